//! Communication gap detection
//!
//! The windowed path measures silences between window boundaries rather than
//! exact message timestamps, so a reported gap can be wider than the true
//! distance between the surrounding messages. The direct scan is used only
//! when the whole input is returned without windowing.

use chrono::Duration;

use crate::curator::types::{CommunicationGap, Message};
use crate::curator::window::TimeWindow;

/// Default minimum silence reported as a gap
pub const DEFAULT_GAP_THRESHOLD_DAYS: i64 = 7;

/// Find silences between non-empty windows.
///
/// A gap runs from the end of one non-empty window to the start of the next
/// non-empty window and is reported when it lasts at least `threshold`.
pub fn detect_gaps_from_windows(windows: &[TimeWindow], threshold: Duration) -> Vec<CommunicationGap> {
    let mut gaps = Vec::new();
    let mut last_non_empty_end = None;

    for window in windows.iter().filter(|w| !w.is_empty()) {
        if let Some(previous_end) = last_non_empty_end {
            if window.start - previous_end >= threshold {
                gaps.push(CommunicationGap::new(previous_end, window.start));
            }
        }
        last_non_empty_end = Some(window.end);
    }

    gaps
}

/// Find silences between consecutive messages
pub fn detect_gaps(messages: &[Message], threshold: Duration) -> Vec<CommunicationGap> {
    messages
        .windows(2)
        .filter(|pair| pair[1].timestamp - pair[0].timestamp >= threshold)
        .map(|pair| CommunicationGap::new(pair[0].timestamp, pair[1].timestamp))
        .collect()
}
