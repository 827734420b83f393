//! Time-window segmentation
//!
//! Splits a chronologically sorted message list into contiguous, fixed-length
//! windows whose length adapts to the total span of the conversation.

use chrono::{DateTime, Duration, Utc};

use crate::curator::types::Message;

/// A half-open time interval `[start, end)` and the messages falling in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Human-readable label, e.g. `"2024-01-01 to 2024-01-07"`
    pub label: String,
    /// Positions of the member messages in the input slice, ascending
    pub members: Vec<usize>,
}

impl TimeWindow {
    fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            label: window_label(start, end),
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Iterate over the member messages
    pub fn messages<'a>(&'a self, all: &'a [Message]) -> impl Iterator<Item = &'a Message> + 'a {
        self.members.iter().map(move |&i| &all[i])
    }
}

/// Label a window by its first and last calendar day
pub fn window_label(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let last_day = end - Duration::days(1);
    format!(
        "{} to {}",
        start.format("%Y-%m-%d"),
        last_day.format("%Y-%m-%d")
    )
}

/// Window length in days for a conversation spanning `span`
///
/// - under 180 days: weekly windows
/// - under 540 days: fortnightly windows
/// - otherwise: 30-day windows
pub fn window_days_for_span(span: Duration) -> i64 {
    if span < Duration::days(180) {
        7
    } else if span < Duration::days(540) {
        14
    } else {
        30
    }
}

/// Partition messages into consecutive windows.
///
/// Messages must be sorted ascending by timestamp. Windows start at the first
/// message and continue until a window start passes the last message, so
/// every message lands in exactly one window. Windows may be empty.
pub fn segment_into_windows(messages: &[Message]) -> Vec<TimeWindow> {
    let (Some(first), Some(last)) = (messages.first(), messages.last()) else {
        return Vec::new();
    };

    let window_len = Duration::days(window_days_for_span(last.timestamp - first.timestamp));

    let mut windows = Vec::new();
    let mut window_start = first.timestamp;
    let mut cursor = 0usize;

    while window_start <= last.timestamp {
        let mut window = TimeWindow::new(window_start, window_start + window_len);

        while cursor < messages.len() && window.contains(messages[cursor].timestamp) {
            window.members.push(cursor);
            cursor += 1;
        }

        window_start = window.end;
        windows.push(window);
    }

    windows
}
