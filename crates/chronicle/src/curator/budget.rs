//! Output budget allocation across time windows
//!
//! Splits the target count between windows in proportion to how many
//! messages each holds, then nudges budgets down or up one at a time until
//! the total matches the target or no window can move any further.

use crate::curator::window::TimeWindow;

/// Allocate a per-window output budget.
///
/// Every non-empty window receives at least one slot. For targets below the
/// message total no window is given more slots than it has messages. When the
/// target is smaller than the number of non-empty windows the one-slot floor
/// wins and the total exceeds the target.
pub fn allocate_budgets(windows: &[TimeWindow], target_count: usize) -> Vec<usize> {
    let mut budgets = vec![0usize; windows.len()];
    let total: usize = windows.iter().map(TimeWindow::len).sum();

    if total == 0 {
        return budgets;
    }

    for (budget, window) in budgets.iter_mut().zip(windows) {
        if window.is_empty() {
            continue;
        }
        let share = window.len() as f64 / total as f64 * target_count as f64;
        *budget = (share.round() as usize).max(1);
    }

    // Densest windows first; stable sort keeps chronological order on ties
    let mut order: Vec<usize> = (0..windows.len())
        .filter(|&i| !windows[i].is_empty())
        .collect();
    order.sort_by(|&a, &b| windows[b].len().cmp(&windows[a].len()));

    let mut allocated: usize = budgets.iter().sum();

    while allocated > target_count {
        let mut changed = false;
        for &i in &order {
            if allocated == target_count {
                break;
            }
            if budgets[i] > 1 {
                budgets[i] -= 1;
                allocated -= 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    while allocated < target_count {
        let mut changed = false;
        for &i in &order {
            if allocated == target_count {
                break;
            }
            if budgets[i] < windows[i].len() {
                budgets[i] += 1;
                allocated += 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    budgets
}
