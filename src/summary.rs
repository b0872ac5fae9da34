//! Per-impact-area progress.

use serde::Serialize;

use crate::todo::{Impact, Todo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImpactSummary {
    pub impact: Impact,
    pub total: usize,
    pub done: usize,
    pub pct: u8,
}

impl ImpactSummary {
    pub fn empty(impact: Impact) -> Self {
        Self {
            impact,
            total: 0,
            done: 0,
            pct: 0,
        }
    }
}

/// One entry per canonical impact area, in [`Impact::CANONICAL`] order.
///
/// Soft-deleted todos and todos filed under `Other` are not counted.
pub fn summarize<'a, I>(todos: I) -> Vec<ImpactSummary>
where
    I: IntoIterator<Item = &'a Todo>,
{
    let mut summaries: Vec<ImpactSummary> =
        Impact::CANONICAL.iter().copied().map(ImpactSummary::empty).collect();

    for todo in todos.into_iter().filter(|todo| todo.is_active()) {
        let Some(entry) = summaries.iter_mut().find(|s| s.impact == todo.impact) else {
            continue;
        };
        entry.total += 1;
        if todo.is_done() {
            entry.done += 1;
        }
    }

    for entry in &mut summaries {
        entry.pct = percent(entry.done, entry.total);
    }
    summaries
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}
