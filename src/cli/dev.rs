//! bcstart dev command implementations (test-data resets).

use serde::Serialize;

use crate::cli::{block_on, Context, Globals};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct ResetAllReport {
    removed: usize,
}

pub fn run_reset(business: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let outcome = block_on(ctx.service().reset_test_data(&business))?;

    let mut human = HumanOutput::new(format!(
        "bcstart dev reset: {} todo(s) regenerated",
        outcome.todos.len()
    ));
    for entry in &outcome.impact_summaries {
        human.push_summary(entry.impact.to_string(), format!("{}/{}", entry.done, entry.total));
    }
    human.push_next_step(format!("bcstart todo list {business}"));
    emit_success(ctx.output, "dev reset", &outcome, Some(&human))
}

pub fn run_reset_all(confirmed: bool, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let removed = block_on(ctx.service().reset_all_test_data(confirmed))?;

    let human = HumanOutput::new(format!("bcstart dev reset-all: {removed} todo(s) deleted"));
    emit_success(ctx.output, "dev reset-all", &ResetAllReport { removed }, Some(&human))
}
