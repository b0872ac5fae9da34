//! bcstart todo and summary command implementations.

use chrono::NaiveDate;

use crate::cli::{block_on, Context, Globals};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::todo::{parse_strict, Effort, Impact, NewTodo, Priority, Todo, TodoStatus};

pub struct ListOptions {
    pub business: String,
    pub binned: bool,
    pub impact: Option<String>,
    pub status: Option<String>,
    pub globals: Globals,
}

pub struct AddOptions {
    pub business: String,
    pub title: String,
    pub impact: String,
    pub priority: Option<String>,
    pub effort: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub sub_area: Option<String>,
    pub due: Option<String>,
    pub globals: Globals,
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = Context::load(&options.globals)?;
    let impact = options.impact.as_deref().map(parse_strict::<Impact>).transpose()?;
    let status = options
        .status
        .as_deref()
        .map(parse_strict::<TodoStatus>)
        .transpose()?;

    let service = ctx.service();
    let mut todos = if options.binned {
        block_on(service.list_binned_todos(&options.business))?
    } else {
        block_on(service.list_todos(&options.business))?
    };
    todos.retain(|t| impact.map_or(true, |i| t.impact == i));
    todos.retain(|t| status.map_or(true, |s| t.status == s));

    let label = if options.binned { "binned" } else { "active" };
    let mut human = HumanOutput::new(format!("bcstart todo list: {} {label}", todos.len()));
    for todo in &todos {
        human.push_detail(todo_line(todo));
    }
    let command = if options.binned { "todo list --binned" } else { "todo list" };
    emit_success(ctx.output, command, &todos, Some(&human))
}

pub fn run_show(id: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let todo = block_on(ctx.service().todo(&id))?;

    let mut human = HumanOutput::new(format!("bcstart todo show: {}", todo.title));
    push_todo_summary(&mut human, &todo);
    if !todo.description_md.is_empty() {
        human.push_detail(todo.description_md.clone());
    }
    for chunk in &todo.evidence_chunk_ids {
        human.push_detail(format!("evidence: {chunk}"));
    }
    emit_success(ctx.output, "todo show", &todo, Some(&human))
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = Context::load(&options.globals)?;

    let mut new = NewTodo::new(options.title, parse_strict::<Impact>(&options.impact)?);
    if let Some(priority) = options.priority.as_deref() {
        new.priority = parse_strict::<Priority>(priority)?;
    }
    if let Some(effort) = options.effort.as_deref() {
        new.effort = parse_strict::<Effort>(effort)?;
    }
    if let Some(status) = options.status.as_deref() {
        new.status = parse_strict::<TodoStatus>(status)?;
    }
    new.description_md = options.description.unwrap_or_default();
    new.sub_area_id = options.sub_area;
    new.due_date = options.due.as_deref().map(parse_due_date).transpose()?;

    let todo = block_on(ctx.service().create_todo(&options.business, new))?;

    let mut human = HumanOutput::new(format!("bcstart todo add: {}", todo.title));
    push_todo_summary(&mut human, &todo);
    emit_success(ctx.output, "todo add", &todo, Some(&human))
}

pub fn run_status(id: String, status: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let status = parse_strict::<TodoStatus>(&status)?;
    let todo = block_on(ctx.service().update_todo_status(&id, status))?;

    let mut human = HumanOutput::new(format!("bcstart todo status: {}", todo.status));
    push_todo_summary(&mut human, &todo);
    human.push_next_step(format!("bcstart summary {}", todo.business_id));
    emit_success(ctx.output, "todo status", &todo, Some(&human))
}

pub fn run_assign(id: String, sub_area: Option<String>, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let todo = block_on(
        ctx.service()
            .assign_task_to_sub_area(&id, sub_area.as_deref()),
    )?;

    let header = match &todo.sub_area_id {
        Some(sub_area) => format!("bcstart todo assign: {sub_area}"),
        None => "bcstart todo assign: unassigned".to_string(),
    };
    let mut human = HumanOutput::new(header);
    push_todo_summary(&mut human, &todo);
    emit_success(ctx.output, "todo assign", &todo, Some(&human))
}

pub fn run_impact(id: String, impact: String, locked: Option<bool>, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let impact = parse_strict::<Impact>(&impact)?;
    let todo = block_on(ctx.service().update_task_impact_area(&id, impact, locked))?;

    let mut human = HumanOutput::new(format!("bcstart todo impact: {}", todo.impact));
    push_todo_summary(&mut human, &todo);
    emit_success(ctx.output, "todo impact", &todo, Some(&human))
}

pub fn run_lock(id: String, locked: bool, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let todo = block_on(ctx.service().update_task_lock_state(&id, locked))?;

    let (command, header) = if locked {
        ("todo lock", "bcstart todo lock: impact area locked")
    } else {
        ("todo unlock", "bcstart todo unlock: impact area unlocked")
    };
    let mut human = HumanOutput::new(header);
    push_todo_summary(&mut human, &todo);
    emit_success(ctx.output, command, &todo, Some(&human))
}

pub fn run_evidence(id: String, chunks: Vec<String>, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let todo = block_on(ctx.service().link_evidence(&id, chunks))?;

    let mut human = HumanOutput::new(format!(
        "bcstart todo evidence: {} chunk(s)",
        todo.evidence_chunk_ids.len()
    ));
    push_todo_summary(&mut human, &todo);
    emit_success(ctx.output, "todo evidence", &todo, Some(&human))
}

pub fn run_delete(id: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let todo = block_on(ctx.service().delete_task(&id))?;

    let mut human = HumanOutput::new("bcstart todo delete: moved to bin");
    push_todo_summary(&mut human, &todo);
    human.push_next_step(format!("bcstart todo restore {}", todo.id));
    emit_success(ctx.output, "todo delete", &todo, Some(&human))
}

pub fn run_restore(id: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let todo = block_on(ctx.service().restore_task(&id))?;

    let mut human = HumanOutput::new("bcstart todo restore: restored");
    push_todo_summary(&mut human, &todo);
    emit_success(ctx.output, "todo restore", &todo, Some(&human))
}

pub fn run_generate(business: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let todos = block_on(ctx.service().generate_todos(&business))?;

    let mut human = HumanOutput::new(format!("bcstart todo generate: {} added", todos.len()));
    for todo in &todos {
        human.push_detail(todo_line(todo));
    }
    if todos.is_empty() {
        human.push_warning("no new todos; every candidate was a duplicate or failed validation");
    }
    emit_success(ctx.output, "todo generate", &todos, Some(&human))
}

pub fn run_summary(business: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let summaries = block_on(ctx.service().impact_summary(&business))?;

    let mut human = HumanOutput::new("bcstart summary");
    for entry in &summaries {
        human.push_summary(
            entry.impact.to_string(),
            format!("{}/{} done ({}%)", entry.done, entry.total, entry.pct),
        );
    }
    emit_success(ctx.output, "summary", &summaries, Some(&human))
}

fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| Error::InvalidArgument(format!("invalid due date '{raw}': {err}")))
}

fn todo_line(todo: &Todo) -> String {
    format!(
        "{} [{}] {:<11} {:<11} {}",
        todo.id, todo.priority, todo.status, todo.impact, todo.title
    )
}

fn push_todo_summary(human: &mut HumanOutput, todo: &Todo) {
    human.push_summary("id", todo.id.clone());
    human.push_summary("title", todo.title.clone());
    human.push_summary("impact", todo.impact.to_string());
    human.push_summary("status", todo.status.to_string());
    human.push_summary("priority", todo.priority.to_string());
    human.push_summary("effort", todo.effort.to_string());
    if let Some(sub_area) = &todo.sub_area_id {
        human.push_summary("sub-area", sub_area.clone());
    }
    if let Some(due) = todo.due_date {
        human.push_summary("due", due.to_string());
    }
    if let Some(completed_at) = todo.completed_at {
        human.push_summary("completed", completed_at.to_rfc3339());
    }
    if todo.is_impact_locked {
        human.push_summary("impact locked", "");
    }
}
