//! bcstart area command implementations.

use serde::Serialize;

use crate::cli::{block_on, Context, Globals};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::subarea::{group_by_sub_area, SubArea};
use crate::todo::{parse_strict, Impact};

pub struct AddOptions {
    pub business: String,
    pub impact: String,
    pub title: String,
    pub description: Option<String>,
    pub globals: Globals,
}

#[derive(Serialize)]
struct SeedReport {
    seeded: Vec<Impact>,
}

#[derive(Serialize)]
struct RemoveReport {
    id: String,
}

pub fn run_list(business: String, impact: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let impact = parse_strict::<Impact>(&impact)?;

    let registry = ctx.registry();
    let service = ctx.service();
    let (sub_areas, todos) = block_on(async {
        let sub_areas = registry.load_sub_areas_by_impact(&business, impact).await?;
        let todos = service.list_todos(&business).await?;
        Ok((sub_areas, todos))
    })?;
    let grouping = group_by_sub_area(impact, &todos, &sub_areas);

    let mut human = HumanOutput::new(format!(
        "bcstart area list: {impact} ({} sub-areas)",
        grouping.groups.len()
    ));
    for group in &grouping.groups {
        human.push_detail(format!(
            "{} {} [{}] {} todo(s){}",
            group.sub_area.id,
            group.sub_area.title,
            group.sub_area.icon_hint(),
            group.todos.len(),
            if group.sub_area.is_user_created { " (custom)" } else { "" }
        ));
    }
    human.push_summary("unassigned", grouping.unassigned.len().to_string());
    if grouping.groups.is_empty() {
        human.push_next_step(format!("bcstart area seed {business}"));
    }
    emit_success(ctx.output, "area list", &grouping, Some(&human))
}

pub fn run_seed(business: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let seeded = block_on(ctx.registry().ensure_defaults(&business))?;

    let mut human = HumanOutput::new(format!(
        "bcstart area seed: {} area(s) seeded",
        seeded.len()
    ));
    for impact in &seeded {
        human.push_detail(impact.to_string());
    }
    emit_success(ctx.output, "area seed", &SeedReport { seeded }, Some(&human))
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = Context::load(&options.globals)?;
    let impact = parse_strict::<Impact>(&options.impact)?;
    let sub_area: SubArea = block_on(ctx.registry().create_sub_area(
        &options.business,
        impact,
        &options.title,
        options.description.as_deref(),
    ))?;

    let mut human = HumanOutput::new(format!("bcstart area add: {}", sub_area.title));
    human.push_summary("id", sub_area.id.clone());
    human.push_summary("impact", sub_area.impact_area.to_string());
    emit_success(ctx.output, "area add", &sub_area, Some(&human))
}

pub fn run_remove(business: String, id: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    block_on(ctx.registry().delete_sub_area(&business, &id))?;

    let mut human = HumanOutput::new("bcstart area remove: removed");
    human.push_summary("id", id.clone());
    human.push_warning("todos in this sub-area are now unassigned");
    emit_success(ctx.output, "area remove", &RemoveReport { id }, Some(&human))
}
