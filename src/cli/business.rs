//! bcstart business command implementations.

use std::path::PathBuf;

use crate::business::Business;
use crate::cli::{block_on, Context, Globals};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

pub struct CreateOptions {
    pub name: String,
    pub description: Option<String>,
    pub description_file: Option<PathBuf>,
    pub globals: Globals,
}

pub fn run_create(options: CreateOptions) -> Result<()> {
    let ctx = Context::load(&options.globals)?;
    ctx.storage.init()?;

    let description = match (&options.description, &options.description_file) {
        (_, Some(path)) => std::fs::read_to_string(path)?,
        (Some(text), None) => text.clone(),
        (None, None) => String::new(),
    };

    let service = ctx.service();
    let business = block_on(service.create_business(&options.name, &description))?;

    let mut human = HumanOutput::new(format!("bcstart business create: {}", business.name));
    human.push_summary("id", business.id.clone());
    if business.description.is_empty() {
        human.push_warning("no description saved; generated todos will quote the name only");
    }
    human.push_next_step(format!("bcstart todo generate {}", business.id));
    emit_success(ctx.output, "business create", &business, Some(&human))
}

pub fn run_list(globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let businesses = block_on(ctx.service().list_businesses())?;

    let mut human = HumanOutput::new(format!("bcstart business list: {}", businesses.len()));
    for business in &businesses {
        human.push_detail(format!("{}  {}", business.id, business.name));
    }
    if businesses.is_empty() {
        human.push_next_step("bcstart business create <name> --description \"...\"");
    }
    emit_success(ctx.output, "business list", &businesses, Some(&human))
}

pub fn run_show(id: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let business: Business = block_on(ctx.service().business(&id))?;

    let mut human = HumanOutput::new(format!("bcstart business show: {}", business.name));
    human.push_summary("id", business.id.clone());
    human.push_summary("created", business.created_at.to_rfc3339());
    if !business.description.is_empty() {
        human.push_detail(business.description.clone());
    }
    emit_success(ctx.output, "business show", &business, Some(&human))
}
