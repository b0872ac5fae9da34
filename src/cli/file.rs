//! bcstart file command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{block_on, Context, Globals};
use crate::error::{Error, Result};
use crate::files::{FileRecord, FileService};
use crate::output::{emit_success, HumanOutput};
use crate::session::require_user;

pub struct UploadOptions {
    pub business: String,
    pub path: PathBuf,
    pub name: Option<String>,
    pub globals: Globals,
}

#[derive(Serialize)]
struct UnmapReport {
    task_id: String,
    file_id: String,
    removed: bool,
}

#[derive(Serialize)]
struct RemoveReport {
    id: String,
}

pub fn run_upload(options: UploadOptions) -> Result<()> {
    let ctx = Context::load(&options.globals)?;
    let name = match options.name {
        Some(name) => name,
        None => options
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("no file name in {}", options.path.display()))
            })?,
    };
    let content = std::fs::read(&options.path)?;

    let service = ctx.service();
    let files = ctx.files();
    let session = ctx.session();
    let record = block_on(async {
        // Uploads go to a business the caller owns.
        service.business(&options.business).await?;
        let user = require_user(session.as_ref()).await?;
        files.upload(&user.id, &options.business, &name, content).await
    })?;

    let mut human = HumanOutput::new(format!("bcstart file upload: {}", record.name));
    human.push_summary("id", record.id.clone());
    human.push_summary("size", format!("{} bytes", record.size_bytes));
    emit_success(ctx.output, "file upload", &record, Some(&human))
}

pub fn run_list(business: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let service = ctx.service();
    let files = ctx.files();
    let session = ctx.session();
    let records: Vec<FileRecord> = block_on(async {
        service.business(&business).await?;
        let user = require_user(session.as_ref()).await?;
        files.list(&user.id, &business).await
    })?;

    let mut human = HumanOutput::new(format!("bcstart file list: {}", records.len()));
    for record in &records {
        human.push_detail(format!("{}  {} ({} bytes)", record.id, record.name, record.size_bytes));
    }
    emit_success(ctx.output, "file list", &records, Some(&human))
}

pub fn run_remove(id: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    block_on(ctx.mapping().remove_file(&id))?;

    let mut human = HumanOutput::new("bcstart file remove: removed");
    human.push_summary("id", id.clone());
    emit_success(ctx.output, "file remove", &RemoveReport { id }, Some(&human))
}

pub fn run_map(task: String, file: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let mapping = block_on(ctx.mapping().map_file(&task, &file))?;

    let mut human = HumanOutput::new("bcstart file map: mapped");
    human.push_summary("task", mapping.task_id.clone());
    human.push_summary("file", mapping.file_id.clone());
    emit_success(ctx.output, "file map", &mapping, Some(&human))
}

pub fn run_unmap(task: String, file: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let removed = block_on(ctx.mapping().unmap_file(&task, &file))?;

    let header = if removed {
        "bcstart file unmap: removed"
    } else {
        "bcstart file unmap: not mapped"
    };
    let human = HumanOutput::new(header);
    let report = UnmapReport {
        task_id: task,
        file_id: file,
        removed,
    };
    emit_success(ctx.output, "file unmap", &report, Some(&human))
}

pub fn run_task(task: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let records = block_on(ctx.mapping().files_for_task(&task))?;

    let mut human = HumanOutput::new(format!("bcstart file task: {} file(s)", records.len()));
    for record in &records {
        human.push_detail(format!("{}  {}", record.id, record.name));
    }
    emit_success(ctx.output, "file task", &records, Some(&human))
}

pub fn run_choices(business: String, task: String, globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let choices = block_on(ctx.mapping().file_choices(&business, &task))?;

    let mut human = HumanOutput::new(format!("bcstart file choices: {} file(s)", choices.len()));
    for choice in &choices {
        let note = match &choice.mapped_to {
            Some(other) if *other == task => " (mapped here)".to_string(),
            Some(other) if choice.selectable => format!(" (also mapped to {other})"),
            Some(other) => format!(" (mapped to {other})"),
            None => String::new(),
        };
        human.push_detail(format!("{}  {}{note}", choice.file.id, choice.file.name));
    }
    emit_success(ctx.output, "file choices", &choices, Some(&human))
}
