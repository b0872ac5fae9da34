//! bcstart init command implementation
//!
//! Creates the data directory and a default `.bcstart.toml`.

use std::path::PathBuf;

use crate::cli::Globals;
use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::storage::Storage;

#[derive(serde::Serialize)]
struct InitReport {
    data_dir: PathBuf,
    created_config: bool,
}

pub fn run(globals: Globals) -> Result<()> {
    let storage = match &globals.data_dir {
        Some(dir) => Storage::new(dir.clone()),
        None => Storage::default_location()?,
    };
    storage.init()?;

    let config_path = storage.config_file();
    let created_config = if config_path.exists() {
        // Surface a broken file now rather than on the next command.
        Config::load(&config_path)?;
        false
    } else {
        Config::default().save(&config_path)?;
        true
    };

    let report = InitReport {
        data_dir: storage.root().to_path_buf(),
        created_config,
    };

    let mut human = HumanOutput::new("bcstart init: data directory ready");
    human.push_summary("data dir", storage.root().display().to_string());
    human.push_summary(
        "config",
        if created_config { "created" } else { "already present" },
    );
    human.push_next_step("bcstart session login <user-id>");
    human.push_next_step("bcstart business create <name> --description \"...\"");

    emit_success(globals.output(), "init", &report, Some(&human))
}
