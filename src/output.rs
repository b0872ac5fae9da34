//! Shared output formatting for bcstart CLI commands.
//!
//! `--json` prints one envelope per command; otherwise a short human report
//! (header, summary, details, warnings, next steps) unless `--quiet`.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "bcstart.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Human-readable report for one command.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header)?;
        if !self.summary.is_empty() {
            f.write_str("\n\nSummary:")?;
            for (key, value) in &self.summary {
                match value.as_str() {
                    "" => write!(f, "\n- {key}")?,
                    value => write!(f, "\n- {key}: {value}")?,
                }
            }
        }
        for (title, items) in [
            ("Details", &self.details),
            ("Warnings", &self.warnings),
            ("Next steps", &self.next_steps),
        ] {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{title}:")?;
            for item in items {
                write!(f, "\n- {item}")?;
            }
        }
        Ok(())
    }
}

/// The `bcstart.v1` JSON envelope. Exactly one of `data` and `error` is set.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    next_steps: &'a [String],
}

impl<'a, T: Serialize> Envelope<'a, T> {
    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        return Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data: Some(data),
            error: None,
            warnings: human.map(|h| h.warnings.as_slice()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.as_slice()).unwrap_or_default(),
        }
        .print();
    }

    if let Some(human) = human.filter(|_| !options.quiet) {
        println!("{human}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        return error_envelope(command, err, &next_steps).print();
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

fn error_envelope<'a>(
    command: &'a str,
    err: &Error,
    next_steps: &'a [String],
) -> Envelope<'a, ()> {
    Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: "error",
        data: None,
        error: Some(JsonError::from(err)),
        warnings: &[],
        next_steps,
    }
}

pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

/// Command groups whose first positional argument names a subcommand.
const GROUPS: [&str; 6] = ["business", "todo", "area", "file", "session", "dev"];

fn command_name(args: impl IntoIterator<Item = String>) -> String {
    // Global flags that consume the following argument.
    const VALUE_FLAGS: [&str; 2] = ["--data-dir", "--user"];

    let mut args = args.into_iter();
    let mut positionals = std::iter::from_fn(|| loop {
        let arg = args.next()?;
        if VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
        } else if !arg.starts_with('-') {
            return Some(arg);
        }
    });

    match positionals.next() {
        None => "bcstart".to_string(),
        Some(group) if GROUPS.contains(&group.as_str()) => match positionals.next() {
            Some(sub) => format!("{group} {sub}"),
            None => group,
        },
        Some(command) => command,
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::AuthenticationRequired => {
            vec!["bcstart session login <user-id> (or pass --user)".to_string()]
        }
        Error::BusinessNotFound(_) => vec!["bcstart business list".to_string()],
        Error::TodoNotFound(_) => vec!["bcstart todo list <business-id> --binned".to_string()],
        Error::SubAreaNotFound(_) => {
            vec!["bcstart area list <business-id> <impact>".to_string()]
        }
        Error::FileNotFound(_) => vec!["bcstart file list <business-id>".to_string()],
        Error::InvalidTransition { .. } => vec![
            "move the todo through in_progress, or set status.strict_transitions = false"
                .to_string(),
        ],
        Error::FileAlreadyMapped { file_id, task_id } => {
            vec![format!("bcstart file unmap {task_id} {file_id}")]
        }
        Error::ResetDisabled => vec!["set dev.allow_reset = true in .bcstart.toml".to_string()],
        Error::ConfirmationRequired(_) => vec!["re-run with --yes".to_string()],
        Error::InvalidConfig(_) => vec!["fix .bcstart.toml then retry".to_string()],
        Error::GenerationTimedOut(_) => {
            vec!["raise generation.timeout_secs or retry later".to_string()]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_output_lists_sections_in_order() {
        let mut output = HumanOutput::new("bcstart todo status: done");
        output.push_summary("todo", "01J0");
        output.push_summary("completed", "");
        output.push_warning("unrecognized priority 'asap'");
        output.push_next_step("bcstart summary <business-id>");

        let text = output.to_string();
        assert_eq!(
            text,
            "bcstart todo status: done\n\nSummary:\n- todo: 01J0\n- completed\n\nWarnings:\n- unrecognized priority 'asap'\n\nNext steps:\n- bcstart summary <business-id>"
        );
    }

    #[test]
    fn empty_sections_are_omitted() {
        assert_eq!(HumanOutput::new("ok").to_string(), "ok");
    }

    #[test]
    fn command_name_skips_global_flag_values() {
        let name = |args: &[&str]| command_name(args.iter().map(|arg| arg.to_string()));

        assert_eq!(name(&[]), "bcstart");
        assert_eq!(name(&["--json", "summary", "b1"]), "summary");
        assert_eq!(
            name(&["--data-dir", "/tmp/todo", "--user", "dev", "todo", "list"]),
            "todo list"
        );
        assert_eq!(name(&["dev", "--yes", "reset-all"]), "dev reset-all");
        assert_eq!(name(&["area"]), "area");
    }

    #[test]
    fn error_envelope_carries_kind_code_and_details() {
        let err = Error::InvalidTransition {
            from: "todo".to_string(),
            to: "done".to_string(),
        };
        let next_steps = error_next_steps(&err);
        let value = serde_json::to_value(error_envelope("todo status", &err, &next_steps))
            .expect("serialize envelope");

        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["status"], "error");
        assert!(value.get("data").is_none());
        assert!(value.get("warnings").is_none());
        assert_eq!(value["error"]["kind"], "policy_blocked");
        assert_eq!(value["error"]["code"], 3);
        assert_eq!(value["error"]["details"]["from"], "todo");
        assert_eq!(value["next_steps"].as_array().map(Vec::len), Some(1));
    }
}
