//! bcstart session command implementations.

use serde::Serialize;

use crate::cli::{Context, Globals};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::session::{clear_session, persist_session, User};

pub struct LoginOptions {
    pub user_id: String,
    pub email: Option<String>,
    pub globals: Globals,
}

#[derive(Serialize)]
struct LogoutReport {
    removed: bool,
}

#[derive(Serialize)]
struct WhoamiReport {
    user: Option<User>,
}

pub fn run_login(options: LoginOptions) -> Result<()> {
    let ctx = Context::load(&options.globals)?;
    ctx.storage.init()?;

    let user = User {
        id: options.user_id.trim().to_string(),
        email: options.email.filter(|e| !e.trim().is_empty()),
    };
    persist_session(&ctx.storage, &user)?;

    let mut human = HumanOutput::new(format!("bcstart session login: {}", user.id));
    if let Some(email) = &user.email {
        human.push_summary("email", email.clone());
    }
    human.push_next_step("bcstart business list");
    emit_success(ctx.output, "session login", &user, Some(&human))
}

pub fn run_logout(globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;
    let removed = clear_session(&ctx.storage)?;

    let header = if removed {
        "bcstart session logout: session removed"
    } else {
        "bcstart session logout: no persisted session"
    };
    let human = HumanOutput::new(header);
    emit_success(ctx.output, "session logout", &LogoutReport { removed }, Some(&human))
}

pub fn run_whoami(globals: Globals) -> Result<()> {
    let ctx = Context::load(&globals)?;

    let mut human = match &ctx.user {
        Some(user) => HumanOutput::new(format!("bcstart session whoami: {}", user.id)),
        None => {
            let mut human = HumanOutput::new("bcstart session whoami: not signed in");
            human.push_next_step("bcstart session login <user-id>");
            human
        }
    };
    if let Some(email) = ctx.user.as_ref().and_then(|u| u.email.as_ref()) {
        human.push_summary("email", email.clone());
    }

    let report = WhoamiReport { user: ctx.user.clone() };
    emit_success(ctx.output, "session whoami", &report, Some(&human))
}
