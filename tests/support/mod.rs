#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use assert_cmd::Command;
use bcstart::generation::BaselineGenerator;
use bcstart::repository::{MemoryRepository, Repository};
use bcstart::service::{AnalysisService, ServiceOptions};
use bcstart::session::{SessionProvider, StaticSession, User};
use tempfile::TempDir;

pub const DESCRIPTION: &str = "We roast speciality coffee in Bristol. \
Our team of 12 staff sells to local cafes and online customers. \
We buy beans from two importers and ship in compostable packaging.";

/// A shared in-memory backend with one service per signed-in user.
pub struct TestEnv {
    pub repo: Arc<MemoryRepository>,
    pub options: ServiceOptions,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_options(ServiceOptions::default())
    }

    pub fn with_options(options: ServiceOptions) -> Self {
        Self {
            repo: Arc::new(MemoryRepository::new()),
            options,
        }
    }

    pub fn repository(&self) -> Arc<dyn Repository> {
        self.repo.clone()
    }

    pub fn service_for(&self, user_id: &str) -> AnalysisService {
        AnalysisService::new(
            self.repository(),
            session_for(user_id),
            Arc::new(BaselineGenerator),
            self.options.clone(),
        )
    }

    pub fn anonymous_service(&self) -> AnalysisService {
        AnalysisService::new(
            self.repository(),
            Arc::new(StaticSession::anonymous()),
            Arc::new(BaselineGenerator),
            self.options.clone(),
        )
    }
}

pub fn session_for(user_id: &str) -> Arc<dyn SessionProvider> {
    Arc::new(StaticSession::signed_in(User::new(user_id)))
}

/// A temporary data directory for driving the binary.
pub struct DataDir {
    dir: TempDir,
}

impl DataDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `bcstart --data-dir <dir>` with a clean environment and no user.
    pub fn bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("bcstart").expect("binary");
        cmd.env_remove("BCSTART_USER")
            .env_remove("BCSTART_DATA_DIR")
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.path());
        cmd
    }

    /// `bcstart --data-dir <dir> --user <user>`.
    pub fn bcstart(&self, user: &str) -> Command {
        let mut cmd = self.bare();
        cmd.arg("--user").arg(user);
        cmd
    }

    /// Run a `--json` command and return the envelope's `data`.
    pub fn json(&self, user: &str, args: &[&str]) -> serde_json::Value {
        let output = self
            .bcstart(user)
            .arg("--json")
            .args(args)
            .output()
            .expect("run bcstart");
        assert!(
            output.status.success(),
            "bcstart {args:?} failed: {}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let envelope: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("json envelope");
        assert_eq!(envelope["status"], "success");
        envelope["data"].clone()
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.path().join(".bcstart.toml"), contents).expect("write config");
    }
}
