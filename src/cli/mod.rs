//! Command-line interface for bcstart
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::files::{FileService, LocalFileService};
use crate::generation::BaselineGenerator;
use crate::mapping::MappingService;
use crate::output::OutputOptions;
use crate::repository::{FileRepository, Repository};
use crate::service::{AnalysisService, ServiceOptions};
use crate::session::{resolve_user, SessionProvider, StaticSession, User};
use crate::storage::Storage;
use crate::subarea::SubAreaRegistry;

mod area;
mod business;
mod dev;
mod file;
mod init;
mod session;
mod todo;

/// bcstart - B Corp certification roadmap
///
/// Manage a business's roadmap of todos across the five B Corp impact
/// areas: status, sub-areas, evidence, supporting files and progress.
#[derive(Parser, Debug)]
#[command(name = "bcstart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "BCSTART_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Act as this user id
    #[arg(long, global = true, env = "BCSTART_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and a default config file
    Init,

    /// Local session (who the CLI acts as)
    #[command(subcommand)]
    Session(SessionCommands),

    /// Business profiles
    #[command(subcommand)]
    Business(BusinessCommands),

    /// Roadmap todos
    #[command(subcommand)]
    Todo(TodoCommands),

    /// Sub-areas inside an impact area
    #[command(subcommand)]
    Area(AreaCommands),

    /// Uploaded files and task-file mappings
    #[command(subcommand)]
    File(FileCommands),

    /// Progress per impact area
    Summary {
        /// Business id
        business: String,
    },

    /// Developer-only operations
    #[command(subcommand)]
    Dev(DevCommands),
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Persist a session for a user id
    Login {
        user_id: String,

        #[arg(long)]
        email: Option<String>,
    },

    /// Remove the persisted session
    Logout,

    /// Show the resolved user
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum BusinessCommands {
    /// Create a business profile
    Create {
        name: String,

        /// Business description (source text for generated todos)
        #[arg(long, conflicts_with = "description_file")]
        description: Option<String>,

        /// Read the description from a file
        #[arg(long)]
        description_file: Option<PathBuf>,
    },

    /// List your businesses
    List,

    /// Show one business
    Show { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TodoCommands {
    /// List active todos (or binned ones with --binned)
    List {
        business: String,

        /// Show soft-deleted todos instead
        #[arg(long)]
        binned: bool,

        /// Only this impact area
        #[arg(long)]
        impact: Option<String>,

        /// Only this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one todo
    Show { id: String },

    /// Add a todo by hand
    Add {
        business: String,

        title: String,

        #[arg(long, default_value = "Other")]
        impact: String,

        #[arg(long)]
        priority: Option<String>,

        #[arg(long)]
        effort: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        sub_area: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// Set status: todo, in_progress, blocked, done
    Status { id: String, status: String },

    /// Move into a sub-area (omit to unassign)
    Assign { id: String, sub_area: Option<String> },

    /// Change impact area
    Impact {
        id: String,
        impact: String,

        /// Lock the impact area
        #[arg(long, conflicts_with = "unlock")]
        lock: bool,

        /// Unlock the impact area
        #[arg(long)]
        unlock: bool,
    },

    /// Lock the impact area
    Lock { id: String },

    /// Unlock the impact area
    Unlock { id: String },

    /// Replace linked evidence chunks
    Evidence { id: String, chunks: Vec<String> },

    /// Move to the bin
    Delete { id: String },

    /// Restore from the bin
    Restore { id: String },

    /// Generate todos from the business description
    Generate { business: String },
}

#[derive(Subcommand, Debug)]
pub enum AreaCommands {
    /// List sub-areas of an impact area with their todos
    List { business: String, impact: String },

    /// Seed the default sub-areas
    Seed { business: String },

    /// Add a user-defined sub-area
    Add {
        business: String,
        impact: String,
        title: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a sub-area
    Remove { business: String, id: String },
}

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// Upload a file for a business
    Upload {
        business: String,
        path: PathBuf,

        /// Stored name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// List a business's files
    List { business: String },

    /// Remove a file and its mappings
    Remove { id: String },

    /// Map a file to a todo
    Map { task: String, file: String },

    /// Remove a file from a todo
    Unmap { task: String, file: String },

    /// Files mapped to a todo
    Task { task: String },

    /// Files offered when picking files for a todo
    Choices { business: String, task: String },
}

#[derive(Subcommand, Debug)]
pub enum DevCommands {
    /// Replace a business's todos with a generated baseline
    Reset { business: String },

    /// Delete every todo you own
    ResetAll {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Global flags shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Globals {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let globals = Globals {
            data_dir: self.data_dir,
            user: self.user,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init => init::run(globals),
            Commands::Session(cmd) => match cmd {
                SessionCommands::Login { user_id, email } => {
                    session::run_login(session::LoginOptions { user_id, email, globals })
                }
                SessionCommands::Logout => session::run_logout(globals),
                SessionCommands::Whoami => session::run_whoami(globals),
            },
            Commands::Business(cmd) => match cmd {
                BusinessCommands::Create {
                    name,
                    description,
                    description_file,
                } => business::run_create(business::CreateOptions {
                    name,
                    description,
                    description_file,
                    globals,
                }),
                BusinessCommands::List => business::run_list(globals),
                BusinessCommands::Show { id } => business::run_show(id, globals),
            },
            Commands::Todo(cmd) => match cmd {
                TodoCommands::List {
                    business,
                    binned,
                    impact,
                    status,
                } => todo::run_list(todo::ListOptions {
                    business,
                    binned,
                    impact,
                    status,
                    globals,
                }),
                TodoCommands::Show { id } => todo::run_show(id, globals),
                TodoCommands::Add {
                    business,
                    title,
                    impact,
                    priority,
                    effort,
                    status,
                    description,
                    sub_area,
                    due,
                } => todo::run_add(todo::AddOptions {
                    business,
                    title,
                    impact,
                    priority,
                    effort,
                    status,
                    description,
                    sub_area,
                    due,
                    globals,
                }),
                TodoCommands::Status { id, status } => todo::run_status(id, status, globals),
                TodoCommands::Assign { id, sub_area } => todo::run_assign(id, sub_area, globals),
                TodoCommands::Impact {
                    id,
                    impact,
                    lock,
                    unlock,
                } => {
                    let locked = match (lock, unlock) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    };
                    todo::run_impact(id, impact, locked, globals)
                }
                TodoCommands::Lock { id } => todo::run_lock(id, true, globals),
                TodoCommands::Unlock { id } => todo::run_lock(id, false, globals),
                TodoCommands::Evidence { id, chunks } => todo::run_evidence(id, chunks, globals),
                TodoCommands::Delete { id } => todo::run_delete(id, globals),
                TodoCommands::Restore { id } => todo::run_restore(id, globals),
                TodoCommands::Generate { business } => todo::run_generate(business, globals),
            },
            Commands::Area(cmd) => match cmd {
                AreaCommands::List { business, impact } => area::run_list(business, impact, globals),
                AreaCommands::Seed { business } => area::run_seed(business, globals),
                AreaCommands::Add {
                    business,
                    impact,
                    title,
                    description,
                } => area::run_add(area::AddOptions {
                    business,
                    impact,
                    title,
                    description,
                    globals,
                }),
                AreaCommands::Remove { business, id } => area::run_remove(business, id, globals),
            },
            Commands::File(cmd) => match cmd {
                FileCommands::Upload {
                    business,
                    path,
                    name,
                } => file::run_upload(file::UploadOptions {
                    business,
                    path,
                    name,
                    globals,
                }),
                FileCommands::List { business } => file::run_list(business, globals),
                FileCommands::Remove { id } => file::run_remove(id, globals),
                FileCommands::Map { task, file } => file::run_map(task, file, globals),
                FileCommands::Unmap { task, file } => file::run_unmap(task, file, globals),
                FileCommands::Task { task } => file::run_task(task, globals),
                FileCommands::Choices { business, task } => {
                    file::run_choices(business, task, globals)
                }
            },
            Commands::Summary { business } => todo::run_summary(business, globals),
            Commands::Dev(cmd) => match cmd {
                DevCommands::Reset { business } => dev::run_reset(business, globals),
                DevCommands::ResetAll { yes } => dev::run_reset_all(yes, globals),
            },
        }
    }
}

/// Everything a command needs, wired over the data directory.
pub(crate) struct Context {
    pub storage: Arc<Storage>,
    pub config: Config,
    pub user: Option<User>,
    pub output: OutputOptions,
}

impl Context {
    pub fn load(globals: &Globals) -> Result<Self> {
        let storage = match &globals.data_dir {
            Some(dir) => Storage::new(dir.clone()),
            None => Storage::default_location()?,
        };
        let config = Config::load_from_dir(storage.root())?;
        let user = resolve_user(&storage, globals.user.as_deref(), &config)?;
        Ok(Self {
            storage: Arc::new(storage),
            config,
            user,
            output: globals.output(),
        })
    }

    pub fn session(&self) -> Arc<dyn SessionProvider> {
        match &self.user {
            Some(user) => Arc::new(StaticSession::signed_in(user.clone())),
            None => Arc::new(StaticSession::anonymous()),
        }
    }

    pub fn repository(&self) -> Arc<dyn Repository> {
        Arc::new(FileRepository::new(Arc::clone(&self.storage)))
    }

    pub fn files(&self) -> Arc<dyn FileService> {
        Arc::new(LocalFileService::new(
            Arc::clone(&self.storage),
            self.config.files.max_upload_bytes,
        ))
    }

    pub fn service(&self) -> AnalysisService {
        AnalysisService::new(
            self.repository(),
            self.session(),
            Arc::new(BaselineGenerator),
            ServiceOptions::from_config(&self.config),
        )
    }

    pub fn registry(&self) -> SubAreaRegistry {
        SubAreaRegistry::new(self.repository(), self.session())
    }

    pub fn mapping(&self) -> MappingService {
        MappingService::new(
            self.repository(),
            self.files(),
            self.session(),
            self.config.files.single_task_per_file,
        )
    }
}

/// Drive one async operation to completion on a current-thread runtime.
pub(crate) fn block_on<T, F>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}
