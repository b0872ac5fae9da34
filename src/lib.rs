//! bcstart - B Corp certification roadmap library
//!
//! This library provides the todo lifecycle and impact-area progress engine
//! behind bcstart.ai, plus the `bcstart` CLI that drives it over a local
//! data directory.
//!
//! # Core Concepts
//!
//! - **Todos**: roadmap actions filed under one of five impact areas
//!   (Governance, Workers, Community, Environment, Customers)
//! - **Sub-areas**: default and user-defined groupings inside an impact area
//! - **Impact summaries**: done/total/percentage per impact area
//! - **Optimistic store**: a client-side cache that applies changes before
//!   the backend confirms them and rolls back on failure
//!
//! # Module Organization
//!
//! - `todo`: todo entity, legacy value normalization, patches
//! - `service`: tenant-scoped todo operations
//! - `store`: optimistic-update cache over the service
//! - `subarea`: sub-area registry and grouping
//! - `mapping`: task-file mappings
//! - `generation`: task-generation contract, screening, offline generator
//! - `repository`: persistence contract with memory and file backends
//! - `session`, `files`, `chat`: external collaborator contracts
//! - `config`, `storage`, `lock`, `error`, `output`, `cli`: ambient plumbing

pub mod business;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod generation;
pub mod lock;
pub mod mapping;
pub mod output;
pub mod repository;
pub mod service;
pub mod session;
pub mod storage;
pub mod store;
pub mod subarea;
pub mod summary;
pub mod todo;

pub use error::{Error, Result};
