//! Persistence collaborator.
//!
//! The repository stores raw rows and performs each call as one atomic
//! step; tenant checks and business rules live in the services above it.

use async_trait::async_trait;

use crate::business::Business;
use crate::error::Result;
use crate::mapping::TaskFileMapping;
use crate::subarea::SubArea;
use crate::todo::{Impact, TodoPatch, TodoRow};

mod file;
mod memory;

pub use file::FileRepository;
pub use memory::MemoryRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    // Businesses

    async fn insert_business(&self, business: Business) -> Result<()>;

    async fn get_business(&self, business_id: &str) -> Result<Option<Business>>;

    async fn list_businesses(&self, user_id: &str) -> Result<Vec<Business>>;

    // Todos

    async fn insert_todos(&self, rows: Vec<TodoRow>) -> Result<()>;

    async fn get_todo(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoRow>>;

    /// Every row of the business owned by `user_id`, soft-deleted included.
    async fn list_todos(&self, user_id: &str, business_id: &str) -> Result<Vec<TodoRow>>;

    /// Apply `patch` to one row and return the updated row, or `None` when
    /// no row with that id is owned by `user_id`.
    async fn update_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        patch: &TodoPatch,
    ) -> Result<Option<TodoRow>>;

    /// Hard-delete the business's rows. Returns the removed ids.
    async fn delete_business_todos(&self, user_id: &str, business_id: &str)
        -> Result<Vec<String>>;

    /// Hard-delete every row owned by `user_id`. Returns the removed ids.
    async fn delete_user_todos(&self, user_id: &str) -> Result<Vec<String>>;

    // Sub-areas

    async fn list_sub_areas(&self, business_id: &str) -> Result<Vec<SubArea>>;

    async fn get_sub_area(&self, sub_area_id: &str) -> Result<Option<SubArea>>;

    async fn insert_sub_area(&self, sub_area: SubArea) -> Result<()>;

    /// Insert `defaults` only if the business has no sub-area for `impact`.
    /// The check and the insert happen as one step. Returns whether rows
    /// were inserted.
    async fn seed_sub_areas(
        &self,
        business_id: &str,
        impact: Impact,
        defaults: Vec<SubArea>,
    ) -> Result<bool>;

    async fn delete_sub_area(&self, business_id: &str, sub_area_id: &str) -> Result<bool>;

    // Task-file mappings

    /// Insert a mapping. Returns `false` when the same pair already exists.
    /// With `exclusive`, a file mapped to a different task is rejected with
    /// `FileAlreadyMapped`.
    async fn insert_mapping(&self, mapping: TaskFileMapping, exclusive: bool) -> Result<bool>;

    async fn delete_mapping(&self, task_id: &str, file_id: &str) -> Result<bool>;

    async fn list_mappings(&self, user_id: &str) -> Result<Vec<TaskFileMapping>>;

    /// Drop every mapping that references one of `task_ids` or `file_id`s.
    async fn delete_mappings_for(&self, task_ids: &[String], file_ids: &[String]) -> Result<usize>;
}

/// Shared row selection so both implementations agree on semantics.
pub(crate) mod rows {
    use super::*;
    use crate::error::Error;

    pub fn seed_needed(existing: &[SubArea], business_id: &str, impact: Impact) -> bool {
        !existing
            .iter()
            .any(|s| s.business_id == business_id && s.impact_area == impact)
    }

    pub fn insert_mapping(
        mappings: &mut Vec<TaskFileMapping>,
        mapping: TaskFileMapping,
        exclusive: bool,
    ) -> Result<bool> {
        if mappings
            .iter()
            .any(|m| m.task_id == mapping.task_id && m.file_id == mapping.file_id)
        {
            return Ok(false);
        }
        if exclusive {
            if let Some(existing) = mappings.iter().find(|m| m.file_id == mapping.file_id) {
                return Err(Error::FileAlreadyMapped {
                    file_id: mapping.file_id,
                    task_id: existing.task_id.clone(),
                });
            }
        }
        mappings.push(mapping);
        Ok(true)
    }

    pub fn drain_todos<F>(todos: &mut Vec<TodoRow>, mut remove: F) -> Vec<String>
    where
        F: FnMut(&TodoRow) -> bool,
    {
        let mut removed = Vec::new();
        todos.retain(|row| {
            if remove(row) {
                removed.push(row.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}
