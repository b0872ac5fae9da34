//! Task-file mappings: which uploaded files back which todo.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::business::owned_business;
use crate::error::{Error, Result};
use crate::files::{FileRecord, FileService};
use crate::repository::Repository;
use crate::session::{require_user, SessionProvider, User};
use crate::todo::TodoRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskFileMapping {
    pub task_id: String,
    pub file_id: String,
    pub mapped_by: String,
    pub mapped_at: DateTime<Utc>,
}

impl TaskFileMapping {
    pub fn new(task_id: &str, file_id: &str, mapped_by: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            file_id: file_id.to_string(),
            mapped_by: mapped_by.to_string(),
            mapped_at: Utc::now(),
        }
    }
}

/// A business file as offered in a task's file picker.
#[derive(Debug, Clone, Serialize)]
pub struct FileChoice {
    pub file: FileRecord,
    /// Task this file is currently mapped to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_to: Option<String>,
    pub selectable: bool,
}

#[derive(Clone)]
pub struct MappingService {
    repo: Arc<dyn Repository>,
    files: Arc<dyn FileService>,
    session: Arc<dyn SessionProvider>,
    single_task_per_file: bool,
}

impl MappingService {
    pub fn new(
        repo: Arc<dyn Repository>,
        files: Arc<dyn FileService>,
        session: Arc<dyn SessionProvider>,
        single_task_per_file: bool,
    ) -> Self {
        Self {
            repo,
            files,
            session,
            single_task_per_file,
        }
    }

    /// Map `file_id` to `task_id`. Mapping an already mapped pair is a no-op.
    pub async fn map_file(&self, task_id: &str, file_id: &str) -> Result<TaskFileMapping> {
        let user = require_user(self.session.as_ref()).await?;
        let todo = self.owned_todo(&user, task_id).await?;
        let file = self.owned_file(&user, file_id).await?;
        if file.business_id != todo.business_id {
            return Err(Error::InvalidArgument(format!(
                "file {file_id} belongs to a different business than task {task_id}"
            )));
        }

        let mapping = TaskFileMapping::new(task_id, file_id, &user.id);
        let inserted = self
            .repo
            .insert_mapping(mapping.clone(), self.single_task_per_file)
            .await?;
        if inserted {
            tracing::info!(task_id, file_id, "file mapped to task");
            return Ok(mapping);
        }

        let existing = self
            .repo
            .list_mappings(&user.id)
            .await?
            .into_iter()
            .find(|m| m.task_id == task_id && m.file_id == file_id);
        Ok(existing.unwrap_or(mapping))
    }

    /// Returns whether a mapping was removed.
    pub async fn unmap_file(&self, task_id: &str, file_id: &str) -> Result<bool> {
        let user = require_user(self.session.as_ref()).await?;
        self.owned_todo(&user, task_id).await?;
        let removed = self.repo.delete_mapping(task_id, file_id).await?;
        if removed {
            tracing::info!(task_id, file_id, "file unmapped from task");
        }
        Ok(removed)
    }

    pub async fn files_for_task(&self, task_id: &str) -> Result<Vec<FileRecord>> {
        let user = require_user(self.session.as_ref()).await?;
        self.owned_todo(&user, task_id).await?;

        let mut files = Vec::new();
        for mapping in self.repo.list_mappings(&user.id).await? {
            if mapping.task_id != task_id {
                continue;
            }
            match self.files.get(&user.id, &mapping.file_id).await? {
                Some(file) => files.push(file),
                None => tracing::warn!(
                    task_id,
                    file_id = %mapping.file_id,
                    "mapping references a missing file"
                ),
            }
        }
        Ok(files)
    }

    /// The business's files for the picker of `task_id`. A file mapped to a
    /// different task is not selectable while one-task-per-file applies.
    pub async fn file_choices(&self, business_id: &str, task_id: &str) -> Result<Vec<FileChoice>> {
        let user = require_user(self.session.as_ref()).await?;
        owned_business(self.repo.as_ref(), &user, business_id).await?;
        let mappings = self.repo.list_mappings(&user.id).await?;

        Ok(self
            .files
            .list(&user.id, business_id)
            .await?
            .into_iter()
            .map(|file| {
                let mapped_to = mappings
                    .iter()
                    .find(|m| m.file_id == file.id)
                    .map(|m| m.task_id.clone());
                let selectable = match &mapped_to {
                    Some(other) => !self.single_task_per_file || other == task_id,
                    None => true,
                };
                FileChoice {
                    file,
                    mapped_to,
                    selectable,
                }
            })
            .collect())
    }

    /// Remove a file through the file service and drop its mappings.
    pub async fn remove_file(&self, file_id: &str) -> Result<()> {
        let user = require_user(self.session.as_ref()).await?;
        if !self.files.remove(&user.id, file_id).await? {
            return Err(Error::FileNotFound(file_id.to_string()));
        }
        let dropped = self
            .repo
            .delete_mappings_for(&[], &[file_id.to_string()])
            .await?;
        tracing::info!(file_id, mappings = dropped, "file removed");
        Ok(())
    }

    async fn owned_todo(&self, user: &User, task_id: &str) -> Result<TodoRow> {
        self.repo
            .get_todo(&user.id, task_id)
            .await?
            .ok_or_else(|| Error::TodoNotFound(task_id.to_string()))
    }

    async fn owned_file(&self, user: &User, file_id: &str) -> Result<FileRecord> {
        self.files
            .get(&user.id, file_id)
            .await?
            .ok_or_else(|| Error::FileNotFound(file_id.to_string()))
    }
}
