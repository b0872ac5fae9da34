//! File-backed repository over JSONL tables in the data directory.
//!
//! Reads load a whole table; writes go through [`Storage::update_table`],
//! which holds the table lock across read-modify-write and replaces the file
//! atomically. Blocking I/O runs on tokio's blocking pool.

use std::sync::Arc;

use async_trait::async_trait;

use super::{rows, Repository};
use crate::business::Business;
use crate::error::{Error, Result};
use crate::mapping::TaskFileMapping;
use crate::storage::{tables, Storage};
use crate::subarea::SubArea;
use crate::todo::{Impact, TodoPatch, TodoRow};

#[derive(Debug, Clone)]
pub struct FileRepository {
    storage: Arc<Storage>,
}

impl FileRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|err| Error::RemoteFailure(format!("storage task failed: {err}")))?
    }
}

#[async_trait]
impl Repository for FileRepository {
    async fn insert_business(&self, business: Business) -> Result<()> {
        self.blocking(move |storage| {
            storage.update_table(tables::BUSINESSES, |rows: &mut Vec<Business>| {
                rows.push(business);
                Ok(())
            })
        })
        .await
    }

    async fn get_business(&self, business_id: &str) -> Result<Option<Business>> {
        let business_id = business_id.to_string();
        self.blocking(move |storage| {
            let rows: Vec<Business> = storage.read_table(tables::BUSINESSES)?;
            Ok(rows.into_iter().find(|b| b.id == business_id))
        })
        .await
    }

    async fn list_businesses(&self, user_id: &str) -> Result<Vec<Business>> {
        let user_id = user_id.to_string();
        self.blocking(move |storage| {
            let mut rows: Vec<Business> = storage.read_table(tables::BUSINESSES)?;
            rows.retain(|b| b.user_id == user_id);
            Ok(rows)
        })
        .await
    }

    async fn insert_todos(&self, new_rows: Vec<TodoRow>) -> Result<()> {
        self.blocking(move |storage| {
            storage.update_table(tables::TODOS, |rows: &mut Vec<TodoRow>| {
                rows.extend(new_rows);
                Ok(())
            })
        })
        .await
    }

    async fn get_todo(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoRow>> {
        let user_id = user_id.to_string();
        let todo_id = todo_id.to_string();
        self.blocking(move |storage| {
            let rows: Vec<TodoRow> = storage.read_table(tables::TODOS)?;
            Ok(rows
                .into_iter()
                .find(|row| row.id == todo_id && row.user_id == user_id))
        })
        .await
    }

    async fn list_todos(&self, user_id: &str, business_id: &str) -> Result<Vec<TodoRow>> {
        let user_id = user_id.to_string();
        let business_id = business_id.to_string();
        self.blocking(move |storage| {
            let mut rows: Vec<TodoRow> = storage.read_table(tables::TODOS)?;
            rows.retain(|row| row.user_id == user_id && row.business_id == business_id);
            Ok(rows)
        })
        .await
    }

    async fn update_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        patch: &TodoPatch,
    ) -> Result<Option<TodoRow>> {
        let user_id = user_id.to_string();
        let todo_id = todo_id.to_string();
        let patch = patch.clone();
        self.blocking(move |storage| {
            storage.update_table(tables::TODOS, |rows: &mut Vec<TodoRow>| {
                let Some(row) = rows
                    .iter_mut()
                    .find(|row| row.id == todo_id && row.user_id == user_id)
                else {
                    return Ok(None);
                };
                patch.apply(row);
                Ok(Some(row.clone()))
            })
        })
        .await
    }

    async fn delete_business_todos(
        &self,
        user_id: &str,
        business_id: &str,
    ) -> Result<Vec<String>> {
        let user_id = user_id.to_string();
        let business_id = business_id.to_string();
        self.blocking(move |storage| {
            storage.update_table(tables::TODOS, |todos: &mut Vec<TodoRow>| {
                Ok(rows::drain_todos(todos, |row| {
                    row.user_id == user_id && row.business_id == business_id
                }))
            })
        })
        .await
    }

    async fn delete_user_todos(&self, user_id: &str) -> Result<Vec<String>> {
        let user_id = user_id.to_string();
        self.blocking(move |storage| {
            storage.update_table(tables::TODOS, |todos: &mut Vec<TodoRow>| {
                Ok(rows::drain_todos(todos, |row| row.user_id == user_id))
            })
        })
        .await
    }

    async fn list_sub_areas(&self, business_id: &str) -> Result<Vec<SubArea>> {
        let business_id = business_id.to_string();
        self.blocking(move |storage| {
            let mut rows: Vec<SubArea> = storage.read_table(tables::SUB_AREAS)?;
            rows.retain(|s| s.business_id == business_id);
            Ok(rows)
        })
        .await
    }

    async fn get_sub_area(&self, sub_area_id: &str) -> Result<Option<SubArea>> {
        let sub_area_id = sub_area_id.to_string();
        self.blocking(move |storage| {
            let rows: Vec<SubArea> = storage.read_table(tables::SUB_AREAS)?;
            Ok(rows.into_iter().find(|s| s.id == sub_area_id))
        })
        .await
    }

    async fn insert_sub_area(&self, sub_area: SubArea) -> Result<()> {
        self.blocking(move |storage| {
            storage.update_table(tables::SUB_AREAS, |rows: &mut Vec<SubArea>| {
                rows.push(sub_area);
                Ok(())
            })
        })
        .await
    }

    async fn seed_sub_areas(
        &self,
        business_id: &str,
        impact: Impact,
        defaults: Vec<SubArea>,
    ) -> Result<bool> {
        let business_id = business_id.to_string();
        self.blocking(move |storage| {
            storage.update_table(tables::SUB_AREAS, |sub_areas: &mut Vec<SubArea>| {
                if !rows::seed_needed(sub_areas, &business_id, impact) {
                    return Ok(false);
                }
                sub_areas.extend(defaults);
                Ok(true)
            })
        })
        .await
    }

    async fn delete_sub_area(&self, business_id: &str, sub_area_id: &str) -> Result<bool> {
        let business_id = business_id.to_string();
        let sub_area_id = sub_area_id.to_string();
        self.blocking(move |storage| {
            storage.update_table(tables::SUB_AREAS, |rows: &mut Vec<SubArea>| {
                let before = rows.len();
                rows.retain(|s| !(s.id == sub_area_id && s.business_id == business_id));
                Ok(rows.len() != before)
            })
        })
        .await
    }

    async fn insert_mapping(&self, mapping: TaskFileMapping, exclusive: bool) -> Result<bool> {
        self.blocking(move |storage| {
            storage.update_table(tables::TASK_FILES, |mappings: &mut Vec<TaskFileMapping>| {
                rows::insert_mapping(mappings, mapping, exclusive)
            })
        })
        .await
    }

    async fn delete_mapping(&self, task_id: &str, file_id: &str) -> Result<bool> {
        let task_id = task_id.to_string();
        let file_id = file_id.to_string();
        self.blocking(move |storage| {
            storage.update_table(tables::TASK_FILES, |rows: &mut Vec<TaskFileMapping>| {
                let before = rows.len();
                rows.retain(|m| !(m.task_id == task_id && m.file_id == file_id));
                Ok(rows.len() != before)
            })
        })
        .await
    }

    async fn list_mappings(&self, user_id: &str) -> Result<Vec<TaskFileMapping>> {
        let user_id = user_id.to_string();
        self.blocking(move |storage| {
            let mut rows: Vec<TaskFileMapping> = storage.read_table(tables::TASK_FILES)?;
            rows.retain(|m| m.mapped_by == user_id);
            Ok(rows)
        })
        .await
    }

    async fn delete_mappings_for(&self, task_ids: &[String], file_ids: &[String]) -> Result<usize> {
        let task_ids = task_ids.to_vec();
        let file_ids = file_ids.to_vec();
        self.blocking(move |storage| {
            storage.update_table(tables::TASK_FILES, |rows: &mut Vec<TaskFileMapping>| {
                let before = rows.len();
                rows.retain(|m| !task_ids.contains(&m.task_id) && !file_ids.contains(&m.file_id));
                Ok(before - rows.len())
            })
        })
        .await
    }
}
