//! In-memory repository.
//!
//! Tables are `tokio::sync::RwLock<Vec<_>>` so rows keep insertion order.
//! Used by tests and anywhere a process-local store is enough; instances
//! are injected, never global.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{rows, Repository};
use crate::business::Business;
use crate::error::{Error, Result};
use crate::mapping::TaskFileMapping;
use crate::subarea::SubArea;
use crate::todo::{Impact, TodoPatch, TodoRow};

#[derive(Default)]
pub struct MemoryRepository {
    businesses: RwLock<Vec<Business>>,
    todos: RwLock<Vec<TodoRow>>,
    sub_areas: RwLock<Vec<SubArea>>,
    mappings: RwLock<Vec<TaskFileMapping>>,
    /// When set, every write fails with `RemoteFailure(message)`.
    write_failure: RwLock<Option<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (`Some`) or succeed again (`None`).
    pub async fn set_write_failure(&self, message: Option<&str>) {
        *self.write_failure.write().await = message.map(str::to_string);
    }

    async fn check_writable(&self) -> Result<()> {
        match self.write_failure.read().await.as_ref() {
            Some(message) => Err(Error::RemoteFailure(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn insert_business(&self, business: Business) -> Result<()> {
        self.check_writable().await?;
        self.businesses.write().await.push(business);
        Ok(())
    }

    async fn get_business(&self, business_id: &str) -> Result<Option<Business>> {
        Ok(self
            .businesses
            .read()
            .await
            .iter()
            .find(|b| b.id == business_id)
            .cloned())
    }

    async fn list_businesses(&self, user_id: &str) -> Result<Vec<Business>> {
        Ok(self
            .businesses
            .read()
            .await
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_todos(&self, rows: Vec<TodoRow>) -> Result<()> {
        self.check_writable().await?;
        self.todos.write().await.extend(rows);
        Ok(())
    }

    async fn get_todo(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoRow>> {
        Ok(self
            .todos
            .read()
            .await
            .iter()
            .find(|row| row.id == todo_id && row.user_id == user_id)
            .cloned())
    }

    async fn list_todos(&self, user_id: &str, business_id: &str) -> Result<Vec<TodoRow>> {
        Ok(self
            .todos
            .read()
            .await
            .iter()
            .filter(|row| row.user_id == user_id && row.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn update_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        patch: &TodoPatch,
    ) -> Result<Option<TodoRow>> {
        self.check_writable().await?;
        let mut todos = self.todos.write().await;
        let Some(row) = todos
            .iter_mut()
            .find(|row| row.id == todo_id && row.user_id == user_id)
        else {
            return Ok(None);
        };
        patch.apply(row);
        Ok(Some(row.clone()))
    }

    async fn delete_business_todos(
        &self,
        user_id: &str,
        business_id: &str,
    ) -> Result<Vec<String>> {
        self.check_writable().await?;
        let mut todos = self.todos.write().await;
        Ok(rows::drain_todos(&mut todos, |row| {
            row.user_id == user_id && row.business_id == business_id
        }))
    }

    async fn delete_user_todos(&self, user_id: &str) -> Result<Vec<String>> {
        self.check_writable().await?;
        let mut todos = self.todos.write().await;
        Ok(rows::drain_todos(&mut todos, |row| row.user_id == user_id))
    }

    async fn list_sub_areas(&self, business_id: &str) -> Result<Vec<SubArea>> {
        Ok(self
            .sub_areas
            .read()
            .await
            .iter()
            .filter(|s| s.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn get_sub_area(&self, sub_area_id: &str) -> Result<Option<SubArea>> {
        Ok(self
            .sub_areas
            .read()
            .await
            .iter()
            .find(|s| s.id == sub_area_id)
            .cloned())
    }

    async fn insert_sub_area(&self, sub_area: SubArea) -> Result<()> {
        self.check_writable().await?;
        self.sub_areas.write().await.push(sub_area);
        Ok(())
    }

    async fn seed_sub_areas(
        &self,
        business_id: &str,
        impact: Impact,
        defaults: Vec<SubArea>,
    ) -> Result<bool> {
        self.check_writable().await?;
        let mut sub_areas = self.sub_areas.write().await;
        if !rows::seed_needed(&sub_areas, business_id, impact) {
            return Ok(false);
        }
        sub_areas.extend(defaults);
        Ok(true)
    }

    async fn delete_sub_area(&self, business_id: &str, sub_area_id: &str) -> Result<bool> {
        self.check_writable().await?;
        let mut sub_areas = self.sub_areas.write().await;
        let before = sub_areas.len();
        sub_areas.retain(|s| !(s.id == sub_area_id && s.business_id == business_id));
        Ok(sub_areas.len() != before)
    }

    async fn insert_mapping(&self, mapping: TaskFileMapping, exclusive: bool) -> Result<bool> {
        self.check_writable().await?;
        let mut mappings = self.mappings.write().await;
        rows::insert_mapping(&mut mappings, mapping, exclusive)
    }

    async fn delete_mapping(&self, task_id: &str, file_id: &str) -> Result<bool> {
        self.check_writable().await?;
        let mut mappings = self.mappings.write().await;
        let before = mappings.len();
        mappings.retain(|m| !(m.task_id == task_id && m.file_id == file_id));
        Ok(mappings.len() != before)
    }

    async fn list_mappings(&self, user_id: &str) -> Result<Vec<TaskFileMapping>> {
        Ok(self
            .mappings
            .read()
            .await
            .iter()
            .filter(|m| m.mapped_by == user_id)
            .cloned()
            .collect())
    }

    async fn delete_mappings_for(&self, task_ids: &[String], file_ids: &[String]) -> Result<usize> {
        self.check_writable().await?;
        let mut mappings = self.mappings.write().await;
        let before = mappings.len();
        mappings.retain(|m| !task_ids.contains(&m.task_id) && !file_ids.contains(&m.file_id));
        Ok(before - mappings.len())
    }
}
