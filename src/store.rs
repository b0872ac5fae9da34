//! Client-side cache of one business's roadmap with optimistic updates.
//!
//! Every mutation applies its change locally, calls the service, and then
//! either replaces the local todo with the service's copy or restores the
//! copy captured before the change and records the error message.
//!
//! Concurrency contract: mutations on different todos may be in flight at
//! the same time and do not interfere. Mutations on the same todo are not
//! ordered; whichever service response arrives last overwrites the cached
//! todo, which may not be the request issued last. The same holds for
//! summary refreshes.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::service::AnalysisService;
use crate::summary::ImpactSummary;
use crate::todo::{Impact, Todo, TodoPatch, TodoStatus};

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreState {
    pub business_id: Option<String>,
    /// Active todos, newest first
    pub todos: Vec<Todo>,
    /// Soft-deleted todos
    pub binned: Vec<Todo>,
    pub summaries: Vec<ImpactSummary>,
    /// Message from the most recent failure, shared by all operations
    pub error: Option<String>,
}

impl StoreState {
    pub fn find(&self, todo_id: &str) -> Option<&Todo> {
        self.todos
            .iter()
            .chain(self.binned.iter())
            .find(|t| t.id == todo_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum List {
    Active,
    Binned,
}

/// A todo as it was before an optimistic change, with its position.
struct Captured {
    todo: Todo,
    list: List,
    index: usize,
}

pub struct AnalysisStore {
    service: AnalysisService,
    state: RwLock<StoreState>,
}

impl AnalysisStore {
    pub fn new(service: AnalysisService) -> Self {
        Self {
            service,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    /// Fetch todos, binned todos and summaries for `business_id`.
    pub async fn load(&self, business_id: &str) -> Result<()> {
        let fetched = async {
            let todos = self.service.list_todos(business_id).await?;
            let binned = self.service.list_binned_todos(business_id).await?;
            let summaries = self.service.impact_summary(business_id).await?;
            Ok::<_, crate::Error>((todos, binned, summaries))
        }
        .await;

        let mut state = self.state.write().await;
        match fetched {
            Ok((todos, binned, summaries)) => {
                *state = StoreState {
                    business_id: Some(business_id.to_string()),
                    todos,
                    binned,
                    summaries,
                    error: None,
                };
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Re-fetch the summaries of the loaded business. A failure is recorded
    /// in `error` and returned; cached todos are left alone.
    pub async fn refresh_summaries(&self) -> Result<()> {
        let Some(business_id) = self.state.read().await.business_id.clone() else {
            return Ok(());
        };
        match self.service.impact_summary(&business_id).await {
            Ok(summaries) => {
                let mut state = self.state.write().await;
                if state.business_id.as_deref() == Some(business_id.as_str()) {
                    state.summaries = summaries;
                }
                Ok(())
            }
            Err(err) => {
                self.state.write().await.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn update_todo_status(&self, todo_id: &str, status: TodoStatus) -> Result<Todo> {
        let local = TodoPatch::status(status, Utc::now());
        let todo = self
            .mutate(todo_id, &local, self.service.update_todo_status(todo_id, status))
            .await?;
        let _ = self.refresh_summaries().await;
        Ok(todo)
    }

    pub async fn assign_task_to_sub_area(
        &self,
        todo_id: &str,
        sub_area_id: Option<&str>,
    ) -> Result<Todo> {
        let local = TodoPatch {
            sub_area_id: Some(sub_area_id.map(str::to_string)),
            ..TodoPatch::default()
        };
        self.mutate(
            todo_id,
            &local,
            self.service.assign_task_to_sub_area(todo_id, sub_area_id),
        )
        .await
    }

    pub async fn update_task_impact_area(
        &self,
        todo_id: &str,
        impact: Impact,
        is_locked: Option<bool>,
    ) -> Result<Todo> {
        let local = TodoPatch {
            impact: Some(impact),
            is_impact_locked: is_locked,
            ..TodoPatch::default()
        };
        let todo = self
            .mutate(
                todo_id,
                &local,
                self.service.update_task_impact_area(todo_id, impact, is_locked),
            )
            .await?;
        let _ = self.refresh_summaries().await;
        Ok(todo)
    }

    pub async fn update_task_lock_state(&self, todo_id: &str, is_locked: bool) -> Result<Todo> {
        let local = TodoPatch {
            is_impact_locked: Some(is_locked),
            ..TodoPatch::default()
        };
        self.mutate(
            todo_id,
            &local,
            self.service.update_task_lock_state(todo_id, is_locked),
        )
        .await
    }

    pub async fn link_evidence(&self, todo_id: &str, chunk_ids: Vec<String>) -> Result<Todo> {
        let local = TodoPatch {
            evidence_chunk_ids: Some(chunk_ids.clone()),
            ..TodoPatch::default()
        };
        self.mutate(todo_id, &local, self.service.link_evidence(todo_id, chunk_ids))
            .await
    }

    pub async fn delete_task(&self, todo_id: &str) -> Result<Todo> {
        let local = TodoPatch {
            deleted_at: Some(Some(Utc::now())),
            ..TodoPatch::default()
        };
        let todo = self
            .mutate(todo_id, &local, self.service.delete_task(todo_id))
            .await?;
        let _ = self.refresh_summaries().await;
        Ok(todo)
    }

    pub async fn restore_task(&self, todo_id: &str) -> Result<Todo> {
        let local = TodoPatch {
            deleted_at: Some(None),
            ..TodoPatch::default()
        };
        let todo = self
            .mutate(todo_id, &local, self.service.restore_task(todo_id))
            .await?;
        let _ = self.refresh_summaries().await;
        Ok(todo)
    }

    /// Regenerate the loaded business's roadmap and replace the cache.
    pub async fn reset_test_data(&self, business_id: &str) -> Result<()> {
        match self.service.reset_test_data(business_id).await {
            Ok(_) => self.load(business_id).await,
            Err(err) => {
                self.state.write().await.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Capture, apply locally, await the service, then commit or roll back.
    /// The state lock is never held across the service call.
    async fn mutate<F>(&self, todo_id: &str, local: &TodoPatch, remote: F) -> Result<Todo>
    where
        F: std::future::Future<Output = Result<Todo>>,
    {
        let captured = {
            let mut state = self.state.write().await;
            let captured = take(&mut state, todo_id);
            if let Some(captured) = &captured {
                let mut optimistic = captured.todo.clone();
                local.apply_to_todo(&mut optimistic);
                place(&mut state, optimistic, captured.list, captured.index);
            }
            captured
        };

        match remote.await {
            Ok(authoritative) => {
                let mut state = self.state.write().await;
                let (from, index) = take(&mut state, todo_id)
                    .map(|c| (c.list, c.index))
                    .unwrap_or((List::Active, 0));
                if state.business_id.as_deref() == Some(authoritative.business_id.as_str()) {
                    place(&mut state, authoritative.clone(), from, index);
                }
                Ok(authoritative)
            }
            Err(err) => {
                let mut state = self.state.write().await;
                if let Some(captured) = captured {
                    take(&mut state, todo_id);
                    restore(&mut state, captured);
                }
                state.error = Some(err.to_string());
                tracing::debug!(todo_id, error = %err, "optimistic update rolled back");
                Err(err)
            }
        }
    }
}

/// Remove a todo from whichever list holds it.
fn take(state: &mut StoreState, todo_id: &str) -> Option<Captured> {
    for (list, todos) in [
        (List::Active, &mut state.todos),
        (List::Binned, &mut state.binned),
    ] {
        if let Some(index) = todos.iter().position(|t| t.id == todo_id) {
            let todo = todos.remove(index);
            return Some(Captured { todo, list, index });
        }
    }
    None
}

/// Insert into the list matching the todo's deleted state. A todo staying
/// in its list keeps `index`; one that moved between lists goes first.
fn place(state: &mut StoreState, todo: Todo, from: List, index: usize) {
    let (to, list) = if todo.is_active() {
        (List::Active, &mut state.todos)
    } else {
        (List::Binned, &mut state.binned)
    };
    let index = if to == from { index.min(list.len()) } else { 0 };
    list.insert(index, todo);
}

fn restore(state: &mut StoreState, captured: Captured) {
    let list = match captured.list {
        List::Active => &mut state.todos,
        List::Binned => &mut state.binned,
    };
    let index = captured.index.min(list.len());
    list.insert(index, captured.todo);
}
