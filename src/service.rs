//! Analysis service: the todo lifecycle over the repository.
//!
//! Every operation resolves the current user first and only touches rows
//! that user owns. Rows pass through [`normalize`] on the way out; fields
//! that fell back to a default are logged.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::business::{owned_business, Business};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::generation::{generate_with_timeout, screen, GenerationRequest, TaskGenerator};
use crate::repository::Repository;
use crate::session::{require_user, SessionProvider, User};
use crate::subarea::SubAreaRegistry;
use crate::summary::{summarize, ImpactSummary};
use crate::todo::{normalize, Canonical, Impact, NewTodo, Todo, TodoPatch, TodoRow, TodoStatus};

/// Behaviour switches, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub strict_transitions: bool,
    pub clear_sub_area_on_impact_change: bool,
    pub seed_sub_areas_on_create: bool,
    pub generation_timeout: Duration,
    pub max_generated_tasks: usize,
    pub allow_reset: bool,
}

impl ServiceOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            strict_transitions: config.status.strict_transitions,
            clear_sub_area_on_impact_change: config.sub_areas.clear_on_impact_change,
            seed_sub_areas_on_create: config.sub_areas.seed_on_business_create,
            generation_timeout: Duration::from_secs(config.generation.timeout_secs),
            max_generated_tasks: config.generation.max_tasks,
            allow_reset: config.dev.allow_reset,
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of regenerating a business's roadmap.
#[derive(Debug, Clone, Serialize)]
pub struct ResetOutcome {
    pub todos: Vec<Todo>,
    pub impact_summaries: Vec<ImpactSummary>,
}

#[derive(Clone)]
pub struct AnalysisService {
    repo: Arc<dyn Repository>,
    session: Arc<dyn SessionProvider>,
    generator: Arc<dyn TaskGenerator>,
    options: ServiceOptions,
}

impl AnalysisService {
    pub fn new(
        repo: Arc<dyn Repository>,
        session: Arc<dyn SessionProvider>,
        generator: Arc<dyn TaskGenerator>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            repo,
            session,
            generator,
            options,
        }
    }

    // =========================================================================
    // Businesses
    // =========================================================================

    pub async fn create_business(&self, name: &str, description: &str) -> Result<Business> {
        let user = self.user().await?;
        let business = Business::new(&user.id, name, description)?;
        self.repo.insert_business(business.clone()).await?;
        tracing::info!(business_id = %business.id, "business created");

        if self.options.seed_sub_areas_on_create {
            SubAreaRegistry::new(Arc::clone(&self.repo), Arc::clone(&self.session))
                .ensure_defaults(&business.id)
                .await?;
        }
        Ok(business)
    }

    pub async fn business(&self, business_id: &str) -> Result<Business> {
        let user = self.user().await?;
        owned_business(self.repo.as_ref(), &user, business_id).await
    }

    pub async fn list_businesses(&self) -> Result<Vec<Business>> {
        let user = self.user().await?;
        let mut businesses = self.repo.list_businesses(&user.id).await?;
        businesses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(businesses)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Active todos, newest first.
    pub async fn list_todos(&self, business_id: &str) -> Result<Vec<Todo>> {
        let user = self.user().await?;
        let mut todos: Vec<Todo> = self
            .business_todos(&user, business_id)
            .await?
            .into_iter()
            .filter(Todo::is_active)
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tracing::debug!(business_id, count = todos.len(), "listed todos");
        Ok(todos)
    }

    /// Soft-deleted todos, most recently deleted first.
    pub async fn list_binned_todos(&self, business_id: &str) -> Result<Vec<Todo>> {
        let user = self.user().await?;
        let mut binned: Vec<Todo> = self
            .business_todos(&user, business_id)
            .await?
            .into_iter()
            .filter(|todo| !todo.is_active())
            .collect();
        binned.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        tracing::debug!(business_id, count = binned.len(), "listed binned todos");
        Ok(binned)
    }

    /// One todo, active or binned.
    pub async fn todo(&self, todo_id: &str) -> Result<Todo> {
        let user = self.user().await?;
        let row = self
            .repo
            .get_todo(&user.id, todo_id)
            .await?
            .ok_or_else(|| Error::TodoNotFound(todo_id.to_string()))?;
        Ok(normalize_logged(row))
    }

    pub async fn impact_summary(&self, business_id: &str) -> Result<Vec<ImpactSummary>> {
        let user = self.user().await?;
        let todos = self.business_todos(&user, business_id).await?;
        Ok(summarize(&todos))
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub async fn create_todo(&self, business_id: &str, new: NewTodo) -> Result<Todo> {
        let user = self.user().await?;
        owned_business(self.repo.as_ref(), &user, business_id).await?;

        if new.title.trim().is_empty() {
            return Err(Error::InvalidArgument("todo title cannot be empty".to_string()));
        }
        if let Some(sub_area_id) = &new.sub_area_id {
            self.business_sub_area(business_id, sub_area_id).await?;
        }

        let row = new.into_row(ulid::Ulid::new().to_string(), business_id, &user.id, Utc::now());
        let todo = normalize_logged(row.clone());
        self.repo.insert_todos(vec![row]).await?;
        tracing::info!(business_id, todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    /// Ask the generator for tasks, keep the ones that pass screening and
    /// insert them. Returns the inserted todos.
    pub async fn generate_todos(&self, business_id: &str) -> Result<Vec<Todo>> {
        let user = self.user().await?;
        let business = owned_business(self.repo.as_ref(), &user, business_id).await?;
        self.generate_for(&user, &business).await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Set the status. `completed_at` is stamped when the todo becomes done
    /// and cleared otherwise.
    pub async fn update_todo_status(&self, todo_id: &str, status: TodoStatus) -> Result<Todo> {
        let user = self.user().await?;
        if self.options.strict_transitions {
            let current = self.owned_todo(&user, todo_id).await?;
            if !current.status.allows(status, true) {
                return Err(Error::InvalidTransition {
                    from: current.status.to_string(),
                    to: status.to_string(),
                });
            }
        }
        let todo = self
            .patch(&user, todo_id, &TodoPatch::status(status, Utc::now()))
            .await?;
        tracing::info!(todo_id, %status, "todo status updated");
        Ok(todo)
    }

    /// Move a todo into a sub-area, or out of any with `None`.
    pub async fn assign_task_to_sub_area(
        &self,
        todo_id: &str,
        sub_area_id: Option<&str>,
    ) -> Result<Todo> {
        let user = self.user().await?;
        let patch = TodoPatch {
            sub_area_id: Some(sub_area_id.map(str::to_string)),
            ..TodoPatch::default()
        };
        let todo = self.patch(&user, todo_id, &patch).await?;
        tracing::info!(todo_id, sub_area_id = ?sub_area_id, "todo sub-area assigned");
        Ok(todo)
    }

    /// Change the impact area and optionally the lock in one write.
    ///
    /// When the area changes and the todo's sub-area belongs elsewhere (or no
    /// longer exists), the sub-area is cleared in the same write unless
    /// `clear_sub_area_on_impact_change` is off. The sub-area is read before
    /// the write, so a concurrent `assign_task_to_sub_area` landing in
    /// between may be overwritten by the clear (last writer wins).
    pub async fn update_task_impact_area(
        &self,
        todo_id: &str,
        impact: Impact,
        is_locked: Option<bool>,
    ) -> Result<Todo> {
        let user = self.user().await?;
        let mut patch = TodoPatch {
            impact: Some(impact),
            is_impact_locked: is_locked,
            ..TodoPatch::default()
        };

        if self.options.clear_sub_area_on_impact_change {
            let current = self.owned_todo(&user, todo_id).await?;
            if let Some(sub_area_id) = current.sub_area_id.as_deref() {
                let still_fits = match self.repo.get_sub_area(sub_area_id).await? {
                    Some(sub_area) => {
                        sub_area.impact_area == impact
                            && sub_area.business_id == current.business_id
                    }
                    None => false,
                };
                if !still_fits {
                    patch.sub_area_id = Some(None);
                }
            }
        }

        let todo = self.patch(&user, todo_id, &patch).await?;
        tracing::info!(
            todo_id,
            %impact,
            locked = ?is_locked,
            cleared_sub_area = patch.sub_area_id.is_some(),
            "todo impact area updated"
        );
        Ok(todo)
    }

    pub async fn update_task_lock_state(&self, todo_id: &str, is_locked: bool) -> Result<Todo> {
        let user = self.user().await?;
        let patch = TodoPatch {
            is_impact_locked: Some(is_locked),
            ..TodoPatch::default()
        };
        let todo = self.patch(&user, todo_id, &patch).await?;
        tracing::info!(todo_id, is_locked, "todo lock updated");
        Ok(todo)
    }

    /// Replace the evidence list.
    pub async fn link_evidence(&self, todo_id: &str, chunk_ids: Vec<String>) -> Result<Todo> {
        let user = self.user().await?;
        let count = chunk_ids.len();
        let patch = TodoPatch {
            evidence_chunk_ids: Some(chunk_ids),
            ..TodoPatch::default()
        };
        let todo = self.patch(&user, todo_id, &patch).await?;
        tracing::info!(todo_id, chunks = count, "todo evidence linked");
        Ok(todo)
    }

    /// Soft delete: the todo moves to the bin.
    pub async fn delete_task(&self, todo_id: &str) -> Result<Todo> {
        let user = self.user().await?;
        let patch = TodoPatch {
            deleted_at: Some(Some(Utc::now())),
            ..TodoPatch::default()
        };
        let todo = self.patch(&user, todo_id, &patch).await?;
        tracing::info!(todo_id, "todo moved to bin");
        Ok(todo)
    }

    pub async fn restore_task(&self, todo_id: &str) -> Result<Todo> {
        let user = self.user().await?;
        let patch = TodoPatch {
            deleted_at: Some(None),
            ..TodoPatch::default()
        };
        let todo = self.patch(&user, todo_id, &patch).await?;
        tracing::info!(todo_id, "todo restored");
        Ok(todo)
    }

    // =========================================================================
    // Developer resets
    // =========================================================================

    /// Hard-delete the business's todos and regenerate a baseline roadmap.
    pub async fn reset_test_data(&self, business_id: &str) -> Result<ResetOutcome> {
        let user = self.user().await?;
        if !self.options.allow_reset {
            return Err(Error::ResetDisabled);
        }
        let business = owned_business(self.repo.as_ref(), &user, business_id).await?;

        let removed = self.repo.delete_business_todos(&user.id, business_id).await?;
        self.repo.delete_mappings_for(&removed, &[]).await?;
        tracing::info!(business_id, removed = removed.len(), "business todos reset");

        let todos = self.generate_for(&user, &business).await?;
        let all = self.business_todos(&user, business_id).await?;
        Ok(ResetOutcome {
            todos,
            impact_summaries: summarize(&all),
        })
    }

    /// Hard-delete every todo the current user owns, across businesses.
    /// Returns the number removed.
    pub async fn reset_all_test_data(&self, confirmed: bool) -> Result<usize> {
        let user = self.user().await?;
        if !confirmed {
            return Err(Error::ConfirmationRequired(
                "resetting all test data deletes every todo you own".to_string(),
            ));
        }
        if !self.options.allow_reset {
            return Err(Error::ResetDisabled);
        }

        let removed = self.repo.delete_user_todos(&user.id).await?;
        self.repo.delete_mappings_for(&removed, &[]).await?;
        tracing::info!(removed = removed.len(), "all user todos reset");
        Ok(removed.len())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn user(&self) -> Result<User> {
        require_user(self.session.as_ref()).await
    }

    async fn business_todos(&self, user: &User, business_id: &str) -> Result<Vec<Todo>> {
        owned_business(self.repo.as_ref(), user, business_id).await?;
        Ok(self
            .repo
            .list_todos(&user.id, business_id)
            .await?
            .into_iter()
            .map(normalize_logged)
            .collect())
    }

    async fn owned_todo(&self, user: &User, todo_id: &str) -> Result<Todo> {
        self.repo
            .get_todo(&user.id, todo_id)
            .await?
            .map(normalize_logged)
            .ok_or_else(|| Error::TodoNotFound(todo_id.to_string()))
    }

    async fn patch(&self, user: &User, todo_id: &str, patch: &TodoPatch) -> Result<Todo> {
        self.repo
            .update_todo(&user.id, todo_id, patch)
            .await?
            .map(normalize_logged)
            .ok_or_else(|| Error::TodoNotFound(todo_id.to_string()))
    }

    async fn business_sub_area(&self, business_id: &str, sub_area_id: &str) -> Result<()> {
        match self.repo.get_sub_area(sub_area_id).await? {
            Some(sub_area) if sub_area.business_id == business_id => Ok(()),
            _ => Err(Error::SubAreaNotFound(sub_area_id.to_string())),
        }
    }

    async fn generate_for(&self, user: &User, business: &Business) -> Result<Vec<Todo>> {
        // A business saved without a description still has its name to quote.
        let source_text = if business.description.trim().is_empty() {
            business.name.clone()
        } else {
            business.description.clone()
        };
        let request = GenerationRequest {
            business_id: business.id.clone(),
            source_text,
        };

        let candidates = generate_with_timeout(
            self.generator.as_ref(),
            &request,
            self.options.generation_timeout,
        )
        .await?;
        let existing: Vec<Todo> = self
            .business_todos(user, &business.id)
            .await?
            .into_iter()
            .filter(Todo::is_active)
            .collect();

        let screened = screen(
            candidates,
            &request.source_text,
            existing.iter().map(|t| t.title.as_str()),
            self.options.max_generated_tasks,
        );
        for rejection in &screened.rejected {
            tracing::warn!(
                business_id = %business.id,
                title = %rejection.title,
                reason = %rejection.reason,
                "generated task rejected"
            );
        }

        let now = Utc::now();
        let todos: Vec<Todo> = screened
            .accepted
            .into_iter()
            .map(|task| {
                normalize_logged(TodoRow {
                    id: ulid::Ulid::new().to_string(),
                    business_id: business.id.clone(),
                    user_id: user.id.clone(),
                    owner_user_id: None,
                    impact: task.impact,
                    sub_area_id: None,
                    requirement_code: None,
                    kb_action_id: task.kb_refs.into_iter().find(|r| !r.trim().is_empty()),
                    title: task.title.trim().to_string(),
                    description_md: task.description_md,
                    priority: task.priority,
                    effort: task.effort,
                    due_date: None,
                    status: TodoStatus::DEFAULT.as_str().to_string(),
                    completed_at: None,
                    created_at: now,
                    deleted_at: None,
                    is_impact_locked: false,
                    evidence_chunk_ids: Vec::new(),
                })
            })
            .collect();

        self.repo
            .insert_todos(todos.iter().map(TodoRow::from).collect())
            .await?;
        tracing::info!(
            business_id = %business.id,
            inserted = todos.len(),
            rejected = screened.rejected.len(),
            "generated todos inserted"
        );
        Ok(todos)
    }
}

fn normalize_logged(row: TodoRow) -> Todo {
    let normalized = normalize(row);
    for fallback in &normalized.fallbacks {
        tracing::warn!(
            todo_id = %normalized.todo.id,
            field = fallback.field,
            raw = %fallback.raw,
            value = fallback.value,
            "missing or unrecognized value replaced with default"
        );
    }
    normalized.todo
}
