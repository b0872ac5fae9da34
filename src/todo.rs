//! Roadmap todos.
//!
//! Todos are persisted as [`TodoRow`]s whose enum-like columns are plain
//! strings. Older rows use legacy vocabularies (`high`/`medium`/`low`,
//! `not_started`, lowercase impact names), so every row passes through
//! [`normalize`] before business logic sees it.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A field whose persisted string form maps onto a closed set of values.
///
/// `parse_canonical` accepts the canonical spelling (case-insensitive),
/// `parse_legacy` the historical synonyms; anything else resolves to
/// `DEFAULT`.
pub trait Canonical: Sized + Copy {
    const FIELD: &'static str;
    const DEFAULT: Self;

    fn parse_canonical(token: &str) -> Option<Self>;
    fn parse_legacy(token: &str) -> Option<Self>;
    fn as_str(&self) -> &'static str;
}

/// How a raw token was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Canonical,
    Legacy,
    Fallback,
}

/// Resolve one raw token. Total and deterministic.
pub fn resolve<T: Canonical>(raw: &str) -> (T, Resolution) {
    let token = token_key(raw);
    if let Some(value) = T::parse_canonical(&token) {
        return (value, Resolution::Canonical);
    }
    if let Some(value) = T::parse_legacy(&token) {
        return (value, Resolution::Legacy);
    }
    (T::DEFAULT, Resolution::Fallback)
}

/// Parse user input strictly: canonical or legacy tokens only.
pub fn parse_strict<T: Canonical>(raw: &str) -> crate::Result<T> {
    match resolve::<T>(raw) {
        (value, Resolution::Canonical | Resolution::Legacy) => Ok(value),
        (_, Resolution::Fallback) => Err(crate::Error::InvalidArgument(format!(
            "unknown {} '{}'",
            T::FIELD,
            raw.trim()
        ))),
    }
}

fn token_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// B Corp impact area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Impact {
    Governance,
    Workers,
    Community,
    Environment,
    Customers,
    Other,
}

impl Impact {
    /// The five assessment areas, in display order. `Other` is not one of them.
    pub const CANONICAL: [Impact; 5] = [
        Impact::Governance,
        Impact::Workers,
        Impact::Community,
        Impact::Environment,
        Impact::Customers,
    ];

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Impact::Other)
    }
}

impl Canonical for Impact {
    const FIELD: &'static str = "impact";
    const DEFAULT: Self = Impact::Other;

    fn parse_canonical(token: &str) -> Option<Self> {
        match token {
            "governance" => Some(Impact::Governance),
            "workers" => Some(Impact::Workers),
            "community" => Some(Impact::Community),
            "environment" => Some(Impact::Environment),
            "customers" => Some(Impact::Customers),
            "other" => Some(Impact::Other),
            _ => None,
        }
    }

    fn parse_legacy(token: &str) -> Option<Self> {
        match token {
            "gov" | "governance_&_ethics" => Some(Impact::Governance),
            "worker" | "employees" | "staff" | "workforce" => Some(Impact::Workers),
            "communities" | "social" => Some(Impact::Community),
            "environmental" | "env" | "planet" | "climate" => Some(Impact::Environment),
            "customer" | "clients" | "consumers" => Some(Impact::Customers),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Impact::Governance => "Governance",
            Impact::Workers => "Workers",
            Impact::Community => "Community",
            Impact::Environment => "Environment",
            Impact::Customers => "Customers",
            Impact::Other => "Other",
        }
    }
}

/// Scheduling priority. `P1` outranks `P2` outranks `P3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
}

impl Priority {
    fn rank(&self) -> u8 {
        match self {
            Priority::P1 => 0,
            Priority::P2 => 1,
            Priority::P3 => 2,
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        other.rank().cmp(&self.rank())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Canonical for Priority {
    const FIELD: &'static str = "priority";
    const DEFAULT: Self = Priority::P2;

    fn parse_canonical(token: &str) -> Option<Self> {
        match token {
            "p1" => Some(Priority::P1),
            "p2" => Some(Priority::P2),
            "p3" => Some(Priority::P3),
            _ => None,
        }
    }

    fn parse_legacy(token: &str) -> Option<Self> {
        match token {
            "high" | "urgent" | "critical" | "1" => Some(Priority::P1),
            "medium" | "med" | "normal" | "2" => Some(Priority::P2),
            "low" | "3" => Some(Priority::P3),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Canonical for Effort {
    const FIELD: &'static str = "effort";
    const DEFAULT: Self = Effort::Medium;

    fn parse_canonical(token: &str) -> Option<Self> {
        match token {
            "low" => Some(Effort::Low),
            "medium" => Some(Effort::Medium),
            "high" => Some(Effort::High),
            _ => None,
        }
    }

    fn parse_legacy(token: &str) -> Option<Self> {
        match token {
            "s" | "small" | "easy" | "quick" => Some(Effort::Low),
            "m" | "moderate" | "med" => Some(Effort::Medium),
            "l" | "large" | "hard" => Some(Effort::High),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Effort::Low => "Low",
            Effort::Medium => "Medium",
            Effort::High => "High",
        }
    }
}

/// Todo status. Any status may move to any other unless strict transitions
/// are switched on in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Todo,
    InProgress,
    Blocked,
    Done,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 4] = [
        TodoStatus::Todo,
        TodoStatus::InProgress,
        TodoStatus::Blocked,
        TodoStatus::Done,
    ];

    /// Whether `self -> next` is permitted. Re-applying the current status is
    /// always permitted.
    pub fn allows(&self, next: TodoStatus, strict: bool) -> bool {
        if !strict || *self == next {
            return true;
        }
        use TodoStatus as S;
        matches!(
            (*self, next),
            (S::Todo, S::InProgress)
                | (S::Todo, S::Blocked)
                | (S::InProgress, S::Todo)
                | (S::InProgress, S::Blocked)
                | (S::InProgress, S::Done)
                | (S::Blocked, S::Todo)
                | (S::Blocked, S::InProgress)
                | (S::Done, S::Todo)
                | (S::Done, S::InProgress)
        )
    }
}

impl Canonical for TodoStatus {
    const FIELD: &'static str = "status";
    const DEFAULT: Self = TodoStatus::Todo;

    fn parse_canonical(token: &str) -> Option<Self> {
        match token {
            "todo" => Some(TodoStatus::Todo),
            "in_progress" => Some(TodoStatus::InProgress),
            "blocked" => Some(TodoStatus::Blocked),
            "done" => Some(TodoStatus::Done),
            _ => None,
        }
    }

    fn parse_legacy(token: &str) -> Option<Self> {
        match token {
            "not_started" | "open" | "pending" | "new" => Some(TodoStatus::Todo),
            "inprogress" | "started" | "doing" | "active" | "wip" => {
                Some(TodoStatus::InProgress)
            }
            "on_hold" | "waiting" | "stuck" => Some(TodoStatus::Blocked),
            "completed" | "complete" | "closed" | "finished" => Some(TodoStatus::Done),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Todo => "todo",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Blocked => "blocked",
            TodoStatus::Done => "done",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        })*
    };
}

display_as_str!(Impact, Priority, Effort, TodoStatus);

/// A todo as it is stored by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoRow {
    pub id: String,
    pub business_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    #[serde(default)]
    pub impact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_area_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kb_action_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description_md: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub effort: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_impact_locked: bool,
    #[serde(default)]
    pub evidence_chunk_ids: Vec<String>,
}

/// Canonical in-memory todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Todo {
    pub id: String,
    pub business_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    pub impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_area_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_action_id: Option<String>,
    pub title: String,
    pub description_md: String,
    pub priority: Priority,
    pub effort: Effort,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub status: TodoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_impact_locked: bool,
    pub evidence_chunk_ids: Vec<String>,
}

impl Todo {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn is_done(&self) -> bool {
        self.status == TodoStatus::Done
    }
}

impl From<&Todo> for TodoRow {
    fn from(todo: &Todo) -> Self {
        TodoRow {
            id: todo.id.clone(),
            business_id: todo.business_id.clone(),
            user_id: todo.user_id.clone(),
            owner_user_id: todo.owner_user_id.clone(),
            impact: todo.impact.as_str().to_string(),
            sub_area_id: todo.sub_area_id.clone(),
            requirement_code: todo.requirement_code.clone(),
            kb_action_id: todo.kb_action_id.clone(),
            title: todo.title.clone(),
            description_md: todo.description_md.clone(),
            priority: todo.priority.as_str().to_string(),
            effort: todo.effort.as_str().to_string(),
            due_date: todo.due_date,
            status: todo.status.as_str().to_string(),
            completed_at: todo.completed_at,
            created_at: todo.created_at,
            deleted_at: todo.deleted_at,
            is_impact_locked: todo.is_impact_locked,
            evidence_chunk_ids: todo.evidence_chunk_ids.clone(),
        }
    }
}

/// A raw value that was missing or unrecognized and fell back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFallback {
    pub field: &'static str,
    pub raw: String,
    pub value: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub todo: Todo,
    pub fallbacks: Vec<FieldFallback>,
}

/// Convert a persisted row into a canonical todo.
pub fn normalize(row: TodoRow) -> Normalized {
    let mut fallbacks = Vec::new();
    let impact = resolve_field::<Impact>(&row.impact, &mut fallbacks);
    let priority = resolve_field::<Priority>(&row.priority, &mut fallbacks);
    let effort = resolve_field::<Effort>(&row.effort, &mut fallbacks);
    let status = resolve_field::<TodoStatus>(&row.status, &mut fallbacks);

    // Done rows always carry a completion time; open rows never do.
    let completed_at = match (status, row.completed_at) {
        (TodoStatus::Done, Some(at)) => Some(at),
        (TodoStatus::Done, None) => {
            fallbacks.push(FieldFallback {
                field: "completed_at",
                raw: String::new(),
                value: "created_at",
            });
            Some(row.created_at)
        }
        _ => None,
    };

    Normalized {
        todo: Todo {
            id: row.id,
            business_id: row.business_id,
            user_id: row.user_id,
            owner_user_id: row.owner_user_id,
            impact,
            sub_area_id: row.sub_area_id,
            requirement_code: row.requirement_code,
            kb_action_id: row.kb_action_id,
            title: row.title,
            description_md: row.description_md,
            priority,
            effort,
            due_date: row.due_date,
            status,
            completed_at,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
            is_impact_locked: row.is_impact_locked,
            evidence_chunk_ids: row.evidence_chunk_ids,
        },
        fallbacks,
    }
}

fn resolve_field<T: Canonical>(raw: &str, fallbacks: &mut Vec<FieldFallback>) -> T {
    let (value, resolution) = resolve::<T>(raw);
    if resolution == Resolution::Fallback {
        fallbacks.push(FieldFallback {
            field: T::FIELD,
            raw: raw.to_string(),
            value: value.as_str(),
        });
    }
    value
}

/// Input for manually seeded todos.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub description_md: String,
    pub impact: Impact,
    pub priority: Priority,
    pub effort: Effort,
    pub status: TodoStatus,
    pub sub_area_id: Option<String>,
    pub requirement_code: Option<String>,
    pub kb_action_id: Option<String>,
    pub owner_user_id: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>, impact: Impact) -> Self {
        Self {
            title: title.into(),
            description_md: String::new(),
            impact,
            priority: Priority::DEFAULT,
            effort: Effort::DEFAULT,
            status: TodoStatus::DEFAULT,
            sub_area_id: None,
            requirement_code: None,
            kb_action_id: None,
            owner_user_id: None,
            due_date: None,
        }
    }

    pub fn into_row(
        self,
        id: String,
        business_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> TodoRow {
        TodoRow {
            id,
            business_id: business_id.to_string(),
            user_id: user_id.to_string(),
            owner_user_id: self.owner_user_id,
            impact: self.impact.as_str().to_string(),
            sub_area_id: self.sub_area_id,
            requirement_code: self.requirement_code,
            kb_action_id: self.kb_action_id,
            title: self.title,
            description_md: self.description_md,
            priority: self.priority.as_str().to_string(),
            effort: self.effort.as_str().to_string(),
            due_date: self.due_date,
            status: self.status.as_str().to_string(),
            completed_at: (self.status == TodoStatus::Done).then_some(now),
            created_at: now,
            deleted_at: None,
            is_impact_locked: false,
            evidence_chunk_ids: Vec::new(),
        }
    }
}

/// A partial update applied atomically by the repository.
///
/// Double options distinguish "leave alone" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPatch {
    pub status: Option<TodoStatus>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub impact: Option<Impact>,
    pub is_impact_locked: Option<bool>,
    pub sub_area_id: Option<Option<String>>,
    pub evidence_chunk_ids: Option<Vec<String>>,
    pub deleted_at: Option<Option<DateTime<Utc>>>,
}

impl TodoPatch {
    /// Status change with the matching `completed_at` stamp.
    pub fn status(status: TodoStatus, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            completed_at: Some((status == TodoStatus::Done).then_some(now)),
            ..Self::default()
        }
    }

    pub fn apply(&self, row: &mut TodoRow) {
        if let Some(status) = self.status {
            row.status = status.as_str().to_string();
        }
        if let Some(completed_at) = self.completed_at {
            row.completed_at = completed_at;
        }
        if let Some(impact) = self.impact {
            row.impact = impact.as_str().to_string();
        }
        if let Some(locked) = self.is_impact_locked {
            row.is_impact_locked = locked;
        }
        if let Some(sub_area_id) = &self.sub_area_id {
            row.sub_area_id = sub_area_id.clone();
        }
        if let Some(chunks) = &self.evidence_chunk_ids {
            row.evidence_chunk_ids = chunks.clone();
        }
        if let Some(deleted_at) = self.deleted_at {
            row.deleted_at = deleted_at;
        }
    }

    /// Same change applied to an already-normalized todo (used for
    /// optimistic updates in the store).
    pub fn apply_to_todo(&self, todo: &mut Todo) {
        if let Some(status) = self.status {
            todo.status = status;
        }
        if let Some(completed_at) = self.completed_at {
            todo.completed_at = completed_at;
        }
        if let Some(impact) = self.impact {
            todo.impact = impact;
        }
        if let Some(locked) = self.is_impact_locked {
            todo.is_impact_locked = locked;
        }
        if let Some(sub_area_id) = &self.sub_area_id {
            todo.sub_area_id = sub_area_id.clone();
        }
        if let Some(chunks) = &self.evidence_chunk_ids {
            todo.evidence_chunk_ids = chunks.clone();
        }
        if let Some(deleted_at) = self.deleted_at {
            todo.deleted_at = deleted_at;
        }
    }
}
