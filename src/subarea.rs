//! Sub-areas: groupings of todos inside one impact area.
//!
//! Every business starts with a default set per impact area (seeded by
//! [`SubAreaRegistry::ensure_defaults`]); users may add their own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::business::owned_business;
use crate::error::{Error, Result};
use crate::repository::Repository;
use crate::session::{require_user, SessionProvider};
use crate::todo::{Impact, Todo};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubArea {
    pub id: String,
    pub business_id: String,
    pub impact_area: Impact,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_user_created: bool,
    pub created_at: DateTime<Utc>,
}

impl SubArea {
    pub fn new(
        business_id: &str,
        impact_area: Impact,
        title: &str,
        description: Option<&str>,
        is_user_created: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            impact_area,
            title: title.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            is_user_created,
            created_at: now,
        }
    }

    /// Icon name for rendering. User-created areas share a generic icon so
    /// they stay distinguishable from the seeded set.
    pub fn icon_hint(&self) -> &'static str {
        if self.is_user_created {
            return "folder";
        }
        match self.impact_area {
            Impact::Governance => "landmark",
            Impact::Workers => "users",
            Impact::Community => "heart-handshake",
            Impact::Environment => "leaf",
            Impact::Customers => "shopping-bag",
            Impact::Other => "folder",
        }
    }
}

/// Starter sub-areas per impact area: `(title, description)`.
pub fn default_sub_areas(impact: Impact) -> &'static [(&'static str, &'static str)] {
    match impact {
        Impact::Governance => &[
            (
                "Mission & Engagement",
                "Social and environmental mission, and how it is embedded in decisions",
            ),
            (
                "Ethics & Transparency",
                "Code of ethics, financial controls and disclosure to stakeholders",
            ),
            (
                "Mission Lock",
                "Legal structure that protects the mission through changes of ownership",
            ),
        ],
        Impact::Workers => &[
            ("Financial Security", "Living wage, benefits and pay equity"),
            (
                "Health, Wellness & Safety",
                "Health cover, wellbeing programmes and workplace safety",
            ),
            ("Career Development", "Training, progression and skills"),
            (
                "Engagement & Satisfaction",
                "Worker voice, surveys and ownership",
            ),
        ],
        Impact::Community => &[
            (
                "Diversity, Equity & Inclusion",
                "Representation, inclusive hiring and accessibility",
            ),
            ("Economic Impact", "Local job creation and local ownership"),
            (
                "Civic Engagement & Giving",
                "Volunteering, donations and community partnerships",
            ),
            (
                "Supply Chain Management",
                "Supplier screening and responsible sourcing",
            ),
        ],
        Impact::Environment => &[
            (
                "Environmental Management",
                "Policies, targets and environmental management systems",
            ),
            ("Air & Climate", "Energy use and greenhouse gas emissions"),
            ("Water", "Water use and discharge"),
            ("Land & Life", "Materials, waste and biodiversity"),
        ],
        Impact::Customers => &[
            (
                "Customer Stewardship",
                "Quality, feedback and ethical marketing",
            ),
            (
                "Data Privacy & Security",
                "Handling of customer data and privacy practices",
            ),
        ],
        Impact::Other => &[],
    }
}

/// Todos of one impact area bucketed by sub-area.
#[derive(Debug, Clone, Serialize)]
pub struct SubAreaGroup {
    pub sub_area: SubArea,
    pub todos: Vec<Todo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubAreaGrouping {
    pub impact: Impact,
    pub groups: Vec<SubAreaGroup>,
    pub unassigned: Vec<Todo>,
}

/// Group the active todos of `impact` under its sub-areas.
///
/// A todo whose `sub_area_id` is missing, unknown or points at a sub-area of
/// another impact area lands in `unassigned`.
pub fn group_by_sub_area(impact: Impact, todos: &[Todo], sub_areas: &[SubArea]) -> SubAreaGrouping {
    let mut groups: Vec<SubAreaGroup> = sub_areas
        .iter()
        .filter(|s| s.impact_area == impact)
        .map(|s| SubAreaGroup {
            sub_area: s.clone(),
            todos: Vec::new(),
        })
        .collect();
    let mut unassigned = Vec::new();

    for todo in todos.iter().filter(|t| t.is_active() && t.impact == impact) {
        let slot = todo
            .sub_area_id
            .as_deref()
            .and_then(|id| groups.iter_mut().find(|g| g.sub_area.id == id));
        match slot {
            Some(group) => group.todos.push(todo.clone()),
            None => unassigned.push(todo.clone()),
        }
    }

    SubAreaGrouping {
        impact,
        groups,
        unassigned,
    }
}

/// Tenant-scoped access to sub-areas.
#[derive(Clone)]
pub struct SubAreaRegistry {
    repo: Arc<dyn Repository>,
    session: Arc<dyn SessionProvider>,
}

impl SubAreaRegistry {
    pub fn new(repo: Arc<dyn Repository>, session: Arc<dyn SessionProvider>) -> Self {
        Self { repo, session }
    }

    pub async fn load_sub_areas_by_impact(
        &self,
        business_id: &str,
        impact: Impact,
    ) -> Result<Vec<SubArea>> {
        let user = require_user(self.session.as_ref()).await?;
        owned_business(self.repo.as_ref(), &user, business_id).await?;

        let mut areas: Vec<SubArea> = self
            .repo
            .list_sub_areas(business_id)
            .await?
            .into_iter()
            .filter(|s| s.impact_area == impact)
            .collect();
        areas.sort_by_key(|s| s.created_at);
        tracing::debug!(business_id, %impact, count = areas.len(), "loaded sub-areas");
        Ok(areas)
    }

    /// Seed the starter set for every canonical area that has none yet.
    /// Returns the areas that were seeded; a second call returns nothing.
    pub async fn ensure_defaults(&self, business_id: &str) -> Result<Vec<Impact>> {
        let user = require_user(self.session.as_ref()).await?;
        owned_business(self.repo.as_ref(), &user, business_id).await?;

        let now = Utc::now();
        let mut seeded = Vec::new();
        for impact in Impact::CANONICAL {
            let defaults = default_sub_areas(impact)
                .iter()
                .map(|(title, description)| {
                    SubArea::new(business_id, impact, title, Some(description), false, now)
                })
                .collect();
            if self.repo.seed_sub_areas(business_id, impact, defaults).await? {
                seeded.push(impact);
            }
        }
        if !seeded.is_empty() {
            tracing::info!(business_id, areas = seeded.len(), "seeded default sub-areas");
        }
        Ok(seeded)
    }

    pub async fn create_sub_area(
        &self,
        business_id: &str,
        impact: Impact,
        title: &str,
        description: Option<&str>,
    ) -> Result<SubArea> {
        let user = require_user(self.session.as_ref()).await?;
        owned_business(self.repo.as_ref(), &user, business_id).await?;

        if !impact.is_canonical() {
            return Err(Error::InvalidArgument(format!(
                "sub-areas belong to one of the five impact areas, not {impact}"
            )));
        }
        if title.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "sub-area title cannot be empty".to_string(),
            ));
        }

        let sub_area = SubArea::new(business_id, impact, title, description, true, Utc::now());
        self.repo.insert_sub_area(sub_area.clone()).await?;
        tracing::info!(business_id, sub_area_id = %sub_area.id, %impact, "sub-area created");
        Ok(sub_area)
    }

    /// Remove a sub-area. Todos that pointed at it read as unassigned.
    pub async fn delete_sub_area(&self, business_id: &str, sub_area_id: &str) -> Result<()> {
        let user = require_user(self.session.as_ref()).await?;
        owned_business(self.repo.as_ref(), &user, business_id).await?;

        if !self.repo.delete_sub_area(business_id, sub_area_id).await? {
            return Err(Error::SubAreaNotFound(sub_area_id.to_string()));
        }
        tracing::info!(business_id, sub_area_id, "sub-area deleted");
        Ok(())
    }
}
