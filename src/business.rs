//! Business profiles, the tenant root for todos and sub-areas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::repository::Repository;
use crate::session::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Saved business description; source text for generated tasks.
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Business {
    pub fn new(user_id: &str, name: &str, description: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "business name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: description.trim().to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Load a business and check that `user` owns it.
///
/// A business owned by someone else is reported as not found so tenant
/// boundaries do not leak which ids exist.
pub async fn owned_business(
    repo: &dyn Repository,
    user: &User,
    business_id: &str,
) -> Result<Business> {
    match repo.get_business(business_id).await? {
        Some(business) if business.user_id == user.id => Ok(business),
        _ => Err(Error::BusinessNotFound(business_id.to_string())),
    }
}
