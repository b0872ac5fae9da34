//! Keys for AI chat sessions.
//!
//! The chat collaborator itself is external; the core only decides which
//! conversation a question belongs to. One key, one session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::todo::Impact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatLevel {
    /// Whole roadmap
    Overview,
    ImpactArea,
    SubArea,
    Task,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatSessionKey {
    pub level: ChatLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_area: Option<Impact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl ChatSessionKey {
    pub fn overview() -> Self {
        Self {
            level: ChatLevel::Overview,
            impact_area: None,
            sub_area: None,
            task_id: None,
        }
    }

    pub fn impact_area(impact: Impact) -> Self {
        Self {
            level: ChatLevel::ImpactArea,
            impact_area: Some(impact),
            ..Self::overview()
        }
    }

    pub fn sub_area(impact: Impact, sub_area_id: &str) -> Self {
        Self {
            level: ChatLevel::SubArea,
            impact_area: Some(impact),
            sub_area: Some(sub_area_id.to_string()),
            task_id: None,
        }
    }

    pub fn task(task_id: &str) -> Self {
        Self {
            level: ChatLevel::Task,
            task_id: Some(task_id.to_string()),
            ..Self::overview()
        }
    }

    /// Reject keys whose fields do not match their level.
    pub fn validate(&self) -> Result<()> {
        let ok = match self.level {
            ChatLevel::Overview => {
                self.impact_area.is_none() && self.sub_area.is_none() && self.task_id.is_none()
            }
            ChatLevel::ImpactArea => {
                self.impact_area.is_some() && self.sub_area.is_none() && self.task_id.is_none()
            }
            ChatLevel::SubArea => {
                self.impact_area.is_some() && self.sub_area.is_some() && self.task_id.is_none()
            }
            ChatLevel::Task => self.task_id.is_some(),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "chat session key does not match its level: {self}"
            )))
        }
    }
}

impl fmt::Display for ChatSessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            ChatLevel::Overview => "overview",
            ChatLevel::ImpactArea => "impact_area",
            ChatLevel::SubArea => "sub_area",
            ChatLevel::Task => "task",
        };
        write!(f, "{level}")?;
        if let Some(impact) = self.impact_area {
            write!(f, "/{impact}")?;
        }
        if let Some(sub_area) = &self.sub_area {
            write!(f, "/{sub_area}")?;
        }
        if let Some(task_id) = &self.task_id {
            write!(f, "/{task_id}")?;
        }
        Ok(())
    }
}
