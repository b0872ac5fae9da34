//! AI task-generation collaborator.
//!
//! A generator turns a business description into candidate tasks. Candidates
//! are untrusted: [`screen`] drops any that lack a title, a literal anchor
//! quote from the source text or a knowledge-base citation, and any whose
//! normalized title duplicates an existing todo or an earlier candidate.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub business_id: String,
    /// Text the anchor quotes must come from.
    pub source_text: String,
}

/// One candidate task as emitted by the generator. Enum-like fields are raw
/// strings and go through normalization on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description_md: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub effort: String,
    #[serde(default)]
    pub anchor_quote: String,
    #[serde(default)]
    pub kb_refs: Vec<String>,
    #[serde(default)]
    pub rationale: String,
}

#[async_trait]
pub trait TaskGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedTask>>;
}

/// Run the generator, giving up after `timeout`.
pub async fn generate_with_timeout(
    generator: &dyn TaskGenerator,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<Vec<GeneratedTask>> {
    match tokio::time::timeout(timeout, generator.generate(request)).await {
        Ok(result) => result,
        Err(_) => Err(Error::GenerationTimedOut(timeout.as_secs())),
    }
}

/// Lowercase, strip punctuation, collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check the hard requirements on a single candidate.
pub fn validate(task: &GeneratedTask, source_text: &str) -> Result<()> {
    if task.title.trim().is_empty() {
        return Err(Error::ValidationFailed("task has no title".to_string()));
    }
    let quote = task.anchor_quote.trim();
    if quote.is_empty() {
        return Err(Error::ValidationFailed(format!(
            "'{}' has no anchor quote",
            task.title.trim()
        )));
    }
    if !source_text.contains(quote) {
        return Err(Error::ValidationFailed(format!(
            "'{}' quotes text that is not in the business description",
            task.title.trim()
        )));
    }
    if !task.kb_refs.iter().any(|r| !r.trim().is_empty()) {
        return Err(Error::ValidationFailed(format!(
            "'{}' cites no knowledge-base reference",
            task.title.trim()
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Screened {
    pub accepted: Vec<GeneratedTask>,
    pub rejected: Vec<Rejection>,
}

/// Filter candidates. `existing_titles` are the titles already on the
/// roadmap; at most `limit` candidates are accepted.
pub fn screen<'a, I>(
    candidates: Vec<GeneratedTask>,
    source_text: &str,
    existing_titles: I,
    limit: usize,
) -> Screened
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<String> = existing_titles.into_iter().map(normalize_title).collect();
    let mut screened = Screened::default();

    for task in candidates {
        let reason = match validate(&task, source_text) {
            Err(err) => Some(err.to_string()),
            Ok(()) if !seen.insert(normalize_title(&task.title)) => {
                Some(format!("duplicate of an existing task: '{}'", task.title.trim()))
            }
            Ok(()) if screened.accepted.len() >= limit => {
                Some(format!("over the limit of {limit} tasks per run"))
            }
            Ok(()) => None,
        };
        match reason {
            Some(reason) => screened.rejected.push(Rejection {
                title: task.title.trim().to_string(),
                reason,
            }),
            None => screened.accepted.push(task),
        }
    }
    screened
}

/// A knowledge-base action the baseline generator can recommend.
struct KbAction {
    id: &'static str,
    impact: &'static str,
    title: &'static str,
    description: &'static str,
    priority: &'static str,
    effort: &'static str,
    keywords: &'static [&'static str],
}

const KB_ACTIONS: &[KbAction] = &[
    KbAction {
        id: "kb-gov-mission",
        impact: "Governance",
        title: "Write a mission statement covering social and environmental impact",
        description: "Document the company's purpose beyond profit and share it with all staff.",
        priority: "P1",
        effort: "Low",
        keywords: &["mission", "purpose", "values"],
    },
    KbAction {
        id: "kb-gov-legal",
        impact: "Governance",
        title: "Amend the articles of association to adopt the B Corp legal requirement",
        description: "Directors must consider stakeholders as well as shareholders.",
        priority: "P1",
        effort: "Medium",
        keywords: &["director", "board", "shareholder", "ltd", "limited"],
    },
    KbAction {
        id: "kb-wrk-wage",
        impact: "Workers",
        title: "Pay at least the Real Living Wage to every employee",
        description: "Review the pay floor against the Living Wage Foundation rates.",
        priority: "P1",
        effort: "Medium",
        keywords: &["staff", "employee", "team", "people", "wage"],
    },
    KbAction {
        id: "kb-wrk-survey",
        impact: "Workers",
        title: "Run an annual employee engagement survey",
        description: "Collect anonymous feedback and publish the actions taken in response.",
        priority: "P2",
        effort: "Low",
        keywords: &["staff", "employee", "team", "culture"],
    },
    KbAction {
        id: "kb-com-suppliers",
        impact: "Community",
        title: "Adopt a supplier code of conduct",
        description: "Screen significant suppliers on social and environmental practices.",
        priority: "P2",
        effort: "Medium",
        keywords: &["supplier", "sourcing", "supply", "partner"],
    },
    KbAction {
        id: "kb-com-volunteer",
        impact: "Community",
        title: "Offer paid volunteering days",
        description: "Give every employee paid time to volunteer with local organisations.",
        priority: "P3",
        effort: "Low",
        keywords: &["local", "community", "charity", "volunteer"],
    },
    KbAction {
        id: "kb-env-footprint",
        impact: "Environment",
        title: "Measure scope 1 and 2 greenhouse gas emissions",
        description: "Establish a carbon baseline from energy bills and fuel use.",
        priority: "P1",
        effort: "Medium",
        keywords: &["energy", "carbon", "emission", "office", "climate"],
    },
    KbAction {
        id: "kb-env-waste",
        impact: "Environment",
        title: "Set up a waste reduction and recycling programme",
        description: "Track waste streams and set a reduction target.",
        priority: "P2",
        effort: "Low",
        keywords: &["waste", "packaging", "recycl", "product"],
    },
    KbAction {
        id: "kb-cus-feedback",
        impact: "Customers",
        title: "Introduce a formal customer feedback process",
        description: "Gather satisfaction data and review it with leadership each quarter.",
        priority: "P2",
        effort: "Low",
        keywords: &["customer", "client", "service"],
    },
    KbAction {
        id: "kb-cus-privacy",
        impact: "Customers",
        title: "Publish a customer data privacy policy",
        description: "Explain how customer data is collected, stored and deleted.",
        priority: "P3",
        effort: "Low",
        keywords: &["data", "online", "digital", "software", "app"],
    },
];

/// Offline generator that recommends every built-in knowledge-base action,
/// anchored on the first sentence of the source text mentioning one of the
/// action's keywords (or the first sentence when none does).
/// The output depends only on the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineGenerator;

#[async_trait]
impl TaskGenerator for BaselineGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedTask>> {
        let sentences = sentences(&request.source_text);
        let Some(first) = sentences.first().copied() else {
            return Ok(Vec::new());
        };

        Ok(KB_ACTIONS
            .iter()
            .map(|action| {
                let anchor = sentences
                    .iter()
                    .copied()
                    .find(|s| {
                        let lower = s.to_lowercase();
                        action.keywords.iter().any(|k| lower.contains(k))
                    })
                    .unwrap_or(first);
                GeneratedTask {
                    title: action.title.to_string(),
                    description_md: action.description.to_string(),
                    priority: action.priority.to_string(),
                    impact: action.impact.to_string(),
                    effort: action.effort.to_string(),
                    anchor_quote: anchor.to_string(),
                    kb_refs: vec![action.id.to_string()],
                    rationale: format!("Baseline {} action", action.impact),
                }
            })
            .collect())
    }
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(|ch| matches!(ch, '.' | '!' | '?' | '\n'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
