use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Decode `null` the same as a missing field.
///
/// The backend emits `None` for blank upstream columns, so plain
/// `#[serde(default)]` is not enough for string fields.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ============================================================================
// Sources
// ============================================================================

/// Short source id used in feed requests and `source_counts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    Sam,
    UsaSpending,
    Grants,
}

impl SourceId {
    /// All sources in sidebar order.
    pub const ALL: [SourceId; 3] = [SourceId::Sam, SourceId::UsaSpending, SourceId::Grants];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sam => "sam",
            Self::UsaSpending => "usaspending",
            Self::Grants => "grants",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sam => "SAM.gov",
            Self::UsaSpending => "USASpending",
            Self::Grants => "Grants.gov",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Sam => "Contract opportunities",
            Self::UsaSpending => "Contract awards",
            Self::Grants => "Grant opportunities",
        }
    }

    /// The item-level source this id fetches from.
    pub fn source(self) -> Source {
        match self {
            Self::Sam => Source::SamGov,
            Self::UsaSpending => Source::UsaSpending,
            Self::Grants => Source::GrantsGov,
        }
    }

    /// Join ids the way the feed endpoint expects them (`sam,grants`).
    pub fn join(ids: &[SourceId]) -> String {
        ids.iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse a comma-separated list, dropping blanks. Unknown ids are an error.
    pub fn parse_list(s: &str) -> Result<Vec<SourceId>, UnknownSource> {
        let mut ids = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let id = part.parse()?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source '{0}' (expected sam, usaspending or grants)")]
pub struct UnknownSource(pub String);

impl FromStr for SourceId {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sam" => Ok(Self::Sam),
            "usaspending" => Ok(Self::UsaSpending),
            "grants" => Ok(Self::Grants),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}

/// Provider name as carried on each item (`"SAM.gov"`, ...).
///
/// Names the client does not know are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    SamGov,
    UsaSpending,
    GrantsGov,
    Other(String),
}

impl Source {
    pub fn name(&self) -> &str {
        match self {
            Self::SamGov => "SAM.gov",
            Self::UsaSpending => "USASpending.gov",
            Self::GrantsGov => "Grants.gov",
            Self::Other(name) => name,
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SAM.gov" => Self::SamGov,
            "USASpending.gov" => Self::UsaSpending,
            "Grants.gov" => Self::GrantsGov,
            _ => Self::Other(s),
        }
    }
}

impl From<Source> for String {
    fn from(s: Source) -> Self {
        match s {
            Source::Other(name) => name,
            known => known.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Contract,
    Award,
    Grant,
    #[default]
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Feed Items
// ============================================================================

/// One opportunity record as returned by the feed endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source: Source,
    #[serde(default, deserialize_with = "nullable")]
    pub source_type: SourceType,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub agency: String,
    #[serde(default, deserialize_with = "nullable")]
    pub posted_date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub deadline: String,
    #[serde(default, deserialize_with = "nullable")]
    pub naics: String,
    #[serde(default, deserialize_with = "nullable")]
    pub set_aside: String,
    #[serde(default, deserialize_with = "nullable")]
    pub contract_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default)]
    pub award_amount: Option<f64>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_mock: bool,
}

impl FeedItem {
    /// Relevance score with absent treated as 0.
    pub fn score(&self) -> f64 {
        self.relevance_score.unwrap_or(0.0)
    }

    /// Award amount with absent treated as 0.
    pub fn amount(&self) -> f64 {
        self.award_amount.unwrap_or(0.0)
    }

    /// AI summary, ignoring empty strings.
    pub fn summary(&self) -> Option<&str> {
        self.ai_summary.as_deref().filter(|s| !s.trim().is_empty())
    }
}

// ============================================================================
// Profile
// ============================================================================

/// The user's standing interest profile. The server copy is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "nullable")]
    pub keywords: String,
    #[serde(default, deserialize_with = "nullable")]
    pub focus: String,
    #[serde(default, deserialize_with = "nullable")]
    pub org_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<String>,
}

impl UserProfile {
    /// Profile built on the client when the server could not confirm one.
    pub fn local(keywords: impl Into<String>, focus: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            focus: focus.into(),
            org_type: String::new(),
            agencies: None,
            raw_input: None,
        }
    }
}

/// Profile used until the first feed response arrives.
pub fn default_profile() -> UserProfile {
    UserProfile::local(
        "defense technology, AI, autonomous systems",
        "Defense technology and government contracts",
    )
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FeedResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<FeedItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub total: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub has_more: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub source_counts: HashMap<String, u64>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

/// `{ "profile": ... }` wrapper used by every profile endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ProfileEnvelope {
    pub profile: UserProfile,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileFromTextBody<'a> {
    pub user_id: &'a str,
    pub raw_input: &'a str,
    pub openai_api_key: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpdateBody<'a> {
    pub user_id: &'a str,
    pub keywords: &'a str,
    pub focus: &'a str,
    pub openai_api_key: &'a str,
}
