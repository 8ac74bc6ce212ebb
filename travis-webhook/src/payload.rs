//! Travis CI build payload types.
//!
//! Travis sends the build description as a JSON string inside the `payload`
//! form field. Only the fields needed for the notification are modelled;
//! everything else is ignored.

use serde::{Deserialize, Deserializer};

/// What triggered the build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Push,
    PullRequest,
    /// cron, api and anything Travis adds later
    #[default]
    #[serde(other)]
    Other,
}

/// Build outcome, collapsed to what the notification distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Passed,
    Canceled,
    Other,
}

impl BuildState {
    pub fn from_state(state: &str) -> Self {
        match state {
            "passed" => BuildState::Passed,
            "canceled" => BuildState::Canceled,
            _ => BuildState::Other,
        }
    }

    /// Font color used for the build label.
    pub fn color(self) -> &'static str {
        match self {
            BuildState::Passed => "#23bd23",
            BuildState::Canceled => "#cb5e0c",
            BuildState::Other => "#b12222",
        }
    }
}

/// Decoded Travis build payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildPayload {
    /// Build number, sent as a string by Travis but accepted as a number too
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub event_type: EventType,
    /// Raw state as reported (passed, failed, errored, canceled, ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub build_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub compare_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub commit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(default)]
    pub pull_request_number: Option<u64>,
    #[serde(default)]
    pub pull_request_title: Option<String>,
    #[serde(default)]
    pub pull_request_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branch: String,
    /// Build duration in seconds
    #[serde(default)]
    pub duration: Option<u64>,
}

impl BuildPayload {
    /// Parse the JSON text carried in the `payload` field.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn build_state(&self) -> BuildState {
        BuildState::from_state(&self.state)
    }

    pub fn is_pull_request(&self) -> bool {
        self.event_type == EventType::PullRequest
    }

    /// Commit hash cut to the usual 8-character short form.
    pub fn short_commit(&self) -> &str {
        match self.commit.char_indices().nth(8) {
            Some((idx, _)) => &self.commit[..idx],
            None => &self.commit,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Travis sends `null` for fields it has no value for; treat it as absent.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
