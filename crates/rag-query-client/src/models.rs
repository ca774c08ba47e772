//! Wire types of the backend contract (camelCase JSON).

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /submitQuery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQueryRequest {
    pub query_text: String,
    pub user_id: String,
}

/// Client-side snapshot of a backend query job.
///
/// `is_complete` only ever moves from `false` to `true` on the backend;
/// `answer_text` and `sources` are meaningful only once it is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub query_id: String,
    pub query_text: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<String>,
}

impl Query {
    /// A freshly submitted, unprocessed query.
    pub fn pending(
        query_id: impl Into<String>,
        query_text: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            query_id: query_id.into(),
            query_text: query_text.into(),
            user_id: user_id.into(),
            is_complete: false,
            answer_text: None,
            sources: Vec::new(),
        }
    }

    /// The answer, if the query is complete and the backend produced one.
    pub fn answer(&self) -> Option<&str> {
        if !self.is_complete {
            return None;
        }
        self.answer_text.as_deref().filter(|a| !a.is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
