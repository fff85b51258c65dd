use serde::{Deserialize, Serialize};

/// Normalized search hit forwarded to the completion API as grounding context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
}
