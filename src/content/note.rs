//! Note model - short free-text entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frontmatter::{opt_string, timestamp};
use crate::pagination::Identified;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    /// Markdown body without front-matter
    pub content: String,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
}

impl Identified for Note {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NoteMatter {
    #[serde(deserialize_with = "opt_string")]
    pub date: Option<String>,
}
