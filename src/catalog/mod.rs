mod api;
mod normalize;

use std::fmt;

pub(crate) use api::{ApiClient, FetchError};
pub(crate) use normalize::{normalize_catalog, normalize_episodes};

/// Identifier as sent by the upstream API, which mixes numbers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ItemId {
    Number(i64),
    Text(String),
}

impl ItemId {
    pub(crate) fn as_param(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<usize> for ItemId {
    fn from(value: usize) -> Self {
        i64::try_from(value)
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Text(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CatalogItem {
    pub(crate) id: ItemId,
    pub(crate) title: String,
    pub(crate) cover_url: String,
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Episode {
    pub(crate) id: ItemId,
    pub(crate) title: String,
    pub(crate) video_url: String,
    pub(crate) sequence_index: usize,
}

impl Episode {
    pub(crate) fn label(&self) -> String {
        format!("Ep {}", self.sequence_index + 1)
    }

    pub(crate) fn has_video(&self) -> bool {
        !self.video_url.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DramaMeta {
    pub(crate) title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EpisodePage {
    pub(crate) meta: DramaMeta,
    pub(crate) episodes: Vec<Episode>,
}
