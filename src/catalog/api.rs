use tracing::{debug, info, trace};

pub(crate) use crate::http::FetchError;
use crate::http::{Timeouts, get_json};

use super::normalize::{normalize_catalog, normalize_episodes};
use super::{CatalogItem, EpisodePage};

const TRENDING_PATH: &str = "/dramabox/trending";
const SEARCH_PATH: &str = "/dramabox/search";
const EPISODES_PATH: &str = "/dramabox/allepisode";

/// Client for the three read-only content endpoints. Every response passes
/// through the normalizer before it reaches a caller.
#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    base_url: String,
    timeouts: Timeouts,
}

impl ApiClient {
    pub(crate) fn new(base_url: &str, timeouts: Timeouts) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn trending(&self) -> Result<Vec<CatalogItem>, FetchError> {
        let payload = get_json(&self.endpoint(TRENDING_PATH), &[], self.timeouts)?;
        trace!(%payload, "trending payload");
        let items = normalize_catalog(&payload);
        info!(count = items.len(), "loaded trending list");
        Ok(items)
    }

    pub(crate) fn search(&self, query: &str) -> Result<Vec<CatalogItem>, FetchError> {
        let payload = get_json(
            &self.endpoint(SEARCH_PATH),
            &[("query", query)],
            self.timeouts,
        )?;
        trace!(%payload, "search payload");
        let items = normalize_catalog(&payload);
        info!(query, count = items.len(), "loaded search results");
        Ok(items)
    }

    pub(crate) fn episodes(&self, book_id: &str) -> Result<EpisodePage, FetchError> {
        let payload = get_json(
            &self.endpoint(EPISODES_PATH),
            &[("bookId", book_id)],
            self.timeouts,
        )?;
        trace!(%payload, "episodes payload");
        let page = normalize_episodes(&payload);
        debug!(book_id, title = %page.meta.title, "normalized episode payload");
        info!(book_id, count = page.episodes.len(), "loaded episodes");
        Ok(page)
    }
}
