use crate::catalog::{Episode, ItemId};

/// Which episode of the loaded list is current. Holds the id plus the row it
/// was picked at; the list itself may be replaced by a refetch at any time.
/// Ids are not guaranteed unique (position fallbacks can collide with real
/// ids), so the row disambiguates while it still holds the same id.
#[derive(Debug, Clone, Default)]
pub(crate) struct EpisodeSelection {
    selected: Option<ItemId>,
    position: Option<usize>,
}

impl EpisodeSelection {
    #[cfg(test)]
    pub(crate) fn selected_id(&self) -> Option<&ItemId> {
        self.selected.as_ref()
    }

    /// One-shot default: picks the first episode only while nothing is
    /// selected yet.
    pub(crate) fn on_episodes_loaded(&mut self, episodes: &[Episode]) -> bool {
        if self.selected.is_some() {
            return false;
        }
        let Some(first) = episodes.first() else {
            return false;
        };
        self.selected = Some(first.id.clone());
        self.position = Some(0);
        true
    }

    pub(crate) fn select(&mut self, id: ItemId) {
        self.selected = Some(id);
        self.position = None;
    }

    /// Falls back to the first episode when the selected id is gone.
    pub(crate) fn current<'a>(&self, episodes: &'a [Episode]) -> Option<&'a Episode> {
        episodes.get(self.current_position(episodes)?)
    }

    pub(crate) fn current_position(&self, episodes: &[Episode]) -> Option<usize> {
        if episodes.is_empty() {
            return None;
        }
        let Some(id) = &self.selected else {
            return Some(0);
        };
        let pinned = self
            .position
            .filter(|&position| episodes.get(position).is_some_and(|ep| &ep.id == id));
        Some(
            pinned
                .or_else(|| episodes.iter().position(|ep| &ep.id == id))
                .unwrap_or(0),
        )
    }

    pub(crate) fn select_next(&mut self, episodes: &[Episode]) -> Option<&ItemId> {
        let position = self.current_position(episodes)?;
        self.select_at(episodes, (position + 1).min(episodes.len() - 1))
    }

    pub(crate) fn select_previous(&mut self, episodes: &[Episode]) -> Option<&ItemId> {
        let position = self.current_position(episodes)?;
        self.select_at(episodes, position.saturating_sub(1))
    }

    pub(crate) fn has_next(&self, episodes: &[Episode]) -> bool {
        self.current_position(episodes)
            .is_some_and(|position| position + 1 < episodes.len())
    }

    fn select_at(&mut self, episodes: &[Episode], position: usize) -> Option<&ItemId> {
        let episode = episodes.get(position)?;
        self.selected = Some(episode.id.clone());
        self.position = Some(position);
        self.selected.as_ref()
    }
}
