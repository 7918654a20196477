use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{CatalogItem, DramaMeta, Episode, EpisodePage, ItemId};

const CATALOG_LIST_FIELD: &str = "columnVoList";
const EPISODE_LIST_FIELD: &str = "episodeList";
const GENERIC_LIST_FIELD: &str = "data";

const ITEM_ID_FIELDS: &[&str] = &["bookId", "id"];
const ITEM_TITLE_FIELDS: &[&str] = &["title", "bookName"];
const ITEM_COVER_FIELDS: &[&str] = &["cover", "bookCover", "coverWap", "img"];
const ITEM_TAG_LIST_FIELDS: &[&str] = &["tags", "tagList", "genres"];
const ITEM_TAG_TEXT_FIELD: &str = "tag";
const TAG_OBJECT_NAME_FIELDS: &[&str] = &["tagName", "name"];

const EPISODE_ID_FIELDS: &[&str] = &["episodeId", "id"];
const EPISODE_TITLE_FIELDS: &[&str] = &["title", "episodeTitle"];
const EPISODE_VIDEO_FIELDS: &[&str] = &["videoUrl", "playUrl", "audioUrl", "url"];

const META_TITLE_FIELDS: &[&str] = &["bookName", "title"];

pub(crate) const DEFAULT_ITEM_TITLE: &str = "Untitled";
pub(crate) const DEFAULT_DRAMA_TITLE: &str = "DramaBox";

/// Maps a trending or search payload onto catalog items. Never fails: unknown
/// shapes produce an empty list and missing fields fall back to defaults.
pub(crate) fn normalize_catalog(payload: &Value) -> Vec<CatalogItem> {
    locate_list(payload, CATALOG_LIST_FIELD)
        .iter()
        .enumerate()
        .map(|(position, raw)| normalize_catalog_item(raw, position))
        .collect()
}

pub(crate) fn normalize_episodes(payload: &Value) -> EpisodePage {
    let episodes = locate_list(payload, EPISODE_LIST_FIELD)
        .iter()
        .enumerate()
        .map(|(idx, raw)| normalize_episode(raw, idx))
        .collect();
    let title = first_text(payload, META_TITLE_FIELDS)
        .unwrap_or_else(|| DEFAULT_DRAMA_TITLE.to_string());

    EpisodePage {
        meta: DramaMeta { title },
        episodes,
    }
}

fn locate_list<'a>(payload: &'a Value, primary_field: &str) -> &'a [Value] {
    [
        payload.get(primary_field),
        payload.get(GENERIC_LIST_FIELD),
        Some(payload),
    ]
    .into_iter()
    .flatten()
    .find_map(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

fn normalize_catalog_item(raw: &Value, position: usize) -> CatalogItem {
    let title = first_text(raw, ITEM_TITLE_FIELDS).unwrap_or_else(|| DEFAULT_ITEM_TITLE.to_string());
    let cover_url = first_text(raw, ITEM_COVER_FIELDS).unwrap_or_default();
    let id = first_id(raw, ITEM_ID_FIELDS)
        .unwrap_or_else(|| synthetic_item_id(&title, &cover_url, position));

    CatalogItem {
        id,
        title,
        cover_url,
        tags: resolve_tags(raw),
    }
}

fn normalize_episode(raw: &Value, idx: usize) -> Episode {
    Episode {
        id: first_id(raw, EPISODE_ID_FIELDS).unwrap_or_else(|| ItemId::from(idx)),
        title: first_text(raw, EPISODE_TITLE_FIELDS)
            .unwrap_or_else(|| format!("Episode {}", idx + 1)),
        video_url: first_text(raw, EPISODE_VIDEO_FIELDS).unwrap_or_default(),
        sequence_index: idx,
    }
}

/// First field in `fields` holding a non-blank string, trimmed.
fn first_text(raw: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| text_value(raw.get(*field)?))
}

fn text_value(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn first_id(raw: &Value, fields: &[&str]) -> Option<ItemId> {
    fields.iter().find_map(|field| id_value(raw.get(*field)?))
}

fn id_value(value: &Value) -> Option<ItemId> {
    match value {
        Value::Number(number) => Some(
            number
                .as_i64()
                .map(ItemId::Number)
                .unwrap_or_else(|| ItemId::Text(number.to_string())),
        ),
        Value::String(_) => text_value(value).map(ItemId::Text),
        _ => None,
    }
}

fn resolve_tags(raw: &Value) -> Vec<String> {
    if let Some(list) = ITEM_TAG_LIST_FIELDS
        .iter()
        .find_map(|field| raw.get(*field)?.as_array())
    {
        return list.iter().filter_map(tag_value).collect();
    }

    raw.get(ITEM_TAG_TEXT_FIELD)
        .and_then(Value::as_str)
        .map(split_tag_text)
        .unwrap_or_default()
}

fn tag_value(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => text_value(value),
        Value::Object(_) => first_text(value, TAG_OBJECT_NAME_FIELDS),
        _ => None,
    }
}

pub(crate) fn split_tag_text(raw: &str) -> Vec<String> {
    raw.split([',', '/'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Content-derived identity for items the upstream sends without any id.
/// SHA-256 over (title, cover, position), so the same payload yields the same
/// ids in every build; distinct per list position.
fn synthetic_item_id(title: &str, cover_url: &str, position: usize) -> ItemId {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\0");
    hasher.update(cover_url.as_bytes());
    hasher.update(b"\0");
    hasher.update((position as u64).to_le_bytes());
    let digest = hasher.finalize();
    ItemId::Text(format!("gen-{}", hex::encode(&digest[..8])))
}
