use chrono::{DateTime, Local};

use crate::catalog::CatalogItem;

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_tags(tags: &[String], limit: usize) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }
    tags.iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn format_fetched_at(at: DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

pub(crate) fn or_placeholder(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

pub(crate) fn print_catalog_table(items: &[CatalogItem]) {
    println!("{:<24} {:<44} {:<30}", "ID", "TITLE", "TAGS");
    for item in items {
        println!(
            "{:<24} {:<44} {:<30}",
            truncate(&item.id.to_string(), 24),
            truncate(&item.title, 44),
            truncate(&format_tags(&item.tags, 3), 30)
        );
    }
}
