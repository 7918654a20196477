mod debounce;
mod format;
mod player;
mod query;
mod selection;
mod tui;


use anyhow::{Context, Result, anyhow};

use crate::catalog::ApiClient;
use crate::cli::{Cli, Command};
use crate::config::Config;

use self::format::{or_placeholder, print_catalog_table, truncate};
use self::player::{play_episode, playback_message};

pub fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.api_base.as_deref());
    let client = ApiClient::new(&config.api_base, config.timeouts);
    tracing::info!(api_base = client.base_url(), "starting");

    match cli.command {
        Some(Command::Trending) => run_trending(&client)?,
        Some(Command::Search { query }) => run_search(&client, &query)?,
        Some(Command::Episodes { book_id }) => run_episodes(&client, &book_id)?,
        Some(Command::Play { book_id, episode }) => run_play(&client, &config, &book_id, episode)?,
        Some(Command::Tui) | None => tui::run_tui(&client, &config)?,
    }

    Ok(())
}

fn run_trending(client: &ApiClient) -> Result<()> {
    let items = client
        .trending()
        .context("failed to load trending dramas, try again later")?;
    if items.is_empty() {
        println!("No dramas to show.");
        return Ok(());
    }
    print_catalog_table(&items);
    Ok(())
}

fn run_search(client: &ApiClient, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        println!("Type a keyword to search.");
        return Ok(());
    }

    let items = client
        .search(query)
        .context("failed to load search results, try again later")?;
    if items.is_empty() {
        println!("Nothing found for \"{query}\".");
        return Ok(());
    }
    print_catalog_table(&items);
    Ok(())
}

fn run_episodes(client: &ApiClient, book_id: &str) -> Result<()> {
    let book_id = require_book_id(book_id)?;
    let page = client
        .episodes(book_id)
        .context("failed to load episodes, the server may be busy")?;

    println!("{}", page.meta.title);
    if page.episodes.is_empty() {
        println!("No episodes found for this drama.");
        return Ok(());
    }

    println!("{} episode(s)", page.episodes.len());
    println!("{:<8} {:<40} {:<50}", "EP", "TITLE", "VIDEO");
    for episode in &page.episodes {
        println!(
            "{:<8} {:<40} {:<50}",
            episode.label(),
            truncate(&episode.title, 40),
            truncate(or_placeholder(&episode.video_url), 50)
        );
    }
    Ok(())
}

fn run_play(client: &ApiClient, config: &Config, book_id: &str, number: usize) -> Result<()> {
    let book_id = require_book_id(book_id)?;
    if number == 0 {
        return Err(anyhow!("episode numbers start at 1"));
    }

    let page = client
        .episodes(book_id)
        .context("failed to load episodes, the server may be busy")?;
    let episode = page.episodes.get(number - 1).with_context(|| {
        format!(
            "{} has {} episode(s); episode {number} does not exist",
            page.meta.title,
            page.episodes.len()
        )
    })?;

    println!("Playing {} · {}", page.meta.title, episode.title);
    let outcome = play_episode(&config.player, &page.meta.title, episode)?;
    println!("{}", playback_message(&page.meta.title, episode, &outcome));
    Ok(())
}

fn require_book_id(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("a drama id is required"));
    }
    Ok(trimmed)
}
