use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use crate::catalog::{CatalogItem, Episode, EpisodePage};

use super::super::format::{format_fetched_at, format_tags, or_placeholder, truncate};
use super::super::query::{QueryKey, QueryState};
use super::{BrowseFocus, BrowseView, Queries, Screen, WatchView};

const ACCENT: Color = Color::Rgb(235, 120, 150);
const MUTED: Color = Color::Rgb(185, 195, 210);
const TEXT: Color = Color::Rgb(230, 230, 230);

pub(super) fn draw_tui(frame: &mut Frame, screen: &mut Screen, queries: &Queries, status: &str) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    match screen {
        Screen::Browse(browse) => draw_browse(frame, browse, queries, status),
        Screen::Watch(watch) => draw_watch(frame, watch, queries, status),
    }
}

fn draw_browse(frame: &mut Frame, browse: &mut BrowseView, queries: &Queries, status: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let trending_state = queries.catalog.state(&QueryKey::Trending);
    let mut header_spans = vec![
        Span::styled(
            "DRAMABOX",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
    ];
    if let QueryState::Success(items) = trending_state {
        header_spans.push(Span::styled(
            format!("{} trending", items.len()),
            Style::default().fg(MUTED),
        ));
    }
    if let Some(at) = queries.catalog.fetched_at(&QueryKey::Trending) {
        header_spans.push(Span::styled(
            format!("   updated {}", format_fetched_at(at)),
            Style::default().fg(MUTED),
        ));
    }
    let header = Paragraph::new(Line::from(header_spans))
        .alignment(Alignment::Center)
        .block(panel_block("Catalog"));
    frame.render_widget(header, chunks[0]);

    let cursor = if browse.editing { "▏" } else { "" };
    let search_text = if browse.search.raw().is_empty() && !browse.editing {
        Line::from(Span::styled(
            "Press / to search dramas...",
            Style::default().fg(MUTED),
        ))
    } else {
        Line::from(vec![
            Span::styled(browse.search.raw().to_string(), Style::default().fg(TEXT)),
            Span::styled(cursor, Style::default().fg(ACCENT)),
        ])
    };
    let search_title = if browse.search.is_pending() {
        "Search (waiting for you to stop typing)"
    } else {
        "Search"
    };
    let search_bar = Paragraph::new(search_text).block(if browse.editing {
        focused_block(search_title)
    } else {
        panel_block(search_title)
    });
    frame.render_widget(search_bar, chunks[1]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[2]);
    let lists_area = body_chunks[0];
    let focus = browse.effective_focus();

    if browse.search.shows_search_section() {
        let list_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(lists_area);
        draw_search_section(frame, browse, queries, list_chunks[0], focus);
        draw_trending_section(
            frame,
            &mut browse.trending_table,
            trending_state,
            list_chunks[1],
            focus == BrowseFocus::Trending,
        );
    } else {
        draw_trending_section(
            frame,
            &mut browse.trending_table,
            trending_state,
            lists_area,
            true,
        );
    }

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(6)])
        .split(body_chunks[1]);

    let featured_text = match trending_state {
        QueryState::Success(items) => match items.first() {
            Some(item) => format!(
                "★ {}\n\n{}",
                truncate(&item.title, 40),
                format_tags(&item.tags, 3)
            ),
            None => "No dramas to show.".to_string(),
        },
        QueryState::Error(_) => "Failed to load data. Try again later.".to_string(),
        QueryState::Idle | QueryState::Loading => "Loading trending dramas...".to_string(),
    };
    let featured = Paragraph::new(featured_text)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: true })
        .block(panel_block("Featured"));
    frame.render_widget(featured, side_chunks[0]);

    let browse: &BrowseView = browse;
    let highlighted = match focus {
        BrowseFocus::SearchResults => browse.search_table.selected(),
        BrowseFocus::Trending => browse.trending_table.selected(),
    }
    .and_then(|idx| super::focused_items(browse, queries)?.get(idx));
    let selection_text = match highlighted {
        Some(item) => item_details(item),
        None => "Nothing selected.".to_string(),
    };
    let selection = Paragraph::new(selection_text)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: false })
        .block(panel_block("Selected"));
    frame.render_widget(selection, side_chunks[1]);

    let controls = if browse.editing {
        "type to search  Backspace delete  Ctrl-U clear  Enter results  Esc done"
    } else {
        "↑/↓ move  Tab switch list  Enter watch  / search  Esc clear search  r retry  q quit"
    };
    draw_footer(frame, controls, status, chunks[3], chunks[4]);
}

fn draw_search_section(
    frame: &mut Frame,
    browse: &mut BrowseView,
    queries: &Queries,
    area: Rect,
    focus: BrowseFocus,
) {
    let title = format!("Results for: {}", truncate(browse.search.raw(), 40));
    let block = if focus == BrowseFocus::SearchResults {
        focused_block_owned(title)
    } else {
        panel_block_owned(title)
    };

    let Some(key) = browse.search_key() else {
        let hint = Paragraph::new("Type a keyword and pause for a moment to see results.")
            .style(Style::default().fg(MUTED))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(hint, area);
        return;
    };

    match queries.catalog.state(&key) {
        QueryState::Success(items) if !items.is_empty() => {
            let table = catalog_table(items, block);
            frame.render_stateful_widget(table, area, &mut browse.search_table);
        }
        state => {
            let message = match state {
                QueryState::Error(_) => "Failed to load search results. Press r to retry.",
                QueryState::Success(_) => "Nothing found.",
                QueryState::Idle | QueryState::Loading => "Searching...",
            };
            let placeholder = Paragraph::new(message)
                .style(Style::default().fg(MUTED))
                .block(block);
            frame.render_widget(placeholder, area);
        }
    }
}

fn draw_trending_section(
    frame: &mut Frame,
    table_state: &mut TableState,
    state: QueryState<'_, Vec<CatalogItem>>,
    area: Rect,
    focused: bool,
) {
    let block = if focused {
        focused_block("Trending now")
    } else {
        panel_block("Trending now")
    };
    match state {
        QueryState::Success(items) if !items.is_empty() => {
            frame.render_stateful_widget(catalog_table(items, block), area, table_state);
        }
        state => {
            let message = match state {
                QueryState::Error(_) => "Failed to load data. Press r to retry.",
                QueryState::Success(_) => "No dramas to show.",
                QueryState::Idle | QueryState::Loading => "Loading trending dramas...",
            };
            let placeholder = Paragraph::new(message)
                .style(Style::default().fg(MUTED))
                .block(block);
            frame.render_widget(placeholder, area);
        }
    }
}

fn catalog_table<'a>(items: &'a [CatalogItem], block: Block<'a>) -> Table<'a> {
    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            Row::new(vec![
                Cell::from(item.title.clone()),
                Cell::from(format_tags(&item.tags, 2)),
            ])
        })
        .collect();

    Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
        .header(
            Row::new(vec!["Title", "Tags"])
                .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .row_highlight_style(highlight_style())
        .highlight_symbol("▸ ")
}

fn item_details(item: &CatalogItem) -> String {
    format!(
        "Title\n{}\n\nTags\n{}\n\nId\n{}\n\nCover\n{}",
        truncate(&item.title, 40),
        format_tags(&item.tags, 5),
        truncate(&item.id.to_string(), 32),
        truncate(or_placeholder(&item.cover_url), 60),
    )
}

fn draw_watch(frame: &mut Frame, watch: &WatchView, queries: &Queries, status: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let key = watch.key();
    let state = queries.episodes.state(&key);
    let drama_title = match state {
        QueryState::Success(page) => page.meta.title.as_str(),
        _ => watch.fallback_title.as_str(),
    };

    let mut header_spans = vec![
        Span::styled(
            "DRAMABOX",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(truncate(drama_title, 60), Style::default().fg(TEXT)),
    ];
    if queries.episodes.is_refreshing(&key) {
        header_spans.push(Span::styled("   refreshing...", Style::default().fg(MUTED)));
    }
    let header = Paragraph::new(Line::from(header_spans))
        .alignment(Alignment::Center)
        .block(panel_block("Watch"));
    frame.render_widget(header, chunks[0]);

    match state {
        QueryState::Success(page) if !page.episodes.is_empty() => {
            draw_episode_body(frame, watch, page, chunks[1]);
        }
        state => {
            let message = match state {
                QueryState::Error(err) => format!(
                    "Failed to load episodes. The server may be busy.\n\n{err}\n\nPress r to retry."
                ),
                QueryState::Success(_) => "No episodes found for this drama.".to_string(),
                QueryState::Idle | QueryState::Loading => {
                    "Loading episodes...\n\nLong series can take a few seconds.".to_string()
                }
            };
            let placeholder = Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(MUTED))
                .wrap(Wrap { trim: true })
                .block(panel_block("Episodes"));
            frame.render_widget(placeholder, chunks[1]);
        }
    }

    let controls = match state {
        QueryState::Error(_) => "r retry  Esc back  q quit",
        _ => "↑/↓ select  Enter/p play  n play next  Esc back  q quit",
    };
    draw_footer(frame, controls, status, chunks[2], chunks[3]);
}

fn draw_episode_body(frame: &mut Frame, watch: &WatchView, page: &EpisodePage, area: Rect) {
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let current_position = watch.selection.current_position(&page.episodes);
    let current = current_position.and_then(|position| page.episodes.get(position));
    let rows: Vec<Row> = page
        .episodes
        .iter()
        .enumerate()
        .map(|(position, episode)| {
            let marker = if current_position == Some(position) {
                "▶"
            } else {
                ""
            };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(episode.label()),
                Cell::from(episode.title.clone()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["", "Ep", "Title"])
            .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    )
    .block(panel_block_owned(format!(
        "Episodes ({})",
        page.episodes.len()
    )))
    .row_highlight_style(highlight_style());
    let mut table_state = TableState::default().with_selected(current_position);
    frame.render_stateful_widget(table, body_chunks[0], &mut table_state);

    let now_playing = Paragraph::new(now_playing_text(&page.meta.title, current))
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: false })
        .block(panel_block("Now playing"));
    frame.render_widget(now_playing, body_chunks[1]);
}

fn now_playing_text(drama_title: &str, current: Option<&Episode>) -> String {
    let Some(episode) = current else {
        return drama_title.to_string();
    };
    let source = if episode.has_video() {
        truncate(&episode.video_url, 80)
    } else {
        "Video source unavailable.".to_string()
    };
    format!(
        "{drama_title} · {}\n\n{}\n\nSource\n{source}",
        episode.title,
        episode.label()
    )
}

fn draw_footer(
    frame: &mut Frame,
    controls: &str,
    status: &str,
    controls_area: Rect,
    status_area: Rect,
) {
    let command_bar = Paragraph::new(controls.to_string())
        .style(Style::default().fg(MUTED))
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(command_bar, controls_area);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, status_area);
}

fn highlight_style() -> Style {
    Style::default()
        .bg(ACCENT)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn panel_block(title: &'static str) -> Block<'static> {
    panel_block_owned(title.to_string())
}

fn panel_block_owned(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn focused_block(title: &'static str) -> Block<'static> {
    focused_block_owned(title.to_string())
}

fn focused_block_owned(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .title(title)
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(TEXT)
    }
}
