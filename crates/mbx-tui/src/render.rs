// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use mbx_app::{
    AppState, HELP_LINKS, InputMode, MainMenuEntry, Named, SPINNER_FRAMES, ViewState,
};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

pub const SPINNER: [&str; SPINNER_FRAMES] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const CRUMB_SEPARATOR: &str = " › ";
const CURSOR_MARK: &str = "▶";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:none], [year] at [hour repr:12 padding:none]:[minute] [period]"
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListRow {
    pub number: usize,
    pub label: String,
    pub detail: String,
    pub selected: bool,
}

pub(crate) fn render(frame: &mut Frame<'_>, state: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(breadcrumb(state))
        .block(Block::default().title(" mbx ").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let body = Paragraph::new(body_lines(state))
        .wrap(Wrap { trim: false })
        .block(Block::default().title(body_title(state)).borders(Borders::ALL));
    frame.render_widget(body, layout[1]);

    let footer = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, layout[2]);

    if let InputMode::Help { cursor } = state.mode {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text(cursor))
            .block(Block::default().title(" help ").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

pub fn format_timestamp(raw: &str) -> String {
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|parsed| parsed.format(TIMESTAMP_FORMAT).ok())
        .unwrap_or_else(|| raw.to_owned())
}

pub(crate) fn breadcrumb(state: &AppState) -> String {
    let mut parts = vec!["Metabase".to_owned()];
    let nav = &state.nav;
    match state.view {
        ViewState::MainMenu => {}
        ViewState::Databases | ViewState::Schemas | ViewState::Tables | ViewState::Fields => {
            parts.push("Databases".to_owned());
            parts.extend(nav.selected_database.as_ref().map(|db| db.name.clone()));
            parts.extend(nav.selected_schema.as_ref().map(|schema| schema.name.clone()));
            parts.extend(nav.selected_table.as_ref().map(|table| table.label().to_owned()));
        }
        ViewState::Collections | ViewState::CollectionItems => collection_trail(state, &mut parts),
        ViewState::GlobalSearch => search_trail(state, &mut parts),
        ViewState::ItemDetail => {
            if state.detail_origin == ViewState::GlobalSearch {
                search_trail(state, &mut parts);
            } else {
                collection_trail(state, &mut parts);
            }
            parts.extend(nav.selected_item.as_ref().map(|item| item.name.clone()));
        }
    }
    parts.join(CRUMB_SEPARATOR)
}

fn collection_trail(state: &AppState, parts: &mut Vec<String>) {
    parts.push("Collections".to_owned());
    parts.extend(
        state
            .nav
            .collection_stack
            .iter()
            .map(|frame| frame.display_name().to_owned()),
    );
    parts.extend(
        state
            .nav
            .selected_collection
            .as_ref()
            .map(|collection| collection.display_name().to_owned()),
    );
}

fn search_trail(state: &AppState, parts: &mut Vec<String>) {
    parts.push("Search".to_owned());
    if !state.search_query.is_empty() {
        parts.push(format!("\"{}\"", state.search_query));
    }
}

fn body_title(state: &AppState) -> String {
    let name = match (state.view, &state.nav.selected_collection) {
        (ViewState::CollectionItems, Some(collection)) => collection.display_name().to_owned(),
        _ => state.view.title().to_owned(),
    };
    if matches!(state.view, ViewState::MainMenu | ViewState::ItemDetail) || state.nav.loading {
        format!(" {name} ")
    } else {
        format!(" {name} ({}) ", state.displayed_len())
    }
}

fn body_lines(state: &AppState) -> Vec<Line<'static>> {
    if let Some(error) = &state.nav.error {
        return vec![
            Line::styled(format!("Error: {error}"), Style::default().fg(Color::Red)),
            Line::from(""),
            Line::from("esc goes back"),
        ];
    }
    if state.nav.loading {
        return vec![Line::from(loading_text(state))];
    }
    if state.view == ViewState::ItemDetail {
        return detail_lines(state).into_iter().map(Line::from).collect();
    }

    let rows = list_rows(state);
    if rows.is_empty() {
        return vec![Line::styled(
            empty_message(state),
            Style::default().fg(Color::DarkGray),
        )];
    }

    let len = state.displayed_len();
    let visible = state.visible_rows();
    let mut lines = Vec::with_capacity(rows.len() + 2);
    if visible.start > 0 {
        lines.push(Line::styled(
            format!("  ↑ {} more", visible.start),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.extend(rows.into_iter().map(row_line));
    if visible.end < len {
        lines.push(Line::styled(
            format!("  ↓ {} more", len - visible.end),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines
}

fn row_line(row: ListRow) -> Line<'static> {
    let marker = if row.selected { CURSOR_MARK } else { " " };
    let label_style = if row.selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::raw(format!("{marker} {:>3}. ", row.number)),
        Span::styled(row.label, label_style),
    ];
    if !row.detail.is_empty() {
        spans.push(Span::styled(
            format!("  {}", row.detail),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

pub(crate) fn list_rows(state: &AppState) -> Vec<ListRow> {
    let indices = state.displayed_indices();
    let visible = state.visible_rows();
    let Some(window) = indices.get(visible.clone()) else {
        return Vec::new();
    };
    window
        .iter()
        .enumerate()
        .filter_map(|(offset, &original)| {
            let position = visible.start + offset;
            let (label, detail) = row_text(state, original)?;
            Some(ListRow {
                number: position + 1,
                label,
                detail,
                selected: position == state.nav.cursor,
            })
        })
        .collect()
}

fn row_text(state: &AppState, index: usize) -> Option<(String, String)> {
    let lists = &state.lists;
    let text = match state.view {
        ViewState::MainMenu => {
            let entry = MainMenuEntry::ALL.get(index)?;
            (entry.as_str().to_owned(), entry.description().to_owned())
        }
        ViewState::Databases => {
            let db = lists.databases.get(index)?;
            (db.name.clone(), db.engine.clone())
        }
        ViewState::Schemas => {
            let schema = lists.schemas.get(index)?;
            let noun = if schema.table_count == 1 { "table" } else { "tables" };
            (schema.name.clone(), format!("{} {noun}", schema.table_count))
        }
        ViewState::Tables => {
            let table = lists.tables.get(index)?;
            (table.label().to_owned(), first_line(table.description.as_deref()))
        }
        ViewState::Fields => {
            let field = lists.fields.get(index)?;
            let mut detail = field.type_label().to_owned();
            if let Some(semantic) = field.semantic_type.as_deref() {
                let semantic = semantic.strip_prefix("type/").unwrap_or(semantic);
                detail.push_str(&format!(" ({semantic})"));
            }
            (field.label().to_owned(), detail)
        }
        ViewState::Collections => {
            let collection = lists.collections.get(index)?;
            (
                collection.name.clone(),
                first_line(collection.description.as_deref()),
            )
        }
        ViewState::CollectionItems => {
            let item = lists.items.get(index)?;
            (item.name.clone(), format!("[{}]", item.model.as_str()))
        }
        ViewState::GlobalSearch => {
            let item = lists.search_results.get(index)?;
            let detail = match &item.collection {
                Some(parent) => format!("[{}] in {}", item.model.as_str(), parent.display_name()),
                None => format!("[{}]", item.model.as_str()),
            };
            (item.name.clone(), detail)
        }
        ViewState::ItemDetail => return None,
    };
    Some(text)
}

fn first_line(text: Option<&str>) -> String {
    text.and_then(|text| text.lines().next())
        .unwrap_or_default()
        .to_owned()
}

fn loading_text(state: &AppState) -> String {
    let what = state
        .nav
        .pending()
        .map(|pending| pending.kind.as_str())
        .unwrap_or("data");
    format!(
        "{} Loading {what}...",
        SPINNER[state.spinner_frame % SPINNER.len()]
    )
}

fn empty_message(state: &AppState) -> String {
    if state.is_filtering() {
        return "No matches".to_owned();
    }
    match state.view {
        ViewState::Databases => "No databases found".to_owned(),
        ViewState::Schemas => "No schemas found".to_owned(),
        ViewState::Tables => "No tables found".to_owned(),
        ViewState::Fields => "No fields found".to_owned(),
        ViewState::Collections => "No collections found".to_owned(),
        ViewState::CollectionItems => "This collection is empty".to_owned(),
        ViewState::GlobalSearch if state.search_query.is_empty() => {
            "Type a query and press enter".to_owned()
        }
        ViewState::GlobalSearch => format!("Nothing found for \"{}\"", state.search_query),
        ViewState::MainMenu | ViewState::ItemDetail => String::new(),
    }
}

pub(crate) fn detail_lines(state: &AppState) -> Vec<String> {
    let Some(item) = &state.nav.selected_item else {
        return vec!["Nothing selected".to_owned()];
    };
    let mut lines = vec![item.name.clone(), format!("Type: {}", item.model.as_str())];
    if let Some(description) = item.description.as_deref().filter(|text| !text.is_empty()) {
        lines.push(format!("Description: {description}"));
    }
    lines.push(String::new());
    match &state.detail {
        Some(detail) => {
            if let Some(creator) = &detail.creator {
                lines.push(format!("Created by: {}", creator.display_name()));
            }
            if let Some(editor) = &detail.last_edit {
                lines.push(format!("Last edited by: {}", editor.display_name()));
            }
            if let Some(created) = &detail.created_at {
                lines.push(format!("Created: {}", format_timestamp(created)));
            }
            if let Some(updated) = &detail.updated_at {
                lines.push(format!("Updated: {}", format_timestamp(updated)));
            }
        }
        None if !item.model.has_detail() => {
            lines.push(format!("No further details for this {}.", item.model.as_str()));
        }
        None => lines.push("No details returned.".to_owned()),
    }
    lines.push(String::new());
    lines.push("w opens it in the browser".to_owned());
    lines
}

pub(crate) fn status_text(state: &AppState) -> String {
    let mut text = match &state.mode {
        InputMode::Search { query } if state.view == ViewState::GlobalSearch => {
            format!("search: {query}▏  enter search | esc cancel")
        }
        InputMode::Search { query } => format!(
            "/{query}▏  {} matches | ↑/↓ move | enter open | esc cancel",
            state.displayed_len()
        ),
        InputMode::NumericEntry(input) => {
            format!("#{}  enter open | esc clear", input.as_str())
        }
        InputMode::Help { .. } => "j/k choose | enter open link | esc close".to_owned(),
        InputMode::Normal => normal_hints(state.view).to_owned(),
    };
    if let Some(latest) = &state.update_notice {
        text.push_str(&format!("  *  update available: {latest}"));
    }
    text
}

fn normal_hints(view: ViewState) -> &'static str {
    match view {
        ViewState::MainMenu => "j/k move | enter open | 1-9 jump | w web | ? help | q quit",
        ViewState::ItemDetail => "esc back | w web | ? help | q quit",
        ViewState::GlobalSearch => {
            "j/k move | enter open | / new search | esc back | w web | ? help | q quit"
        }
        _ => "j/k move | enter open | esc back | / filter | 1-9 jump | w web | ? help | q quit",
    }
}

pub(crate) fn help_overlay_text(cursor: usize) -> String {
    let mut lines = vec![
        "j/k or ↑/↓    move".to_owned(),
        "enter/l/→     open".to_owned(),
        "esc/h/←/bksp  back".to_owned(),
        "/             filter (search view: new query)".to_owned(),
        "digits        jump to row number".to_owned(),
        "w             open in browser".to_owned(),
        "?             toggle help".to_owned(),
        "q or ctrl+c   quit".to_owned(),
        String::new(),
        "Links".to_owned(),
    ];
    lines.extend(HELP_LINKS.iter().enumerate().map(|(index, link)| {
        let marker = if index == cursor { CURSOR_MARK } else { " " };
        format!("{marker} {}  {}", link.label, link.url)
    }));
    lines.join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        breadcrumb, detail_lines, format_timestamp, help_overlay_text, list_rows, loading_text,
        render, status_text,
    };
    use mbx_app::{
        AppState, Command, Input, ItemDetail, ItemModel, Key, LoadCompleted, LoadPayload, Person,
        Schema,
    };
    use mbx_testkit::{MetabaseFaker, fixture_datetime};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn press(state: &mut AppState, key: Key) -> Option<Command> {
        state.handle(Input::Key(key))
    }

    fn deliver(state: &mut AppState, command: Option<Command>, payload: LoadPayload) {
        let Some(Command::Load { id, .. }) = command else {
            panic!("expected load, got {command:?}");
        };
        state.handle(Input::Loaded(LoadCompleted {
            id,
            result: Ok(payload),
        }));
    }

    fn browsing_items(count: usize, viewport: usize) -> AppState {
        let mut faker = MetabaseFaker::new(21);
        let mut state = AppState::new("https://mb.example.com", viewport);
        let command = press(&mut state, Key::Enter);
        deliver(
            &mut state,
            command,
            LoadPayload::Collections(faker.collections(2)),
        );
        press(&mut state, Key::Down);
        let command = press(&mut state, Key::Enter);
        let items = (0..count)
            .map(|_| faker.item_of(ItemModel::Card))
            .collect();
        deliver(&mut state, command, LoadPayload::CollectionItems(items));
        state
    }

    #[test]
    fn timestamps_render_in_long_form() {
        assert_eq!(format_timestamp(fixture_datetime()), "Feb 19, 2026 at 12:34 PM");
        assert_eq!(
            format_timestamp("2024-01-05T09:07:00.123456Z"),
            "Jan 5, 2024 at 9:07 AM"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn main_menu_rows_are_numbered_with_cursor() {
        let state = AppState::new("https://mb.example.com", 15);
        let rows = list_rows(&state);
        let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
        assert_eq!(labels, vec!["Collections", "Databases", "Search"]);
        assert_eq!(rows[0].number, 1);
        assert!(rows[0].selected);
        assert!(!rows[2].selected);
    }

    #[test]
    fn long_lists_render_only_the_viewport() {
        let mut state = browsing_items(12, 5);
        for _ in 0..7 {
            press(&mut state, Key::Down);
        }
        let rows = list_rows(&state);
        assert_eq!(rows.len(), 5);
        let numbers: Vec<usize> = rows.iter().map(|row| row.number).collect();
        assert_eq!(numbers, vec![4, 5, 6, 7, 8]);
        assert!(rows[4].selected);
    }

    #[test]
    fn breadcrumb_follows_collection_stack() {
        let state = browsing_items(1, 15);
        let crumb = breadcrumb(&state);
        assert!(crumb.starts_with("Metabase › Collections › "), "{crumb}");
        assert_eq!(crumb.matches(" › ").count(), 2);
    }

    #[test]
    fn breadcrumb_shows_database_path() {
        let mut faker = MetabaseFaker::new(4);
        let mut state = AppState::new("https://mb.example.com", 15);
        press(&mut state, Key::Down);
        let command = press(&mut state, Key::Enter);
        deliver(&mut state, command, LoadPayload::Databases(faker.databases(1)));
        let command = press(&mut state, Key::Enter);
        deliver(
            &mut state,
            command,
            LoadPayload::Schemas(vec![Schema {
                name: "public".to_owned(),
                table_count: 2,
            }]),
        );
        assert_eq!(breadcrumb(&state), "Metabase › Databases › Sample Database › public");
        assert!(loading_text(&state).contains("Loading tables"));
    }

    #[test]
    fn search_mode_status_shows_query_and_matches() {
        let mut state = browsing_items(3, 15);
        press(&mut state, Key::Char('/'));
        for ch in "zzz".chars() {
            press(&mut state, Key::Char(ch));
        }
        let status = status_text(&state);
        assert!(status.starts_with("/zzz"), "{status}");
        assert!(status.contains("0 matches"), "{status}");
    }

    #[test]
    fn update_notice_is_appended_to_status() {
        let mut state = AppState::new("https://mb.example.com", 15);
        state.handle(Input::UpdateChecked(Some("v2.0.0".to_owned())));
        assert!(status_text(&state).ends_with("update available: v2.0.0"));
    }

    #[test]
    fn detail_lines_show_authors_and_dates() {
        let mut state = browsing_items(2, 15);
        let command = press(&mut state, Key::Enter);
        deliver(
            &mut state,
            command,
            LoadPayload::ItemDetail(Some(ItemDetail {
                creator: Some(Person {
                    first_name: Some("Ada".to_owned()),
                    last_name: Some("Lovelace".to_owned()),
                    email: None,
                }),
                last_edit: None,
                created_at: Some(fixture_datetime().to_owned()),
                updated_at: None,
            })),
        );
        let lines = detail_lines(&state);
        assert!(lines.contains(&"Type: question".to_owned()), "{lines:?}");
        assert!(lines.contains(&"Created by: Ada Lovelace".to_owned()));
        assert!(lines.contains(&"Created: Feb 19, 2026 at 12:34 PM".to_owned()));
    }

    #[test]
    fn help_overlay_marks_selected_link() {
        let text = help_overlay_text(1);
        let marked: Vec<&str> = text.lines().filter(|line| line.starts_with('▶')).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("issues"));
    }

    #[test]
    fn full_frame_renders_to_test_backend() -> anyhow::Result<()> {
        let mut terminal = Terminal::new(TestBackend::new(80, 24))?;
        let mut state = AppState::new("https://mb.example.com", 15);
        let screen = |terminal: &Terminal<TestBackend>| -> String {
            terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|cell| cell.symbol())
                .collect()
        };

        terminal.draw(|frame| render(frame, &state))?;
        let main = screen(&terminal);
        assert!(main.contains("Collections"));
        assert!(main.contains("q quit"));

        press(&mut state, Key::Char('?'));
        terminal.draw(|frame| render(frame, &state))?;
        assert!(screen(&terminal).contains("toggle help"));
        Ok(())
    }
}
