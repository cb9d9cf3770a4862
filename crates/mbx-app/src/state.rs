// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::filter::QuickFilter;
use crate::load::{LoadCompleted, LoadPayload, LoadRequest, PendingLoad, RequestId};
use crate::model::{
    Collection, CollectionItem, CollectionRef, Database, Field, ItemDetail, ItemModel,
    MainMenuEntry, Named, Schema, Table,
};
use crate::numeric::NumberInput;
use crate::stack::CollectionStack;
use crate::viewport::Viewport;
use tracing::{debug, warn};

pub const SPINNER_FRAMES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpLink {
    pub label: &'static str,
    pub url: &'static str,
}

pub const HELP_LINKS: [HelpLink; 3] = [
    HelpLink {
        label: "Project home",
        url: "https://github.com/mbx-dev/mbx",
    },
    HelpLink {
        label: "Report an issue",
        url: "https://github.com/mbx-dev/mbx/issues",
    },
    HelpLink {
        label: "Creating a Metabase API key",
        url: "https://www.metabase.com/docs/latest/people-and-groups/api-keys",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    MainMenu,
    Databases,
    Schemas,
    Tables,
    Fields,
    Collections,
    CollectionItems,
    ItemDetail,
    GlobalSearch,
}

impl ViewState {
    pub const fn title(self) -> &'static str {
        match self {
            Self::MainMenu => "Metabase Explorer",
            Self::Databases => "Databases",
            Self::Schemas => "Schemas",
            Self::Tables => "Tables",
            Self::Fields => "Fields",
            Self::Collections => "Collections",
            Self::CollectionItems => "Collection",
            Self::ItemDetail => "Details",
            Self::GlobalSearch => "Search",
        }
    }

    /// Views whose lists can grow past one screen are windowed.
    pub const fn uses_viewport(self) -> bool {
        matches!(self, Self::CollectionItems | Self::GlobalSearch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Search {
        query: String,
    },
    NumericEntry(NumberInput),
    Help {
        cursor: usize,
    },
}

/// Keys as the state machine sees them; the terminal layer translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Backspace,
    Esc,
    Interrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Key(Key),
    Loaded(LoadCompleted),
    Tick,
    UpdateChecked(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load { id: RequestId, request: LoadRequest },
    OpenUrl(String),
    Quit,
}

/// Items of one view plus the indices that survive the active filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot<T> {
    items: Vec<T>,
    filtered: Vec<usize>,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
        }
    }
}

impl<T> ListSnapshot<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.filtered.clear();
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    fn clear_filter(&mut self) {
        self.filtered.clear();
    }
}

impl<T: Named> ListSnapshot<T> {
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(Named::label).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lists {
    pub databases: ListSnapshot<Database>,
    pub schemas: ListSnapshot<Schema>,
    pub tables: ListSnapshot<Table>,
    pub fields: ListSnapshot<Field>,
    pub collections: ListSnapshot<Collection>,
    pub items: ListSnapshot<CollectionItem>,
    pub search_results: ListSnapshot<CollectionItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationContext {
    pub cursor: usize,
    pub selected_database: Option<Database>,
    pub selected_schema: Option<Schema>,
    pub selected_table: Option<Table>,
    pub selected_collection: Option<CollectionRef>,
    pub selected_item: Option<CollectionItem>,
    pub collection_stack: CollectionStack,
    pub loading: bool,
    pub error: Option<String>,
    pending: Option<PendingLoad>,
}

impl NavigationContext {
    pub fn pending(&self) -> Option<PendingLoad> {
        self.pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub view: ViewState,
    pub mode: InputMode,
    pub nav: NavigationContext,
    pub lists: Lists,
    pub viewport: Viewport,
    pub detail: Option<ItemDetail>,
    pub detail_origin: ViewState,
    /// Last query submitted from the search view.
    pub search_query: String,
    pub spinner_frame: usize,
    pub update_notice: Option<String>,
    base_url: String,
    next_request_id: RequestId,
}

impl AppState {
    pub fn new(base_url: impl Into<String>, viewport_height: usize) -> Self {
        Self {
            view: ViewState::MainMenu,
            mode: InputMode::Normal,
            nav: NavigationContext::default(),
            lists: Lists::default(),
            viewport: Viewport::new(viewport_height),
            detail: None,
            detail_origin: ViewState::CollectionItems,
            search_query: String::new(),
            spinner_frame: 0,
            update_notice: None,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            next_request_id: 0,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn handle(&mut self, input: Input) -> Option<Command> {
        match input {
            Input::Key(key) => self.handle_key(key),
            Input::Loaded(completed) => self.apply_load(completed),
            Input::Tick => {
                if self.nav.loading {
                    self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES;
                }
                None
            }
            Input::UpdateChecked(latest) => {
                self.update_notice = latest;
                None
            }
        }
    }

    /// Surfaces a failure from outside the state machine, such as a browser
    /// that would not launch.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.nav.error = Some(message.into());
    }

    pub fn search_text(&self) -> Option<&str> {
        match &self.mode {
            InputMode::Search { query } => Some(query),
            _ => None,
        }
    }

    /// True when a local quick filter narrows the current list.
    pub fn is_filtering(&self) -> bool {
        self.view != ViewState::GlobalSearch
            && self.search_text().is_some_and(|query| !query.is_empty())
    }

    pub fn displayed_len(&self) -> usize {
        if self.is_filtering() {
            self.filtered_indices().len()
        } else {
            self.list_len(self.view)
        }
    }

    /// Original indices in display order.
    pub fn displayed_indices(&self) -> Vec<usize> {
        if self.is_filtering() {
            self.filtered_indices().to_vec()
        } else {
            (0..self.list_len(self.view)).collect()
        }
    }

    pub fn original_index(&self, displayed: usize) -> Option<usize> {
        if self.is_filtering() {
            self.filtered_indices().get(displayed).copied()
        } else {
            (displayed < self.list_len(self.view)).then_some(displayed)
        }
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        self.original_index(self.nav.cursor)
    }

    pub fn visible_rows(&self) -> std::ops::Range<usize> {
        let len = self.displayed_len();
        if self.view.uses_viewport() {
            self.viewport.visible_range(len)
        } else {
            0..len
        }
    }

    fn list_len(&self, view: ViewState) -> usize {
        match view {
            ViewState::MainMenu => MainMenuEntry::ALL.len(),
            ViewState::Databases => self.lists.databases.len(),
            ViewState::Schemas => self.lists.schemas.len(),
            ViewState::Tables => self.lists.tables.len(),
            ViewState::Fields => self.lists.fields.len(),
            ViewState::Collections => self.lists.collections.len(),
            ViewState::CollectionItems => self.lists.items.len(),
            ViewState::GlobalSearch => self.lists.search_results.len(),
            ViewState::ItemDetail => 0,
        }
    }

    fn filtered_indices(&self) -> &[usize] {
        match self.view {
            ViewState::Databases => self.lists.databases.filtered(),
            ViewState::Schemas => self.lists.schemas.filtered(),
            ViewState::Tables => self.lists.tables.filtered(),
            ViewState::Fields => self.lists.fields.filtered(),
            ViewState::Collections => self.lists.collections.filtered(),
            ViewState::CollectionItems => self.lists.items.filtered(),
            ViewState::MainMenu | ViewState::ItemDetail | ViewState::GlobalSearch => &[],
        }
    }

    fn labels(&self, view: ViewState) -> Vec<&str> {
        match view {
            ViewState::Databases => self.lists.databases.labels(),
            ViewState::Schemas => self.lists.schemas.labels(),
            ViewState::Tables => self.lists.tables.labels(),
            ViewState::Fields => self.lists.fields.labels(),
            ViewState::Collections => self.lists.collections.labels(),
            ViewState::CollectionItems => self.lists.items.labels(),
            ViewState::GlobalSearch => self.lists.search_results.labels(),
            ViewState::MainMenu => MainMenuEntry::ALL.iter().map(|entry| entry.as_str()).collect(),
            ViewState::ItemDetail => Vec::new(),
        }
    }

    fn set_filtered(&mut self, view: ViewState, filtered: Vec<usize>) {
        match view {
            ViewState::Databases => self.lists.databases.filtered = filtered,
            ViewState::Schemas => self.lists.schemas.filtered = filtered,
            ViewState::Tables => self.lists.tables.filtered = filtered,
            ViewState::Fields => self.lists.fields.filtered = filtered,
            ViewState::Collections => self.lists.collections.filtered = filtered,
            ViewState::CollectionItems => self.lists.items.filtered = filtered,
            ViewState::MainMenu | ViewState::ItemDetail | ViewState::GlobalSearch => {}
        }
    }

    fn clear_filter(&mut self, view: ViewState) {
        match view {
            ViewState::Databases => self.lists.databases.clear_filter(),
            ViewState::Schemas => self.lists.schemas.clear_filter(),
            ViewState::Tables => self.lists.tables.clear_filter(),
            ViewState::Fields => self.lists.fields.clear_filter(),
            ViewState::Collections => self.lists.collections.clear_filter(),
            ViewState::CollectionItems => self.lists.items.clear_filter(),
            ViewState::MainMenu | ViewState::ItemDetail | ViewState::GlobalSearch => {}
        }
    }

    fn handle_key(&mut self, key: Key) -> Option<Command> {
        if key == Key::Interrupt {
            return Some(Command::Quit);
        }
        match &self.mode {
            InputMode::Help { .. } => self.handle_help_key(key),
            InputMode::Search { .. } if self.view == ViewState::GlobalSearch => {
                self.handle_query_key(key)
            }
            InputMode::Search { .. } => self.handle_search_key(key),
            InputMode::NumericEntry(_) => self.handle_numeric_key(key),
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_help_key(&mut self, key: Key) -> Option<Command> {
        let InputMode::Help { cursor } = self.mode else {
            return None;
        };
        match key {
            Key::Up | Key::Char('k') => {
                self.mode = InputMode::Help {
                    cursor: cursor.saturating_sub(1),
                };
                None
            }
            Key::Down | Key::Char('j') => {
                self.mode = InputMode::Help {
                    cursor: (cursor + 1).min(HELP_LINKS.len() - 1),
                };
                None
            }
            Key::Enter | Key::Right | Key::Char('l') => HELP_LINKS
                .get(cursor)
                .map(|link| Command::OpenUrl(link.url.to_owned())),
            Key::Esc | Key::Left | Key::Backspace | Key::Char('h' | '?') => {
                self.mode = InputMode::Normal;
                None
            }
            Key::Char('q') => Some(Command::Quit),
            _ => None,
        }
    }

    fn handle_search_key(&mut self, key: Key) -> Option<Command> {
        match key {
            Key::Esc => {
                self.mode = InputMode::Normal;
                self.clear_filter(self.view);
                self.jump_to_top();
                None
            }
            Key::Enter => {
                // Nothing matched: stay in the editor.
                let original = self.highlighted_index()?;
                self.mode = InputMode::Normal;
                self.clear_filter(self.view);
                self.nav.cursor = original;
                self.forward()
            }
            Key::Backspace => {
                let changed = match &mut self.mode {
                    InputMode::Search { query } => query.pop().is_some(),
                    _ => false,
                };
                if changed {
                    self.refilter();
                }
                None
            }
            Key::Up => {
                self.move_cursor(-1);
                None
            }
            Key::Down => {
                self.move_cursor(1);
                None
            }
            Key::Char(ch) => {
                if let InputMode::Search { query } = &mut self.mode {
                    query.push(ch);
                }
                self.refilter();
                None
            }
            _ => None,
        }
    }

    /// Search mode on the search view edits the server-side query instead of
    /// filtering locally.
    fn handle_query_key(&mut self, key: Key) -> Option<Command> {
        match key {
            Key::Esc => {
                self.mode = InputMode::Normal;
                if self.search_query.is_empty() && self.lists.search_results.is_empty() {
                    return self.back();
                }
                None
            }
            Key::Enter => {
                let query = self.search_text().unwrap_or_default().trim().to_owned();
                if query.is_empty() {
                    return None;
                }
                self.mode = InputMode::Normal;
                self.search_query = query.clone();
                self.lists.search_results.clear();
                self.jump_to_top();
                Some(self.schedule(LoadRequest::Search { query }))
            }
            Key::Backspace => {
                if let InputMode::Search { query } = &mut self.mode {
                    query.pop();
                }
                None
            }
            Key::Char(ch) => {
                if let InputMode::Search { query } = &mut self.mode {
                    query.push(ch);
                }
                None
            }
            _ => None,
        }
    }

    fn handle_numeric_key(&mut self, key: Key) -> Option<Command> {
        match key {
            Key::Char(digit) if digit.is_ascii_digit() => self.push_digit(digit),
            // A pending number swallows the first back key.
            Key::Left | Key::Backspace | Key::Esc | Key::Char('h') => {
                self.mode = InputMode::Normal;
                None
            }
            other => {
                self.mode = InputMode::Normal;
                self.handle_normal_key(other)
            }
        }
    }

    fn handle_normal_key(&mut self, key: Key) -> Option<Command> {
        match key {
            Key::Char('q') => Some(Command::Quit),
            Key::Char('?') => {
                self.mode = InputMode::Help { cursor: 0 };
                None
            }
            Key::Char('/') => {
                self.enter_search();
                None
            }
            Key::Char('w') => Some(Command::OpenUrl(self.web_url())),
            Key::Char(digit) if digit.is_ascii_digit() => self.push_digit(digit),
            Key::Up | Key::Char('k') => {
                self.move_cursor(-1);
                None
            }
            Key::Down | Key::Char('j') => {
                self.move_cursor(1);
                None
            }
            Key::Enter | Key::Right | Key::Char('l') => self.forward(),
            Key::Left | Key::Backspace | Key::Esc | Key::Char('h') => self.back(),
            _ => None,
        }
    }

    fn push_digit(&mut self, digit: char) -> Option<Command> {
        if self.nav.loading {
            return None;
        }
        let count = self.displayed_len();
        let mut input = match std::mem::take(&mut self.mode) {
            InputMode::NumericEntry(input) => input,
            _ => NumberInput::default(),
        };
        if let Some(target) = input.push(digit, count) {
            self.nav.cursor = target;
            self.follow_viewport();
        }
        if !input.is_empty() {
            self.mode = InputMode::NumericEntry(input);
        }
        None
    }

    fn enter_search(&mut self) {
        if self.nav.loading || matches!(self.view, ViewState::MainMenu | ViewState::ItemDetail) {
            return;
        }
        if self.view == ViewState::GlobalSearch {
            self.mode = InputMode::Search {
                query: self.search_query.clone(),
            };
            return;
        }
        self.mode = InputMode::Search {
            query: String::new(),
        };
        self.clear_filter(self.view);
        self.jump_to_top();
    }

    fn refilter(&mut self) {
        let view = self.view;
        let ranked = {
            let query = self.search_text().unwrap_or_default();
            QuickFilter::default().rank(query, &self.labels(view))
        };
        self.set_filtered(view, ranked);
        self.jump_to_top();
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.displayed_len();
        self.nav.cursor = if len == 0 {
            0
        } else {
            self.nav.cursor.saturating_add_signed(delta).min(len - 1)
        };
        self.follow_viewport();
    }

    fn jump_to_top(&mut self) {
        self.nav.cursor = 0;
        self.viewport.reset();
    }

    fn follow_viewport(&mut self) {
        if self.view.uses_viewport() {
            self.viewport.follow(self.nav.cursor, self.displayed_len());
        }
    }

    fn forward(&mut self) -> Option<Command> {
        if self.nav.loading {
            return None;
        }
        let index = self.nav.cursor;
        match self.view {
            ViewState::MainMenu => match *MainMenuEntry::ALL.get(index)? {
                MainMenuEntry::Collections => {
                    Some(self.descend(ViewState::Collections, LoadRequest::Collections))
                }
                MainMenuEntry::Databases => {
                    Some(self.descend(ViewState::Databases, LoadRequest::Databases))
                }
                MainMenuEntry::Search => {
                    self.enter_view(ViewState::GlobalSearch);
                    self.search_query.clear();
                    self.mode = InputMode::Search {
                        query: String::new(),
                    };
                    None
                }
            },
            ViewState::Databases => {
                let database = self.lists.databases.get(index)?.clone();
                let request = LoadRequest::Schemas {
                    database: database.id,
                };
                self.nav.selected_database = Some(database);
                Some(self.descend(ViewState::Schemas, request))
            }
            ViewState::Schemas => {
                let schema = self.lists.schemas.get(index)?.clone();
                self.open_schema(schema)
            }
            ViewState::Tables => {
                let table = self.lists.tables.get(index)?.clone();
                let request = LoadRequest::Fields { table: table.id };
                self.nav.selected_table = Some(table);
                Some(self.descend(ViewState::Fields, request))
            }
            ViewState::Fields | ViewState::ItemDetail => None,
            ViewState::Collections => {
                let collection = CollectionRef::from(self.lists.collections.get(index)?);
                self.nav.collection_stack.clear();
                Some(self.open_collection(collection))
            }
            ViewState::CollectionItems => {
                let item = self.lists.items.get(index)?.clone();
                if item.model == ItemModel::Collection {
                    if let Some(current) = self.nav.selected_collection.take() {
                        self.nav.collection_stack.push(current);
                    }
                    Some(self.open_collection(CollectionRef::from(&item)))
                } else {
                    Some(self.open_item(item, ViewState::CollectionItems))
                }
            }
            ViewState::GlobalSearch => {
                let item = self.lists.search_results.get(index)?.clone();
                if item.model == ItemModel::Collection {
                    self.nav.collection_stack.clear();
                    Some(self.open_collection(CollectionRef::from(&item)))
                } else {
                    Some(self.open_item(item, ViewState::GlobalSearch))
                }
            }
        }
    }

    fn open_schema(&mut self, schema: Schema) -> Option<Command> {
        let database = self.nav.selected_database.as_ref()?.id;
        let request = LoadRequest::Tables {
            database,
            schema: schema.name.clone(),
        };
        self.nav.selected_schema = Some(schema);
        Some(self.descend(ViewState::Tables, request))
    }

    fn open_collection(&mut self, collection: CollectionRef) -> Command {
        let request = LoadRequest::CollectionItems {
            collection: collection.id.clone(),
        };
        self.nav.selected_collection = Some(collection);
        self.descend(ViewState::CollectionItems, request)
    }

    fn open_item(&mut self, item: CollectionItem, origin: ViewState) -> Command {
        let request = LoadRequest::ItemDetail {
            item: item.id,
            model: item.model,
        };
        self.detail_origin = origin;
        self.nav.selected_item = Some(item);
        self.descend(ViewState::ItemDetail, request)
    }

    fn descend(&mut self, view: ViewState, request: LoadRequest) -> Command {
        debug!(from = ?self.view, to = ?view, "forward");
        self.enter_view(view);
        self.schedule(request)
    }

    fn enter_view(&mut self, view: ViewState) {
        self.view = view;
        self.mode = InputMode::Normal;
        self.nav.error = None;
        self.jump_to_top();
        match view {
            ViewState::Databases => {
                self.lists.databases.clear();
                self.lists.schemas.clear();
                self.lists.tables.clear();
                self.lists.fields.clear();
            }
            ViewState::Schemas => {
                self.lists.schemas.clear();
                self.lists.tables.clear();
                self.lists.fields.clear();
            }
            ViewState::Tables => {
                self.lists.tables.clear();
                self.lists.fields.clear();
            }
            ViewState::Fields => self.lists.fields.clear(),
            ViewState::Collections => {
                self.lists.collections.clear();
                self.lists.items.clear();
                self.detail = None;
            }
            ViewState::CollectionItems => {
                self.lists.items.clear();
                self.detail = None;
            }
            ViewState::ItemDetail => self.detail = None,
            ViewState::GlobalSearch => {
                self.lists.search_results.clear();
                self.detail = None;
            }
            ViewState::MainMenu => {}
        }
    }

    fn schedule(&mut self, request: LoadRequest) -> Command {
        self.next_request_id += 1;
        let id = self.next_request_id;
        let kind = request.kind();
        debug!(id, kind = kind.as_str(), "scheduling load");
        self.nav.pending = Some(PendingLoad { id, kind });
        self.nav.loading = true;
        self.spinner_frame = 0;
        Command::Load { id, request }
    }

    fn back(&mut self) -> Option<Command> {
        let parent = match self.view {
            ViewState::MainMenu => return None,
            ViewState::Databases => {
                self.lists.databases.clear();
                ViewState::MainMenu
            }
            ViewState::Collections => {
                self.lists.collections.clear();
                ViewState::MainMenu
            }
            ViewState::GlobalSearch => {
                self.lists.search_results.clear();
                self.search_query.clear();
                ViewState::MainMenu
            }
            ViewState::Schemas => {
                self.lists.schemas.clear();
                self.nav.selected_database = None;
                ViewState::Databases
            }
            ViewState::Tables => {
                self.lists.tables.clear();
                self.nav.selected_schema = None;
                ViewState::Schemas
            }
            ViewState::Fields => {
                self.lists.fields.clear();
                self.nav.selected_table = None;
                ViewState::Tables
            }
            ViewState::CollectionItems => {
                self.lists.items.clear();
                self.nav.selected_collection = None;
                self.cancel_pending();
                if let Some(parent) = self.nav.collection_stack.pop() {
                    debug!(collection = %parent.id, "back to parent collection");
                    return Some(self.open_collection(parent));
                }
                if self.lists.collections.is_empty() {
                    // Reached from search, so the top-level list was never loaded.
                    return Some(self.descend(ViewState::Collections, LoadRequest::Collections));
                }
                ViewState::Collections
            }
            ViewState::ItemDetail => {
                self.detail = None;
                self.nav.selected_item = None;
                self.detail_origin
            }
        };
        debug!(from = ?self.view, to = ?parent, "back");
        self.cancel_pending();
        self.view = parent;
        self.mode = InputMode::Normal;
        self.nav.error = None;
        self.clear_filter(parent);
        self.jump_to_top();
        None
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.nav.pending.take() {
            debug!(id = pending.id, kind = pending.kind.as_str(), "abandoning load");
        }
        self.nav.loading = false;
    }

    fn apply_load(&mut self, completed: LoadCompleted) -> Option<Command> {
        let Some(pending) = self.nav.pending.filter(|pending| pending.id == completed.id) else {
            debug!(id = completed.id, "discarding stale completion");
            return None;
        };
        self.nav.pending = None;
        self.nav.loading = false;
        let payload = match completed.result {
            Ok(payload) => payload,
            Err(message) => {
                warn!(id = pending.id, kind = pending.kind.as_str(), error = %message, "load failed");
                self.nav.error = Some(message);
                return None;
            }
        };
        if payload.kind() != pending.kind {
            warn!(
                id = pending.id,
                expected = pending.kind.as_str(),
                got = payload.kind().as_str(),
                "discarding mismatched completion"
            );
            return None;
        }
        self.nav.error = None;
        self.jump_to_top();
        match payload {
            LoadPayload::Databases(databases) => self.lists.databases.replace(databases),
            LoadPayload::Schemas(schemas) => {
                let only = (schemas.len() == 1).then(|| schemas[0].clone());
                self.lists.schemas.replace(schemas);
                if let Some(schema) = only {
                    debug!(schema = %schema.name, "single schema, skipping to tables");
                    // A completion never closes the help overlay.
                    let help =
                        matches!(self.mode, InputMode::Help { .. }).then(|| self.mode.clone());
                    let command = self.open_schema(schema);
                    if let Some(help) = help {
                        self.mode = help;
                    }
                    return command;
                }
            }
            LoadPayload::Tables(tables) => self.lists.tables.replace(tables),
            LoadPayload::Fields(fields) => self.lists.fields.replace(fields),
            LoadPayload::Collections(collections) => self.lists.collections.replace(collections),
            LoadPayload::CollectionItems(items) => self.lists.items.replace(items),
            LoadPayload::ItemDetail(detail) => self.detail = detail,
            LoadPayload::Search(results) => self.lists.search_results.replace(results),
        }
        None
    }
}
