// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::CollectionId;
use crate::model::{CollectionItem, ItemModel};
use crate::state::{AppState, ViewState};

impl AppState {
    /// Browser URL for the highlighted row, or for the surrounding context
    /// when the list is empty.
    pub fn web_url(&self) -> String {
        let base = self.base_url();
        let highlighted = self.highlighted_index();
        let database = self.nav.selected_database.as_ref().map(|db| db.id);
        match self.view {
            ViewState::MainMenu => base.to_owned(),
            ViewState::Databases => match highlighted.and_then(|i| self.lists.databases.get(i)) {
                Some(db) => format!("{base}/browse/databases/{}", db.id),
                None => format!("{base}/browse/databases"),
            },
            ViewState::Schemas => match (database, highlighted.and_then(|i| self.lists.schemas.get(i))) {
                (Some(db), Some(schema)) => {
                    format!("{base}/browse/databases/{db}/schema/{}", schema.name)
                }
                (Some(db), None) => format!("{base}/browse/databases/{db}"),
                (None, _) => base.to_owned(),
            },
            ViewState::Tables => match (database, highlighted.and_then(|i| self.lists.tables.get(i))) {
                (Some(db), Some(table)) => {
                    format!("{base}/reference/databases/{db}/tables/{}", table.id)
                }
                (Some(db), None) => format!("{base}/admin/databases/{db}"),
                (None, _) => base.to_owned(),
            },
            ViewState::Fields => {
                let table = self.nav.selected_table.as_ref().map(|table| table.id);
                let field = highlighted.and_then(|i| self.lists.fields.get(i));
                match (database, table, field) {
                    (Some(db), Some(table), Some(field)) => format!(
                        "{base}/reference/databases/{db}/tables/{table}/fields/{}",
                        field.id
                    ),
                    (Some(db), Some(table), None) => {
                        format!("{base}/reference/databases/{db}/tables/{table}")
                    }
                    _ => base.to_owned(),
                }
            }
            ViewState::Collections => match highlighted.and_then(|i| self.lists.collections.get(i))
            {
                Some(collection) => collection_url(base, &collection.id),
                None => format!("{base}/collection/root"),
            },
            ViewState::CollectionItems => {
                match highlighted.and_then(|i| self.lists.items.get(i)) {
                    Some(item) if linkable(item.model) => item_url(base, item),
                    _ => self.current_collection_url(),
                }
            }
            ViewState::ItemDetail => match &self.nav.selected_item {
                Some(item) if linkable(item.model) => item_url(base, item),
                _ => self.current_collection_url(),
            },
            ViewState::GlobalSearch => {
                match highlighted.and_then(|i| self.lists.search_results.get(i)) {
                    Some(item) if linkable(item.model) => item_url(base, item),
                    Some(CollectionItem {
                        collection: Some(parent),
                        ..
                    }) => collection_url(base, &parent.id),
                    _ => {
                        let query: String =
                            url::form_urlencoded::byte_serialize(self.search_query.as_bytes())
                                .collect();
                        format!("{base}/search?q={query}")
                    }
                }
            }
        }
    }

    fn current_collection_url(&self) -> String {
        let id = self
            .nav
            .selected_collection
            .as_ref()
            .map(|collection| collection.id.clone())
            .unwrap_or_else(CollectionId::root);
        collection_url(self.base_url(), &id)
    }
}

fn linkable(model: ItemModel) -> bool {
    model.is_card() || matches!(model, ItemModel::Dashboard | ItemModel::Collection)
}

fn item_url(base: &str, item: &CollectionItem) -> String {
    match item.model {
        ItemModel::Dashboard => format!("{base}/dashboard/{}", item.id),
        ItemModel::Collection => collection_url(base, &CollectionId::from(item.id)),
        _ => format!("{base}/question/{}", item.id),
    }
}

fn collection_url(base: &str, id: &CollectionId) -> String {
    format!("{base}/collection/{id}")
}
