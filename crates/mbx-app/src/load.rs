// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::{CollectionId, DatabaseId, ItemId, TableId};
use crate::model::{
    Collection, CollectionItem, Database, Field, ItemDetail, ItemModel, Schema, Table,
};

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Databases,
    Schemas,
    Tables,
    Fields,
    Collections,
    CollectionItems,
    ItemDetail,
    Search,
}

impl LoadKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Databases => "databases",
            Self::Schemas => "schemas",
            Self::Tables => "tables",
            Self::Fields => "fields",
            Self::Collections => "collections",
            Self::CollectionItems => "collection items",
            Self::ItemDetail => "item detail",
            Self::Search => "search",
        }
    }
}

/// What a view needs fetched before it can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Databases,
    Schemas { database: DatabaseId },
    Tables { database: DatabaseId, schema: String },
    Fields { table: TableId },
    Collections,
    CollectionItems { collection: CollectionId },
    ItemDetail { item: ItemId, model: ItemModel },
    Search { query: String },
}

impl LoadRequest {
    pub fn kind(&self) -> LoadKind {
        match self {
            Self::Databases => LoadKind::Databases,
            Self::Schemas { .. } => LoadKind::Schemas,
            Self::Tables { .. } => LoadKind::Tables,
            Self::Fields { .. } => LoadKind::Fields,
            Self::Collections => LoadKind::Collections,
            Self::CollectionItems { .. } => LoadKind::CollectionItems,
            Self::ItemDetail { .. } => LoadKind::ItemDetail,
            Self::Search { .. } => LoadKind::Search,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPayload {
    Databases(Vec<Database>),
    Schemas(Vec<Schema>),
    Tables(Vec<Table>),
    Fields(Vec<Field>),
    Collections(Vec<Collection>),
    CollectionItems(Vec<CollectionItem>),
    /// `None` for models the server has no detail endpoint for.
    ItemDetail(Option<ItemDetail>),
    Search(Vec<CollectionItem>),
}

impl LoadPayload {
    pub fn kind(&self) -> LoadKind {
        match self {
            Self::Databases(_) => LoadKind::Databases,
            Self::Schemas(_) => LoadKind::Schemas,
            Self::Tables(_) => LoadKind::Tables,
            Self::Fields(_) => LoadKind::Fields,
            Self::Collections(_) => LoadKind::Collections,
            Self::CollectionItems(_) => LoadKind::CollectionItems,
            Self::ItemDetail(_) => LoadKind::ItemDetail,
            Self::Search(_) => LoadKind::Search,
        }
    }
}

/// Outcome of one fetch, tagged with the id it was scheduled under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCompleted {
    pub id: RequestId,
    pub result: Result<LoadPayload, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLoad {
    pub id: RequestId,
    pub kind: LoadKind,
}
