// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::{CollectionId, DatabaseId, FieldId, ItemId, TableId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Tables whose schema is empty are grouped under this name.
pub const DEFAULT_SCHEMA_NAME: &str = "default";

/// Display name used for the instance-wide root collection.
pub const ROOT_COLLECTION_NAME: &str = "Our analytics";

/// Anything that shows up as a row in a list view.
pub trait Named {
    fn label(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainMenuEntry {
    Collections,
    Databases,
    Search,
}

impl MainMenuEntry {
    pub const ALL: [Self; 3] = [Self::Collections, Self::Databases, Self::Search];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collections => "Collections",
            Self::Databases => "Databases",
            Self::Search => "Search",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Collections => "questions, models, metrics and dashboards",
            Self::Databases => "schemas, tables and fields",
            Self::Search => "search the whole instance",
        }
    }
}

impl Named for MainMenuEntry {
    fn label(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: DatabaseId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub engine: String,
}

impl Named for Database {
    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub table_count: usize,
}

impl Named for Schema {
    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schema: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Table {
    pub fn schema_name(&self) -> &str {
        if self.schema.is_empty() {
            DEFAULT_SCHEMA_NAME
        } else {
            &self.schema
        }
    }
}

impl Named for Table {
    fn label(&self) -> &str {
        display_or_name(&self.display_name, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub effective_type: Option<String>,
    #[serde(default)]
    pub semantic_type: Option<String>,
    #[serde(default)]
    pub database_type: Option<String>,
    #[serde(default)]
    pub table_id: Option<TableId>,
    #[serde(default)]
    pub position: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, rename = "visibility_type")]
    pub visibility: Option<String>,
}

impl Field {
    /// The most specific type the server reported, with the `type/` prefix
    /// stripped.
    pub fn type_label(&self) -> &str {
        let raw = self
            .effective_type
            .as_deref()
            .or(self.base_type.as_deref())
            .unwrap_or("");
        raw.strip_prefix("type/").unwrap_or(raw)
    }
}

impl Named for Field {
    fn label(&self) -> &str {
        display_or_name(&self.display_name, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub personal_owner_id: Option<i64>,
}

impl Named for Collection {
    fn label(&self) -> &str {
        &self.name
    }
}

/// A collection as remembered by navigation: just enough to refetch it and
/// print it in a breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    #[serde(deserialize_with = "null_as_root")]
    pub id: CollectionId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl CollectionRef {
    pub fn root() -> Self {
        Self {
            id: CollectionId::root(),
            name: ROOT_COLLECTION_NAME.to_owned(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() && self.id.is_root() {
            ROOT_COLLECTION_NAME
        } else {
            &self.name
        }
    }
}

impl From<&Collection> for CollectionRef {
    fn from(collection: &Collection) -> Self {
        Self {
            id: collection.id.clone(),
            name: collection.name.clone(),
        }
    }
}

impl From<&CollectionItem> for CollectionRef {
    fn from(item: &CollectionItem) -> Self {
        Self {
            id: CollectionId::from(item.id),
            name: item.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemModel {
    Card,
    Dataset,
    Metric,
    Dashboard,
    Collection,
    Table,
    Database,
    Pulse,
    Snippet,
    #[serde(other)]
    Other,
}

impl ItemModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "question",
            Self::Dataset => "model",
            Self::Metric => "metric",
            Self::Dashboard => "dashboard",
            Self::Collection => "collection",
            Self::Table => "table",
            Self::Database => "database",
            Self::Pulse => "pulse",
            Self::Snippet => "snippet",
            Self::Other => "item",
        }
    }

    /// Models served by `/api/card/{id}`.
    pub const fn is_card(self) -> bool {
        matches!(self, Self::Card | Self::Dataset | Self::Metric)
    }

    pub const fn has_detail(self) -> bool {
        self.is_card() || matches!(self, Self::Dashboard)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub model: ItemModel,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub collection: Option<CollectionRef>,
}

impl Named for CollectionItem {
    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Person {
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.email.clone().unwrap_or_default()
        } else {
            full
        }
    }
}

/// Authorship and timestamps for a question, model, metric or dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(default)]
    pub creator: Option<Person>,
    #[serde(default, rename = "last-edit-info")]
    pub last_edit: Option<Person>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Groups tables by schema name and counts them, sorted by name.
pub fn extract_schemas(tables: &[Table]) -> Vec<Schema> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for table in tables {
        *counts.entry(table.schema_name()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, table_count)| Schema {
            name: name.to_owned(),
            table_count,
        })
        .collect()
}

pub fn tables_in_schema(tables: Vec<Table>, schema: &str) -> Vec<Table> {
    tables
        .into_iter()
        .filter(|table| table.schema_name() == schema)
        .collect()
}

fn display_or_name<'a>(display_name: &'a str, name: &'a str) -> &'a str {
    if display_name.is_empty() {
        name
    } else {
        display_name
    }
}

fn default_true() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_root<'de, D>(deserializer: D) -> Result<CollectionId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CollectionId>::deserialize(deserializer)?.unwrap_or_else(CollectionId::root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn table(id: i64, name: &str, schema: &str) -> Table {
        Table {
            id: TableId::new(id),
            name: name.to_owned(),
            display_name: String::new(),
            schema: schema.to_owned(),
            description: None,
        }
    }

    #[test]
    fn extract_schemas_groups_counts_and_sorts() {
        let tables = vec![
            table(1, "orders", "public"),
            table(2, "events", "analytics"),
            table(3, "people", "public"),
            table(4, "scratch", ""),
        ];
        let schemas = extract_schemas(&tables);
        let summary: Vec<(&str, usize)> = schemas
            .iter()
            .map(|schema| (schema.name.as_str(), schema.table_count))
            .collect();
        assert_eq!(
            summary,
            vec![("analytics", 1), ("default", 1), ("public", 2)]
        );
    }

    #[test]
    fn tables_in_schema_maps_empty_schema_to_default() {
        let tables = vec![table(1, "orders", "public"), table(2, "scratch", "")];
        let kept = tables_in_schema(tables, DEFAULT_SCHEMA_NAME);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "scratch");
    }

    #[test]
    fn tables_and_fields_prefer_display_name() {
        let mut orders = table(1, "orders", "public");
        assert_eq!(orders.label(), "orders");
        orders.display_name = "Orders".to_owned();
        assert_eq!(orders.label(), "Orders");
    }

    #[test]
    fn unknown_item_models_are_preserved_as_other() -> Result<()> {
        let item: CollectionItem = serde_json::from_str(
            r#"{"id": 3, "name": "Weekly", "model": "timeline", "description": null}"#,
        )?;
        assert_eq!(item.model, ItemModel::Other);
        assert!(!item.model.has_detail());
        Ok(())
    }

    #[test]
    fn search_result_with_null_collection_points_at_root() -> Result<()> {
        let item: CollectionItem = serde_json::from_str(
            r#"{"id": 9, "name": "Revenue", "model": "card",
                "collection": {"id": null, "name": null}}"#,
        )?;
        let parent = item.collection.expect("collection present");
        assert!(parent.id.is_root());
        assert_eq!(parent.display_name(), ROOT_COLLECTION_NAME);
        Ok(())
    }

    #[test]
    fn field_type_label_strips_prefix_and_prefers_effective_type() -> Result<()> {
        let field: Field = serde_json::from_str(
            r#"{"id": 1, "name": "created_at", "display_name": "Created At",
                "base_type": "type/DateTimeWithLocalTZ",
                "effective_type": "type/DateTime", "visibility_type": "normal"}"#,
        )?;
        assert_eq!(field.type_label(), "DateTime");
        assert!(field.active);
        assert_eq!(field.visibility.as_deref(), Some("normal"));
        Ok(())
    }

    #[test]
    fn person_display_name_falls_back_to_email() {
        let person = Person {
            first_name: None,
            last_name: Some(String::new()),
            email: Some("ada@example.com".to_owned()),
        };
        assert_eq!(person.display_name(), "ada@example.com");
        let named = Person {
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            email: None,
        };
        assert_eq!(named.display_name(), "Ada Lovelace");
    }
}
