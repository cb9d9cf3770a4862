// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use mbx_app::{
    Collection, CollectionId, CollectionItem, CollectionRef, Database, DatabaseId, Field, FieldId,
    ItemId, ItemModel, Table, TableId,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Response, Server};

const DATABASE_NAMES: [&str; 8] = [
    "Sample Database",
    "Warehouse",
    "Product Analytics",
    "Billing",
    "Support Desk",
    "Inventory",
    "Marketing Events",
    "Finance Ledger",
];

const ENGINES: [&str; 5] = ["postgres", "mysql", "h2", "bigquery-cloud-sdk", "snowflake"];

const TABLE_NAMES: [&str; 16] = [
    "orders",
    "people",
    "products",
    "reviews",
    "accounts",
    "invoices",
    "events",
    "sessions",
    "subscriptions",
    "payments",
    "tickets",
    "shipments",
    "campaigns",
    "refunds",
    "feedback",
    "plans",
];

const FIELD_NAMES: [(&str, &str); 12] = [
    ("id", "type/BigInteger"),
    ("created_at", "type/DateTime"),
    ("updated_at", "type/DateTime"),
    ("user_id", "type/Integer"),
    ("email", "type/Text"),
    ("status", "type/Text"),
    ("total", "type/Float"),
    ("quantity", "type/Integer"),
    ("country", "type/Text"),
    ("is_active", "type/Boolean"),
    ("source", "type/Text"),
    ("notes", "type/Text"),
];

const COLLECTION_NAMES: [&str; 10] = [
    "Marketing",
    "Finance",
    "Product",
    "Operations",
    "Customer Success",
    "Executive",
    "Growth",
    "Data Team",
    "Sales",
    "Engineering",
];

const ITEM_SUBJECTS: [&str; 12] = [
    "Revenue",
    "Active users",
    "Churn",
    "Orders",
    "Signups",
    "Refund rate",
    "Ticket volume",
    "Conversion",
    "Pipeline",
    "Retention",
    "Margin",
    "Inventory levels",
];

const ITEM_QUALIFIERS: [&str; 8] = [
    "by month",
    "by region",
    "this quarter",
    "trend",
    "overview",
    "by plan",
    "last 30 days",
    "by channel",
];

const ITEM_MODELS: [ItemModel; 5] = [
    ItemModel::Card,
    ItemModel::Dataset,
    ItemModel::Metric,
    ItemModel::Dashboard,
    ItemModel::Collection,
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of Metabase metadata. The same seed always yields the
/// same instance.
#[derive(Debug, Clone)]
pub struct MetabaseFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl MetabaseFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn databases(&mut self, count: usize) -> Vec<Database> {
        (0..count)
            .map(|index| Database {
                id: DatabaseId::new(self.id()),
                name: DATABASE_NAMES[index % DATABASE_NAMES.len()].to_owned(),
                engine: (*self.pick(&ENGINES)).to_owned(),
            })
            .collect()
    }

    /// Tables spread round-robin over `schemas`; an empty schema name stands
    /// for a database without schemas.
    pub fn tables(&mut self, count: usize, schemas: &[&str]) -> Vec<Table> {
        (0..count)
            .map(|index| {
                let name = TABLE_NAMES[index % TABLE_NAMES.len()];
                let schema = schemas.get(index % schemas.len().max(1)).copied().unwrap_or("");
                Table {
                    id: TableId::new(self.id()),
                    name: name.to_owned(),
                    display_name: title_case(name),
                    schema: schema.to_owned(),
                    description: self.maybe_description(name),
                }
            })
            .collect()
    }

    pub fn fields(&mut self, table: TableId, count: usize) -> Vec<Field> {
        (0..count)
            .map(|index| {
                let (name, base_type) = FIELD_NAMES[index % FIELD_NAMES.len()];
                Field {
                    id: FieldId::new(self.id()),
                    name: name.to_owned(),
                    display_name: title_case(name),
                    description: self.maybe_description(name),
                    base_type: Some(base_type.to_owned()),
                    effective_type: Some(base_type.to_owned()),
                    semantic_type: (name == "id").then(|| "type/PK".to_owned()),
                    database_type: Some(database_type(base_type).to_owned()),
                    table_id: Some(table),
                    position: index as i64,
                    active: true,
                    visibility: Some("normal".to_owned()),
                }
            })
            .collect()
    }

    /// The root collection followed by `count` top-level collections.
    pub fn collections(&mut self, count: usize) -> Vec<Collection> {
        let root = Collection {
            id: CollectionId::root(),
            name: CollectionRef::root().name,
            description: None,
            archived: false,
            personal_owner_id: None,
        };
        let mut collections = vec![root];
        collections.extend((0..count).map(|index| Collection {
            id: CollectionId::Id(self.id()),
            name: COLLECTION_NAMES[index % COLLECTION_NAMES.len()].to_owned(),
            description: None,
            archived: false,
            personal_owner_id: None,
        }));
        collections
    }

    pub fn items(&mut self, count: usize) -> Vec<CollectionItem> {
        (0..count).map(|_| self.item()).collect()
    }

    pub fn item(&mut self) -> CollectionItem {
        let model = *self.pick(&ITEM_MODELS);
        self.item_of(model)
    }

    pub fn item_of(&mut self, model: ItemModel) -> CollectionItem {
        let name = if model == ItemModel::Collection {
            self.pick(&COLLECTION_NAMES).to_string()
        } else {
            format!(
                "{} {}",
                self.pick(&ITEM_SUBJECTS),
                self.pick(&ITEM_QUALIFIERS)
            )
        };
        CollectionItem {
            id: ItemId::new(self.id()),
            description: self.maybe_description(&name),
            name,
            model,
            archived: false,
            collection: None,
        }
    }

    fn id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1 + self.rng.int_n(3) as i64;
        id
    }

    fn pick<'a, T>(&mut self, values: &'a [T]) -> &'a T {
        &values[self.rng.int_n(values.len())]
    }

    fn maybe_description(&mut self, subject: &str) -> Option<String> {
        (self.rng.int_n(3) == 0).then(|| format!("Everything about {subject}."))
    }
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn database_type(base_type: &str) -> &'static str {
    match base_type {
        "type/BigInteger" => "BIGINT",
        "type/Integer" => "INTEGER",
        "type/DateTime" => "TIMESTAMP",
        "type/Float" => "DOUBLE PRECISION",
        "type/Boolean" => "BOOLEAN",
        _ => "TEXT",
    }
}

/// A canned response keyed by request path. Routes that include a query
/// string only match that exact query.
#[derive(Debug, Clone)]
pub struct MockRoute {
    path: String,
    status: u16,
    body: String,
}

impl MockRoute {
    pub fn json(path: &str, body: serde_json::Value) -> Self {
        Self {
            path: path.to_owned(),
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(path: &str, status: u16, body: &str) -> Self {
        Self {
            path: path.to_owned(),
            status,
            body: body.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub api_key: Option<String>,
}

/// Minimal Metabase stand-in that answers from a fixed route table and
/// records what it was asked. Unknown paths answer 404.
pub struct MockMetabase {
    server: Arc<Server>,
    addr: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockMetabase {
    pub fn start(routes: Vec<MockRoute>) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock metabase: {error}"))?;
        let addr = format!("http://{}", server.server_addr());
        let server = Arc::new(server);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker_server = Arc::clone(&server);
        let worker_requests = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for request in worker_server.incoming_requests() {
                let url = request.url().to_owned();
                let api_key = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("X-API-Key"))
                    .map(|header| header.value.as_str().to_owned());
                worker_requests
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(RecordedRequest {
                        url: url.clone(),
                        api_key,
                    });

                let path = url.split('?').next().unwrap_or_default();
                let (status, body) = routes
                    .iter()
                    .find(|route| route.path == url)
                    .or_else(|| routes.iter().find(|route| route.path == path))
                    .map(|route| (route.status, route.body.clone()))
                    .unwrap_or_else(|| (404, r#"{"message":"Not found."}"#.to_owned()));
                let mut response = Response::from_string(body).with_status_code(status);
                if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
        });

        Ok(Self {
            server,
            addr,
            requests,
            handle: Some(handle),
        })
    }

    pub fn url(&self) -> &str {
        &self.addr
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for MockMetabase {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

#[cfg(test)]
mod tests {
    use super::{ENGINES, MetabaseFaker, MockMetabase, MockRoute, title_case};
    use mbx_app::{CollectionId, ItemModel, extract_schemas};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_instance() {
        let mut a = MetabaseFaker::new(7);
        let mut b = MetabaseFaker::new(7);
        assert_eq!(a.databases(3), b.databases(3));
        assert_eq!(a.items(20), b.items(20));
    }

    #[test]
    fn databases_use_known_engines() {
        let mut faker = MetabaseFaker::new(13);
        let databases = faker.databases(8);
        assert_eq!(databases.len(), 8);
        for database in &databases {
            assert!(
                ENGINES.contains(&database.engine.as_str()),
                "{}",
                database.engine
            );
        }
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut faker = MetabaseFaker::new(3);
        let ids: Vec<i64> = faker.items(50).iter().map(|item| item.id.get()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn tables_spread_across_schemas() {
        let mut faker = MetabaseFaker::new(11);
        let tables = faker.tables(9, &["public", "analytics", ""]);
        let schemas = extract_schemas(&tables);
        let names: BTreeSet<&str> = schemas.iter().map(|schema| schema.name.as_str()).collect();
        assert_eq!(names, BTreeSet::from(["analytics", "default", "public"]));
        assert!(schemas.iter().all(|schema| schema.table_count == 3));
    }

    #[test]
    fn collections_start_with_root() {
        let mut faker = MetabaseFaker::new(5);
        let collections = faker.collections(4);
        assert_eq!(collections.len(), 5);
        assert_eq!(collections[0].id, CollectionId::root());
        assert!(matches!(collections[1].id, CollectionId::Id(_)));
    }

    #[test]
    fn item_of_respects_model() {
        let mut faker = MetabaseFaker::new(9);
        assert_eq!(faker.item_of(ItemModel::Dashboard).model, ItemModel::Dashboard);
    }

    #[test]
    fn title_case_splits_snake_case() {
        assert_eq!(title_case("created_at"), "Created At");
        assert_eq!(title_case("id"), "Id");
    }

    #[test]
    fn mock_server_routes_and_records() -> anyhow::Result<()> {
        let server = MockMetabase::start(vec![MockRoute::json(
            "/api/ping",
            serde_json::json!({"ok": true}),
        )])?;
        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert!(server.requests().is_empty());
        Ok(())
    }
}
