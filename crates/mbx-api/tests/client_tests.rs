// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use mbx_api::{Client, ReleaseChecker};
use mbx_app::{
    CollectionId, DatabaseId, ItemId, ItemModel, LoadPayload, LoadRequest, TableId,
};
use mbx_testkit::{MetabaseFaker, MockMetabase, MockRoute, fixture_datetime};
use serde_json::json;
use std::time::Duration;

const TOKEN: &str = "mb_test_key";

fn client(server: &MockMetabase) -> Result<Client> {
    Client::new(server.url(), TOKEN, Some(Duration::from_secs(2)))
}

#[test]
fn unreachable_server_error_names_the_url() {
    let client = Client::new("http://127.0.0.1:1", TOKEN, Some(Duration::from_millis(50)))
        .expect("client should initialize");
    let error = client
        .databases()
        .expect_err("request should fail for unreachable server");
    let message = format!("{error:#}");
    assert!(message.contains("http://127.0.0.1:1"), "{message}");
}

#[test]
fn databases_send_api_key_and_accept_wrapped_listing() -> Result<()> {
    let mut faker = MetabaseFaker::new(1);
    let databases = faker.databases(3);
    let server = MockMetabase::start(vec![MockRoute::json(
        "/api/database",
        json!({ "data": databases, "total": 3 }),
    )])?;

    let fetched = client(&server)?.databases()?;
    assert_eq!(fetched, databases);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "/api/database");
    assert_eq!(requests[0].api_key.as_deref(), Some(TOKEN));
    Ok(())
}

#[test]
fn schemas_and_tables_come_from_database_metadata() -> Result<()> {
    let mut faker = MetabaseFaker::new(2);
    let tables = faker.tables(6, &["public", "analytics"]);
    let server = MockMetabase::start(vec![MockRoute::json(
        "/api/database/4/metadata",
        json!({ "id": 4, "name": "Warehouse", "tables": tables }),
    )])?;
    let client = client(&server)?;

    let schemas = client.schemas(DatabaseId::new(4))?;
    let names: Vec<&str> = schemas.iter().map(|schema| schema.name.as_str()).collect();
    assert_eq!(names, vec!["analytics", "public"]);
    assert!(schemas.iter().all(|schema| schema.table_count == 3));

    let public = client.tables(DatabaseId::new(4), "public")?;
    assert_eq!(public.len(), 3);
    assert!(public.iter().all(|table| table.schema == "public"));
    Ok(())
}

#[test]
fn fields_are_ordered_by_position() -> Result<()> {
    let mut faker = MetabaseFaker::new(3);
    let mut fields = faker.fields(TableId::new(9), 4);
    fields.reverse();
    let server = MockMetabase::start(vec![MockRoute::json(
        "/api/table/9/query_metadata",
        json!({ "id": 9, "fields": fields }),
    )])?;

    let fetched = client(&server)?.table_fields(TableId::new(9))?;
    let positions: Vec<i64> = fetched.iter().map(|field| field.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
    Ok(())
}

#[test]
fn collections_drop_archived_and_root_items_use_root_key() -> Result<()> {
    let mut faker = MetabaseFaker::new(4);
    let mut collections = faker.collections(3);
    collections[2].archived = true;
    let items = faker.items(5);
    let server = MockMetabase::start(vec![
        MockRoute::json("/api/collection", json!(collections)),
        MockRoute::json("/api/collection/root/items", json!({ "data": items })),
    ])?;
    let client = client(&server)?;

    let fetched = client.collections()?;
    assert_eq!(fetched.len(), 3);
    assert!(fetched[0].id.is_root());

    let fetched_items = client.collection_items(&CollectionId::root())?;
    assert_eq!(fetched_items, items);
    Ok(())
}

#[test]
fn item_detail_follows_model() -> Result<()> {
    let server = MockMetabase::start(vec![
        MockRoute::json(
            "/api/card/12",
            json!({
                "id": 12,
                "name": "Revenue",
                "creator": { "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" },
                "last-edit-info": { "first_name": "Grace", "last_name": "Hopper" },
                "created_at": fixture_datetime(),
                "updated_at": fixture_datetime(),
            }),
        ),
        MockRoute::json("/api/dashboard/13", json!({ "id": 13, "name": "Overview" })),
    ])?;
    let client = client(&server)?;

    let card = client
        .item_detail(ItemId::new(12), ItemModel::Dataset)?
        .expect("card detail");
    assert_eq!(
        card.creator.map(|person| person.display_name()).as_deref(),
        Some("Ada Lovelace")
    );
    assert_eq!(card.updated_at.as_deref(), Some(fixture_datetime()));

    let dashboard = client
        .item_detail(ItemId::new(13), ItemModel::Dashboard)?
        .expect("dashboard detail");
    assert_eq!(dashboard.creator, None);

    assert_eq!(client.item_detail(ItemId::new(14), ItemModel::Snippet)?, None);
    assert_eq!(server.requests().len(), 2);
    Ok(())
}

#[test]
fn search_encodes_query() -> Result<()> {
    let mut faker = MetabaseFaker::new(5);
    let results = faker.items(2);
    let server = MockMetabase::start(vec![MockRoute::json(
        "/api/search?q=monthly+revenue",
        json!({ "data": results, "total": 2 }),
    )])?;

    let fetched = client(&server)?.search("monthly revenue")?;
    assert_eq!(fetched, results);
    Ok(())
}

#[test]
fn server_message_surfaces_in_error() -> Result<()> {
    let server = MockMetabase::start(vec![MockRoute::status(
        "/api/table/77/query_metadata",
        404,
        r#"{"message": "Table 77 not found."}"#,
    )])?;

    let error = client(&server)?
        .table_fields(TableId::new(77))
        .expect_err("missing table should fail");
    assert_eq!(error.to_string(), "server error (404): Table 77 not found.");
    Ok(())
}

#[test]
fn fetch_maps_requests_to_payloads() -> Result<()> {
    let mut faker = MetabaseFaker::new(6);
    let databases = faker.databases(2);
    let server = MockMetabase::start(vec![
        MockRoute::json("/api/database", json!(databases)),
        MockRoute::json(
            "/api/user/current",
            json!({ "id": 1, "email": "ops@example.com", "common_name": "Ops Bot" }),
        ),
    ])?;
    let client = client(&server)?;

    assert_eq!(
        client.fetch(&LoadRequest::Databases)?,
        LoadPayload::Databases(databases)
    );
    assert_eq!(
        client.fetch(&LoadRequest::ItemDetail {
            item: ItemId::new(1),
            model: ItemModel::Collection,
        })?,
        LoadPayload::ItemDetail(None)
    );
    assert_eq!(client.test_connection()?.display_name(), "Ops Bot");
    Ok(())
}

#[test]
fn release_checker_reads_tag_name() -> Result<()> {
    let server = MockMetabase::start(vec![MockRoute::json(
        "/releases/latest",
        json!({ "tag_name": "v0.9.1", "name": "0.9.1" }),
    )])?;
    let checker = ReleaseChecker::new(
        &format!("{}/releases/latest", server.url()),
        Duration::from_secs(2),
    )?;
    assert_eq!(checker.latest_tag()?, "v0.9.1");
    Ok(())
}
