// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use mbx_app::{
    Collection, CollectionId, CollectionItem, Database, DatabaseId, Field, ItemDetail, ItemId,
    ItemModel, LoadPayload, LoadRequest, Schema, Table, TableId, extract_schemas,
    tables_in_schema,
};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const RELEASES_URL: &str = "https://api.github.com/repos/mbx-dev/mbx/releases/latest";

const USER_AGENT: &str = concat!("mbx/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl CurrentUser {
    pub fn display_name(&self) -> String {
        if let Some(name) = self.common_name.as_deref()
            && !name.is_empty()
        {
            return name.to_owned();
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if full.trim().is_empty() {
            self.email.clone()
        } else {
            full
        }
    }
}

/// Blocking client for the parts of the Metabase REST API the explorer reads.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: HttpClient,
}

impl Client {
    /// `timeout` of `None` lets requests wait as long as the server takes.
    pub fn new(base_url: &str, token: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("metabase URL must not be empty");
        }
        let parsed =
            Url::parse(&base_url).with_context(|| format!("invalid metabase URL {base_url:?}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "metabase URL {base_url:?} must start with http:// or https://, got scheme {:?}",
                parsed.scheme()
            );
        }
        let token = token.trim();
        if token.is_empty() {
            bail!("API token must not be empty -- create one under Admin > Settings > API keys");
        }

        let mut key = HeaderValue::from_str(token)
            .context("API token contains characters that cannot be sent in an HTTP header")?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn test_connection(&self) -> Result<CurrentUser> {
        self.get_json(self.endpoint("/api/user/current")?, "current user")
    }

    pub fn databases(&self) -> Result<Vec<Database>> {
        let listing: Listing<Database> =
            self.get_json(self.endpoint("/api/database")?, "database list")?;
        Ok(listing.into_vec())
    }

    pub fn database_tables(&self, database: DatabaseId) -> Result<Vec<Table>> {
        let metadata: DatabaseMetadata = self.get_json(
            self.endpoint(&format!("/api/database/{database}/metadata"))?,
            "database metadata",
        )?;
        Ok(metadata.tables)
    }

    pub fn schemas(&self, database: DatabaseId) -> Result<Vec<Schema>> {
        Ok(extract_schemas(&self.database_tables(database)?))
    }

    pub fn tables(&self, database: DatabaseId, schema: &str) -> Result<Vec<Table>> {
        Ok(tables_in_schema(self.database_tables(database)?, schema))
    }

    pub fn table_fields(&self, table: TableId) -> Result<Vec<Field>> {
        let metadata: TableMetadata = self.get_json(
            self.endpoint(&format!("/api/table/{table}/query_metadata"))?,
            "table metadata",
        )?;
        let mut fields = metadata.fields;
        fields.sort_by_key(|field| field.position);
        Ok(fields)
    }

    pub fn collections(&self) -> Result<Vec<Collection>> {
        let listing: Listing<Collection> =
            self.get_json(self.endpoint("/api/collection")?, "collection list")?;
        Ok(listing
            .into_vec()
            .into_iter()
            .filter(|collection| !collection.archived)
            .collect())
    }

    pub fn collection_items(&self, collection: &CollectionId) -> Result<Vec<CollectionItem>> {
        let listing: Listing<CollectionItem> = self.get_json(
            self.endpoint(&format!("/api/collection/{collection}/items"))?,
            "collection items",
        )?;
        Ok(listing
            .into_vec()
            .into_iter()
            .filter(|item| !item.archived)
            .collect())
    }

    pub fn card(&self, card: ItemId) -> Result<ItemDetail> {
        self.get_json(self.endpoint(&format!("/api/card/{card}"))?, "card")
    }

    pub fn dashboard(&self, dashboard: ItemId) -> Result<ItemDetail> {
        self.get_json(
            self.endpoint(&format!("/api/dashboard/{dashboard}"))?,
            "dashboard",
        )
    }

    /// Detail for models that have one; other models yield `None` without a
    /// request.
    pub fn item_detail(&self, item: ItemId, model: ItemModel) -> Result<Option<ItemDetail>> {
        if model.is_card() {
            return self.card(item).map(Some);
        }
        if model == ItemModel::Dashboard {
            return self.dashboard(item).map(Some);
        }
        Ok(None)
    }

    pub fn search(&self, query: &str) -> Result<Vec<CollectionItem>> {
        let mut url = self.endpoint("/api/search")?;
        url.query_pairs_mut().append_pair("q", query);
        let listing: Listing<CollectionItem> = self.get_json(url, "search results")?;
        Ok(listing
            .into_vec()
            .into_iter()
            .filter(|item| !item.archived)
            .collect())
    }

    pub fn fetch(&self, request: &LoadRequest) -> Result<LoadPayload> {
        let payload = match request {
            LoadRequest::Databases => LoadPayload::Databases(self.databases()?),
            LoadRequest::Schemas { database } => LoadPayload::Schemas(self.schemas(*database)?),
            LoadRequest::Tables { database, schema } => {
                LoadPayload::Tables(self.tables(*database, schema)?)
            }
            LoadRequest::Fields { table } => LoadPayload::Fields(self.table_fields(*table)?),
            LoadRequest::Collections => LoadPayload::Collections(self.collections()?),
            LoadRequest::CollectionItems { collection } => {
                LoadPayload::CollectionItems(self.collection_items(collection)?)
            }
            LoadRequest::ItemDetail { item, model } => {
                LoadPayload::ItemDetail(self.item_detail(*item, *model)?)
            }
            LoadRequest::Search { query } => LoadPayload::Search(self.search(query)?),
        };
        Ok(payload)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{path}", self.base_url);
        Url::parse(&raw).with_context(|| format!("build request URL {raw:?}"))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        response.json().with_context(|| format!("decode {what}"))
    }
}

/// Looks up the newest published release tag.
#[derive(Debug, Clone)]
pub struct ReleaseChecker {
    url: String,
    http: HttpClient,
}

impl ReleaseChecker {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            url: url.to_owned(),
            http,
        })
    }

    pub fn latest_tag(&self) -> Result<String> {
        let response = self
            .http
            .get(&self.url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|error| anyhow!("check for updates at {}: {error}", self.url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("release check returned {}", status.as_u16());
        }
        let release: Release = response.json().context("decode release")?;
        Ok(release.tag_name)
    }
}

/// True when `latest` names a different version than `current`, ignoring a
/// leading `v` on either.
pub fn release_differs(current: &str, latest: &str) -> bool {
    let latest = latest.trim().trim_start_matches('v');
    !latest.is_empty() && current.trim().trim_start_matches('v') != latest
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "timed out waiting for {base_url} -- raise [http] timeout in the config ({error})"
        );
    }
    anyhow!("cannot reach {base_url} -- check the URL and that Metabase is running ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return anyhow!(
            "server error ({}): API key rejected -- check the token for this profile",
            status.as_u16()
        );
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}

/// List endpoints answer with either a bare array or `{"data": [...]}`
/// depending on server version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatabaseMetadata {
    #[serde(default)]
    tables: Vec<Table>,
}

#[derive(Debug, Deserialize)]
struct TableMetadata {
    #[serde(default)]
    fields: Vec<Field>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}
