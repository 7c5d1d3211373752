//! Client for the hosted headless CMS that owns projects and press articles.

use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::{
    config::CmsConfig,
    listing::{PageMeta, PageRequest, Paginated},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Collections the dashboard manages through the CMS.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmsCollection {
    Projects,
    PressArticles,
}

impl CmsCollection {
    pub fn path(&self) -> &'static str {
        match self {
            CmsCollection::Projects => "projects",
            CmsCollection::PressArticles => "press-articles",
        }
    }

    fn default_sort(&self) -> &'static str {
        match self {
            CmsCollection::Projects => "createdAt:desc",
            CmsCollection::PressArticles => "publishedAt:desc",
        }
    }
}

impl fmt::Display for CmsCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Filters forwarded to the CMS so they apply across the whole collection.
#[derive(Debug, Clone, Default)]
pub struct CmsListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub district: Option<String>,
}

/// Failure talking to the CMS, carrying the upstream status and error name when known.
#[derive(Debug)]
pub struct CmsError {
    pub status: Option<StatusCode>,
    pub message: String,
    pub code: Option<String>,
}

impl CmsError {
    fn transport(err: impl fmt::Display) -> Self {
        Self {
            status: None,
            message: err.to_string(),
            code: None,
        }
    }

    fn decode(err: impl fmt::Display) -> Self {
        Self {
            status: None,
            message: format!("unexpected CMS payload: {err}"),
            code: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }
}

impl fmt::Display for CmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "CMS responded {status}: {}", self.message),
            None => write!(f, "CMS request failed: {}", self.message),
        }
    }
}

impl std::error::Error for CmsError {}

#[derive(Clone)]
pub struct CmsClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl CmsClient {
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build CMS HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub async fn list(
        &self,
        collection: CmsCollection,
        page: PageRequest,
        query: &CmsListQuery,
    ) -> Result<Paginated<Value>, CmsError> {
        let params = list_params(collection, page, query);
        let body = self
            .send(self.request(Method::GET, &self.collection_url(collection)).query(&params))
            .await?;
        parse_list(body, page)
    }

    pub async fn get(&self, collection: CmsCollection, id: &str) -> Result<Value, CmsError> {
        let body = self
            .send(
                self.request(Method::GET, &self.entry_url(collection, id))
                    .query(&[("populate", "*")]),
            )
            .await?;
        parse_single(body)
    }

    pub async fn create(&self, collection: CmsCollection, fields: Value) -> Result<Value, CmsError> {
        let body = self
            .send(
                self.request(Method::POST, &self.collection_url(collection))
                    .json(&json!({ "data": fields })),
            )
            .await?;
        parse_single(body)
    }

    pub async fn update(
        &self,
        collection: CmsCollection,
        id: &str,
        fields: Value,
    ) -> Result<Value, CmsError> {
        let body = self
            .send(
                self.request(Method::PUT, &self.entry_url(collection, id))
                    .json(&json!({ "data": fields })),
            )
            .await?;
        parse_single(body)
    }

    pub async fn delete(&self, collection: CmsCollection, id: &str) -> Result<(), CmsError> {
        self.send(self.request(Method::DELETE, &self.entry_url(collection, id)))
            .await?;
        Ok(())
    }

    fn collection_url(&self, collection: CmsCollection) -> String {
        format!("{}/api/{}", self.base_url, collection.path())
    }

    fn entry_url(&self, collection: CmsCollection, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, CmsError> {
        let response = builder.send().await.map_err(CmsError::transport)?;
        let status = response.status();
        let text = response.text().await.map_err(CmsError::transport)?;

        if !status.is_success() {
            let (message, code) = parse_error_body(&text);
            warn!(%status, code = ?code, "CMS request rejected");
            return Err(CmsError {
                status: Some(status),
                message,
                code,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(CmsError::decode)
    }
}

/// Query string understood by the CMS REST API (pagination, sort, filters).
pub fn list_params(
    collection: CmsCollection,
    page: PageRequest,
    query: &CmsListQuery,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("pagination[page]".to_string(), page.page.to_string()),
        ("pagination[pageSize]".to_string(), page.limit.to_string()),
        ("sort".to_string(), collection.default_sort().to_string()),
        ("populate".to_string(), "*".to_string()),
    ];

    if let Some(search) = &query.search {
        params.push(("filters[title][$containsi]".to_string(), search.clone()));
    }
    if let Some(status) = &query.status {
        params.push(("filters[status][$eq]".to_string(), status.clone()));
    }
    if let Some(district) = &query.district {
        params.push(("filters[district][$eq]".to_string(), district.clone()));
    }

    params
}

#[derive(Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    meta: Option<ListMeta>,
}

#[derive(Deserialize)]
struct ListMeta {
    #[serde(default)]
    pagination: Option<RemotePagination>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemotePagination {
    page: Option<i64>,
    page_size: Option<i64>,
    page_count: Option<i64>,
    total: Option<i64>,
}

pub fn parse_list(body: Value, request: PageRequest) -> Result<Paginated<Value>, CmsError> {
    let envelope: ListEnvelope = serde_json::from_value(body).map_err(CmsError::decode)?;
    let data: Vec<Value> = envelope.data.into_iter().map(normalize_entry).collect();

    let pagination = match envelope.meta.and_then(|meta| meta.pagination) {
        Some(remote) => {
            let limit = remote.page_size.unwrap_or(request.limit);
            let total = remote.total.unwrap_or(data.len() as i64);
            let mut meta = PageMeta::new(PageRequest::new(remote.page.unwrap_or(request.page), limit), total);
            if let Some(page_count) = remote.page_count {
                meta.pages = page_count;
            }
            meta
        }
        None => PageMeta::new(request, data.len() as i64),
    };

    Ok(Paginated { data, pagination })
}

fn parse_single(body: Value) -> Result<Value, CmsError> {
    match body {
        Value::Object(mut map) if map.contains_key("data") => match map.remove("data") {
            Some(Value::Null) | None => Err(CmsError {
                status: Some(StatusCode::NOT_FOUND),
                message: "entry not found".to_string(),
                code: None,
            }),
            Some(entry) => Ok(normalize_entry(entry)),
        },
        other => Err(CmsError::decode(format!("missing data field in {other}"))),
    }
}

/// Extracts `(message, error name)` from a CMS error body.
pub fn parse_error_body(text: &str) -> (String, Option<String>) {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: Option<ErrorBody>,
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        name: Option<String>,
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorEnvelope>(text) {
        Ok(ErrorEnvelope {
            error: Some(ErrorBody { name, message }),
        }) => (
            message.unwrap_or_else(|| "CMS request failed".to_string()),
            name,
        ),
        _ => {
            let preview: String = text.chars().take(200).collect();
            let message = if preview.trim().is_empty() {
                "CMS request failed".to_string()
            } else {
                preview
            };
            (message, None)
        }
    }
}

/// Flattens `{ id, attributes: {..} }` entries and resolves the developer field.
pub fn normalize_entry(entry: Value) -> Value {
    let Value::Object(mut map) = entry else {
        return entry;
    };

    if let Some(Value::Object(attributes)) = map.remove("attributes") {
        for (key, value) in attributes {
            map.entry(key).or_insert(value);
        }
    }

    if let Some(developer) = map.get("developer") {
        let resolved = developer_name(developer)
            .map(Value::String)
            .unwrap_or(Value::Null);
        map.insert("developer".to_string(), resolved);
    }

    Value::Object(map)
}

/// Resolves the developer field, which the CMS returns as a plain string, a
/// `{ name }` object, or a relation wrapped in `data` / `attributes`.
pub fn developer_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.trim().to_string()).filter(|n| !n.is_empty()),
        Value::Array(items) => items.iter().find_map(developer_name),
        Value::Object(map) => object_developer_name(map),
        _ => None,
    }
}

fn object_developer_name(map: &Map<String, Value>) -> Option<String> {
    if let Some(name) = map.get("name").and_then(developer_name) {
        return Some(name);
    }
    if let Some(attributes) = map.get("attributes") {
        if let Some(name) = developer_name(attributes) {
            return Some(name);
        }
    }
    map.get("data").and_then(developer_name)
}
