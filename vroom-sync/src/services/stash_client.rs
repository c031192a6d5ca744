//! Stash GraphQL client
//!
//! Implements [`Upstream`] over plain GraphQL POST requests. Queries are built
//! from fixed templates; only the field projection and the root field vary
//! by mode.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::upstream::{ItemQuery, Upstream, UpstreamError};
use crate::models::{FilterMode, Item, SavedFilter};

const USER_AGENT: &str = concat!("VRoom/", env!("CARGO_PKG_VERSION"));

/// Full scene projection
const SCENE_FIELDS: &str = "id title details date rating100 o_counter play_count organized \
    paths { screenshot preview stream funscript } \
    files { id path basename duration width height frame_rate video_codec size } \
    tags { id name } performers { id name gender } studio { id name }";

/// Full image projection
const IMAGE_FIELDS: &str = "id title date rating100 o_counter \
    paths { thumbnail image } \
    visual_files { __typename ... on ImageFile { id path basename width height } \
    ... on VideoFile { id path basename width height } } \
    tags { id name } performers { id name } studio { id name }";

const SAVED_FILTERS_QUERY: &str = r#"
query SavedFilters($mode: FilterMode!) {
    findSavedFilters(mode: $mode) {
        id
        mode
        name
        find_filter { q page per_page sort direction }
        object_filter
        ui_options
    }
}"#;

const VERSION_QUERY: &str = "query Version { version { version } }";

/// Credentials sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashAuth {
    None,
    /// Sent as the `ApiKey` header
    ApiKey(String),
    /// `Name=Value`, sent as the `Cookie` header
    SessionCookie(String),
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlMessage {
    message: String,
}

/// Stash GraphQL API client
pub struct StashClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl StashClient {
    pub fn new(
        endpoint: impl Into<String>,
        auth: StashAuth,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        match auth {
            StashAuth::None => {}
            StashAuth::ApiKey(key) => {
                let value = HeaderValue::from_str(&key)
                    .map_err(|e| UpstreamError::Network(format!("Invalid API key header: {}", e)))?;
                // Header names are case-insensitive; `from_static` requires lowercase.
                headers.insert("apikey", value);
            }
            StashAuth::SessionCookie(cookie) => {
                let value = HeaderValue::from_str(&cookie)
                    .map_err(|e| UpstreamError::Network(format!("Invalid cookie header: {}", e)))?;
                headers.insert(COOKIE, value);
            }
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one GraphQL request and return its `data` member
    async fn call(&self, query: &str, variables: Value) -> Result<Value, UpstreamError> {
        let body = json!({ "query": query, "variables": variables });

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();

        if status == 401 || status == 403 {
            return Err(UpstreamError::Auth(status.as_u16()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api(status.as_u16(), error_text));
        }

        let payload: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        if let Some(errors) = payload.errors.filter(|e| !e.is_empty()) {
            return Err(UpstreamError::GraphQl(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        payload
            .data
            .ok_or_else(|| UpstreamError::Parse("response has no data".to_string()))
    }
}

#[async_trait]
impl Upstream for StashClient {
    async fn version(&self) -> Result<String, UpstreamError> {
        let data = self.call(VERSION_QUERY, json!({})).await?;
        data.pointer("/version/version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| UpstreamError::Parse("missing version.version".to_string()))
    }

    async fn fetch_filters(&self, mode: FilterMode) -> Result<Vec<SavedFilter>, UpstreamError> {
        let data = self
            .call(SAVED_FILTERS_QUERY, json!({ "mode": mode.as_str() }))
            .await?;

        let filters = data
            .get("findSavedFilters")
            .cloned()
            .ok_or_else(|| UpstreamError::Parse("missing findSavedFilters".to_string()))?;

        let filters: Vec<SavedFilter> =
            serde_json::from_value(filters).map_err(|e| UpstreamError::Parse(e.to_string()))?;

        tracing::debug!(mode = %mode, count = filters.len(), "Fetched saved filters");
        Ok(filters)
    }

    async fn fetch_item_ids(
        &self,
        mode: FilterMode,
        query: &ItemQuery,
    ) -> Result<Vec<String>, UpstreamError> {
        let data = self
            .call(&criteria_query(mode, "id"), criteria_variables(query))
            .await?;

        let ids = extract_list(mode, data)?
            .into_iter()
            .map(|v| {
                Item::from_json(mode, v)
                    .map(|item| item.id)
                    .ok_or_else(|| UpstreamError::Parse("record without id".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(mode = %mode, count = ids.len(), "Fetched item ids");
        Ok(ids)
    }

    async fn fetch_items(
        &self,
        mode: FilterMode,
        query: &ItemQuery,
    ) -> Result<Vec<Item>, UpstreamError> {
        let data = self
            .call(&criteria_query(mode, fields_for(mode)), criteria_variables(query))
            .await?;

        let items = parse_items(mode, extract_list(mode, data)?)?;
        tracing::debug!(mode = %mode, count = items.len(), "Fetched items by criteria");
        Ok(items)
    }

    async fn fetch_items_by_ids(
        &self,
        mode: FilterMode,
        ids: &[String],
    ) -> Result<Vec<Item>, UpstreamError> {
        if ids.is_empty() {
            tracing::debug!(mode = %mode, "No item ids to query");
            return Ok(Vec::new());
        }

        let variables = json!({ "ids": ids, "filter": { "per_page": -1 } });
        let data = self.call(&ids_query(mode), variables).await?;

        let items = parse_items(mode, extract_list(mode, data)?)?;
        tracing::debug!(
            mode = %mode,
            requested = ids.len(),
            count = items.len(),
            "Fetched items by id"
        );
        Ok(items)
    }
}

/// Root query field and result list field for a mode
fn result_fields(mode: FilterMode) -> (&'static str, &'static str) {
    match mode {
        FilterMode::Scenes => ("findScenes", "scenes"),
        FilterMode::Images => ("findImages", "images"),
    }
}

fn fields_for(mode: FilterMode) -> &'static str {
    match mode {
        FilterMode::Scenes => SCENE_FIELDS,
        FilterMode::Images => IMAGE_FIELDS,
    }
}

/// Query by saved-filter criteria with the given projection
pub(crate) fn criteria_query(mode: FilterMode, projection: &str) -> String {
    let (root, list) = result_fields(mode);
    let (filter_type, filter_arg) = match mode {
        FilterMode::Scenes => ("SceneFilterType", "scene_filter"),
        FilterMode::Images => ("ImageFilterType", "image_filter"),
    };

    format!(
        "query Find($filter: FindFilterType, $object_filter: {filter_type}) {{\n    \
         {root}(filter: $filter, {filter_arg}: $object_filter) {{\n        \
         {list} {{ {projection} }}\n    }}\n}}"
    )
}

/// Query by explicit id list with the full projection
pub(crate) fn ids_query(mode: FilterMode) -> String {
    let (root, list) = result_fields(mode);
    let projection = fields_for(mode);

    format!(
        "query FindByIds($ids: [ID!], $filter: FindFilterType) {{\n    \
         {root}(ids: $ids, filter: $filter) {{\n        \
         {list} {{ {projection} }}\n    }}\n}}"
    )
}

fn criteria_variables(query: &ItemQuery) -> Value {
    json!({
        "filter": query.find_filter,
        "object_filter": query.object_filter,
    })
}

/// Pull the result list out of a `findScenes`/`findImages` response
pub(crate) fn extract_list(mode: FilterMode, data: Value) -> Result<Vec<Value>, UpstreamError> {
    let (root, list) = result_fields(mode);

    match data.get(root).and_then(|r| r.get(list)) {
        Some(Value::Array(values)) => Ok(values.clone()),
        _ => Err(UpstreamError::Parse(format!("missing {}.{}", root, list))),
    }
}

fn parse_items(mode: FilterMode, values: Vec<Value>) -> Result<Vec<Item>, UpstreamError> {
    values
        .into_iter()
        .map(|v| {
            Item::from_json(mode, v)
                .ok_or_else(|| UpstreamError::Parse("record without id".to_string()))
        })
        .collect()
}
