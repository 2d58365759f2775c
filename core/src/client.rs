//! Stateless HTTP request builder and response parser for the inventory API.
//!
//! # Design
//! `InventoryClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. The operation methods (`list`, `create`,
//! ...) glue the two together around a single `Transport::execute` call:
//! one attempt, no retry, no caching.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Draft, Health, Item, ItemId};

/// Client for the inventory API.
#[derive(Debug, Clone)]
pub struct InventoryClient {
    base_url: String,
}

impl InventoryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request(&self, method: HttpMethod, path: &str, draft: &Draft) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(draft).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
            ..self.request(method, path)
        })
    }

    pub fn build_list_items(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/items")
    }

    pub fn build_get_item(&self, id: &ItemId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/items/{id}"))
    }

    pub fn build_create_item(&self, draft: &Draft) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/items", draft)
    }

    pub fn build_update_item(&self, id: &ItemId, draft: &Draft) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/items/{id}"), draft)
    }

    pub fn build_delete_item(&self, id: &ItemId) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/items/{id}"))
    }

    pub fn build_health(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/health")
    }

    pub fn parse_list_items(&self, response: HttpResponse) -> Result<Vec<Item>, ApiError> {
        decode(response)
    }

    pub fn parse_get_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        decode(response)
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        decode(response)
    }

    pub fn parse_update_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        decode(response)
    }

    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<Health, ApiError> {
        decode(response)
    }

    /// Fetch every item, in server order.
    pub fn list(&self, transport: &impl Transport) -> Result<Vec<Item>, ApiError> {
        let response = send(transport, self.build_list_items())?;
        self.parse_list_items(response)
    }

    pub fn get(&self, transport: &impl Transport, id: &ItemId) -> Result<Item, ApiError> {
        let response = send(transport, self.build_get_item(id))?;
        self.parse_get_item(response)
    }

    /// Create an item; the returned item carries the server-assigned id.
    pub fn create(&self, transport: &impl Transport, draft: &Draft) -> Result<Item, ApiError> {
        let response = send(transport, self.build_create_item(draft)?)?;
        self.parse_create_item(response)
    }

    pub fn update(&self, transport: &impl Transport, id: &ItemId, draft: &Draft) -> Result<Item, ApiError> {
        let response = send(transport, self.build_update_item(id, draft)?)?;
        self.parse_update_item(response)
    }

    pub fn delete(&self, transport: &impl Transport, id: &ItemId) -> Result<(), ApiError> {
        let response = send(transport, self.build_delete_item(id))?;
        self.parse_delete_item(response)
    }

    pub fn health(&self, transport: &impl Transport) -> Result<Health, ApiError> {
        let response = send(transport, self.build_health())?;
        self.parse_health(response)
    }
}

fn send(transport: &impl Transport, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    debug!(method = %request.method, url = %request.url, "sending request");
    let response = transport.execute(request)?;
    debug!(status = response.status, "received response");
    Ok(response)
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, response.body.clone()))
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}
