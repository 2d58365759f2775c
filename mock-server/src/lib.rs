use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: Decimal,
}

/// Partial update: omitted fields keep their stored value.
#[derive(Deserialize)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
}

#[derive(Default)]
pub struct Store {
    items: HashMap<i64, Item>,
    next_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

/// Error body in the `{"detail": ...}` shape the client expects.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: "Item not found".to_string(),
        }
    }

    fn invalid(detail: &str) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/health", get(health))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn valid_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid("name must not be empty"));
    }
    Ok(name.to_string())
}

fn valid_quantity(quantity: i64) -> Result<i64, ApiError> {
    if quantity < 0 {
        return Err(ApiError::invalid("quantity must not be negative"));
    }
    Ok(quantity)
}

fn valid_price(price: Decimal) -> Result<Decimal, ApiError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ApiError::invalid("price must not be negative"));
    }
    if price.normalize().scale() > 2 {
        return Err(ApiError::invalid("price must have at most 2 decimal places"));
    }
    if price.trunc() >= Decimal::from(100_000_000) {
        return Err(ApiError::invalid("price must have at most 10 digits"));
    }
    Ok(price)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Newest first; ties go to the higher id.
async fn list_items(State(db): State<Db>) -> Json<Vec<Item>> {
    let store = db.read().await;
    let mut items: Vec<Item> = store.items.values().cloned().collect();
    items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    Json(items)
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<CreateItem>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let name = valid_name(&input.name)?;
    let quantity = valid_quantity(input.quantity)?;
    let price = valid_price(input.price)?;

    let mut store = db.write().await;
    store.next_id += 1;
    let now = Utc::now();
    let item = Item {
        id: store.next_id,
        name,
        description: input.description,
        quantity,
        price,
        created_at: now,
        updated_at: now,
    };
    store.items.insert(item.id, item.clone());
    info!(id = item.id, "created item");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Item>, ApiError> {
    let store = db.read().await;
    store.items.get(&id).cloned().map(Json).ok_or_else(ApiError::not_found)
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Item>, ApiError> {
    let mut store = db.write().await;
    let item = store.items.get_mut(&id).ok_or_else(ApiError::not_found)?;
    let name = input.name.as_deref().map(valid_name).transpose()?;
    let quantity = input.quantity.map(valid_quantity).transpose()?;
    let price = input.price.map(valid_price).transpose()?;

    if let Some(name) = name {
        item.name = name;
    }
    if let Some(description) = input.description {
        item.description = Some(description);
    }
    if let Some(quantity) = quantity {
        item.quantity = quantity;
    }
    if let Some(price) = price {
        item.price = price;
    }
    item.updated_at = Utc::now();
    info!(id, "updated item");
    Ok(Json(item.clone()))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store.items.remove(&id).ok_or_else(ApiError::not_found)?;
    info!(id, "deleted item");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn item_serializes_price_as_number() {
        let now = Utc::now();
        let item = Item {
            id: 7,
            name: "Widget".to_string(),
            description: None,
            quantity: 5,
            price: Decimal::from_str("9.99").unwrap(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["price"], 9.99);
        assert!(json["description"].is_null());
        assert!(json["updated_at"].is_string());
    }

    #[test]
    fn create_item_defaults_quantity_and_price() {
        let input: CreateItem = serde_json::from_str(r#"{"name":"Bolt"}"#).unwrap();
        assert_eq!(input.quantity, 0);
        assert_eq!(input.price, Decimal::ZERO);
        assert!(input.description.is_none());
    }

    #[test]
    fn create_item_rejects_missing_name() {
        let result: Result<CreateItem, _> = serde_json::from_str(r#"{"quantity":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_item_all_fields_optional() {
        let input: UpdateItem = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.quantity.is_none());
        assert!(input.price.is_none());
    }

    #[test]
    fn validation_rules() {
        assert_eq!(valid_name("  Gear ").unwrap(), "Gear");
        assert!(valid_name("   ").is_err());
        assert!(valid_quantity(-1).is_err());
        assert!(valid_price(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(valid_price(Decimal::from_str("1.005").unwrap()).is_err());
        assert!(valid_price(Decimal::from_str("1.50").unwrap()).is_ok());
        assert!(valid_price(Decimal::from_str("99999999.99").unwrap()).is_ok());
        assert!(valid_price(Decimal::from_str("100000000").unwrap()).is_err());
    }
}
