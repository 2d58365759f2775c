//! Client core for the inventory service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and layers the view-facing
//! pieces on top: the create/edit form, the item list renderer and the
//! controller that keeps the session in step with the server.
//!
//! # Design
//! - `InventoryClient` is stateless; it holds only `base_url`.
//! - All I/O goes through the `Transport` trait, implemented by the host.
//! - `Controller` refetches the whole collection after every write instead of
//!   patching local state, and serializes writes with a single-flight guard.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod http;
pub mod list;
pub mod transport;
pub mod types;

pub use client::InventoryClient;
pub use config::Config;
pub use controller::{Controller, ControllerError, DeleteOutcome, Session};
pub use error::ApiError;
pub use form::{Field, FieldError, ItemForm, SubmitError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use list::{ItemList, ItemRow, ListAction};
pub use transport::Transport;
pub use types::{Draft, Health, Item, ItemId};
