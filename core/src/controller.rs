//! Application controller: owns the session and orchestrates API calls.
//!
//! # Design
//! Every successful mutation is followed by a full `list()` that replaces
//! `items` wholesale; nothing is patched locally. Mutations pass through a
//! single-flight guard: while one create/update/delete is outstanding, any
//! other mutation fails fast with `ControllerError::Busy` and sends nothing.
//! The session lock is never held across a transport call, so views can keep
//! rendering snapshots while a request is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{info, warn};

use crate::client::InventoryClient;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{Draft, Item, ItemId};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this item?";
pub const LOAD_FAILED: &str = "Failed to load items";
pub const REQUEST_FAILED: &str = "Request failed";
pub const DELETE_FAILED: &str = "Delete failed";

/// Transient UI state. Views render from a snapshot of this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub items: Vec<Item>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_item: Option<Item>,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("another change is already in flight")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

pub struct Controller<T> {
    client: InventoryClient,
    transport: T,
    session: Mutex<Session>,
    in_flight: AtomicBool,
}

/// Held for the duration of one mutation; releases `submitting` on drop.
struct MutationGuard<'a, T> {
    controller: &'a Controller<T>,
}

impl<T> Drop for MutationGuard<'_, T> {
    fn drop(&mut self) {
        self.controller.state().submitting = false;
        self.controller.in_flight.store(false, Ordering::Release);
    }
}

impl<T: Transport> Controller<T> {
    pub fn new(client: InventoryClient, transport: T) -> Self {
        Self {
            client,
            transport,
            session: Mutex::new(Session::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &InventoryClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.state().clone()
    }

    /// Initial load and resynchronization fetch.
    ///
    /// On failure the previous `items` stay in place and `error` is set.
    pub fn load(&self) -> Result<(), ApiError> {
        {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
        }

        let result = self.client.list(&self.transport);

        let mut state = self.state();
        state.loading = false;
        match result {
            Ok(items) => {
                info!(count = items.len(), "loaded items");
                state.items = items;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, status = ?err.status(), "failed to load items");
                state.error = Some(err.user_message(LOAD_FAILED));
                Err(err)
            }
        }
    }

    /// Create a new item, or update the selected one.
    ///
    /// On success the selection is cleared and the collection refetched. On
    /// failure the selection is kept so the user can retry.
    pub fn submit(&self, draft: Draft) -> Result<Item, ControllerError> {
        let _guard = self.begin_mutation()?;
        let selected = self.state().selected_item.clone();

        let result = match &selected {
            Some(item) => {
                info!(id = %item.id, "updating item");
                self.client.update(&self.transport, &item.id, &draft)
            }
            None => {
                info!(name = %draft.name, "creating item");
                self.client.create(&self.transport, &draft)
            }
        };

        match result {
            Ok(item) => {
                self.state().selected_item = None;
                self.resync();
                Ok(item)
            }
            Err(err) => {
                warn!(error = %err, status = ?err.status(), "submit failed");
                self.state().error = Some(err.user_message(REQUEST_FAILED));
                Err(err.into())
            }
        }
    }

    /// Delete an item after `confirm` approves [`DELETE_PROMPT`].
    ///
    /// A declined confirmation sends nothing and leaves the session as is.
    pub fn delete(
        &self,
        id: &ItemId,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<DeleteOutcome, ControllerError> {
        if !confirm(DELETE_PROMPT) {
            return Ok(DeleteOutcome::Declined);
        }
        let _guard = self.begin_mutation()?;

        info!(%id, "deleting item");
        match self.client.delete(&self.transport, id) {
            Ok(()) => {
                self.resync();
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                warn!(error = %err, status = ?err.status(), "delete failed");
                self.state().error = Some(err.user_message(DELETE_FAILED));
                Err(err.into())
            }
        }
    }

    /// Enter edit mode for `item`. Takes a copy; `items` is untouched.
    pub fn select(&self, item: Item) {
        self.state().selected_item = Some(item);
    }

    pub fn cancel_edit(&self) {
        self.state().selected_item = None;
    }

    fn begin_mutation(&self) -> Result<MutationGuard<'_, T>, ControllerError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("rejected mutation while another is in flight");
            return Err(ControllerError::Busy);
        }
        let mut state = self.state();
        state.submitting = true;
        state.error = None;
        Ok(MutationGuard { controller: self })
    }

    /// Refetch after a successful write. A failure here replaces `error`
    /// with the load failure; the write itself is not reported again.
    fn resync(&self) {
        if let Err(err) = self.load() {
            warn!(error = %err, "write succeeded but refresh failed");
        }
    }
}

impl<T> Controller<T> {
    fn state(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::sync::mpsc;

    /// In-memory stand-in for the REST API, speaking the same wire format.
    #[derive(Default)]
    struct FakeApi {
        store: Mutex<Vec<Item>>,
        next_id: Mutex<i64>,
        log: Mutex<Vec<(HttpMethod, String)>>,
        fail: Mutex<Option<(HttpMethod, HttpResponse)>>,
        network_down: AtomicBool,
    }

    impl FakeApi {
        fn with_items(items: Vec<Item>) -> Self {
            let next = items.len() as i64;
            Self {
                store: Mutex::new(items),
                next_id: Mutex::new(next),
                ..Default::default()
            }
        }

        fn fail_on(&self, method: HttpMethod, response: HttpResponse) {
            *self.fail.lock().unwrap() = Some((method, response));
        }

        fn stored(&self) -> Vec<Item> {
            self.store.lock().unwrap().clone()
        }

        fn requests(&self) -> Vec<(HttpMethod, String)> {
            self.log.lock().unwrap().clone()
        }

        fn id_of(url: &str) -> ItemId {
            ItemId::Int(url.rsplit('/').next().unwrap().parse().unwrap())
        }

        fn not_found() -> HttpResponse {
            HttpResponse::new(404, r#"{"detail":"Item not found"}"#)
        }
    }

    impl Transport for FakeApi {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let path = request.url.trim_start_matches(BASE).to_string();
            self.log.lock().unwrap().push((request.method, path.clone()));
            if self.network_down.load(Ordering::SeqCst) {
                return Err(ApiError::Network("connection refused".to_string()));
            }
            if let Some((method, response)) = self.fail.lock().unwrap().clone() {
                if method == request.method {
                    return Ok(response);
                }
            }

            let mut store = self.store.lock().unwrap();
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let response = match request.method {
                HttpMethod::Get => HttpResponse::new(200, serde_json::to_string(&*store).unwrap()),
                HttpMethod::Post => {
                    let draft: Draft = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
                    let mut next = self.next_id.lock().unwrap();
                    *next += 1;
                    let item = Item {
                        id: ItemId::Int(*next),
                        name: draft.name,
                        description: draft.description,
                        quantity: draft.quantity.into(),
                        price: draft.price,
                        created_at: Some(now),
                        updated_at: now,
                    };
                    store.insert(0, item.clone());
                    HttpResponse::new(201, serde_json::to_string(&item).unwrap())
                }
                HttpMethod::Put => {
                    let id = Self::id_of(&path);
                    let draft: Draft = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
                    match store.iter_mut().find(|i| i.id == id) {
                        Some(item) => {
                            item.name = draft.name;
                            item.description = draft.description;
                            item.quantity = draft.quantity.into();
                            item.price = draft.price;
                            HttpResponse::new(200, serde_json::to_string(&*item).unwrap())
                        }
                        None => Self::not_found(),
                    }
                }
                HttpMethod::Delete => {
                    let id = Self::id_of(&path);
                    let before = store.len();
                    store.retain(|i| i.id != id);
                    if store.len() == before {
                        Self::not_found()
                    } else {
                        HttpResponse::new(204, "")
                    }
                }
            };
            Ok(response)
        }
    }

    const BASE: &str = "http://api.test";

    fn item(id: i64, name: &str) -> Item {
        Item {
            id: ItemId::Int(id),
            name: name.to_string(),
            description: String::new(),
            quantity: 1,
            price: Decimal::ONE,
            created_at: None,
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn draft(name: &str, quantity: u32, price: &str) -> Draft {
        Draft {
            name: name.to_string(),
            description: String::new(),
            quantity,
            price: price.parse().unwrap(),
        }
    }

    fn controller(api: FakeApi) -> Controller<FakeApi> {
        Controller::new(InventoryClient::new(BASE), api)
    }

    #[test]
    fn load_replaces_items_and_clears_flags() {
        let c = controller(FakeApi::with_items(vec![item(1, "A"), item(2, "B")]));
        c.load().unwrap();
        let s = c.session();
        assert_eq!(s.items.len(), 2);
        assert!(!s.loading);
        assert_eq!(s.error, None);
    }

    #[test]
    fn failed_load_keeps_stale_items() {
        let c = controller(FakeApi::with_items(vec![item(1, "A")]));
        c.load().unwrap();
        c.transport().network_down.store(true, Ordering::SeqCst);

        assert!(c.load().is_err());
        let s = c.session();
        assert_eq!(s.items.len(), 1);
        assert!(!s.loading);
        assert_eq!(s.error.as_deref(), Some("network error: connection refused"));
    }

    #[test]
    fn load_failure_without_detail_uses_fallback() {
        let api = FakeApi::default();
        api.fail_on(HttpMethod::Get, HttpResponse::new(500, "oops"));
        let c = controller(api);
        assert!(c.load().is_err());
        assert_eq!(c.session().error.as_deref(), Some(LOAD_FAILED));
    }

    #[test]
    fn create_then_resync_shows_server_item() {
        let c = controller(FakeApi::default());
        c.load().unwrap();

        let created = c.submit(draft("Widget", 5, "9.99")).unwrap();
        assert_eq!(created.id, ItemId::Int(1));

        let s = c.session();
        assert_eq!(s.items, vec![created]);
        assert_eq!(s.selected_item, None);
        assert!(!s.submitting);
        assert_eq!(
            c.transport().requests(),
            vec![
                (HttpMethod::Get, "/items".to_string()),
                (HttpMethod::Post, "/items".to_string()),
                (HttpMethod::Get, "/items".to_string()),
            ]
        );
    }

    #[test]
    fn submit_with_selection_updates_never_creates() {
        let c = controller(FakeApi::with_items(vec![item(1, "A"), item(2, "B")]));
        c.load().unwrap();
        c.select(item(2, "B"));

        let updated = c.submit(draft("B2", 7, "3.5")).unwrap();
        assert_eq!(updated.name, "B2");
        let methods: Vec<_> = c.transport().requests().into_iter().map(|(m, p)| format!("{m} {p}")).collect();
        assert_eq!(methods, vec!["GET /items", "PUT /items/2", "GET /items"]);
        assert_eq!(c.session().selected_item, None);
        assert_eq!(c.session().items, c.transport().stored());
    }

    #[test]
    fn failed_update_keeps_selection_and_surfaces_detail() {
        let c = controller(FakeApi::with_items(vec![item(1, "A")]));
        c.load().unwrap();
        c.select(item(42, "Gone"));

        let err = c.submit(draft("X", 1, "1")).unwrap_err();
        assert!(matches!(err, ControllerError::Api(ApiError::NotFound { .. })));
        let s = c.session();
        assert_eq!(s.error.as_deref(), Some("Item not found"));
        assert_eq!(s.selected_item, Some(item(42, "Gone")));
        assert!(!s.submitting);
        assert_eq!(s.items.len(), 1);
    }

    #[test]
    fn failed_update_without_detail_says_request_failed() {
        let api = FakeApi::with_items(vec![item(42, "A")]);
        api.fail_on(HttpMethod::Put, HttpResponse::new(404, ""));
        let c = controller(api);
        c.select(item(42, "A"));
        assert!(c.submit(draft("X", 1, "1")).is_err());
        assert_eq!(c.session().error.as_deref(), Some(REQUEST_FAILED));
        assert!(c.session().selected_item.is_some());
    }

    #[test]
    fn new_operation_clears_previous_error() {
        let api = FakeApi::default();
        api.fail_on(HttpMethod::Post, HttpResponse::new(422, r#"{"detail":"bad name"}"#));
        let c = controller(api);
        assert!(c.submit(draft("X", 1, "1")).is_err());
        assert_eq!(c.session().error.as_deref(), Some("bad name"));

        *c.transport().fail.lock().unwrap() = None;
        c.submit(draft("X", 1, "1")).unwrap();
        assert_eq!(c.session().error, None);
    }

    #[test]
    fn declined_delete_sends_nothing() {
        let c = controller(FakeApi::with_items(vec![item(1, "A")]));
        c.load().unwrap();
        let before = c.session();
        let requests_before = c.transport().requests().len();

        let mut prompt = String::new();
        let outcome = c
            .delete(&ItemId::Int(1), |p| {
                prompt = p.to_string();
                false
            })
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(prompt, DELETE_PROMPT);
        assert_eq!(c.session(), before);
        assert_eq!(c.transport().requests().len(), requests_before);
        assert_eq!(c.transport().stored().len(), 1);
    }

    #[test]
    fn confirmed_delete_resyncs() {
        let c = controller(FakeApi::with_items(vec![item(1, "A"), item(2, "B")]));
        c.load().unwrap();
        let outcome = c.delete(&ItemId::Int(1), |_| true).unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(c.session().items, vec![item(2, "B")]);
    }

    #[test]
    fn failed_delete_uses_delete_fallback() {
        let api = FakeApi::with_items(vec![item(1, "A")]);
        api.fail_on(HttpMethod::Delete, HttpResponse::new(503, ""));
        let c = controller(api);
        c.load().unwrap();
        assert!(c.delete(&ItemId::Int(1), |_| true).is_err());
        let s = c.session();
        assert_eq!(s.error.as_deref(), Some(DELETE_FAILED));
        assert_eq!(s.items.len(), 1);
        assert!(!s.submitting);
    }

    #[test]
    fn select_then_cancel_changes_nothing() {
        let c = controller(FakeApi::with_items(vec![item(1, "A")]));
        c.load().unwrap();
        let before = c.session();
        let stored = c.transport().stored();
        let requests = c.transport().requests().len();

        c.select(before.items[0].clone());
        assert_eq!(c.session().selected_item, Some(item(1, "A")));
        c.cancel_edit();

        assert_eq!(c.session(), before);
        assert_eq!(c.transport().stored(), stored);
        assert_eq!(c.transport().requests().len(), requests);
    }

    #[test]
    fn items_match_server_after_mutation_sequence() {
        let c = controller(FakeApi::default());
        c.load().unwrap();
        for name in ["a", "b", "c", "d"] {
            c.submit(draft(name, 1, "1.25")).unwrap();
        }
        let second = c.session().items[1].clone();
        c.select(second.clone());
        c.submit(draft("b-renamed", 9, "2")).unwrap();
        c.delete(&c.session().items[0].id.clone(), |_| true).unwrap();
        c.delete(&second.id, |_| true).unwrap();

        let s = c.session();
        assert_eq!(s.items, c.transport().stored());
        assert_eq!(s.items.len(), 2);
        let mut ids: Vec<_> = s.items.iter().map(|i| i.id.to_string()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn refresh_failure_after_write_overwrites_error() {
        let api = FakeApi::default();
        api.fail_on(HttpMethod::Get, HttpResponse::new(500, r#"{"detail":"db down"}"#));
        let c = controller(api);

        let created = c.submit(draft("Widget", 1, "1")).unwrap();
        let s = c.session();
        assert_eq!(s.error.as_deref(), Some("db down"));
        assert!(s.items.is_empty());
        assert_eq!(c.transport().stored(), vec![created]);
    }

    /// Blocks every POST until the test releases it.
    struct Gated {
        inner: FakeApi,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Transport for Gated {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            if request.method == HttpMethod::Post {
                self.entered.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            self.inner.execute(request)
        }
    }

    #[test]
    fn concurrent_mutation_is_rejected_while_in_flight() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gated = Gated {
            inner: FakeApi::with_items(vec![item(1, "A")]),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let c = Controller::new(InventoryClient::new(BASE), gated);

        std::thread::scope(|scope| {
            let first = scope.spawn(|| c.submit(draft("first", 1, "1")));
            entered_rx.recv().unwrap();

            assert!(c.session().submitting);
            assert_eq!(c.submit(draft("second", 1, "1")), Err(ControllerError::Busy));
            assert_eq!(c.delete(&ItemId::Int(1), |_| true), Err(ControllerError::Busy));

            release_tx.send(()).unwrap();
            assert!(first.join().unwrap().is_ok());
        });

        let s = c.session();
        assert!(!s.submitting);
        assert_eq!(s.items.len(), 2);
        let posts = c
            .transport()
            .inner
            .requests()
            .into_iter()
            .filter(|(m, _)| *m == HttpMethod::Post)
            .count();
        assert_eq!(posts, 1);
        assert_eq!(c.transport().inner.stored().len(), 2);
    }
}
