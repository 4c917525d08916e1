//! Two independent broadcast domains rebroadcasting catalog and order
//! mutations to connected listeners.
//!
//! The admin domain is a registry of authenticated connections keyed by the
//! credential subject; the public domain is a plain broadcast channel. All
//! emission is fire-and-forget: no buffering, no retry, no error surfaced to
//! the mutating caller.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};

/// Per-admin-connection mailbox depth; events beyond it are dropped.
const ADMIN_BUFFER: usize = 32;
const PUBLIC_BUFFER: usize = 64;

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub event: String,
    pub data: Value,
}

impl Event {
    pub fn new(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }
}

#[derive(Clone)]
pub struct NotificationHub {
    admins: Arc<DashMap<String, mpsc::Sender<Event>>>,
    public_tx: broadcast::Sender<Event>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        let (public_tx, _) = broadcast::channel(PUBLIC_BUFFER);
        Self {
            admins: Arc::new(DashMap::new()),
            public_tx,
        }
    }

    /// Register an admin connection under its credential subject. A subject
    /// reconnecting overwrites its previous entry: latest connection wins.
    pub fn register_admin(&self, subject: &str) -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(ADMIN_BUFFER);
        self.admins.insert(subject.to_string(), tx.clone());
        (tx, rx)
    }

    /// Remove the registry entry, but only if it still belongs to the caller's
    /// connection; a superseding connection's entry is left alone.
    pub fn unregister_admin(&self, subject: &str, tx: &mpsc::Sender<Event>) {
        self.admins
            .remove_if(subject, |_, current| current.same_channel(tx));
    }

    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }

    pub fn is_admin_connected(&self, subject: &str) -> bool {
        self.admins.contains_key(subject)
    }

    pub fn subscribe_public(&self) -> broadcast::Receiver<Event> {
        self.public_tx.subscribe()
    }

    /// Deliver to every connected admin. Full or closed mailboxes are
    /// skipped; zero listeners is a no-op.
    pub fn emit_admin(&self, event: &str, data: Value) {
        let event = Event::new(event, data);
        for entry in self.admins.iter() {
            if entry.value().try_send(event.clone()).is_err() {
                tracing::debug!(subject = %entry.key(), event = %event.event, "admin listener unavailable, dropping event");
            }
        }
    }

    pub fn emit_public(&self, event: &str, data: Value) {
        // send() errs only when no receiver is subscribed.
        let _ = self.public_tx.send(Event::new(event, data));
    }

    pub fn emit_all(&self, event: &str, data: Value) {
        self.emit_admin(event, data.clone());
        self.emit_public(event, data);
    }

    pub fn emit_new_order(&self, order: Value) {
        self.emit_admin("new-order", order);
    }

    pub fn emit_order_status_change(&self, order_id: &str, status: &str, order: Value) {
        self.emit_admin(
            "order-status-changed",
            json!({
                "orderId": order_id,
                "status": status,
                "order": order,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        );
    }

    pub fn emit_product_created(&self, product: Value) {
        self.emit_all("product-created", product);
    }

    pub fn emit_product_updated(&self, product: Value) {
        self.emit_all("product-updated", product);
    }

    pub fn emit_product_deleted(&self, product_id: &str) {
        self.emit_all(
            "product-deleted",
            json!({ "productId": product_id, "timestamp": Utc::now().to_rfc3339() }),
        );
    }

    pub fn emit_category_created(&self, category: Value) {
        self.emit_all("category-created", category);
    }

    pub fn emit_category_updated(&self, category: Value) {
        self.emit_all("category-updated", category);
    }

    pub fn emit_category_deleted(&self, category_id: &str) {
        self.emit_all(
            "category-deleted",
            json!({ "categoryId": category_id, "timestamp": Utc::now().to_rfc3339() }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emission_with_zero_listeners_is_a_noop() {
        let hub = NotificationHub::new();
        hub.emit_admin("new-order", json!({"total": 4198}));
        hub.emit_public("product-created", json!({}));
        assert_eq!(hub.admin_count(), 0);
    }

    #[tokio::test]
    async fn registered_admin_receives_admin_events() {
        let hub = NotificationHub::new();
        let (_tx, mut rx) = hub.register_admin("admin-1");

        hub.emit_new_order(json!({"orderNumber": "#1001"}));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "new-order");
        assert_eq!(event.data["orderNumber"], "#1001");
    }

    #[tokio::test]
    async fn latest_connection_wins_for_a_subject() {
        let hub = NotificationHub::new();
        let (_old_tx, mut old_rx) = hub.register_admin("admin-1");
        let (_new_tx, mut new_rx) = hub.register_admin("admin-1");

        assert_eq!(hub.admin_count(), 1);

        hub.emit_admin("order-status-changed", json!({"status": "shipped"}));
        assert_eq!(new_rx.recv().await.unwrap().data["status"], "shipped");
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_leaves_superseding_entry_alone() {
        let hub = NotificationHub::new();
        let (old_tx, _old_rx) = hub.register_admin("admin-1");
        let (_new_tx, _new_rx) = hub.register_admin("admin-1");

        // Old session disconnects after being superseded.
        hub.unregister_admin("admin-1", &old_tx);
        assert!(hub.is_admin_connected("admin-1"));
    }

    #[tokio::test]
    async fn catalog_events_reach_both_domains() {
        let hub = NotificationHub::new();
        let (_tx, mut admin_rx) = hub.register_admin("admin-1");
        let mut public_rx = hub.subscribe_public();

        hub.emit_product_deleted("7c9e6679-7425-40de-944b-e07fc1f90ae7");

        let admin_event = admin_rx.recv().await.unwrap();
        let public_event = public_rx.recv().await.unwrap();
        assert_eq!(admin_event.event, "product-deleted");
        assert_eq!(public_event.event, "product-deleted");
        assert_eq!(
            public_event.data["productId"],
            "7c9e6679-7425-40de-944b-e07fc1f90ae7"
        );
    }

    #[tokio::test]
    async fn order_events_stay_off_the_public_channel() {
        let hub = NotificationHub::new();
        let mut public_rx = hub.subscribe_public();

        hub.emit_new_order(json!({"orderNumber": "#1001"}));
        hub.emit_order_status_change("id", "shipped", json!({}));

        assert!(public_rx.try_recv().is_err());
    }
}
