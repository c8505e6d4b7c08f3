//! The command gateway: validates external commands, funnels them through
//! the single engine lock, forwards drained events, and serves read models.

use crate::config::Config;
use crate::engine::InventoryEngine;
use crate::events::{Event, EventSender};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::{Arc, RwLock};

mod baskets;
mod ingest;
mod receiving;
mod rules;
mod staff;
mod system;
mod tasks;
mod zones;

/// Application state shared across handlers.
///
/// Commands are serialised through the engine lock, so every request
/// observes read models consistent with the command that just finished.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<InventoryEngine>>,
    pub event_sender: Arc<EventSender>,
    pub config: Config,
}

/// Forward events the engine left in its outbox during a command.
pub(crate) async fn publish(state: &AppState, events: Vec<Event>) {
    for event in events {
        state.event_sender.send(event).await;
    }
}

pub fn api_v1_router() -> Router<AppState> {
    Router::new()
        // ingestion
        .route("/reads", post(ingest::ingest_read))
        .route("/sales-events", post(ingest::ingest_sales_event))
        .route("/zones/{id}/sweep", post(ingest::sweep_zone))
        // zones
        .route("/zones", get(zones::list_zones).post(zones::create_zone))
        .route(
            "/zones/{id}",
            get(zones::zone_detail)
                .put(zones::update_zone)
                .delete(zones::delete_zone),
        )
        .route("/zones/{id}/sources", post(zones::add_source))
        .route(
            "/zones/{id}/sources/{source_id}",
            delete(zones::remove_source),
        )
        .route("/external-locations", post(zones::create_external))
        // baskets
        .route("/baskets", get(baskets::list_items))
        .route("/baskets/items", post(baskets::add_item))
        .route("/baskets/items/{id}", delete(baskets::remove_item))
        .route("/customers/{id}/checkout", post(baskets::checkout))
        // rules & templates
        .route(
            "/rule-templates",
            get(rules::list_templates).post(rules::upsert_template),
        )
        .route("/rule-templates/{id}", delete(rules::delete_template))
        .route("/rules", get(rules::list_rules).put(rules::upsert_rule))
        .route("/rules/{id}", delete(rules::delete_rule))
        // tasks
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/{id}", get(tasks::get_task))
        .route("/tasks/{id}/assign", post(tasks::assign_task))
        .route("/tasks/{id}/start", post(tasks::start_task))
        .route("/tasks/{id}/confirm", post(tasks::confirm_task))
        // receiving
        .route(
            "/receiving-orders",
            get(receiving::list_orders).post(receiving::create_order),
        )
        .route("/receiving-orders/{id}/confirm", post(receiving::confirm_order))
        // staff
        .route("/staff", get(staff::list_staff).post(staff::create_staff))
        .route("/staff/{id}", put(staff::update_staff))
        // read models
        .route("/dashboard", get(system::dashboard))
        .route("/audit", get(system::audit_log))
        .route("/timeline", get(system::timeline))
}
