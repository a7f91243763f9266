// 🌐 REST API - Classification over HTTP for UI collaborators
// Every response uses the { success, data, error } envelope

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::classifier::EventClassifier;
use crate::mapping::{EntryType, EventDescriptor};
use crate::notify::{Notification, NotificationLog};

/// Shared application state
///
/// `notifications` must be the notifier the classifier reports to.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<EventClassifier>,
    pub notifications: NotificationLog,
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Query for GET /api/classify
#[derive(Debug, Deserialize)]
pub struct ClassifyQuery {
    pub event_type: String,
    pub event_subtype: String,
    pub counterparty: Option<String>,
    pub entry_type: Option<String>,
    #[serde(default)]
    pub is_exit: bool,
    #[serde(default = "default_show_fallback_label")]
    pub show_fallback_label: bool,
}

fn default_show_fallback_label() -> bool {
    true
}

#[derive(Serialize)]
struct MappingStatus {
    generation: u64,
    event_types: usize,
    categories: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/mappings - Current snapshot (raw backend labels)
async fn get_mappings(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.classifier.snapshot();
    Json(ApiResponse::ok(snapshot.as_ref().clone()))
}

/// GET /api/categories - Category details with localized labels
async fn get_categories(State(state): State<AppState>) -> impl IntoResponse {
    let details = state.classifier.category_details();
    Json(ApiResponse::ok(details.as_ref().clone()))
}

/// GET /api/event-types
async fn get_event_types(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.classifier.event_types_data()))
}

/// GET /api/event-subtypes
async fn get_event_subtypes(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.classifier.event_subtypes_data()))
}

/// GET /api/classify - Classify one event
async fn classify(State(state): State<AppState>, Query(query): Query<ClassifyQuery>) -> impl IntoResponse {
    let entry_type = match query.entry_type.as_deref().filter(|value| !value.is_empty()) {
        Some(raw) => match raw.parse::<EntryType>() {
            Ok(entry_type) => Some(entry_type),
            Err(message) => {
                return (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(message))).into_response();
            }
        },
        None => None,
    };

    let descriptor = EventDescriptor {
        event_type: query.event_type,
        event_subtype: query.event_subtype,
        counterparty: query.counterparty,
        entry_type,
        is_exit: query.is_exit,
    };

    let result = state.classifier.event_type_data(&descriptor, query.show_fallback_label);
    (StatusCode::OK, Json(ApiResponse::ok(result))).into_response()
}

/// GET /api/accounting - All accounting event types
async fn get_accounting_events(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.classifier.accounting_events_data()))
}

/// GET /api/accounting/:key - One accounting event type
async fn get_accounting_event(State(state): State<AppState>, Path(key): Path<String>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.classifier.accounting_event_data(&key)))
}

fn mapping_status(classifier: &EventClassifier) -> MappingStatus {
    let snapshot = classifier.snapshot();
    MappingStatus {
        generation: classifier.cache().generation(),
        event_types: snapshot.global_mappings.len(),
        categories: snapshot.event_category_details.len(),
    }
}

/// POST /api/refresh - Refetch mappings from the backend
async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    match state.classifier.refresh().await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok(mapping_status(&state.classifier)))).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ApiResponse::<MappingStatus>::err(e.message())),
        )
            .into_response(),
    }
}

/// GET /api/notifications - Pending failure notifications, oldest first
async fn get_notifications(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::<Vec<Notification>>::ok(state.notifications.all()))
}

/// POST /api/notifications/:id/retry - Run the notification's action ("Fetch again")
///
/// The notification is consumed; a retry that fails again shows up as a new one.
async fn retry_notification(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    if !state.notifications.trigger(&id).await {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<MappingStatus>::err(format!("Notification not found: {}", id))),
        )
            .into_response();
    }

    (StatusCode::OK, Json(ApiResponse::ok(mapping_status(&state.classifier)))).into_response()
}

/// DELETE /api/notifications/:id - Dismiss a notification
async fn dismiss_notification(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    if state.notifications.dismiss(&id) {
        (StatusCode::OK, Json(ApiResponse::ok(id))).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<String>::err(format!("Notification not found: {}", id))),
        )
            .into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/mappings", get(get_mappings))
        .route("/categories", get(get_categories))
        .route("/event-types", get(get_event_types))
        .route("/event-subtypes", get(get_event_subtypes))
        .route("/classify", get(classify))
        .route("/accounting", get(get_accounting_events))
        .route("/accounting/:key", get(get_accounting_event))
        .route("/refresh", post(refresh))
        .route("/notifications", get(get_notifications))
        .route("/notifications/:id", delete(dismiss_notification))
        .route("/notifications/:id/retry", post(retry_notification))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================
