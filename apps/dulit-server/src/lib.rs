//! Dulit Server Library
//!
//! Backend for the Dulit event: programme and speaker records, image
//! hosting, and personalized pass generation (DOCX template → PDF → URL).
//!
//! # Modules
//!
//! - `pipeline`: pass generation (template fill, conversion, delivery)
//! - `db`: SQLite-backed record store
//! - `routes`: HTTP handlers

pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::documents::router())
        .merge(routes::images::router())
        .nest("/programmes", routes::programmes::router())
        .nest("/speakers", routes::speakers::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
