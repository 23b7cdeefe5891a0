//! # Hearthline Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_web::{web, App, HttpServer};
use hl_api::handlers::AppState;
use hl_api::{configure_routes, middleware};
use hl_core::models::ProfileQuestion;
use std::sync::Arc;

// Feature-gated imports: plugins are compiled to order
#[cfg(feature = "db-sqlite")]
use hl_store_sqlite::SqliteDocStore;

#[cfg(feature = "auth-simple")]
use hl_auth_simple::{SessionRegistry, SimpleAuth};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let db_url = std::env::var("HEARTHLINE_DB").unwrap_or_else(|_| "sqlite:hearthline.db".into());
    let addr = std::env::var("HEARTHLINE_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let frontend =
        std::env::var("HEARTHLINE_FRONTEND").unwrap_or_else(|_| "http://localhost:5173".into());

    // The one owned copy of the profiling configuration, injected into
    // both the persistence plugin and the route layer.
    let question = ProfileQuestion::default_question();

    // 1. Initialize the document store implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(
        SqliteDocStore::new(&db_url, question.clone())
            .await
            .expect("Failed to init SQLite document store"),
    );

    // 2. Initialize the identity/session implementations
    #[cfg(feature = "auth-simple")]
    let auth = Arc::new(SimpleAuth::new());
    #[cfg(feature = "auth-simple")]
    let sessions = Arc::new(SessionRegistry::new());

    // 3. Wrap in AppState (dynamic dispatch so plugins stay swappable)
    let state = web::Data::new(AppState {
        threads: store.clone(),
        posts: store.clone(),
        profiles: store,
        auth,
        sessions,
        question,
    });

    log::info!("🔥 Hearthline starting on http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy(&frontend))
            .configure(configure_routes)
    })
    .bind(addr)?
    .run()
    .await
}
