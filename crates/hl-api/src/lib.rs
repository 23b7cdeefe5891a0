//! # hl-api
//!
//! The web routing and orchestration layer for Hearthline.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use actix_web::web;

/// Configures the routes for the backend.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // Auth + sessions
            .route("/users", web::post().to(handlers::register))
            .route("/users/{username}", web::get().to(handlers::get_user))
            .route("/login", web::post().to(handlers::login))
            .route("/logout", web::post().to(handlers::logout))
            .route("/session", web::get().to(handlers::current_session))
            // Threads
            .route("/threads", web::post().to(handlers::create_thread))
            .route("/threads", web::delete().to(handlers::delete_thread))
            .route("/threads/{id}", web::get().to(handlers::get_thread_posts))
            .route("/threads/{id}", web::patch().to(handlers::edit_thread_title))
            .route("/joinThreads/{id}", web::patch().to(handlers::join_thread))
            .route("/leaveThreads/{id}", web::patch().to(handlers::leave_thread))
            // Posts
            .route("/posts", web::post().to(handlers::create_post))
            .route("/posts/{id}", web::patch().to(handlers::update_post))
            .route("/posts/{id}", web::delete().to(handlers::delete_post))
            .route("/posts/author/{id}", web::get().to(handlers::get_posts_by_author))
            // Profiling
            .route("/profile/question", web::get().to(handlers::get_profile_question))
            .route("/profile", web::post().to(handlers::answer_profile))
            .route("/profile", web::patch().to(handlers::answer_profile))
            .route("/profile/{id}", web::get().to(handlers::get_profile)),
    );
}
