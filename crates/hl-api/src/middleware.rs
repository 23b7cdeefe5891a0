//! hearthline/crates/hl-api/src/middleware.rs Middleware
//!
//! Custom middleware for security, logging, and traffic control.

use actix_web::middleware::Logger;
use actix_cors::Cors;

// Returns a standard set of middleware for the Hearthline API.
pub fn standard_middleware() -> Logger {
    // We use the 'default' logger which outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing)
// The session cookie requires credentialed requests from the frontend.
pub fn cors_policy(frontend_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_origin)
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allowed_headers(vec!["content-type"])
        .supports_credentials()
        .max_age(3600)
}
