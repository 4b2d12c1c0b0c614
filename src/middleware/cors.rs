use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::identity::USER_ID_HEADER;

/// Any origin; only the methods and headers the API actually uses.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_origin(Any)
}
