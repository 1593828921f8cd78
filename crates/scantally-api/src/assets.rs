//! Static scanner page, web-app manifest, and offline service worker.

use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde_json::{json, Value};

const INDEX_HTML: &str = include_str!("../assets/index.html");
const SERVICE_WORKER_JS: &str = include_str!("../assets/service-worker.js");

const ICON_SVG: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'%3E%3Crect width='100' height='100' fill='%23000'/%3E%3Cpath d='M20 25v50M30 25v50M38 25v50M50 25v50M58 25v50M70 25v50M80 25v50' stroke='white' stroke-width='4'/%3E%3C/svg%3E";

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn manifest() -> Json<Value> {
    Json(json!({
        "name": "Scantally Scanner",
        "short_name": "Scantally",
        "start_url": "/",
        "display": "standalone",
        "background_color": "#ffffff",
        "theme_color": "#000000",
        "icons": [{
            "src": ICON_SVG,
            "sizes": "192x192",
            "type": "image/svg+xml"
        }]
    }))
}

pub async fn service_worker() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        SERVICE_WORKER_JS,
    )
}
