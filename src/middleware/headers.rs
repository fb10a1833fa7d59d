//! Response header middleware.
//!
//! Every response, including static files, the media page and error bodies,
//! is readable cross-origin so players on other pages can embed the files.

use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, X_CONTENT_TYPE_OPTIONS};
use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Adds `Access-Control-Allow-Origin: *` and `X-Content-Type-Options: nosniff`.
pub async fn response_headers_middleware(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    res
}
