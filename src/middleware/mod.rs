//! HTTP middleware layered over every route.

pub mod headers;

pub use headers::response_headers_middleware;
