//! # mediashelf
//!
//! A local media server: serves a directory tree over HTTP and generates a
//! page with an `<audio>`/`<video>` player for every media file in it.
//! Optionally, each page request first concatenates the audio files of every
//! subdirectory into a single `.mp3` track with ffmpeg.
//!
//! ## Architecture
//!
//! - **Axum** / **tower-http**: routing, static files, request tracing
//! - **Tokio**: per-request tasks, the aggregation task tree, child processes
//! - **askama**: the media page and directory listing templates
//!
//! ## Core Components
//!
//! - [`aggregator`]: recursive per-directory audio concatenation
//! - [`cli`]: command line flags
//! - [`config`]: layered configuration
//! - [`error`]: HTTP error responses
//! - [`logging`]: tracing subscriber setup
//! - [`media`]: extension based media classification
//! - [`metrics`]: counters exposed on `/metrics`
//! - [`middleware`]: response headers (CORS)
//! - [`playlist`]: media page rendering
//! - [`routes`]: HTTP handlers and the router
//! - [`state`]: shared application state
//! - [`types`]: directory entries and playlist entries

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod playlist;
pub mod routes;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
