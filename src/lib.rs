//! # Plaza
//!
//! Client-side state for a community content site publishing news, events and
//! restaurant posts over a REST backend.
//!
//! ## Architecture
//!
//! ```text
//! CLI → FetchCoordinator → ContentStore ← ApiClient
//!                          FavoriteStore ← ApiClient
//! ```
//!
//! Listings are cached per content type and refetched when stale or when the
//! requested filters differ from the stored ones. Favorites are tracked per post
//! with optimistic counts.
//!
//! ## Quick Start
//!
//! ```bash
//! # First page of every type
//! plaza list
//!
//! # Filtered listing
//! plaza list events --search jazz --sort oldest
//!
//! # A single post
//! plaza show summer-festival
//!
//! # Authenticated actions
//! plaza login <token>
//! plaza favorite 65f1c0ffee
//! ```

/// REST transport.
///
/// - [`ApiClient`](api::ApiClient): async trait over GET/POST/PUT/DELETE
/// - [`HttpApiClient`](api::HttpApiClient): reqwest implementation with bearer auth
/// - [`endpoints`](api::endpoints) and [`responses`](api::responses): paths and envelopes
pub mod api;

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together every store
/// around one API client, session and clock.
pub mod app;

/// Bearer token storage and sign-in redirects.
pub mod auth;

/// Time-boxed cache used for favorite lookups.
pub mod cache;

/// Command-line interface using clap.
///
/// - `list [type]` - List posts
/// - `show <slug>` - Show a post with related posts
/// - `create` / `update <id>` / `delete <id>` - Manage posts
/// - `favorite <post>` / `favorites <user>` - Favorites
/// - `subscribe <email>` - Newsletter
/// - `profile` / `update-profile` - User profiles
/// - `login <token>` / `logout` - Session
pub mod cli;

pub mod clock;

/// Configuration loaded from `~/.config/plaza/config.toml`.
pub mod config;

/// Cache-or-fetch decisions for paginated listings.
pub mod coordinator;

/// Core domain models.
///
/// - [`Post`](domain::Post): a news, event or restaurant post with type-specific details
/// - [`PostDraft`](domain::PostDraft): validated form data
/// - [`Favorite`](domain::Favorite), [`User`](domain::User), [`Subscription`](domain::Subscription)
pub mod domain;

/// Per-post favorite status and counts.
pub mod favorites;

/// Date and text formatting for display.
pub mod format;

/// User-visible success and failure messages.
pub mod notify;

/// Listing partitions and single-post state.
pub mod store;

pub mod subscribe;

pub mod user;

#[cfg(test)]
mod fixtures;
