//! # leadswipe
//!
//! Swipe-feed core for reviewing sales leads sourced from Facebook groups,
//! served over REST and WebSocket.
//!
//! A signed-in user works through a paginated feed one card at a time:
//! swiping right matches a lead, swiping left archives it. Every decision
//! is recorded in per-user membership tables (viewed, saved, matched,
//! blocked, archived) so the feed never shows the same lead twice.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── SessionRegistry ── LeadSession (session/)
//!     │       SwipeCard · MembershipManager · FeedController
//!     │
//!     ├── Lead / Notification / Group / Settings services (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── Store ports (store/): InMemoryStore | PostgresStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod query;
pub mod service;
pub mod session;
pub mod store;
pub mod ws;
