//! WebSocket layer: live notification stream.
//!
//! The endpoint at `/ws?token=...` pushes the user's new notifications with
//! a running unread count and accepts a few read-marking commands.

pub mod connection;
pub mod handler;
pub mod messages;
