//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams wallet events (deposits,
//! purchases, refunds, interest credits, status changes) to subscribed
//! clients in real time.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
