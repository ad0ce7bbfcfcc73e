//! Room-based signaling server for browser peer-to-peer calls.
//!
//! Browsers join a named room over a websocket, learn about the other members,
//! and exchange opaque session descriptions and candidates through the server.
//! Media never passes through here.

pub mod accounts;
pub mod actor;
pub mod app_state;
pub mod config;
pub mod hub;
pub mod room;
pub mod routes;
pub mod signal;
pub mod ws;
