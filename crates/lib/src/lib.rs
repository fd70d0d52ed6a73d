//! opsbot core library: the chat-session pipeline behind the `opsbot` CLI.
//!
//! Inbound frames flow through [`payload`] (normalize) → [`classify`] → [`timeline`];
//! [`session`] owns the timeline and connection state, [`transport`] is the WebSocket
//! client, and [`driver`] serializes both onto one writer.

pub mod classify;
pub mod config;
pub mod driver;
pub mod init;
pub mod payload;
pub mod sanitize;
pub mod session;
pub mod timeline;
pub mod transport;
