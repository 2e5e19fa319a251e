//! memchat core library — provider catalog, transcript, backend client, and
//! the session controller shared by the CLI frontend.

pub mod api;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod transcript;
