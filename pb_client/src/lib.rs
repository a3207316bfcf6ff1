//! Internal modules for the terminal client.
//!
//! This library provides command parsing, the HTTP API client, round result
//! tracking and the text rendering used by the pb_client binary.

pub mod api_client;
pub mod commands;
pub mod display;
pub mod rounds;
