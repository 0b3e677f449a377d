//! Core of the agenda sync ecosystem.
//!
//! This crate holds everything both the CLI and the server share:
//! - `snapshot`: the agenda document model
//! - `identity`: the stable per-device id and display name
//! - `diff` and `presentation`: what differs between two snapshots, and how to show it
//! - `resolution`: the single in-flight conflict dialog
//! - `sync`: the driver deciding between push, pull and asking the operator

pub mod agenda;
pub mod config;
pub mod diff;
pub mod error;
pub mod identity;
pub mod presentation;
pub mod resolution;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use agenda::Agenda;
pub use error::{AgendaError, AgendaResult};
pub use snapshot::{AgendaSnapshot, Category, Item, SnapshotMetadata};
