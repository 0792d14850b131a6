//! # agora-store
//!
//! Document storage for the Agora backend, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model, plus a cloneable [`Store`] that shares one connection between
//! request handlers and background tasks.

pub mod activity_logs;
pub mod comments;
pub mod currencies;
pub mod database;
pub mod experiences;
pub mod friends;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod people;
pub mod posts;
pub mod reports;
pub mod tags;
pub mod transactions;
pub mod users;
pub mod votes;
pub mod wallets;

mod codec;
mod error;

pub use database::{Database, Store};
pub use error::{Result, StoreError};
pub use models::*;
