//! file-vault - Personal file storage API with per-session device sync
//!
//! This crate provides per-owner file upload, metadata management, and
//! content serving with:
//! - Signed access/refresh tokens with single-shot rotation and revocation
//! - redb embedded database for metadata (ACID, MVCC, crash-safe)
//! - Owner-partitioned blob storage behind a swappable backend trait
//! - Real-time push of file-list changes to every socket of a session

pub mod api;
pub mod auth;
pub mod config;
pub mod notify;
pub mod object_store;
pub mod storage;

use std::sync::Arc;

use auth::TokenSigner;
use config::Config;
use notify::NotificationHub;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub blob_store: Arc<dyn object_store::ObjectStore>,
    pub hub: Arc<dyn NotificationHub>,
    pub tokens: TokenSigner,
}
