//! Local key-value persistence for the partner session.
//!
//! Two keys are kept: the authentication flag and the serialized partner
//! profile. Backends only move strings; (de)serialization lives here.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::partner::Partner;

pub const AUTH_KEY: &str = "isAuthenticated";
pub const PARTNER_KEY: &str = "partner";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub async fn load_partner(store: &dyn KeyValueStore) -> Result<Option<Partner>, StoreError> {
    match store.get(PARTNER_KEY).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn save_partner(store: &dyn KeyValueStore, partner: &Partner) -> Result<(), StoreError> {
    store.set(PARTNER_KEY, serde_json::to_string(partner)?).await
}

pub async fn is_authenticated(store: &dyn KeyValueStore) -> Result<bool, StoreError> {
    Ok(store.get(AUTH_KEY).await?.as_deref() == Some("true"))
}

pub async fn set_authenticated(store: &dyn KeyValueStore, authenticated: bool) -> Result<(), StoreError> {
    if authenticated {
        store.set(AUTH_KEY, "true".to_string()).await
    } else {
        store.remove(AUTH_KEY).await
    }
}

/// Session persisted by an earlier run: present only when the auth flag is
/// set and a partner profile was stored.
pub async fn load_session(store: &dyn KeyValueStore) -> Result<Option<Partner>, StoreError> {
    if !is_authenticated(store).await? {
        return Ok(None);
    }
    load_partner(store).await
}
