// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Caching of vended role credentials.
//!
//! Each slot moves through two states:
//!
//! ```text
//! EMPTY --get--> CACHED --get (now <= expires_at)--> CACHED (same record)
//!                   \----get (now >  expires_at)--> CACHED' (fresh record)
//! ```
//!
//! With [`CachePolicy::SingleSlot`] every role shares one slot, so while a
//! record is fresh it is returned for any role name, even one that never
//! populated it. [`CachePolicy::PerRole`] keeps one slot per role name.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::configuration::CachePolicy;
use crate::constants::DATE_FORMAT;
use crate::errors::IssuerError;
use crate::issuer::CredentialIssuer;
use crate::models::CredentialRecord;

struct CachedCredential {
    role_name: String,
    record: Arc<CredentialRecord>,
}

#[derive(Default)]
struct SlotState {
    cached: Option<CachedCredential>,
    /// Error of the latest issuer call, cleared by the next success.
    last_failure: Option<IssuerError>,
}

#[derive(Default)]
struct Slot {
    state: RwLock<SlotState>,
    /// Number of completed issuer calls, bumped while holding the write lock.
    refreshes: AtomicU64,
}

pub struct CredentialCache {
    policy: CachePolicy,
    issuer: Arc<dyn CredentialIssuer>,
    shared: Arc<Slot>,
    per_role: Mutex<HashMap<String, Arc<Slot>>>,
}

impl CredentialCache {
    pub fn new(policy: CachePolicy, issuer: Arc<dyn CredentialIssuer>) -> Self {
        Self {
            policy,
            issuer,
            shared: Arc::new(Slot::default()),
            per_role: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached record if it has not expired at `now`, otherwise
    /// assumes `role_name` through the issuer and caches the result.
    ///
    /// Issuer failures are returned as-is and leave the previously cached
    /// record in place. Callers that were already waiting on a refresh that
    /// failed get the same error instead of calling the issuer again.
    #[tracing::instrument(skip(self))]
    pub async fn get_credentials(
        &self,
        role_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Arc<CredentialRecord>, IssuerError> {
        let slot = self.slot(role_name).await;
        // taken before any lock so a refresh already in flight counts as seen
        let observed_refreshes = slot.refreshes.load(Ordering::SeqCst);

        // Fast path: check if cached credentials are still valid
        {
            let state = slot.state.read().await;
            if let Some(ref cached) = state.cached
                && !cached.record.is_expired(now)
            {
                if cached.role_name != role_name {
                    tracing::debug!(
                        "[imds] serving credentials cached for role {}",
                        cached.role_name
                    );
                }
                return Ok(cached.record.clone());
            }
        }

        // Slow path: refresh credentials
        let result = self.refresh(&slot, role_name, now, observed_refreshes).await;
        if result.is_err() {
            self.release_slot(role_name, slot).await;
        }
        result
    }

    /// The record currently held for `role_name`, fresh or not.
    pub async fn current(&self, role_name: &str) -> Option<Arc<CredentialRecord>> {
        let slot = match self.policy {
            CachePolicy::SingleSlot => self.shared.clone(),
            CachePolicy::PerRole => self.per_role.lock().await.get(role_name)?.clone(),
        };
        let state = slot.state.read().await;
        state.cached.as_ref().map(|cached| cached.record.clone())
    }

    async fn slot(&self, role_name: &str) -> Arc<Slot> {
        match self.policy {
            CachePolicy::SingleSlot => self.shared.clone(),
            CachePolicy::PerRole => {
                let mut slots = self.per_role.lock().await;
                slots.entry(role_name.to_string()).or_default().clone()
            }
        }
    }

    /// Drops a per-role slot that never held a record once nobody else is
    /// using it, so rejected role names do not accumulate.
    async fn release_slot(&self, role_name: &str, slot: Arc<Slot>) {
        if self.policy != CachePolicy::PerRole {
            return;
        }

        let mut slots = self.per_role.lock().await;
        // the map and `slot` are the only owners left
        let unused = Arc::strong_count(&slot) == 2
            && slot
                .state
                .try_read()
                .is_ok_and(|state| state.cached.is_none());
        if unused && slots.get(role_name).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
            slots.remove(role_name);
        }
        // release our reference before the map so the last releaser sees a count of 2
        drop(slot);
        drop(slots);
    }

    async fn refresh(
        &self,
        slot: &Slot,
        role_name: &str,
        now: DateTime<Utc>,
        observed_refreshes: u64,
    ) -> Result<Arc<CredentialRecord>, IssuerError> {
        let mut state = slot.state.write().await;

        // Double-check after acquiring write lock (another task may have refreshed)
        if let Some(ref cached) = state.cached
            && !cached.record.is_expired(now)
        {
            return Ok(cached.record.clone());
        }

        // A refresh finished while we waited and it failed: share its outcome
        if slot.refreshes.load(Ordering::SeqCst) != observed_refreshes
            && let Some(ref error) = state.last_failure
        {
            return Err(error.clone());
        }

        let result = self.fetch(role_name, now).await;
        slot.refreshes.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(record) => {
                state.cached = Some(CachedCredential {
                    role_name: role_name.to_string(),
                    record: record.clone(),
                });
                state.last_failure = None;
                Ok(record)
            }
            Err(e) => {
                tracing::error!("[imds] failed to assume role {}: {}", role_name, e);
                state.last_failure = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn fetch(
        &self,
        role_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Arc<CredentialRecord>, IssuerError> {
        let issued = self.issuer.assume(role_name).await?;
        let expires_at = parse_expiration(&issued.expiration)?;

        tracing::debug!(
            "[imds] refreshed credentials for role {}, expires_at: {}",
            role_name,
            issued.expiration
        );

        Ok(Arc::new(CredentialRecord::new(&issued, now, expires_at)))
    }
}

/// Parses an issuer expiration, which must match [`DATE_FORMAT`] exactly.
fn parse_expiration(value: &str) -> Result<DateTime<Utc>, IssuerError> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            tracing::error!("[imds] malformed expiration {:?}: {}", value, e);
            IssuerError::MalformedExpiration(value.to_string())
        })
}
