// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background renewal of refreshable identities

use crate::error::OAuth2Error;
use crate::identity::Identity;
use crate::oauth2::{OAuth2Client, TokenLifecycle};
use chrono::{DateTime, Utc};
use evl_core::{Clock, IdentityId};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Delay before retrying an identity whose refresh failed.
pub const RETRY_DELAY: Duration = Duration::from_secs(600);

/// Where refreshable identities are loaded from and saved to.
pub trait IdentityStore: Send + Sync {
    /// The refreshable identity with the oldest refresh time not after `now`.
    fn next_due(&self, now: DateTime<Utc>) -> Option<Identity>;

    fn save(&self, identity: Identity);
}

impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    fn next_due(&self, now: DateTime<Utc>) -> Option<Identity> {
        (**self).next_due(now)
    }

    fn save(&self, identity: Identity) {
        (**self).save(identity)
    }
}

/// In-memory [`IdentityStore`].
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: Mutex<BTreeMap<IdentityId, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &IdentityId) -> Option<Identity> {
        self.identities.lock().get(id).cloned()
    }

    pub fn by_name(&self, name: &str) -> Option<Identity> {
        self.identities.lock().values().find(|i| i.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.identities.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.lock().is_empty()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn next_due(&self, now: DateTime<Utc>) -> Option<Identity> {
        self.identities
            .lock()
            .values()
            .filter(|i| i.refreshable())
            .filter_map(|i| i.refresh_time.filter(|t| *t <= now).map(|t| (t, i)))
            .min_by_key(|(t, _)| *t)
            .map(|(_, i)| i.clone())
    }

    fn save(&self, identity: Identity) {
        self.identities.lock().insert(identity.id.clone(), identity);
    }
}

#[derive(Debug, Error)]
#[error("cannot refresh identity {identity_id}: {source}")]
pub struct RefreshError {
    pub identity_id: IdentityId,
    #[source]
    pub source: OAuth2Error,
}

/// Refreshes due identities one at a time.
pub struct IdentityRefresher<S, O, C> {
    store: S,
    lifecycle: TokenLifecycle<O, C>,
    clock: C,
    retry_delay: Duration,
}

impl<S, O, C> IdentityRefresher<S, O, C>
where
    S: IdentityStore,
    O: OAuth2Client,
    C: Clock,
{
    pub fn new(store: S, lifecycle: TokenLifecycle<O, C>, clock: C) -> Self {
        Self { store, lifecycle, clock, retry_delay: RETRY_DELAY }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Refresh the next due identity, if any. Returns whether one was
    /// processed.
    ///
    /// A failed refresh postpones the identity by the retry delay and is
    /// reported as an error after the identity has been saved.
    pub async fn process_one(&self) -> Result<bool, RefreshError> {
        let now = self.clock.utc_now();
        let Some(mut identity) = self.store.next_due(now) else {
            return Ok(false);
        };

        tracing::info!(identity_id = %identity.id, name = %identity.name, "refreshing identity");
        let result = self.lifecycle.refresh_identity(&mut identity).await;

        if let Err(source) = result {
            tracing::error!(identity_id = %identity.id, error = %source, "cannot refresh identity");
            let delay = chrono::Duration::from_std(self.retry_delay).unwrap_or_else(|_| chrono::Duration::zero());
            let base = identity.refresh_time.unwrap_or(now);
            identity.refresh_time = Some(base + delay);
            let identity_id = identity.id.clone();
            self.store.save(identity);
            return Err(RefreshError { identity_id, source });
        }

        self.store.save(identity);
        Ok(true)
    }

    /// Process due identities until `cancel` fires, polling every `interval`
    /// when nothing is due.
    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        loop {
            // failures are logged by process_one
            let processed = self.process_one().await.unwrap_or(false);
            if processed {
                continue;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        tracing::debug!("identity refresher stopped");
    }
}

#[cfg(test)]
#[path = "refresher_tests.rs"]
mod tests;
