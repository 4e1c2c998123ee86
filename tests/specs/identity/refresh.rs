// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth2 refresh scheduling specs

use chrono::{Duration, TimeZone, Utc};
use evl_core::FakeClock;
use evl_identity::oauth2::FakeOAuth2Client;
use evl_identity::test_support::fixtures;
use evl_identity::{IdentityRefresher, IdentityStore, MemoryIdentityStore, TokenLifecycle};
use std::sync::Arc;

#[tokio::test]
async fn refresh_happens_at_half_ttl_and_reschedules() {
    let start = Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap();
    let clock = FakeClock::at(start);
    let client = FakeOAuth2Client::new();
    client.push_token("access-1", Some("refresh-1"), Some(1201));

    let store = Arc::new(MemoryIdentityStore::new());
    let mut identity = fixtures::authorized_oauth2_identity("api");
    identity.refresh_time = Some(start + Duration::seconds(1800));
    let id = identity.id.clone();
    store.save(identity);

    let refresher = IdentityRefresher::new(store.clone(), TokenLifecycle::new(client.clone(), clock.clone()), clock.clone());

    // not due yet
    assert!(!refresher.process_one().await.unwrap());

    clock.advance(std::time::Duration::from_secs(1800));
    assert!(refresher.process_one().await.unwrap());

    let now = start + Duration::seconds(1800);
    let refreshed = store.get(&id).unwrap();
    let oauth = refreshed.data.oauth2().unwrap();
    assert_eq!(oauth.access_token, "access-1");
    assert_eq!(oauth.refresh_token, "refresh-1");
    assert_eq!(oauth.expiration_time, Some(now + Duration::seconds(1201)));
    assert_eq!(refreshed.refresh_time, Some(now + Duration::seconds(601)));
}
