// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! evl-identity: identities, credential resolution and OAuth2 tokens

pub mod data;
pub mod error;
pub mod identity;
pub mod kind;
pub mod oauth2;
pub mod refresher;
pub mod resolve;
pub mod schema;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use data::{
    ApiKey, GenericPassword, GithubOAuth2Identity, GpgKey, IdentityData, OAuth2Identity, PostgresqlPassword, SshKey,
    UsernamePassword, UsernameToken,
};
pub use error::{IdentityError, OAuth2Error, ResolveError};
pub use identity::{Identity, IdentityStatus};
pub use kind::{Connector, IdentityKind, IdentityType};
pub use oauth2::{HttpOAuth2Client, OAuth2Client, TokenLifecycle};
pub use refresher::{IdentityRefresher, IdentityStore, MemoryIdentityStore, RefreshError};
pub use resolve::{registry_auth_key, transport_auth, TransportAuth};
pub use schema::{FieldEntry, FieldType, FieldValue, Schema, SECRET_MASK};
