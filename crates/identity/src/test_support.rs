// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers shared with other crates' tests

pub mod fixtures {
    use crate::data::{
        ApiKey, GenericPassword, GithubOAuth2Identity, GpgKey, IdentityData, OAuth2Identity, PostgresqlPassword,
        SshKey, UsernamePassword, UsernameToken,
    };
    use crate::identity::Identity;
    use chrono::{TimeZone, Utc};

    /// Registered but not yet authorized OAuth2 client with explicit endpoints.
    pub fn oauth2_identity() -> OAuth2Identity {
        OAuth2Identity {
            issuer: "https://auth.example.com".to_string(),
            discovery: false,
            discovery_endpoint: None,
            authorization_endpoint: Some("https://auth.example.com/authorize".to_string()),
            token_endpoint: Some("https://auth.example.com/token".to_string()),
            client_id: "client-1".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec!["read".to_string(), "write".to_string()],
            access_token: String::new(),
            refresh_token: String::new(),
            ttl: 0,
            expiration_time: None,
        }
    }

    /// Authorized OAuth2 identity holding a refresh token.
    pub fn authorized_oauth2_identity(name: &str) -> Identity {
        let mut data = oauth2_identity();
        data.access_token = "access-0".to_string();
        data.refresh_token = "refresh-0".to_string();
        data.ttl = 3600;
        let mut identity = Identity::new(name, IdentityData::GenericOAuth2(data));
        identity.mark_ready();
        identity
    }

    /// Registered but not yet authorized GitHub OAuth App.
    pub fn github_oauth2_identity() -> GithubOAuth2Identity {
        GithubOAuth2Identity {
            username: "octocat".to_string(),
            client_id: "gh-client".to_string(),
            client_secret: "gh-secret".to_string(),
            scopes: vec!["repo".to_string(), "read:packages".to_string()],
            access_token: String::new(),
            ttl: 0,
            expiration_time: None,
        }
    }

    /// One payload per supported kind with every field populated.
    pub fn all_kinds() -> Vec<IdentityData> {
        let mut oauth2 = oauth2_identity();
        oauth2.discovery = true;
        oauth2.discovery_endpoint = Some("https://auth.example.com/.well-known/oauth-authorization-server".to_string());
        oauth2.access_token = "access".to_string();
        oauth2.refresh_token = "refresh".to_string();
        oauth2.ttl = 3600;
        oauth2.expiration_time = Utc.with_ymd_and_hms(2026, 5, 4, 11, 0, 0).single();

        vec![
            IdentityData::GenericPassword(GenericPassword {
                login: "root".to_string(),
                password: "hunter2".to_string(),
            }),
            IdentityData::GenericApiKey(ApiKey { key: "key-1".to_string() }),
            IdentityData::GenericSshKey(SshKey {
                private_key: "private\n".to_string(),
                public_key: "ssh-ed25519 AAAA\n".to_string(),
                certificate: "cert\n".to_string(),
            }),
            IdentityData::GenericGpgKey(GpgKey {
                private_key: "gpg-private".to_string(),
                public_key: "gpg-public".to_string(),
                password: "passphrase".to_string(),
            }),
            IdentityData::GenericOAuth2(oauth2),
            IdentityData::DockerhubPassword(UsernamePassword {
                username: "bob".to_string(),
                password: "hunter2".to_string(),
            }),
            IdentityData::DockerhubToken(UsernameToken { username: "bob".to_string(), token: "dckr_pat".to_string() }),
            IdentityData::GithubToken(UsernameToken { username: "octocat".to_string(), token: "ghp_x".to_string() }),
            IdentityData::GithubOAuth2(GithubOAuth2Identity {
                access_token: "gho_x".to_string(),
                ttl: 28800,
                expiration_time: Utc.with_ymd_and_hms(2026, 5, 4, 18, 0, 0).single(),
                ..github_oauth2_identity()
            }),
            IdentityData::PostgresqlPassword(PostgresqlPassword {
                user: "postgres".to_string(),
                password: "pg".to_string(),
            }),
            IdentityData::EventlineApiKey(ApiKey { key: "evl-key".to_string() }),
        ]
    }
}
