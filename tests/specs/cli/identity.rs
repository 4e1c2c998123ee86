// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `evl identity check` specs

use crate::prelude::*;

#[test]
fn check_prints_redacted_identities() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "identities.json",
        r#"[
            {"name": "hub", "connector": "dockerhub", "type": "token", "data": {"username": "u", "token": "t0ken"}},
            {"name": "db", "connector": "postgresql", "type": "password", "data": {"user": "app", "password": "pw"}}
        ]"#,
    );

    cli()
        .args(&["identity", "check", &file])
        .passes()
        .stdout_has("hub (dockerhub/token): ready")
        .stdout_has("db (postgresql/password): ready")
        .stdout_lacks("t0ken");
}

#[test]
fn check_reports_gpg_key_without_keys() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "identities.json",
        r#"[{"name": "signing", "connector": "generic", "type": "gpg_key", "data": {}}]"#,
    );

    cli()
        .args(&["identity", "check", &file])
        .fails_with(1)
        .stdout_has("signing (generic/gpg_key): invalid")
        .stdout_has("/data/private_key")
        .stdout_has("/data/public_key")
        .stderr_has("1 invalid identities");
}

#[test]
fn check_rejects_unknown_type() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "identities.json",
        r#"[{"name": "x", "connector": "generic", "type": "kerberos", "data": {}}]"#,
    );

    cli().args(&["identity", "check", &file]).fails_with(1).stderr_has("unknown identity type generic/kerberos");
}
