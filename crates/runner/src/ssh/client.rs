// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! russh / russh-sftp transport

use super::params::SshParameters;
use super::transport::{ExitOutcome, FsError, RemoteFs, RemoteMetadata, SshConnection, SshConnector};
use crate::error::RunnerError;
use crate::runner::StepOutput;
use async_trait::async_trait;
use evl_identity::TransportAuth;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect, Sig};
use russh_keys::key::PublicKey;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::FileAttributes;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extended data type of stderr in session channels.
const STDERR_EXT: u32 = 1;

/// Host key pinned by the runner parameters.
struct PinnedHostKey {
    algorithm: String,
    key: PublicKey,
}

impl PinnedHostKey {
    fn parse(algorithm: &str, key: &str) -> Result<Self, RunnerError> {
        let key = russh_keys::parse_public_key_base64(key)
            .map_err(|e| RunnerError::Config(format!("cannot parse host key: {e}")))?;
        Ok(Self { algorithm: algorithm.to_string(), key })
    }

    /// The server must present the pinned key with the pinned algorithm.
    fn accepts(&self, server_key: &PublicKey) -> bool {
        key_algorithm(server_key.name()) == self.algorithm
            && key_algorithm(self.key.name()) == self.algorithm
            && server_key.fingerprint() == self.key.fingerprint()
    }
}

/// Verifies the server key against the pinned key, if any.
struct ClientHandler {
    address: String,
    pinned: Option<PinnedHostKey>,
}

/// `rsa-sha2-*` signatures use `ssh-rsa` keys.
fn key_algorithm(name: &str) -> &str {
    if name.starts_with("rsa-sha2-") {
        "ssh-rsa"
    } else {
        name
    }
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        match &self.pinned {
            Some(pinned) => {
                let accepted = pinned.accepts(server_public_key);
                if !accepted {
                    tracing::error!(
                        address = %self.address,
                        algorithm = server_public_key.name(),
                        fingerprint = %server_public_key.fingerprint(),
                        expected_algorithm = %pinned.algorithm,
                        "host key mismatch"
                    );
                }
                Ok(accepted)
            }
            None => {
                tracing::info!(
                    address = %self.address,
                    fingerprint = %server_public_key.fingerprint(),
                    "no pinned host key, trusting server key"
                );
                Ok(true)
            }
        }
    }
}

/// Connects with russh.
#[derive(Clone, Default)]
pub struct RusshConnector {
    config: Arc<client::Config>,
}

impl RusshConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SshConnector for RusshConnector {
    async fn connect(
        &self,
        params: &SshParameters,
        auth: &TransportAuth,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn SshConnection>, RunnerError> {
        let address = params.address();
        let pinned = match (&params.host_key, &params.host_key_algorithm) {
            (Some(key), Some(algorithm)) => Some(PinnedHostKey::parse(algorithm, key)?),
            (Some(_), None) => return Err(RunnerError::Config("missing host key algorithm".into())),
            (None, _) => None,
        };
        let port = u16::try_from(params.port).map_err(|_| RunnerError::Config(format!("invalid port {}", params.port)))?;
        let handler = ClientHandler { address: address.clone(), pinned };

        let dial = async {
            let mut handle = client::connect(Arc::clone(&self.config), (params.host.as_str(), port), handler)
                .await
                .map_err(|e| RunnerError::transport("connect to", &address, e))?;
            let authenticated = match auth {
                TransportAuth::Password(password) => handle.authenticate_password(&params.user, password).await,
                TransportAuth::PrivateKey(key) => handle.authenticate_publickey(&params.user, Arc::clone(key)).await,
            }
            .map_err(|e| RunnerError::transport("authenticate to", &address, e))?;
            if !authenticated {
                return Err(RunnerError::transport("authenticate to", &address, format!("rejected user {}", params.user)));
            }
            Ok::<_, RunnerError>(handle)
        };
        let handle = tokio::select! {
            _ = cancel.cancelled() => return Err(RunnerError::Cancelled { op: "connect" }),
            result = tokio::time::timeout(CONNECT_TIMEOUT, dial) => result.map_err(|_| {
                RunnerError::transport("connect to", &address, format!("timed out after {}s", CONNECT_TIMEOUT.as_secs()))
            })??,
        };

        Ok(Box::new(RusshConnection { address, handle }))
    }
}

struct RusshConnection {
    address: String,
    handle: Handle<ClientHandler>,
}

impl RusshConnection {
    async fn open_channel(&self) -> Result<Channel<Msg>, RunnerError> {
        self.handle
            .channel_open_session()
            .await
            .map_err(|e| RunnerError::transport("open session on", &self.address, e))
    }
}

enum ChannelEvent {
    Cancelled,
    Message(Option<ChannelMsg>),
}

fn signal_name(sig: &Sig) -> String {
    match sig {
        Sig::Custom(name) => name.clone(),
        other => format!("{other:?}"),
    }
}

#[async_trait]
impl SshConnection for RusshConnection {
    async fn open_sftp(&mut self) -> Result<Box<dyn RemoteFs>, RunnerError> {
        let channel = self.open_channel().await?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| RunnerError::transport("start sftp on", &self.address, e))?;
        let session = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| RunnerError::transport("start sftp on", &self.address, e))?;
        Ok(Box::new(SftpFs { session }))
    }

    async fn exec(
        &mut self,
        command: &str,
        env: &BTreeMap<String, String>,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<ExitOutcome, RunnerError> {
        let mut channel = self.open_channel().await?;
        for (name, value) in env {
            channel
                .set_env(false, name.as_str(), value.as_str())
                .await
                .map_err(|e| RunnerError::transport("set environment on", &self.address, e))?;
        }
        channel
            .exec(true, command)
            .await
            .map_err(|e| RunnerError::transport("start command on", &self.address, e))?;

        let mut outcome = None;
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => ChannelEvent::Cancelled,
                msg = channel.wait() => ChannelEvent::Message(msg),
            };
            let msg = match event {
                ChannelEvent::Cancelled => {
                    if let Err(e) = channel.signal(Sig::KILL).await {
                        tracing::error!(address = %self.address, error = %e, "cannot kill program");
                    }
                    if let Err(e) = channel.close().await {
                        tracing::warn!(address = %self.address, error = %e, "cannot close channel");
                    }
                    return Err(RunnerError::Cancelled { op: "execute step" });
                }
                ChannelEvent::Message(None) => break,
                ChannelEvent::Message(Some(msg)) => msg,
            };
            let written = match msg {
                ChannelMsg::Data { ref data } => output.stdout.write_all(data).await,
                ChannelMsg::ExtendedData { ref data, ext } if ext == STDERR_EXT => output.stderr.write_all(data).await,
                ChannelMsg::ExitStatus { exit_status } => {
                    outcome = Some(ExitOutcome::Status(exit_status));
                    Ok(())
                }
                ChannelMsg::ExitSignal { ref signal_name, .. } => {
                    outcome = Some(ExitOutcome::Signal(self::signal_name(signal_name)));
                    Ok(())
                }
                _ => Ok(()),
            };
            written.map_err(|e| RunnerError::transport("write output of", command, e))?;
        }

        outcome.ok_or_else(|| RunnerError::transport("run command on", &self.address, "channel closed without exit status"))
    }

    async fn close(&mut self) -> Result<(), FsError> {
        self.handle.disconnect(Disconnect::ByApplication, "", "en").await.map_err(FsError::new)
    }
}

struct SftpFs {
    session: SftpSession,
}

fn metadata(attrs: &FileAttributes) -> RemoteMetadata {
    RemoteMetadata { is_dir: attrs.is_dir(), mode: attrs.permissions.unwrap_or(0) & 0o7777 }
}

#[async_trait]
impl RemoteFs for SftpFs {
    async fn mkdir_all(&mut self, path: &str) -> Result<(), FsError> {
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = format!("{current}/{part}");
            if let Ok(attrs) = self.session.metadata(current.as_str()).await {
                if attrs.is_dir() {
                    continue;
                }
                return Err(FsError::new(format!("{current}: not a directory")));
            }
            if let Err(e) = self.session.create_dir(current.as_str()).await {
                // lost a race with another job creating the same directory
                if !self.session.metadata(current.as_str()).await.is_ok_and(|a| a.is_dir()) {
                    return Err(FsError::new(e));
                }
            }
        }
        Ok(())
    }

    async fn stat(&mut self, path: &str) -> Result<RemoteMetadata, FsError> {
        self.session.metadata(path).await.map(|a| metadata(&a)).map_err(FsError::new)
    }

    async fn lstat(&mut self, path: &str) -> Result<RemoteMetadata, FsError> {
        self.session.symlink_metadata(path).await.map(|a| metadata(&a)).map_err(FsError::new)
    }

    async fn chmod(&mut self, path: &str, mode: u32) -> Result<(), FsError> {
        let mut attrs = FileAttributes::empty();
        attrs.permissions = Some(mode);
        self.session.set_metadata(path, attrs).await.map_err(FsError::new)
    }

    async fn read_dir(&mut self, path: &str) -> Result<Vec<String>, FsError> {
        let entries = self.session.read_dir(path).await.map_err(FsError::new)?;
        Ok(entries.map(|e| e.file_name()).filter(|name| name != "." && name != "..").collect())
    }

    async fn write_file(&mut self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let mut file = self.session.create(path).await.map_err(FsError::new)?;
        file.write_all(content).await.map_err(FsError::new)?;
        file.shutdown().await.map_err(FsError::new)
    }

    async fn remove_file(&mut self, path: &str) -> Result<(), FsError> {
        self.session.remove_file(path).await.map_err(FsError::new)
    }

    async fn remove_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.session.remove_dir(path).await.map_err(FsError::new)
    }

    async fn close(&mut self) -> Result<(), FsError> {
        self.session.close().await.map_err(FsError::new)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
