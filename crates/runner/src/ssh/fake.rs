// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory ssh transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::params::SshParameters;
use super::transport::{ExitOutcome, FsError, RemoteFs, RemoteMetadata, SshConnection, SshConnector};
use crate::error::RunnerError;
use crate::runner::StepOutput;
use async_trait::async_trait;
use evl_identity::TransportAuth;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshCall {
    Connect { address: String, user: String, auth: &'static str },
    OpenSftp,
    MkdirAll { path: String },
    Stat { path: String },
    Lstat { path: String },
    Chmod { path: String, mode: u32 },
    ReadDir { path: String },
    WriteFile { path: String },
    RemoveFile { path: String },
    RemoveDir { path: String },
    CloseSftp,
    Exec { command: String, env: BTreeMap<String, String> },
    Kill,
    Close,
}

/// Scripted result of a remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeExec {
    Exit { status: u32, stdout: String, stderr: String },
    Signal(String),
    /// Run until cancelled.
    Hang,
}

impl FakeExec {
    pub fn success(stdout: &str) -> Self {
        FakeExec::Exit { status: 0, stdout: stdout.to_string(), stderr: String::new() }
    }

    pub fn status(status: u32) -> Self {
        FakeExec::Exit { status, stdout: String::new(), stderr: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FakeNode {
    is_dir: bool,
    mode: u32,
    content: Vec<u8>,
}

#[derive(Default)]
struct FakeSshState {
    calls: Vec<SshCall>,
    nodes: BTreeMap<String, FakeNode>,
    execs: VecDeque<FakeExec>,
    connect_error: Option<String>,
    stall_sftp: bool,
}

impl FakeSshState {
    fn metadata(&self, path: &str) -> Result<RemoteMetadata, FsError> {
        if path == "/" {
            return Ok(RemoteMetadata { is_dir: true, mode: 0o755 });
        }
        self.nodes
            .get(path)
            .map(|n| RemoteMetadata { is_dir: n.is_dir, mode: n.mode })
            .ok_or_else(|| FsError::new(format!("{path}: no such file")))
    }

    fn children(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.nodes
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect()
    }
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Fake ssh host: records every call and keeps an in-memory file system.
///
/// New directories get mode 0755 and new files 0644, as with a 022 umask.
#[derive(Clone, Default)]
pub struct FakeSsh {
    state: Arc<Mutex<FakeSshState>>,
}

impl FakeSsh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SshCall> {
        self.state.lock().calls.clone()
    }

    /// Pre-existing directory on the host.
    pub fn add_dir(&self, path: &str, mode: u32) {
        self.state.lock().nodes.insert(path.to_string(), FakeNode { is_dir: true, mode, content: Vec::new() });
    }

    pub fn add_file(&self, path: &str, content: &str) {
        self.state
            .lock()
            .nodes
            .insert(path.to_string(), FakeNode { is_dir: false, mode: 0o644, content: content.as_bytes().to_vec() });
    }

    pub fn push_exec(&self, exec: FakeExec) {
        self.state.lock().execs.push_back(exec);
    }

    pub fn fail_connect(&self, message: &str) {
        self.state.lock().connect_error = Some(message.to_string());
    }

    /// Never answer the sftp subsystem request.
    pub fn stall_sftp(&self) {
        self.state.lock().stall_sftp = true;
    }

    /// Every path on the host, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.state.lock().nodes.keys().cloned().collect()
    }

    pub fn mode(&self, path: &str) -> Option<u32> {
        self.state.lock().nodes.get(path).map(|n| n.mode)
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.state.lock().nodes.get(path).map(|n| String::from_utf8_lossy(&n.content).into_owned())
    }

    fn record(&self, call: SshCall) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl SshConnector for FakeSsh {
    async fn connect(
        &self,
        params: &SshParameters,
        auth: &TransportAuth,
        _cancel: &CancellationToken,
    ) -> Result<Box<dyn SshConnection>, RunnerError> {
        let auth = match auth {
            TransportAuth::Password(_) => "password",
            TransportAuth::PrivateKey(_) => "private_key",
        };
        self.record(SshCall::Connect { address: params.address(), user: params.user.clone(), auth });
        if let Some(message) = self.state.lock().connect_error.clone() {
            return Err(RunnerError::transport("connect to", params.address(), message));
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl SshConnection for FakeSsh {
    async fn open_sftp(&mut self) -> Result<Box<dyn RemoteFs>, RunnerError> {
        self.record(SshCall::OpenSftp);
        let stall = self.state.lock().stall_sftp;
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(Box::new(self.clone()))
    }

    async fn exec(
        &mut self,
        command: &str,
        env: &BTreeMap<String, String>,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<ExitOutcome, RunnerError> {
        self.record(SshCall::Exec { command: command.to_string(), env: env.clone() });
        let exec = self.state.lock().execs.pop_front().unwrap_or_else(|| FakeExec::success(""));
        match exec {
            FakeExec::Exit { status, stdout, stderr } => {
                let write = async {
                    output.stdout.write_all(stdout.as_bytes()).await?;
                    output.stderr.write_all(stderr.as_bytes()).await
                };
                write.await.map_err(|e| RunnerError::transport("write output of", command, e))?;
                Ok(ExitOutcome::Status(status))
            }
            FakeExec::Signal(name) => Ok(ExitOutcome::Signal(name)),
            FakeExec::Hang => {
                cancel.cancelled().await;
                self.record(SshCall::Kill);
                Err(RunnerError::Cancelled { op: "execute step" })
            }
        }
    }

    async fn close(&mut self) -> Result<(), FsError> {
        self.record(SshCall::Close);
        Ok(())
    }
}

#[async_trait]
impl RemoteFs for FakeSsh {
    async fn mkdir_all(&mut self, path: &str) -> Result<(), FsError> {
        self.record(SshCall::MkdirAll { path: path.to_string() });
        let mut state = self.state.lock();
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = format!("{current}/{part}");
            match state.nodes.get(&current) {
                Some(node) if node.is_dir => {}
                Some(_) => return Err(FsError::new(format!("{current}: not a directory"))),
                None => {
                    state.nodes.insert(current.clone(), FakeNode { is_dir: true, mode: 0o755, content: Vec::new() });
                }
            }
        }
        Ok(())
    }

    async fn stat(&mut self, path: &str) -> Result<RemoteMetadata, FsError> {
        self.record(SshCall::Stat { path: path.to_string() });
        self.state.lock().metadata(path)
    }

    async fn lstat(&mut self, path: &str) -> Result<RemoteMetadata, FsError> {
        self.record(SshCall::Lstat { path: path.to_string() });
        self.state.lock().metadata(path)
    }

    async fn chmod(&mut self, path: &str, mode: u32) -> Result<(), FsError> {
        self.record(SshCall::Chmod { path: path.to_string(), mode });
        let mut state = self.state.lock();
        let node = state.nodes.get_mut(path).ok_or_else(|| FsError::new(format!("{path}: no such file")))?;
        node.mode = mode;
        Ok(())
    }

    async fn read_dir(&mut self, path: &str) -> Result<Vec<String>, FsError> {
        self.record(SshCall::ReadDir { path: path.to_string() });
        let state = self.state.lock();
        state.metadata(path)?;
        Ok(state.children(path))
    }

    async fn write_file(&mut self, path: &str, content: &[u8]) -> Result<(), FsError> {
        self.record(SshCall::WriteFile { path: path.to_string() });
        let mut state = self.state.lock();
        if !state.metadata(parent(path)).is_ok_and(|m| m.is_dir) {
            return Err(FsError::new(format!("{path}: no such directory")));
        }
        let mode = state.nodes.get(path).map(|n| n.mode).unwrap_or(0o644);
        state.nodes.insert(path.to_string(), FakeNode { is_dir: false, mode, content: content.to_vec() });
        Ok(())
    }

    async fn remove_file(&mut self, path: &str) -> Result<(), FsError> {
        self.record(SshCall::RemoveFile { path: path.to_string() });
        let mut state = self.state.lock();
        match state.nodes.get(path) {
            Some(node) if !node.is_dir => {
                state.nodes.remove(path);
                Ok(())
            }
            Some(_) => Err(FsError::new(format!("{path}: is a directory"))),
            None => Err(FsError::new(format!("{path}: no such file"))),
        }
    }

    async fn remove_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.record(SshCall::RemoveDir { path: path.to_string() });
        let mut state = self.state.lock();
        if !state.children(path).is_empty() {
            return Err(FsError::new(format!("{path}: directory not empty")));
        }
        state.nodes.remove(path).map(|_| ()).ok_or_else(|| FsError::new(format!("{path}: no such file")))
    }

    async fn close(&mut self) -> Result<(), FsError> {
        self.record(SshCall::CloseSftp);
        Ok(())
    }
}
