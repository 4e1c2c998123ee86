// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted container engine for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::engine::{ContainerEngine, ContainerSpec, EngineError, ExecHandle, ExecSpec, OutputChunk};
use super::params::RegistryCredentials;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    PullImage { image: String, username: Option<String>, password: Option<String> },
    CreateContainer(ContainerSpec),
    ContainerStatus { id: String },
    UploadArchive { id: String, path: String, archive: Vec<u8> },
    StartContainer { id: String },
    Exec { id: String, spec: ExecSpec },
    ExecExitCode { exec_id: String },
    RemoveContainer { id: String },
}

/// Scripted result of an exec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeContainerExec {
    Exit { code: i64, stdout: String, stderr: String },
    /// Produce no output and never finish.
    Hang,
}

impl FakeContainerExec {
    pub fn success(stdout: &str) -> Self {
        FakeContainerExec::Exit { code: 0, stdout: stdout.to_string(), stderr: String::new() }
    }

    pub fn code(code: i64) -> Self {
        FakeContainerExec::Exit { code, stdout: String::new(), stderr: String::new() }
    }
}

#[derive(Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    pull_error: Option<String>,
    create_error: Option<String>,
    remove_error: Option<String>,
    statuses: VecDeque<String>,
    execs: VecDeque<FakeContainerExec>,
    exit_codes: BTreeMap<String, i64>,
    next_exec: usize,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    pub fn fail_pull(&self, message: &str) {
        self.state.lock().pull_error = Some(message.to_string());
    }

    pub fn fail_create(&self, message: &str) {
        self.state.lock().create_error = Some(message.to_string());
    }

    pub fn fail_remove(&self, message: &str) {
        self.state.lock().remove_error = Some(message.to_string());
    }

    /// Queue container states reported before `created`.
    pub fn push_status(&self, status: &str) {
        self.state.lock().statuses.push_back(status.to_string());
    }

    /// Queue the result of the next exec. Unscripted execs succeed silently.
    pub fn push_exec(&self, exec: FakeContainerExec) {
        self.state.lock().execs.push_back(exec);
    }

    /// The archive uploaded to the container, if any.
    pub fn uploaded_archive(&self) -> Option<Vec<u8>> {
        self.state.lock().calls.iter().find_map(|call| match call {
            EngineCall::UploadArchive { archive, .. } => Some(archive.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    fn pull_image(
        &self,
        image: &str,
        credentials: Option<RegistryCredentials>,
    ) -> BoxStream<'static, Result<String, EngineError>> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::PullImage {
            image: image.to_string(),
            username: credentials.as_ref().map(|c| c.username.clone()),
            password: credentials.map(|c| c.password),
        });
        let mut items = vec![Ok(format!("Pulling from {image}"))];
        match state.pull_error.clone() {
            Some(message) => items.push(Err(EngineError::new(message))),
            None => items.push(Ok("Download complete".to_string())),
        }
        stream::iter(items).boxed()
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::CreateContainer(spec.clone()));
        match &state.create_error {
            Some(message) => Err(EngineError::new(message)),
            None => Ok(format!("container-{}", spec.name)),
        }
    }

    async fn container_status(&self, id: &str) -> Result<Option<String>, EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::ContainerStatus { id: id.to_string() });
        Ok(Some(state.statuses.pop_front().unwrap_or_else(|| "created".to_string())))
    }

    async fn upload_archive(&self, id: &str, path: &str, archive: Vec<u8>) -> Result<(), EngineError> {
        self.state.lock().calls.push(EngineCall::UploadArchive {
            id: id.to_string(),
            path: path.to_string(),
            archive,
        });
        Ok(())
    }

    async fn start_container(&self, id: &str) -> Result<(), EngineError> {
        self.state.lock().calls.push(EngineCall::StartContainer { id: id.to_string() });
        Ok(())
    }

    async fn exec(&self, id: &str, spec: &ExecSpec) -> Result<ExecHandle, EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Exec { id: id.to_string(), spec: spec.clone() });
        state.next_exec += 1;
        let exec_id = format!("exec-{}", state.next_exec);
        let output = match state.execs.pop_front().unwrap_or_else(|| FakeContainerExec::success("")) {
            FakeContainerExec::Exit { code, stdout, stderr } => {
                state.exit_codes.insert(exec_id.clone(), code);
                let mut chunks = Vec::new();
                if !stdout.is_empty() {
                    chunks.push(Ok(OutputChunk::Stdout(Bytes::from(stdout))));
                }
                if !stderr.is_empty() {
                    chunks.push(Ok(OutputChunk::Stderr(Bytes::from(stderr))));
                }
                stream::iter(chunks).boxed()
            }
            FakeContainerExec::Hang => stream::pending().boxed(),
        };
        Ok(ExecHandle { id: exec_id, output })
    }

    async fn exec_exit_code(&self, exec_id: &str) -> Result<Option<i64>, EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::ExecExitCode { exec_id: exec_id.to_string() });
        Ok(state.exit_codes.get(exec_id).copied())
    }

    async fn remove_container(&self, id: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::RemoveContainer { id: id.to_string() });
        match &state.remove_error {
            Some(message) => Err(EngineError::new(message)),
            None => Ok(()),
        }
    }
}
