// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ContainerEngine`] backed by the Docker Engine API.

use super::engine::{ContainerEngine, ContainerSpec, EngineError, ExecHandle, ExecSpec, OutputChunk};
use super::params::{split_image_reference, DockerConfig, RegistryCredentials};
use crate::error::RunnerError;
use async_trait::async_trait;
use bollard::auth::DockerCredentials;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogOutput, RemoveContainerOptions,
    StartContainerOptions, UploadToContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::{Docker, API_DEFAULT_VERSION};
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};

/// Seconds before an engine request times out.
const REQUEST_TIMEOUT: u64 = 120;

#[derive(Clone)]
pub struct BollardEngine {
    docker: Docker,
}

impl BollardEngine {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connect according to the uri scheme: a unix socket, plain tcp, or tcp
    /// with TLS when all three certificate paths are set.
    pub fn connect(config: &DockerConfig) -> Result<Self, RunnerError> {
        let uri = config.uri.as_str();
        let docker = if let Some(path) = uri.strip_prefix("unix://") {
            Docker::connect_with_unix(path, REQUEST_TIMEOUT, API_DEFAULT_VERSION)
        } else if uri.starts_with("tcp://") {
            match (&config.private_key_path, &config.certificate_path, &config.ca_certificate_path) {
                (Some(key), Some(cert), Some(ca)) => {
                    Docker::connect_with_ssl(uri, key, cert, ca, REQUEST_TIMEOUT, API_DEFAULT_VERSION)
                }
                (None, None, None) => Docker::connect_with_http(uri, REQUEST_TIMEOUT, API_DEFAULT_VERSION),
                _ => {
                    return Err(RunnerError::Config(
                        "docker tls requires the ca certificate, certificate and private key paths".into(),
                    ))
                }
            }
        } else {
            return Err(RunnerError::Config(format!("unsupported docker uri {uri:?}")));
        };
        docker.map(Self::new).map_err(|e| RunnerError::transport("connect to", uri, e))
    }
}

fn engine_error(e: bollard::errors::Error) -> EngineError {
    EngineError::new(e)
}

#[async_trait]
impl ContainerEngine for BollardEngine {
    fn pull_image(
        &self,
        image: &str,
        credentials: Option<RegistryCredentials>,
    ) -> BoxStream<'static, Result<String, EngineError>> {
        let (name, tag) = split_image_reference(image);
        let options = CreateImageOptions { from_image: name.to_string(), tag: tag.to_string(), ..Default::default() };
        let credentials = credentials.map(|c| DockerCredentials {
            username: Some(c.username),
            password: Some(c.password),
            ..Default::default()
        });
        self.docker
            .create_image(Some(options), None, credentials)
            .map(|info| info.map(|info| info.status.unwrap_or_default()).map_err(engine_error))
            .boxed()
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError> {
        let options = CreateContainerOptions { name: spec.name.clone(), platform: None };
        let host_config = HostConfig {
            nano_cpus: spec.nano_cpus,
            memory: spec.memory,
            pids_limit: spec.pids_limit,
            ..Default::default()
        };
        let config = Config {
            hostname: Some(spec.name.clone()),
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            env: Some(spec.env.clone()),
            labels: Some(spec.labels.clone().into_iter().collect()),
            stop_timeout: spec.stop_timeout,
            host_config: Some(host_config),
            ..Default::default()
        };
        let response = self.docker.create_container(Some(options), config).await.map_err(engine_error)?;
        for warning in response.warnings {
            tracing::warn!(container = %spec.name, %warning, "container creation warning");
        }
        Ok(response.id)
    }

    async fn container_status(&self, id: &str) -> Result<Option<String>, EngineError> {
        let info = self.docker.inspect_container(id, None::<InspectContainerOptions>).await.map_err(engine_error)?;
        Ok(info.state.and_then(|s| s.status).map(|status| format!("{status:?}").to_lowercase()))
    }

    async fn upload_archive(&self, id: &str, path: &str, archive: Vec<u8>) -> Result<(), EngineError> {
        let options = UploadToContainerOptions { path: path.to_string(), ..Default::default() };
        self.docker.upload_to_container(id, Some(options), Bytes::from(archive)).await.map_err(engine_error)
    }

    async fn start_container(&self, id: &str) -> Result<(), EngineError> {
        self.docker.start_container(id, None::<StartContainerOptions<String>>).await.map_err(engine_error)
    }

    async fn exec(&self, id: &str, spec: &ExecSpec) -> Result<ExecHandle, EngineError> {
        let options = CreateExecOptions {
            cmd: Some(spec.cmd.clone()),
            env: Some(spec.env.clone()),
            working_dir: Some(spec.working_dir.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };
        let exec = self.docker.create_exec(id, options).await.map_err(engine_error)?;
        let output = match self.docker.start_exec(&exec.id, None).await.map_err(engine_error)? {
            StartExecResults::Attached { output, .. } => output
                .filter_map(|item| async move {
                    match item {
                        Ok(LogOutput::StdOut { message }) => Some(Ok(OutputChunk::Stdout(message))),
                        Ok(LogOutput::StdErr { message }) => Some(Ok(OutputChunk::Stderr(message))),
                        Ok(_) => None,
                        Err(e) => Some(Err(engine_error(e))),
                    }
                })
                .boxed(),
            StartExecResults::Detached => stream::empty().boxed(),
        };
        Ok(ExecHandle { id: exec.id, output })
    }

    async fn exec_exit_code(&self, exec_id: &str) -> Result<Option<i64>, EngineError> {
        let info = self.docker.inspect_exec(exec_id).await.map_err(engine_error)?;
        Ok(info.exit_code)
    }

    async fn remove_container(&self, id: &str) -> Result<(), EngineError> {
        let options = RemoveContainerOptions { force: true, v: true, ..Default::default() };
        self.docker.remove_container(id, Some(options)).await.map_err(engine_error)
    }
}
