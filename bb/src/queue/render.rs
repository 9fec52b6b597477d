//! Rendering and notification collaborators used by the queue worker

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::task::Locator;
use crate::config::{ArtifactConfig, RenderConfig};
use crate::outbox::Outbox;
use crate::transport::Transport;

/// Failure of an external collaborator while applying a task
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code}: {stderr}")]
    Exit { program: String, code: i32, stderr: String },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Draws a marker onto the artifact in place
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn draw(&self, artifact: &Path, target: &Locator, attribute: &str) -> Result<(), CollaboratorError>;
}

/// Told after every successful draw
#[async_trait]
pub trait UpdateNotifier: Send + Sync {
    async fn artifact_updated(&self);
}

/// Renderer that shells out to a configured image tool
///
/// Each argument is a template; `{attribute}`, `{target}` and `{artifact}` are
/// substituted per task. Arguments are passed directly, never through a shell.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        debug!(program = %config.program, "CommandRenderer::from_config: called");
        Self::new(config.program.clone(), config.args.clone(), config.timeout())
    }

    /// Arguments with placeholders filled in
    pub fn expand_args(&self, artifact: &Path, target: &Locator, attribute: &str) -> Vec<String> {
        let artifact = artifact.to_string_lossy();
        let target = target.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{attribute}", attribute)
                    .replace("{target}", &target)
                    .replace("{artifact}", &artifact)
            })
            .collect()
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn draw(&self, artifact: &Path, target: &Locator, attribute: &str) -> Result<(), CollaboratorError> {
        let args = self.expand_args(artifact, target, attribute);
        debug!(program = %self.program, ?args, "CommandRenderer::draw: called");

        let output = match tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new(&self.program)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(CollaboratorError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(CollaboratorError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
        };

        if output.status.success() {
            debug!("CommandRenderer::draw: succeeded");
            Ok(())
        } else {
            Err(CollaboratorError::Exit {
                program: self.program.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Pings the companion bot through the outbox after each draw, but only while
/// the chat session is up
pub struct CompanionNotifier {
    transport: Arc<dyn Transport>,
    outbox: Outbox,
    target: String,
    message: String,
}

impl CompanionNotifier {
    pub fn new(
        transport: Arc<dyn Transport>,
        outbox: Outbox,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            outbox,
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn from_config(config: &ArtifactConfig, transport: Arc<dyn Transport>, outbox: Outbox) -> Self {
        Self::new(
            transport,
            outbox,
            config.companion.clone(),
            config.companion_message.clone(),
        )
    }
}

#[async_trait]
impl UpdateNotifier for CompanionNotifier {
    async fn artifact_updated(&self) {
        if !self.transport.is_live() {
            debug!(target = %self.target, "CompanionNotifier: transport down, skipping");
            return;
        }
        self.outbox.direct(&self.target, &self.message);
    }
}
