//! Custom lookup command

use async_trait::async_trait;
use ddns_core::traits::{Address, AddressSource};
use ddns_core::{Error, RecordType, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Time budget for the custom command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `sh -c <command>` and uses its trimmed stdout
///
/// The exit status is not checked; non-empty output wins. The child is
/// killed if the timeout expires.
#[derive(Debug, Clone)]
pub struct CommandSource {
    command: String,
    timeout: Duration,
}

impl CommandSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AddressSource for CommandSource {
    async fn resolve(&self, _record_type: RecordType) -> Result<Address> {
        tracing::info!("Running custom IP command: {}", self.command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| Error::timeout("custom IP command", self.timeout.as_secs()))?
            .map_err(|e| Error::command(format!("Failed to run custom command: {}", e)))?;

        if !output.status.success() {
            tracing::debug!("Custom command exited with {}", output.status);
        }

        match Address::from_output(&String::from_utf8_lossy(&output.stdout)) {
            Some(address) => {
                tracing::info!("Got IP from custom command: {}", address);
                Ok(address)
            }
            None => {
                tracing::warn!("Custom command returned empty output");
                Err(Error::command("Custom command returned empty output"))
            }
        }
    }

    fn name(&self) -> &str {
        "custom command"
    }
}
