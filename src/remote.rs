//! Remote command execution over the system ssh binary
//!
//! No SSH protocol implementation here: commands are handed to `ssh`
//! with host key checking disabled and a forced tty, and transient
//! failures retry a few times with a pause between attempts.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::sleep;

use awsops_core::error::{AwsopsError, Result};

const RETRIES: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_secs(15);

/// The apt-based Docker install sequence run on Ubuntu instances
pub const DOCKER_INSTALL_STEPS: &[&str] = &[
    "sudo apt-get update",
    "sudo apt-get install apt-transport-https ca-certificates curl software-properties-common",
    "curl -fsSL https://download.docker.com/linux/ubuntu/gpg | sudo apt-key add -",
    "sudo apt-key fingerprint 0EBFCD88",
    "sudo add-apt-repository \"deb [arch=amd64] https://download.docker.com/linux/ubuntu $(lsb_release -cs) stable\"",
    "sudo apt-get update",
    "apt-cache policy docker-ce",
    "sudo apt-get install docker-ce",
    "sudo usermod -aG docker $USER",
    "sudo systemctl enable docker",
];

/// Remote shell executor bound to one SSH user and identity file
pub struct RemoteExec {
    user: String,
    identity: Option<PathBuf>,
}

impl RemoteExec {
    /// Create an executor for `user`, optionally with a private key file
    pub fn new(user: impl Into<String>, identity: Option<PathBuf>) -> Self {
        Self {
            user: user.into(),
            identity,
        }
    }

    fn ssh_args(&self, host: &str, command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
        ];
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args.push("-t".to_string());
        args.push("-t".to_string());
        args.push(format!("{}@{host}", self.user));
        args.push(command.to_string());
        args
    }

    /// Run one command on the host, retrying transient failures.
    ///
    /// Exit code 255 after exhausting retries usually means the
    /// connection itself failed rather than the remote command.
    pub async fn run(&self, host: &str, command: &str) -> Result<()> {
        let mut tries = 0u32;
        loop {
            let status = Command::new("ssh")
                .args(self.ssh_args(host, command))
                .status()
                .await?;

            if status.success() {
                return Ok(());
            }

            if tries >= RETRIES {
                return Err(if status.code() == Some(255) {
                    AwsopsError::Remote(format!(
                        "failed to SSH to remote host {host}; check that --identity and --key-pair are correct"
                    ))
                } else {
                    AwsopsError::Remote(format!("remote command on {host} exited with {status}"))
                });
            }

            tries += 1;
            tracing::warn!(
                %host,
                %status,
                "error executing remote command, retrying in {}s",
                RETRY_DELAY.as_secs()
            );
            sleep(RETRY_DELAY).await;
        }
    }

    /// Run the Docker install sequence on the host.
    pub async fn install_docker(&self, host: &str) -> Result<()> {
        for step in DOCKER_INSTALL_STEPS {
            self.run(host, step).await?;
        }
        Ok(())
    }
}
