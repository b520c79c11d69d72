//! Sole point of contact with the CA helper executable and the TLS toolkit.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use super::common_name::CommonName;
use super::errors::{CaError, CaResult};

/// Exit status and combined stdout/stderr of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub output: String,
}

/// Runs a program with a structured argument list.
#[async_trait]
pub trait ToolRunner: Send + Sync + 'static {
    async fn run(&self, program: &Path, args: &[OsString]) -> CaResult<ToolOutput>;
}

/// Spawns real processes, killing them once `timeout` elapses.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &Path, args: &[OsString]) -> CaResult<ToolOutput> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CaError::io(program, e))?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| CaError::io(program, e))?,
            Err(_) => {
                return Err(CaError::ToolTimeout {
                    command: render_command(program, args),
                    timeout: self.timeout,
                });
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ToolOutput {
            exit_code: output.status.code(),
            output: combined,
        })
    }
}

/// Builds argument lists for the CA helper and the TLS toolkit and checks
/// their exit status. The output of a successful run is not interpreted.
#[derive(Clone)]
pub struct ExternalCaInvoker {
    runner: Arc<dyn ToolRunner>,
    vpn_ca_path: PathBuf,
    openssl_path: PathBuf,
    ca_dir: PathBuf,
    invocations: Arc<AtomicU64>,
}

impl ExternalCaInvoker {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        vpn_ca_path: impl Into<PathBuf>,
        openssl_path: impl Into<PathBuf>,
        ca_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            vpn_ca_path: vpn_ca_path.into(),
            openssl_path: openssl_path.into(),
            ca_dir: ca_dir.into(),
            invocations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of processes started through this invoker.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Creates a new root certificate and key in the CA directory.
    pub async fn bootstrap(&self) -> CaResult<ToolOutput> {
        self.vpn_ca(vec!["--init".into()]).await
    }

    pub async fn issue_server(&self, common_name: &CommonName) -> CaResult<ToolOutput> {
        self.vpn_ca(vec!["--server".into(), common_name.as_str().into()])
            .await
    }

    pub async fn issue_client(
        &self,
        common_name: &CommonName,
        not_after: DateTime<Utc>,
    ) -> CaResult<ToolOutput> {
        self.vpn_ca(vec![
            "--client".into(),
            common_name.as_str().into(),
            "--not-after".into(),
            format_not_after(not_after).into(),
        ])
        .await
    }

    /// Rewrites a private key in traditional RSA encoding.
    pub async fn convert_key(&self, in_key: &Path, out_key: &Path) -> CaResult<ToolOutput> {
        let args = vec![
            OsString::from("rsa"),
            "-in".into(),
            in_key.into(),
            "-out".into(),
            out_key.into(),
        ];
        self.invoke(&self.openssl_path, &args).await
    }

    async fn vpn_ca(&self, mut args: Vec<OsString>) -> CaResult<ToolOutput> {
        args.push("--ca-dir".into());
        args.push(self.ca_dir.clone().into());
        self.invoke(&self.vpn_ca_path, &args).await
    }

    #[instrument(skip_all, fields(program = %program.display()))]
    pub async fn invoke(&self, program: &Path, args: &[OsString]) -> CaResult<ToolOutput> {
        let command = render_command(program, args);
        debug!(%command, "Running external tool");

        self.invocations.fetch_add(1, Ordering::Relaxed);
        let result = self.runner.run(program, args).await?;

        if result.exit_code != Some(0) {
            error!(
                %command,
                exit_code = ?result.exit_code,
                output = %result.output,
                "External tool failed"
            );
            return Err(CaError::ExternalTool {
                command,
                exit_code: result.exit_code,
                output: result.output,
            });
        }

        Ok(result)
    }
}

impl std::fmt::Debug for ExternalCaInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalCaInvoker")
            .field("vpn_ca_path", &self.vpn_ca_path)
            .field("openssl_path", &self.openssl_path)
            .field("ca_dir", &self.ca_dir)
            .finish()
    }
}

/// `2026-01-02T15:04:05+00:00`
pub fn format_not_after(not_after: DateTime<Utc>) -> String {
    not_after.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn render_command(program: &Path, args: &[OsString]) -> String {
    let mut command = program.display().to_string();
    for arg in args {
        command.push(' ');
        command.push_str(&arg.to_string_lossy());
    }
    command
}
