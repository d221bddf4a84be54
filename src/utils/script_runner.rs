//! Runs the external data scripts (quotes, news, disclosures, search).
//!
//! Every call is one-shot: spawn, collect stdout/stderr while racing a timer,
//! then classify the outcome. Failures come back as [`FetchError`] values and
//! nothing here retries.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
    time::Instant,
};
use tracing::{debug, info, warn};

/// Per-stream cap on captured stdout/stderr.
pub const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptOp {
    Quote,
    News,
    Disclosure,
    DartDisclosure,
    Search,
}

impl ScriptOp {
    pub fn script_name(self) -> &'static str {
        match self {
            ScriptOp::Quote => "fetch_stock_data.py",
            ScriptOp::News => "fetch_stock_news.py",
            ScriptOp::Disclosure => "fetch_disclosure.py",
            ScriptOp::DartDisclosure => "fetch_dart_disclosure.py",
            ScriptOp::Search => "fetch_all_stocks.py",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTimeouts {
    pub quote: Duration,
    pub news: Duration,
    pub disclosure: Duration,
    pub search: Duration,
}

impl ScriptTimeouts {
    pub fn for_op(&self, op: ScriptOp) -> Duration {
        match op {
            ScriptOp::Quote => self.quote,
            ScriptOp::News => self.news,
            ScriptOp::Disclosure | ScriptOp::DartDisclosure => self.disclosure,
            ScriptOp::Search => self.search,
        }
    }
}

impl Default for ScriptTimeouts {
    fn default() -> Self {
        Self {
            quote: Duration::from_secs(10),
            news: Duration::from_secs(30),
            disclosure: Duration::from_secs(30),
            search: Duration::from_secs(180),
        }
    }
}

/// Resolved once at startup and handed to [`PythonRunner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub interpreter: PathBuf,
    pub scripts_dir: PathBuf,
    pub timeouts: ScriptTimeouts,
    /// Passed to every script on top of the inherited environment.
    pub extra_env: Vec<(String, String)>,
}

/// One invocation. Arguments are handed to the process as an argv array, so
/// user input is never interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub op: ScriptOp,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ScriptRequest {
    pub fn new(op: ScriptOp) -> Self {
        Self {
            op,
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Adds `flag=value` as one argv entry, so a value starting with `-`
    /// is not taken for an option.
    pub fn arg(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.args.push(format!("{}={}", flag, value.into()));
        self
    }

    /// The value passed for `flag`, if any.
    pub fn value(&self, flag: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| {
            arg.strip_prefix(flag)
                .and_then(|rest| rest.strip_prefix('='))
        })
    }

    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to spawn {script}: {source}")]
    Spawn {
        script: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read output of {script}: {source}")]
    Io {
        script: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{script} exited with code {code:?}: {stderr}")]
    Exit {
        script: &'static str,
        code: Option<i32>,
        stderr: String,
    },
    #[error("{script} produced no JSON object: {raw}")]
    NoJson { script: &'static str, raw: String },
    #[error("{script} produced malformed JSON ({source}): {raw}")]
    Json {
        script: &'static str,
        #[source]
        source: serde_json::Error,
        raw: String,
    },
    #[error("{script} wrote more than {limit} bytes to one stream")]
    OutputTooLarge { script: &'static str, limit: u64 },
    #[error("{script} timed out after {after:?}")]
    Timeout {
        script: &'static str,
        after: Duration,
    },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn execute(&self, request: ScriptRequest) -> Result<Value, FetchError>;
}

pub struct PythonRunner {
    config: RunnerConfig,
}

impl PythonRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn command(&self, request: &ScriptRequest) -> Command {
        let script_path = self.config.scripts_dir.join(request.op.script_name());
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(&script_path)
            .args(&request.args)
            .env("LANG", "C.UTF-8")
            .env("LC_ALL", "C.UTF-8")
            .env("PYTHONIOENCODING", "utf-8")
            .envs(self.config.extra_env.iter().map(|(k, v)| (k, v)))
            .envs(request.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

enum Capture {
    Io(std::io::Error),
    TooLarge,
}

/// Reads a stream to EOF, giving up as soon as it passes the cap.
async fn read_capped(stream: impl AsyncRead + Unpin) -> Result<Vec<u8>, Capture> {
    let mut buf = Vec::new();
    stream
        .take(MAX_OUTPUT_BYTES + 1)
        .read_to_end(&mut buf)
        .await
        .map_err(Capture::Io)?;
    if buf.len() as u64 > MAX_OUTPUT_BYTES {
        return Err(Capture::TooLarge);
    }
    Ok(buf)
}

/// Kills the child and everything it spawned, then reaps it.
async fn terminate(child: &mut Child, script: &str) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        if let Err(e) = kill_process_group(pid) {
            warn!("Failed to kill process group of {}: {}", script, e);
        }
    }
    if let Err(e) = child.kill().await {
        warn!("Failed to kill {}: {}", script, e);
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) -> nix::Result<()> {
    use nix::{
        errno::Errno,
        sys::signal::{killpg, Signal},
        unistd::Pid,
    };

    let pgid = i32::try_from(pid).map_err(|_| Errno::EINVAL)?;
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        // group already gone
        Err(Errno::ESRCH) => Ok(()),
        other => other,
    }
}

#[async_trait]
impl ScriptExecutor for PythonRunner {
    async fn execute(&self, request: ScriptRequest) -> Result<Value, FetchError> {
        let script = request.op.script_name();
        let limit = self.config.timeouts.for_op(request.op);
        let started = Instant::now();

        let mut child = self
            .command(&request)
            .spawn()
            .map_err(|source| FetchError::Spawn { script, source })?;
        debug!(
            "Spawned {} (pid {:?}) with args {:?}",
            script,
            child.id(),
            request.args
        );

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            terminate(&mut child, script).await;
            return Err(FetchError::Io {
                script,
                source: std::io::Error::other("stdio pipes were not captured"),
            });
        };

        let collect = async {
            let (out, err) = tokio::try_join!(read_capped(stdout), read_capped(stderr))?;
            let status = child.wait().await.map_err(Capture::Io)?;
            Ok::<_, Capture>((status, out, err))
        };

        let (status, out, err) = match tokio::time::timeout(limit, collect).await {
            Ok(Ok(collected)) => collected,
            Ok(Err(Capture::TooLarge)) => {
                terminate(&mut child, script).await;
                warn!("{} exceeded the output cap, process killed", script);
                return Err(FetchError::OutputTooLarge {
                    script,
                    limit: MAX_OUTPUT_BYTES,
                });
            }
            Ok(Err(Capture::Io(source))) => {
                terminate(&mut child, script).await;
                return Err(FetchError::Io { script, source });
            }
            Err(_) => {
                terminate(&mut child, script).await;
                warn!("{} timed out after {:?}, process killed", script, limit);
                return Err(FetchError::Timeout {
                    script,
                    after: limit,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&out);
        let stderr = String::from_utf8_lossy(&err);
        info!(
            "{} exited with {:?} in {:?} (stdout {} bytes, stderr {} bytes)",
            script,
            status.code(),
            started.elapsed(),
            stdout.len(),
            stderr.len()
        );

        if !status.success() {
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(FetchError::Exit {
                script,
                code: status.code(),
                stderr: detail.to_string(),
            });
        }

        parse_output(script, &stdout)
    }
}

/// The span between the first `{` and the last `}`, inclusive.
pub fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn parse_output(script: &'static str, stdout: &str) -> Result<Value, FetchError> {
    let Some(json) = extract_json(stdout) else {
        return Err(FetchError::NoJson {
            script,
            raw: stdout.to_string(),
        });
    };
    serde_json::from_str(json).map_err(|source| FetchError::Json {
        script,
        source,
        raw: stdout.to_string(),
    })
}

/// Whether the configured scripts directory exists. Used by the health check.
pub fn scripts_dir_present(dir: &Path) -> bool {
    dir.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_strips_surrounding_noise() {
        let raw = "loading 2 markets...\n{\"a\": {\"b\": 1}}\ndone";
        assert_eq!(extract_json(raw), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn extract_json_requires_an_object_span() {
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} before {"), None);
        assert_eq!(extract_json("{"), None);
    }

    #[test]
    fn parse_output_reports_malformed_json_with_raw_text() {
        let err = parse_output("fetch_stock_data.py", "{not json}").unwrap_err();
        match err {
            FetchError::Json { raw, .. } => assert_eq!(raw, "{not json}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn request_builder_joins_flag_and_value() {
        let request = ScriptRequest::new(ScriptOp::News)
            .arg("--symbol", "005930")
            .arg("--name", "-KODEX 200")
            .env("SEARCH_QUERY", "삼성");
        assert_eq!(request.args, vec!["--symbol=005930", "--name=-KODEX 200"]);
        assert_eq!(request.value("--name"), Some("-KODEX 200"));
        assert_eq!(request.value("--limit"), None);
        assert_eq!(
            request.env,
            vec![("SEARCH_QUERY".to_string(), "삼성".to_string())]
        );
    }

    #[test]
    fn timeouts_follow_operation_cost() {
        let timeouts = ScriptTimeouts::default();
        assert_eq!(timeouts.for_op(ScriptOp::Quote), Duration::from_secs(10));
        assert_eq!(
            timeouts.for_op(ScriptOp::DartDisclosure),
            Duration::from_secs(30)
        );
        assert_eq!(timeouts.for_op(ScriptOp::Search), Duration::from_secs(180));
    }
}
