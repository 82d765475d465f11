//! Server lifecycle - launching the site under test and reaping it afterwards

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::retry::{self, Readiness, RetryPolicy};

/// Environment variable that selects the server's runtime mode. Only set when
/// the caller's environment leaves it undefined.
pub const RUNTIME_MODE_VAR: &str = "FLASK_ENV";

/// Handle to the running site under test.
///
/// Owned by the fixture for the whole run; checks borrow the base URL and must
/// not terminate the process themselves. Termination happens exactly once, on
/// `stop` or on drop.
#[derive(Debug)]
pub struct ServerHandle {
    child: Child,
    base_url: String,
    grace_timeout: Duration,
    stopped: bool,
}

/// Configuration for launching the site under test.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory containing the entry script, also the child's working dir
    pub project_root: PathBuf,

    /// Interpreter used to launch the entry script
    pub interpreter: String,

    /// Entry scripts to try, in order of preference
    pub entry_candidates: Vec<PathBuf>,

    /// Loopback host the server is expected to bind
    pub host: String,

    /// Port the server is expected to bind
    pub port: u16,

    /// Value for the runtime-mode variable when the caller has not set one
    pub runtime_mode: String,

    /// Readiness polling policy
    pub readiness: RetryPolicy,

    /// How long teardown waits for a clean exit before killing
    pub grace_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            interpreter: "python3".to_string(),
            entry_candidates: vec![PathBuf::from("run.py"), PathBuf::from("app.py")],
            host: "127.0.0.1".to_string(),
            port: 5000,
            runtime_mode: "production".to_string(),
            readiness: RetryPolicy::default(),
            grace_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Resolve the entry script against the ordered candidate list. Returns the
/// first candidate that exists, or an error naming every path that was tried.
pub fn resolve_entry(root: &Path, candidates: &[PathBuf]) -> HarnessResult<PathBuf> {
    for candidate in candidates {
        if root.join(candidate).is_file() {
            return Ok(candidate.clone());
        }
    }
    Err(HarnessError::EntryScriptNotFound {
        attempted: candidates.iter().map(|c| root.join(c)).collect(),
    })
}

impl ServerHandle {
    /// Launch the site under test and wait for it to answer.
    pub async fn spawn(config: ServerConfig) -> HarnessResult<Self> {
        let entry = resolve_entry(&config.project_root, &config.entry_candidates)?;
        let base_url = config.base_url();

        info!(
            "launching {} {} for {}",
            config.interpreter,
            entry.display(),
            base_url
        );

        let mut cmd = Command::new(&config.interpreter);
        cmd.arg(&entry)
            .current_dir(&config.project_root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if std::env::var_os(RUNTIME_MODE_VAR).is_none() {
            cmd.env(RUNTIME_MODE_VAR, &config.runtime_mode);
        }

        let child = cmd.spawn().map_err(|e| {
            HarnessError::ServerSpawn(format!(
                "{} {}: {}",
                config.interpreter,
                entry.display(),
                e
            ))
        })?;

        let mut handle = ServerHandle {
            child,
            base_url: base_url.clone(),
            grace_timeout: config.grace_timeout,
            stopped: false,
        };

        let client = config.readiness.probe_client()?;
        match retry::wait_until_ready(&client, &base_url, &config.readiness, retry::server_answered)
            .await
        {
            Readiness::Ready { attempts } => {
                info!("server answered at {} after {} attempt(s)", base_url, attempts);
                Ok(handle)
            }
            Readiness::TimedOut { attempts } => {
                let log = handle.kill_and_collect_output();
                Err(HarnessError::BootTimeout { attempts, log })
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Kill the child outright and drain whatever it wrote to its pipes.
    fn kill_and_collect_output(&mut self) -> String {
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.stopped = true;

        let mut log = String::new();
        if let Some(mut out) = self.child.stdout.take() {
            let _ = out.read_to_string(&mut log);
        }
        if let Some(mut err) = self.child.stderr.take() {
            let mut tail = String::new();
            let _ = err.read_to_string(&mut tail);
            if !tail.is_empty() {
                if !log.is_empty() {
                    log.push('\n');
                }
                log.push_str(&tail);
            }
        }
        log
    }

    /// Stop the server: interrupt, terminate, wait out the grace period, then
    /// force kill. Best-effort on every step; never fails and never blocks
    /// past the grace timeout.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        info!("stopping server (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            let _ = kill(pid, Signal::SIGINT);
            let _ = kill(pid, Signal::SIGTERM);
        }

        let deadline = Instant::now() + self.grace_timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    info!("server exited: {}", status);
                    return;
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(_) => break,
            }
        }

        warn!("server did not exit within grace period, killing");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
