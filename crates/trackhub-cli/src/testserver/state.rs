//! The persisted testserver state file and the lock that guards it.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::output;
use crate::testserver::health::{HealthError, wait_for_http_200};

/// A lock this old is assumed abandoned and taken over.
const LOCK_STALE_TTL: Duration = Duration::from_secs(60);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const BACKOFF_BASE: Duration = Duration::from_millis(100);
const BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Map from server names to information about them.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Whether this tool started the server or just connected to it.
    pub managed: bool,

    /// The server's address, e.g. "localhost".
    pub hostname: String,

    /// The exposed base port, serving the GraphQL and web APIs.
    pub base_port: u16,

    /// The exposed fixture port, serving test-only functionality.
    pub fixture_port: u16,
}

impl ServerInfo {
    /// Block until both health endpoints answer HTTP 200.
    pub async fn wait_until_healthy(&self, timeout: Duration) -> Result<(), HealthError> {
        let app_health_url = format!("http://{}:{}/ready", self.hostname, self.base_port);
        let fixture_health_url = format!("http://{}:{}/health", self.hostname, self.fixture_port);
        wait_for_http_200(&app_health_url, timeout).await?;
        wait_for_http_200(&fixture_health_url, timeout).await?;
        Ok(())
    }
}

/// On-disk home of the state file and its lock.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn default_location() -> Result<Self> {
        Ok(Self::new(crate::config::trackhub_dir()?))
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join("testserver.state.json")
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join("testserver.state.lock")
    }

    /// Take the exclusive lock on the state file. Hold the guard across
    /// the whole read-modify-write (including any health waits).
    pub fn lock(&self) -> Result<LockGuard> {
        fs::create_dir_all(&self.dir)?;
        LockGuard::acquire(&self.lock_path(), ACQUIRE_TIMEOUT)
    }

    /// Read the state; an unparseable file is discarded with a warning
    /// and remade.
    pub fn load(&self) -> Result<StateFile> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(StateFile::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(StateFile::default());
        }
        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(err) => {
                output::print_error(&format!("Couldn't parse state file; remaking it: {err}"));
                Ok(StateFile::default())
            }
        }
    }

    pub fn save(&self, state: &StateFile) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(state)?;
        fs::write(self.state_path(), content)
            .with_context(|| format!("Failed to write {}", self.state_path().display()))?;
        Ok(())
    }
}

/// An exclusive lock file. Acquisition atomically creates the file; a
/// lock older than [`LOCK_STALE_TTL`] is taken over. Released on drop.
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let deadline = Instant::now() + timeout;
        let mut backoff = BACKOFF_BASE;
        loop {
            match fs::OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    if lock_is_stale(path) {
                        let _ = fs::remove_file(path);
                        continue;
                    }
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("Failed to create lock file {}", path.display())
                    });
                }
            }
            if Instant::now() >= deadline {
                anyhow::bail!("Timed out waiting for the lock at {}", path.display());
            }
            std::thread::sleep(backoff);
            backoff = (backoff * 2).min(BACKOFF_MAX);
        }
    }
}

fn lock_is_stale(path: &Path) -> bool {
    match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => SystemTime::now()
            .duration_since(modified)
            .map(|age| age > LOCK_STALE_TTL)
            .unwrap_or(false),
        Err(_) => false,
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
