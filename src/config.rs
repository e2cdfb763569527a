//! Startup configuration, resolved once from environment variables and CLI
//! flags, mirroring the teacher's `planning_paths` defaulting idiom: env var
//! wins when set, otherwise fall back to a `dirs::home_dir()`-relative path.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const ENV_DATA_DIR: &str = "CCW_DATA_DIR";
const ENV_PORT: &str = "CCW_PORT";
const ENV_TOOL_TIMEOUT_SECS: &str = "CCW_TOOL_TIMEOUT_SECS";
const ENV_EVENT_BUFFER_SIZE: &str = "CCW_EVENT_BUFFER_SIZE";
const ENV_ENABLED_TOOLS: &str = "CCW_ENABLED_TOOLS";

const DEFAULT_PORT: u16 = 4317;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

/// Which tools the Tool-Calling Server exposes, per `CCW_ENABLED_TOOLS`
/// (spec §6): a comma-list of names, the literal `all`, or an explicit
/// empty value to expose none. Left unset, every tool in the catalog is
/// enabled — the spec only defines the gating behavior once the variable
/// is present, so "unset" is read as "no restriction" (see DESIGN.md).
#[derive(Debug, Clone)]
pub enum EnabledTools {
    All,
    Named(HashSet<String>),
}

impl EnabledTools {
    pub fn is_enabled(&self, name: &str) -> bool {
        match self {
            EnabledTools::All => true,
            EnabledTools::Named(names) => names.contains(name),
        }
    }

    fn from_env_value(value: &str) -> Self {
        if value == "all" {
            return EnabledTools::All;
        }
        let names: HashSet<String> = value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        EnabledTools::Named(names)
    }
}

/// Resolved process configuration shared by both subcommands.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory under which all projects' state lives
    /// (`<globalRoot>/projects/<projectId>/...`).
    pub global_root: PathBuf,
    /// Dashboard Bridge HTTP/WebSocket port, used by `ccw serve` when
    /// `--port` is not passed on the command line.
    pub port: u16,
    /// Per-tool-call timeout for the Tool-Calling Server (spec §4.5 step 4).
    pub tool_timeout_secs: u64,
    /// Bounded per-subscriber channel size for the Event Bus (spec §4.3).
    pub event_buffer_size: usize,
    /// Tool catalog restriction for the Tool-Calling Server (spec §6).
    pub enabled_tools: EnabledTools,
}

impl Config {
    /// Resolves configuration from the environment, falling back to
    /// `~/.ccw` for the global root the way the teacher falls back to
    /// `~/.planning-agent` in `planning_paths::planning_agent_home_dir`.
    pub fn from_env() -> Result<Self> {
        let global_root = match std::env::var(ENV_DATA_DIR) {
            Ok(value) => PathBuf::from(value),
            Err(_) => default_global_root()?,
        };

        let port = match std::env::var(ENV_PORT) {
            Ok(value) => value
                .parse()
                .with_context(|| format!("{ENV_PORT} must be a valid u16, got {value:?}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let tool_timeout_secs = match std::env::var(ENV_TOOL_TIMEOUT_SECS) {
            Ok(value) => value.parse().with_context(|| {
                format!("{ENV_TOOL_TIMEOUT_SECS} must be a valid u64, got {value:?}")
            })?,
            Err(_) => DEFAULT_TOOL_TIMEOUT_SECS,
        };

        let event_buffer_size = match std::env::var(ENV_EVENT_BUFFER_SIZE) {
            Ok(value) => value.parse().with_context(|| {
                format!("{ENV_EVENT_BUFFER_SIZE} must be a valid usize, got {value:?}")
            })?,
            Err(_) => DEFAULT_EVENT_BUFFER_SIZE,
        };

        let enabled_tools = match std::env::var(ENV_ENABLED_TOOLS) {
            Ok(value) => EnabledTools::from_env_value(&value),
            Err(_) => EnabledTools::All,
        };

        Ok(Self {
            global_root,
            port,
            tool_timeout_secs,
            event_buffer_size,
            enabled_tools,
        })
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.global_root.join("projects")
    }
}

fn default_global_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".ccw"))
}

/// Ensures `dir` exists, creating it (and parents) on first access —
/// the teacher's `fs::create_dir_all`-on-access convention.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))
}
