//! Startup configuration snapshot.
//!
//! Values are layered once (defaults, rc file, environment, CLI overrides)
//! and then handed out as typed settings. Nothing re-reads the environment
//! after `load`.

use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::messages::Locale;

pub const DEFAULT_CHECKER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    /// Load defaults, the rc file (explicit path or the per-user default)
    /// and matching environment variables.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut map = default_map();
        let config_path = explicit_path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);

        if config_path.exists() {
            let file = fs::File::open(&config_path)
                .with_context(|| format!("opening config file {}", config_path.display()))?;
            read_rc(BufReader::new(file), &mut map);
        } else if explicit_path.is_some() {
            anyhow::bail!("config file not found: {}", config_path.display());
        }

        // Environment variables take precedence over the rc file
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Ok(Self { inner: map, config_path })
    }

    /// Defaults only; used by tests and embedders that build settings by hand.
    pub fn defaults() -> Self {
        Self {
            inner: default_map(),
            config_path: default_config_path(),
        }
    }

    pub fn with_override(mut self, key: &str, value: impl Into<String>) -> Self {
        self.inner.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let raw = self.get("LEANPAD_ADDR").unwrap_or_else(|| "0.0.0.0:8000".into());
        raw.parse::<SocketAddr>()
            .with_context(|| format!("invalid LEANPAD_ADDR: {}", raw))
    }

    pub fn checker_program(&self) -> PathBuf {
        self.get_path("CHECKER_PROGRAM")
            .unwrap_or_else(|| PathBuf::from("lean"))
    }

    pub fn checker_timeout(&self) -> Duration {
        let secs = self
            .get_u64("CHECKER_TIMEOUT")
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_CHECKER_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn workspace_dir(&self) -> Option<PathBuf> {
        self.get_path("WORKSPACE_DIR")
    }

    pub fn store_path(&self) -> PathBuf {
        self.get_path("STORE_PATH")
            .unwrap_or_else(|| PathBuf::from("saved_files"))
    }

    pub fn static_path(&self) -> PathBuf {
        self.get_path("STATIC_PATH")
            .unwrap_or_else(|| PathBuf::from("static"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.get_path("INDEX_PATH")
            .unwrap_or_else(|| PathBuf::from("index.html"))
    }

    pub fn locale(&self) -> Locale {
        self.get("LEANPAD_LOCALE")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn api_key(&self) -> Option<String> {
        self.get("ANTHROPIC_API_KEY").filter(|s| !s.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }
}

fn read_rc(reader: impl BufRead, map: &mut HashMap<String, String>) {
    for line in reader.lines().map_while(|l| l.ok()) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "CHECKER_PROGRAM",
        "CHECKER_TIMEOUT",
        "WORKSPACE_DIR",
        "STORE_PATH",
        "STATIC_PATH",
        "INDEX_PATH",
        "CHAT_MODEL",
        "CHAT_MAX_TOKENS",
        "REQUEST_TIMEOUT",
    ];

    KEYS.contains(&k) || k.starts_with("LEANPAD_") || k.starts_with("ANTHROPIC_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("leanpad").join(".leanpadrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("LEANPAD_ADDR".into(), "0.0.0.0:8000".into());
    m.insert("LEANPAD_LOCALE".into(), "ja".into());

    // Checker
    m.insert("CHECKER_PROGRAM".into(), "lean".into());
    m.insert(
        "CHECKER_TIMEOUT".into(),
        DEFAULT_CHECKER_TIMEOUT_SECS.to_string(),
    );

    // Paths
    m.insert("STORE_PATH".into(), "saved_files".into());
    m.insert("STATIC_PATH".into(), "static".into());
    m.insert("INDEX_PATH".into(), "index.html".into());

    // Chat
    m.insert("ANTHROPIC_BASE_URL".into(), "https://api.anthropic.com".into());
    m.insert("CHAT_MODEL".into(), "claude-3-5-sonnet-20241022".into());
    m.insert("CHAT_MAX_TOKENS".into(), "2048".into());
    m.insert("REQUEST_TIMEOUT".into(), "60".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_lines_skip_comments_and_trim() {
        let mut map = HashMap::new();
        let text = "# comment\n\nCHECKER_TIMEOUT = 5\nSTORE_PATH=/srv/docs\nnot a pair\n";
        read_rc(text.as_bytes(), &mut map);
        assert_eq!(map.get("CHECKER_TIMEOUT").map(String::as_str), Some("5"));
        assert_eq!(map.get("STORE_PATH").map(String::as_str), Some("/srv/docs"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn bad_or_zero_timeout_falls_back() {
        let cfg = Config::defaults().with_override("CHECKER_TIMEOUT", "soon");
        assert_eq!(cfg.checker_timeout(), Duration::from_secs(30));
        let cfg = Config::defaults().with_override("CHECKER_TIMEOUT", "0");
        assert_eq!(cfg.checker_timeout(), Duration::from_secs(30));
        let cfg = Config::defaults().with_override("CHECKER_TIMEOUT", "7");
        assert_eq!(cfg.checker_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn explicit_rc_file_is_read_and_recorded() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("leanpadrc");
        fs::write(&path, "STORE_PATH=/srv/proofs\n")?;
        let cfg = Config::load(Some(&path))?;
        assert_eq!(cfg.config_path, path);
        assert_eq!(cfg.store_path(), PathBuf::from("/srv/proofs"));

        assert!(Config::load(Some(&dir.path().join("absent"))).is_err());
        Ok(())
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = Config::defaults().with_override("ANTHROPIC_API_KEY", "  ");
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn only_known_or_prefixed_env_keys_are_taken() {
        assert!(is_config_key("CHECKER_PROGRAM"));
        assert!(is_config_key("LEANPAD_LOCALE"));
        assert!(is_config_key("ANTHROPIC_API_KEY"));
        assert!(!is_config_key("PATH"));
    }
}
