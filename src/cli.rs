use std::path::PathBuf;

use clap::Parser;
use leanpad::config::Config;

#[derive(Parser, Debug, Clone)]
#[command(name = "leanpad", about = "Lean 4 editor backend", version)]
pub struct Cli {
    /// Address to listen on, e.g. 127.0.0.1:8000.
    #[arg(long)]
    pub addr: Option<String>,

    /// Read settings from this file instead of ~/.config/leanpad/.leanpadrc.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Checker executable (default: lean from PATH).
    #[arg(long)]
    pub checker: Option<String>,

    /// Wall-clock limit for one check, in seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Directory for saved documents.
    #[arg(long)]
    pub store: Option<String>,

    /// Directory served under /static.
    #[arg(long = "static-dir")]
    pub static_dir: Option<String>,

    /// Language of user-facing messages (ja|en).
    #[arg(long)]
    pub locale: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Flags win over every other config layer.
    pub fn apply(&self, mut cfg: Config) -> Config {
        let overrides = [
            ("LEANPAD_ADDR", self.addr.clone()),
            ("CHECKER_PROGRAM", self.checker.clone()),
            ("CHECKER_TIMEOUT", self.timeout.map(|t| t.to_string())),
            ("STORE_PATH", self.store.clone()),
            ("STATIC_PATH", self.static_dir.clone()),
            ("LEANPAD_LOCALE", self.locale.clone()),
        ];
        for (key, value) in overrides {
            if let Some(v) = value {
                cfg = cfg.with_override(key, v);
            }
        }
        cfg
    }
}
