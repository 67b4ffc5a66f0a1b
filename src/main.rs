mod cli;

use anyhow::{Context, Result};
use leanpad::{
    config::Config,
    server::{self, AppState, Assets},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = cli::Cli::parse();

    // Read once; nothing below touches the environment again.
    let cfg = args.apply(Config::load(args.config.as_deref())?);
    let addr = cfg.listen_addr()?;

    let assets = Assets {
        index: cfg.index_path(),
        static_dir: cfg.static_path(),
    };
    tokio::fs::create_dir_all(&assets.static_dir)
        .await
        .with_context(|| format!("creating {}", assets.static_dir.display()))?;

    let state = AppState::from_config(&cfg).await?;
    info!(
        checker = %state.gateway.checker().program().display(),
        timeout_secs = state.gateway.checker().timeout().as_secs(),
        store = %state.store.root().display(),
        locale = %cfg.locale(),
        config = %cfg.config_path.display(),
        chat = state.advisor.is_enabled(),
        "configuration loaded"
    );

    server::run(addr, server::create_app(state, &assets)).await
}
