use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rollcall::{db, AppState, Config};

#[derive(Parser)]
#[command(name = "rollcall", about = "Gym class scheduling and reservation service")]
struct Args {
    /// Path to a YAML configuration file.
    #[arg(long, env = "ROLLCALL_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let pool = db::connect(&config.database_url).await?;
    let state = AppState {
        db: pool,
        policy: config.policy,
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "listening");
    axum::serve(listener, rollcall::router(state)).await?;

    Ok(())
}
