mod cli;
mod commands;

use clap::Parser;
use pairly_config::Settings;
use pairly_services::InviteService;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays machine-readable
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "pairly=info,pairly_services=debug,pairly_db=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Load config
    let mut settings = Settings::load()?;
    if let Some(backend) = cli.backend {
        settings.store.backend = backend.into();
    }
    info!(
        app = %settings.app.name,
        backend = ?settings.store.backend,
        default_ttl_ms = settings.invite.default_ttl_ms,
        "Starting"
    );

    let service = InviteService::from_settings(&settings).await?;
    commands::run(&service, cli.command).await
}
