use anyhow::Context;
use clap::Parser;
use inc_config::IncidentConfig;
use inc_server::{AppState, router};

/// Incident response service.
#[derive(Debug, Parser)]
#[command(name = "incd", version, about)]
struct Cli {
    /// Address to listen on (overrides `server.bind_addr`)
    #[arg(long)]
    bind: Option<String>,

    /// libSQL database file (overrides `server.database_path`)
    #[arg(long)]
    database: Option<String>,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("incd error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = IncidentConfig::load_with_dotenv().context("failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    if let Some(database) = cli.database {
        config.server.database_path = database;
    }
    if !config.openai.is_configured() {
        tracing::warn!("OPENAI_API_KEY not set; agent runs use fixtures only");
    }
    if !config.slack.is_configured() {
        tracing::warn!("Slack bot token or channel not set; /slack/alert is disabled");
    }

    let bind_addr = config.server.bind_addr.clone();
    let state = AppState::build(config)
        .await
        .context("failed to initialize application state")?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "incd listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("INCIDENT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
