use clap::Parser;
use dotenv::dotenv;
use foodgram::db::schema::create_tables;
use foodgram::server::config::ServerConfig;
use foodgram::web::create_axum_router;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    dotenv().ok();

    // Config comes first: it names the log directory.
    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting server.");

    // --- Database Pool Setup ---
    let mut opt = ConnectOptions::new(server_config.database_url.clone());
    opt.max_connections(server_config.max_connections);
    let db_pool: DatabaseConnection = Database::connect(opt).await?;

    if server_config.auto_create_schema {
        create_tables(&db_pool).await?;
    }

    let http_router = create_axum_router(db_pool, server_config.clone());

    let addr = server_config.listen_addr;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;
    info!(address = %addr, "HTTP server listening.");

    axum::serve(listener, http_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Box::new)?;

    info!("Server stopped.");
    Ok(())
}
