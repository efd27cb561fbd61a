//! rowscope - a lightweight SQL console that knows which statements return rows.

use rowscope::cli::Cli;
use rowscope::config::{Config, ConnectionConfig};
use rowscope::error::{Result, RowscopeError};
use rowscope::query::QueryExecutor;
use rowscope::{console, db, logging, output};
use std::io::IsTerminal;
use tokio::io::BufReader;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() {
    // Load .env before parsing so env-backed flags and DATABASE_URL see it.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Could not load .env: {e}");
        }
    }

    let cli = Cli::parse_args();
    logging::init(cli.log_file);

    if let Err(e) = run(cli).await {
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    debug!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // Precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. DATABASE_URL
    let Some(connection) = resolve_connection(&cli, &config)? else {
        warn!("No database connection configured");
        return Err(RowscopeError::config(
            "No database connection configured. Use --help for usage information.",
        ));
    };

    info!("Connecting to {}", connection.display_string());
    let client = db::connect(&connection).await?;
    let limits = cli.query_config(&config.query);
    let executor = QueryExecutor::new(client.as_ref(), &limits);

    let result = if cli.tables {
        client
            .tables()
            .await
            .and_then(|tables| output::render_tables(&tables, cli.output))
            .map(|rendered| println!("{rendered}"))
    } else if !cli.execute.is_empty() {
        console::run_script(&executor, &cli.execute, cli.output).await
    } else if std::io::stdin().is_terminal() {
        console::interactive(&executor, cli.output).await
    } else {
        console::run_input(&executor, BufReader::new(tokio::io::stdin()), cli.output).await
    };

    client.close().await?;
    result
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(RowscopeError::config(format!(
                    "Connection '{name}' not found in config file"
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    if connection.is_none() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            connection = Some(ConnectionConfig::from_connection_string(&url)?);
        }
    }

    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
