//! Club tournament server.
//!
//! Serves the tournament engine over HTTP, backed either by an in-process
//! store or by PostgreSQL.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use club_tourney::{
    collaborators::{
        MemoryParticipantDirectory, MemoryPaymentVerifier, ParticipantDirectory,
        PaymentVerifier, PgParticipantDirectory, PgPaymentVerifier,
    },
    db::{Database, MemoryStore, TournamentStore},
    tournament::TournamentManager,
};
use ct_server::{
    api::{self, auth::TokenVerifier},
    config::{Overrides, ServerConfig, StorageMode},
    logging, metrics,
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the club tournament server

USAGE:
  ct_server [OPTIONS]

OPTIONS:
  --bind        IP:PORT    Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --storage     MODE       memory or postgres          [default: env STORAGE or memory]
  --db-url      URL        Database connection string  [default: env DATABASE_URL]
  --issue-token USER_ID    Print a one-hour bearer token for USER_ID and exit

FLAGS:
  --migrate                Apply database migrations before serving (postgres only)
  -h, --help               Print help information

ENVIRONMENT:
  JWT_SECRET               Token signing secret (required, 32+ characters)
  PAYMENT_VERIFY_TIMEOUT_MS  Payment verification bound [default: 5000]
  PAIRING_TIEBREAKS        Comma list of rating, buchholz, wins [default: rating]
  SCORE_WIN, SCORE_DRAW, SCORE_LOSS, SCORE_BYE  Points per outcome [default: 1, 0.5, 0, 1]
  PLAYER_MATCHES_PAGE_LIMIT  Default page size for player matches [default: 50]
  DEV_PAYMENT_REFERENCES   Comma list of references accepted in memory mode
  DB_MAX_CONNECTIONS, DB_MIN_CONNECTIONS  Pool bounds (postgres only)
  METRICS_BIND             Prometheus exporter address
";

/// Lifetime of tokens minted with `--issue-token`
const ISSUED_TOKEN_TTL_SECS: i64 = 3600;

struct Args {
    overrides: Overrides,
    migrate: bool,
    issue_token: Option<i64>,
}

fn parse_args() -> Result<Args, Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        overrides: Overrides {
            bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
            storage: pargs.opt_value_from_str::<_, StorageMode>("--storage")?,
            database_url: pargs.opt_value_from_str("--db-url")?,
        },
        migrate: pargs.contains("--migrate"),
        issue_token: pargs.opt_value_from_str("--issue-token")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}", remaining);
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let args = parse_args()?;

    let config = ServerConfig::from_env(args.overrides)?;
    config.validate()?;

    let tokens = Arc::new(TokenVerifier::new(&config.security.jwt_secret));

    if let Some(user_id) = args.issue_token {
        println!("{}", tokens.issue(user_id, ISSUED_TOKEN_TTL_SECS)?);
        return Ok(());
    }

    logging::init();
    info!("Starting tournament server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported at http://{}/metrics", addr);
    }

    let (store, payments, directory, database): (
        Arc<dyn TournamentStore>,
        Arc<dyn PaymentVerifier>,
        Arc<dyn ParticipantDirectory>,
        Option<Database>,
    ) = match (config.storage, &config.database) {
        (StorageMode::Postgres, Some(db_config)) => {
            info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

            if args.migrate {
                db.run_migrations()
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
                info!("Database migrations applied");
            }

            let pool = db.pool().clone();
            (
                Arc::new(db.tournament_store()),
                Arc::new(PgPaymentVerifier::new(pool.clone())),
                Arc::new(PgParticipantDirectory::new(pool)),
                Some(db),
            )
        }
        (StorageMode::Postgres, None) => {
            anyhow::bail!("Postgres storage selected without a database configuration");
        }
        (StorageMode::Memory, _) => {
            if args.migrate {
                tracing::warn!("--migrate ignored with memory storage");
            }
            info!(
                "Using in-memory storage with {} accepted payment reference(s)",
                config.dev_payment_references.len()
            );
            (
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryPaymentVerifier::with_valid(
                    config.dev_payment_references.iter().cloned(),
                )),
                Arc::new(MemoryParticipantDirectory::permissive()),
                None,
            )
        }
    };

    let manager = TournamentManager::new(store, payments, directory, config.engine.clone());
    let app = api::create_router(api::AppState { manager, tokens });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
