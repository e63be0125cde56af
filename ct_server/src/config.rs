//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use club_tourney::db::DatabaseConfig;
use club_tourney::tournament::{EngineConfig, PairingPolicy, ScoringConfig, Tiebreak};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Largest page a client may request from `/players/{id}/matches`
pub const MAX_PAGE_LIMIT: usize = 200;

/// Minimum JWT secret length
const MIN_JWT_SECRET_LEN: usize = 32;

/// Where tournament state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// In-process store with in-memory collaborators
    Memory,
    /// PostgreSQL store with table-backed collaborators
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageMode::Memory),
            "postgres" | "postgresql" => Ok(StorageMode::Postgres),
            other => Err(ConfigError::Invalid {
                var: "STORAGE".to_string(),
                reason: format!("'{other}' is not one of memory, postgres"),
            }),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Storage backend
    pub storage: StorageMode,
    /// Database configuration, present for postgres storage
    pub database: Option<DatabaseConfig>,
    /// Security configuration
    pub security: SecurityConfig,
    /// Scoring, pairing policy and timeouts handed to the engine
    pub engine: EngineConfig,
    /// References the in-memory payment verifier accepts
    pub dev_payment_references: Vec<String>,
    /// Prometheus exporter address
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

/// Command-line values that take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub storage: Option<StorageMode>,
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values parsed from the command line
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Load configuration through `lookup` instead of the process environment
    pub fn from_lookup<F>(lookup: F, overrides: Overrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_var_or(&lookup, "SERVER_BIND", SocketAddr::from(([127, 0, 0, 1], 6969)))?,
        };

        let storage = match overrides.storage {
            Some(storage) => storage,
            None => lookup("STORAGE")
                .map(|s| s.parse::<StorageMode>())
                .transpose()?
                .unwrap_or(StorageMode::Memory),
        };

        let database = match storage {
            StorageMode::Memory => None,
            StorageMode::Postgres => {
                let database_url = overrides
                    .database_url
                    .or_else(|| lookup("DATABASE_URL"))
                    .ok_or_else(|| ConfigError::MissingRequired {
                        var: "DATABASE_URL".to_string(),
                        hint: "Required for postgres storage, e.g. postgres://user@localhost/club_tourney".to_string(),
                    })?;

                let defaults = DatabaseConfig::development();
                Some(DatabaseConfig {
                    database_url,
                    max_connections: parse_var_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
                    min_connections: parse_var_or(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections)?,
                    connection_timeout_secs: parse_var_or(
                        &lookup,
                        "DB_CONNECTION_TIMEOUT",
                        defaults.connection_timeout_secs,
                    )?,
                    idle_timeout_secs: parse_var_or(&lookup, "DB_IDLE_TIMEOUT", defaults.idle_timeout_secs)?,
                    max_lifetime_secs: parse_var_or(&lookup, "DB_MAX_LIFETIME", defaults.max_lifetime_secs)?,
                })
            }
        };

        // Security configuration (REQUIRED)
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        // Engine configuration
        let scoring_defaults = ScoringConfig::default();
        let scoring = ScoringConfig {
            win: parse_var_or(&lookup, "SCORE_WIN", scoring_defaults.win)?,
            draw: parse_var_or(&lookup, "SCORE_DRAW", scoring_defaults.draw)?,
            loss: parse_var_or(&lookup, "SCORE_LOSS", scoring_defaults.loss)?,
            bye: parse_var_or(&lookup, "SCORE_BYE", scoring_defaults.bye)?,
        };

        let pairing = match lookup("PAIRING_TIEBREAKS") {
            Some(list) => PairingPolicy {
                tiebreaks: parse_tiebreaks(&list)?,
            },
            None => PairingPolicy::default(),
        };

        let engine_defaults = EngineConfig::default();
        let timeout_ms: u64 = parse_var_or(
            &lookup,
            "PAYMENT_VERIFY_TIMEOUT_MS",
            engine_defaults.payment_timeout.as_millis() as u64,
        )?;

        let engine = EngineConfig {
            scoring,
            pairing,
            payment_timeout: Duration::from_millis(timeout_ms),
            player_matches_page_size: parse_var_or(
                &lookup,
                "PLAYER_MATCHES_PAGE_LIMIT",
                engine_defaults.player_matches_page_size,
            )?,
        };

        let dev_payment_references: Vec<String> = lookup("DEV_PAYMENT_REFERENCES")
            .map(|list| split_list(&list).map(str::to_string).collect())
            .unwrap_or_default();

        let metrics_bind = lookup("METRICS_BIND")
            .map(|addr| {
                addr.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{addr}' is not a socket address"),
                })
            })
            .transpose()?;

        Ok(ServerConfig {
            bind,
            storage,
            database,
            security: SecurityConfig { jwt_secret },
            engine,
            dev_payment_references,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {MIN_JWT_SECRET_LEN} characters (128-bit security)"),
            });
        }

        let scoring = &self.engine.scoring;
        for (var, value) in [
            ("SCORE_WIN", scoring.win),
            ("SCORE_DRAW", scoring.draw),
            ("SCORE_LOSS", scoring.loss),
            ("SCORE_BYE", scoring.bye),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("Must be a finite, non-negative number (got {value})"),
                });
            }
        }

        if scoring.win < scoring.draw {
            return Err(ConfigError::Invalid {
                var: "SCORE_WIN".to_string(),
                reason: format!("Must not be below the draw score ({})", scoring.draw),
            });
        }

        if self.engine.payment_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "PAYMENT_VERIFY_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let page_limit = self.engine.player_matches_page_size;
        if page_limit == 0 || page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::Invalid {
                var: "PLAYER_MATCHES_PAGE_LIMIT".to_string(),
                reason: format!("Must be between 1 and {MAX_PAGE_LIMIT}"),
            });
        }

        if let Some(database) = &self.database {
            if database.max_connections < database.min_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS".to_string(),
                    reason: format!(
                        "Must be at least DB_MIN_CONNECTIONS ({})",
                        database.min_connections
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse `key` through `lookup`, falling back to `default` when unset
fn parse_var_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{raw}' could not be parsed"),
        }),
        None => Ok(default),
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_tiebreaks(list: &str) -> Result<Vec<Tiebreak>, ConfigError> {
    split_list(list)
        .map(|name| {
            name.parse::<Tiebreak>().map_err(|reason| ConfigError::Invalid {
                var: "PAIRING_TIEBREAKS".to_string(),
                reason,
            })
        })
        .collect()
}
