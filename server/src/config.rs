//! Configuration for the nhltop server
//!
//! Read once at startup from the environment. The database is chosen with
//! the following precedence:
//! 1. NHLTOP_DATABASE_URL (any sqlx URL)
//! 2. DB_HOST with DB_USER / DB_PASSWORD / DB_NAME (MySQL or MariaDB)
//! 3. A SQLite file `nhltop.db` under NHLTOP_DATA_DIR (default ./data)

use nhl_client::DEFAULT_BASE_URL;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::ConnectOptions;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::persistence::sql::Database;
use crate::persistence::PersistenceError;

const DEV_DATA_DIR: &str = "./data";
const SQLITE_FILE: &str = "nhltop.db";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_DB_NAME: &str = "nhltop";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen address {value:?}: {source}")]
    ListenAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid database port in DB_HOST {0:?}")]
    DbPort(String),
}

/// Where the stats tables live.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Url(String),
    MySql {
        host: String,
        port: Option<u16>,
        user: String,
        password: String,
        name: String,
    },
    Sqlite(PathBuf),
}

impl DatabaseTarget {
    /// The sqlx connection URL. Creates the SQLite directory when needed.
    pub fn connection_url(&self) -> Result<String, PersistenceError> {
        match self {
            DatabaseTarget::Url(url) => Ok(url.clone()),
            DatabaseTarget::MySql {
                host,
                port,
                user,
                password,
                name,
            } => {
                let mut options = MySqlConnectOptions::new()
                    .host(host)
                    .username(user)
                    .password(password)
                    .database(name);
                if let Some(port) = port {
                    options = options.port(*port);
                }
                Ok(options.to_url_lossy().to_string())
            }
            DatabaseTarget::Sqlite(path) => Database::sqlite_url(path),
        }
    }
}

// Keeps the password out of logs
impl fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseTarget::Url(_) => f.write_str("Url(..)"),
            DatabaseTarget::MySql {
                host, port, user, name, ..
            } => f
                .debug_struct("MySql")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("name", name)
                .finish_non_exhaustive(),
            DatabaseTarget::Sqlite(path) => f.debug_tuple("Sqlite").field(path).finish(),
        }
    }
}

impl fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseTarget::Url(url) => {
                let scheme = url.split(':').next().unwrap_or_default();
                write!(f, "{scheme} database from NHLTOP_DATABASE_URL")
            }
            DatabaseTarget::MySql { host, name, .. } => write!(f, "mysql://{host}/{name}"),
            DatabaseTarget::Sqlite(path) => write!(f, "sqlite file {}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database: DatabaseTarget,
    pub listen_addr: SocketAddr,
    pub api_base: String,
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = if let Some(url) = var("NHLTOP_DATABASE_URL") {
            DatabaseTarget::Url(url)
        } else if let Some(host) = var("DB_HOST") {
            let (host, port) = match host.rsplit_once(':') {
                Some((h, p)) => {
                    let port = p.parse().map_err(|_| ConfigError::DbPort(host.clone()))?;
                    (h.to_string(), Some(port))
                }
                None => (host, None),
            };
            DatabaseTarget::MySql {
                host,
                port,
                user: var("DB_USER").unwrap_or_default(),
                password: var("DB_PASSWORD").unwrap_or_default(),
                name: var("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            }
        } else {
            let dir = var("NHLTOP_DATA_DIR").unwrap_or_else(|| DEV_DATA_DIR.to_string());
            DatabaseTarget::Sqlite(PathBuf::from(dir).join(SQLITE_FILE))
        };

        let listen = var("NHLTOP_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen
            .parse()
            .map_err(|source| ConfigError::ListenAddr {
                value: listen.clone(),
                source,
            })?;

        Ok(Self {
            database,
            listen_addr,
            api_base: var("NHLTOP_API_BASE").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            log_dir: var("NHLTOP_LOG_DIR").map(PathBuf::from),
        })
    }
}
