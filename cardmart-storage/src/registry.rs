//! One connection pool per credential tier

use cardmart_config::{DatabaseConfig, TierCredential};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::tier::ConnectionTier;

/// Holds the default connection and every tier connection that could be
/// established. Cloning is cheap; pools are shared.
#[derive(Clone, Debug)]
pub struct ConnectionRegistry {
    default: DatabaseConnection,
    tiers: HashMap<ConnectionTier, DatabaseConnection>,
}

/// Reachability of one tier credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierHealth {
    pub tier: ConnectionTier,
    pub configured: bool,
    pub reachable: bool,
    pub error: Option<String>,
}

impl ConnectionRegistry {
    /// Connect the default connection and every configured tier.
    ///
    /// The default connection is required. A tier that fails to connect is
    /// logged and left out; lookups for it fall back to the default.
    pub async fn connect(config: &DatabaseConfig) -> StorageResult<Self> {
        info!("Connecting default database connection");
        let default = Self::open(&config.url, config.max_connections, config)
            .await
            .map_err(|source| StorageError::Connect {
                tier: ConnectionTier::Default,
                source,
            })?;

        let mut tiers = HashMap::new();
        for tier in ConnectionTier::OPERATION_TIERS {
            let Some(credential) = Self::credential_for(config, tier) else {
                warn!(tier = %tier, "No credential configured, tier will use the default connection");
                continue;
            };

            let max_connections = credential.max_connections.unwrap_or(config.max_connections);
            match Self::open(&credential.url, max_connections, config).await {
                Ok(connection) => {
                    debug!(tier = %tier, role = tier.database_role(), "Tier connection established");
                    tiers.insert(tier, connection);
                }
                Err(e) => {
                    warn!(tier = %tier, error = %e, "Tier credential unreachable, tier will use the default connection");
                }
            }
        }

        Ok(Self { default, tiers })
    }

    /// Build a registry from already-open connections
    pub fn from_connections(
        default: DatabaseConnection,
        tiers: impl IntoIterator<Item = (ConnectionTier, DatabaseConnection)>,
    ) -> Self {
        let tiers = tiers
            .into_iter()
            .filter(|(tier, _)| *tier != ConnectionTier::Default)
            .collect();
        Self { default, tiers }
    }

    /// The application's default connection
    pub fn default_connection(&self) -> &DatabaseConnection {
        &self.default
    }

    /// Connection for a tier, if that tier's credential is connected.
    /// `Default` always resolves.
    pub fn get(&self, tier: ConnectionTier) -> Option<&DatabaseConnection> {
        match tier {
            ConnectionTier::Default => Some(&self.default),
            other => self.tiers.get(&other),
        }
    }

    pub fn is_available(&self, tier: ConnectionTier) -> bool {
        self.get(tier).is_some()
    }

    /// Connected operation tiers, least privileged first
    pub fn available_tiers(&self) -> Vec<ConnectionTier> {
        ConnectionTier::OPERATION_TIERS
            .into_iter()
            .filter(|tier| self.tiers.contains_key(tier))
            .collect()
    }

    /// Ping every tier and report reachability
    pub async fn health_check(&self) -> Vec<TierHealth> {
        let mut report = Vec::with_capacity(5);

        for tier in std::iter::once(ConnectionTier::Default).chain(ConnectionTier::OPERATION_TIERS) {
            let health = match self.get(tier) {
                None => TierHealth {
                    tier,
                    configured: false,
                    reachable: false,
                    error: None,
                },
                Some(connection) => match connection.ping().await {
                    Ok(()) => TierHealth {
                        tier,
                        configured: true,
                        reachable: true,
                        error: None,
                    },
                    Err(e) => TierHealth {
                        tier,
                        configured: true,
                        reachable: false,
                        error: Some(e.to_string()),
                    },
                },
            };
            report.push(health);
        }

        report
    }

    fn credential_for(config: &DatabaseConfig, tier: ConnectionTier) -> Option<&TierCredential> {
        match tier {
            ConnectionTier::Default => None,
            ConnectionTier::Read => config.tiers.read.as_ref(),
            ConnectionTier::DataEntry => config.tiers.data_entry.as_ref(),
            ConnectionTier::AdminOps => config.tiers.admin_ops.as_ref(),
            ConnectionTier::SystemAdmin => config.tiers.system_admin.as_ref(),
        }
    }

    async fn open(
        url: &str,
        max_connections: u32,
        config: &DatabaseConfig,
    ) -> Result<DatabaseConnection, sea_orm::DbErr> {
        let mut opts = ConnectOptions::new(url);
        opts.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(config.connection_timeout)
            .acquire_timeout(config.connection_timeout)
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(3600))
            .sqlx_logging(config.sqlx_logging);

        Database::connect(opts).await
    }
}
