//! Server settings loaded via OrthoConfig and the resolved server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use dolly_backend::domain::{CarrierGatewayConfig, StationChannelError, StationChannels};
use dolly_backend::outbound::carrier::{CarrierCredentials, CarrierHttpSettings};
use dolly_backend::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_CARRIER_ENVIRONMENT: &str = "production";
const DEFAULT_CARRIER_USER_ID: &str = "0";
const DEFAULT_CARRIER_TIMEOUT_SECS: u64 = 30;

/// Error raised while resolving [`ServerSettings`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address {value}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid carrier url {value}: {message}")]
    CarrierUrl { value: String, message: String },
    #[error("carrier is enabled but {0} is not configured")]
    MissingCarrierSetting(&'static str),
    #[error(transparent)]
    StationChannels(#[from] StationChannelError),
}

/// Environment, file and CLI settings for the HTTP server.
///
/// Environment variables use the `DOLLY_` prefix, e.g. `DOLLY_DATABASE_URL`.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DOLLY")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub pool_max_size: Option<u32>,
    /// Send confirmations to the carrier instead of accepting them locally.
    #[ortho_config(default = false)]
    pub carrier_enabled: bool,
    pub carrier_environment: Option<String>,
    pub carrier_url: Option<String>,
    pub carrier_username: Option<String>,
    pub carrier_password: Option<String>,
    pub carrier_supplier_code: Option<String>,
    pub carrier_user_id: Option<String>,
    pub carrier_timeout_secs: Option<u64>,
    /// Extra attempts after the first failed carrier call.
    pub carrier_retry_count: Option<u32>,
    pub carrier_initial_backoff_ms: Option<u64>,
    pub carrier_max_backoff_ms: Option<u64>,
    /// Comma-separated `STATION=channel` entries, e.g. `EOL1=asn,EOL2=waybill`.
    pub station_channels: Option<String>,
}

impl ServerSettings {
    /// Parse the bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| ConfigError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    /// Configured database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Retry and switch settings for the carrier gateway.
    pub fn carrier_gateway_config(&self) -> CarrierGatewayConfig {
        let defaults = CarrierGatewayConfig::default();
        CarrierGatewayConfig {
            enabled: self.carrier_enabled,
            environment: self
                .carrier_environment
                .clone()
                .unwrap_or_else(|| DEFAULT_CARRIER_ENVIRONMENT.to_owned()),
            retry_count: self.carrier_retry_count.unwrap_or(defaults.retry_count),
            initial_backoff: self
                .carrier_initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: self
                .carrier_max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
        }
    }

    /// HTTP transport settings, `None` while the carrier is disabled.
    pub fn carrier_http_settings(&self) -> Result<Option<CarrierHttpSettings>, ConfigError> {
        if !self.carrier_enabled {
            return Ok(None);
        }
        let raw_url = required(&self.carrier_url, "carrier_url")?;
        let endpoint = reqwest::Url::parse(raw_url).map_err(|error| ConfigError::CarrierUrl {
            value: raw_url.to_owned(),
            message: error.to_string(),
        })?;
        let credentials = CarrierCredentials {
            username: required(&self.carrier_username, "carrier_username")?.to_owned(),
            password: required(&self.carrier_password, "carrier_password")?.to_owned(),
            supplier_code: required(&self.carrier_supplier_code, "carrier_supplier_code")?
                .to_owned(),
            user_id: self
                .carrier_user_id
                .clone()
                .unwrap_or_else(|| DEFAULT_CARRIER_USER_ID.to_owned()),
        };
        Ok(Some(CarrierHttpSettings {
            endpoint,
            credentials,
            timeout: Duration::from_secs(
                self.carrier_timeout_secs
                    .unwrap_or(DEFAULT_CARRIER_TIMEOUT_SECS),
            ),
        }))
    }

    /// Parse the per-station channel table; unlisted stations use `both`.
    pub fn station_channels(&self) -> Result<StationChannels, ConfigError> {
        let Some(raw) = self.station_channels.as_deref() else {
            return Ok(StationChannels::default());
        };
        let entries = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty());
        Ok(StationChannels::parse_entries(entries)?)
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingCarrierSetting(name))
}

/// Resolved configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) carrier: CarrierGatewayConfig,
    pub(crate) carrier_http: Option<CarrierHttpSettings>,
    pub(crate) station_channels: StationChannels,
}

impl ServerConfig {
    /// Construct a configuration with the carrier disabled and no database.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            carrier: CarrierGatewayConfig {
                enabled: false,
                ..CarrierGatewayConfig::default()
            },
            carrier_http: None,
            station_channels: StationChannels::default(),
        }
    }

    /// Resolve every setting except the database pool.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self, ConfigError> {
        Ok(Self::new(settings.bind_addr()?)
            .with_carrier(
                settings.carrier_gateway_config(),
                settings.carrier_http_settings()?,
            )
            .with_station_channels(settings.station_channels()?))
    }

    /// Attach a database connection pool; the Diesel store is used when set.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Replace the carrier gateway settings.
    #[must_use]
    pub fn with_carrier(
        mut self,
        carrier: CarrierGatewayConfig,
        http: Option<CarrierHttpSettings>,
    ) -> Self {
        self.carrier = carrier;
        self.carrier_http = http;
        self
    }

    #[must_use]
    pub fn with_station_channels(mut self, channels: StationChannels) -> Self {
        self.station_channels = channels;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
