//! Online/offline tracking.
//!
//! Sharing needs the network; writing never does. This module keeps the two
//! flags that decide whether sharing is allowed (`is_online`, detected by a
//! [`ConnectivityProbe`], and `is_working_offline`, chosen by the user and
//! persisted) and the probe abstraction used to refresh the first one.

use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::Result;
use crate::storage::Storage;

/// Key under which the working-offline flag is persisted.
pub const WORKING_OFFLINE_KEY: &str = "network.working_offline";

/// Connection mode derived from the two network flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Connected and not working offline.
    Online,
    /// No connectivity detected.
    Offline,
    /// Connected, but the user chose to work offline.
    WorkingOffline,
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
            Self::WorkingOffline => write!(f, "working offline"),
        }
    }
}

/// Current network state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    /// Whether connectivity is available. Assumed until a probe says otherwise.
    pub is_online: bool,
    /// Whether the user chose to work offline.
    pub is_working_offline: bool,
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self {
            is_online: true,
            is_working_offline: false,
        }
    }
}

impl NetworkStatus {
    /// Load the persisted working-offline flag; `is_online` starts as `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored flag cannot be read.
    pub fn load(storage: &Storage) -> Result<Self> {
        let is_working_offline = storage.kv_get::<bool>(WORKING_OFFLINE_KEY)?.unwrap_or(false);
        Ok(Self {
            is_online: true,
            is_working_offline,
        })
    }

    /// Record the result of a connectivity check.
    pub fn set_online(&mut self, is_online: bool) {
        if self.is_online != is_online {
            debug!("Connectivity changed: online={}", is_online);
        }
        self.is_online = is_online;
    }

    /// Flip the working-offline flag and persist it.
    ///
    /// Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag cannot be persisted.
    pub fn toggle_working_offline(&mut self, storage: &Storage) -> Result<bool> {
        self.is_working_offline = !self.is_working_offline;
        storage.kv_set(WORKING_OFFLINE_KEY, &self.is_working_offline)?;
        Ok(self.is_working_offline)
    }

    /// Whether sharing operations are allowed.
    #[must_use]
    pub fn sharing_available(&self) -> bool {
        self.is_online && !self.is_working_offline
    }

    /// The combined connection mode.
    #[must_use]
    pub fn mode(&self) -> ConnectionMode {
        if !self.is_online {
            ConnectionMode::Offline
        } else if self.is_working_offline {
            ConnectionMode::WorkingOffline
        } else {
            ConnectionMode::Online
        }
    }

    /// Run `probe` and record its answer.
    pub async fn refresh(&mut self, probe: &dyn ConnectivityProbe) -> bool {
        let online = probe.check().await;
        self.set_online(online);
        online
    }
}

/// A way of finding out whether the network is reachable.
#[async_trait::async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Name of this probe (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Return `true` if the network looks reachable.
    async fn check(&self) -> bool;
}

/// Probe that opens a TCP connection to a fixed address.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    /// Create a probe for `address` (`host:port`).
    #[must_use]
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    /// Build a probe from the network configuration.
    #[must_use]
    pub fn from_config(config: &crate::Config) -> Self {
        Self::new(config.network.probe_address.clone(), config.probe_timeout())
    }

    /// The address this probe connects to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait::async_trait]
impl ConnectivityProbe for TcpProbe {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn check(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Probe to {} failed: {}", self.address, e);
                false
            }
            Err(_) => {
                debug!("Probe to {} timed out after {:?}", self.address, self.timeout);
                false
            }
        }
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

#[async_trait::async_trait]
impl ConnectivityProbe for StaticProbe {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn check(&self) -> bool {
        self.0
    }
}
