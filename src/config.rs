//! Transaction manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{gas::DEFAULT_GAS_LIMIT, poll::PollPolicy};

/// Default confirmation timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Default receipt poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default time allowed for connecting to the endpoint
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`TransactionManager`](crate::txm::TransactionManager).
///
/// Numeric fields left at zero fall back to their defaults when the manager is
/// built. `gas_price == 0` and `chain_id == None` are resolved from the node.
///
/// Durations are expressed in whole seconds when (de)serialized.
///
/// ```ignore
/// let config = ManagerConfig::new("http://127.0.0.1:8545")
///     .with_timeout(Duration::from_secs(30))
///     .with_replay_protection(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub rpc_url: String,
    /// Default gas price in wei (0: ask the node at construction)
    pub gas_price: u128,
    /// Default gas limit for calls and creations (0: 2 000 000)
    pub gas_limit: u64,
    /// Confirmation deadline, measured from the start of each wait
    #[serde(with = "secs")]
    pub timeout: Duration,
    #[serde(with = "secs")]
    pub poll_interval: Duration,
    /// Chain id used for EIP-155 signatures (None: ask the node)
    pub chain_id: Option<u64>,
    /// Sign with EIP-155 replay protection (default: true)
    pub replay_protection: bool,
    #[serde(with = "secs")]
    pub dial_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            gas_price: 0,
            gas_limit: DEFAULT_GAS_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            chain_id: None,
            replay_protection: true,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}

impl ManagerConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set default gas price in wei
    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Set default gas limit
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Set confirmation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set receipt poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Pin the chain id instead of querying it
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_replay_protection(mut self, enabled: bool) -> Self {
        self.replay_protection = enabled;
        self
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Replace zero values with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.gas_limit == 0 {
            self.gas_limit = DEFAULT_GAS_LIMIT;
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if self.poll_interval.is_zero() {
            self.poll_interval = DEFAULT_POLL_INTERVAL;
        }
        if self.dial_timeout.is_zero() {
            self.dial_timeout = DEFAULT_DIAL_TIMEOUT;
        }
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.poll_interval, self.timeout)
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
