//! Network identification for Soroban RPC endpoints.

use std::borrow::Cow;
use std::fmt;

use crate::error::Error;

/// Passphrase of the public test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
/// Passphrase of the future-protocol preview network.
pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";
/// Passphrase of a standalone local network.
pub const LOCALNET_PASSPHRASE: &str = "Standalone Network ; February 2017";

/// The family a network belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum NetworkKind {
    /// Public test network.
    #[default]
    Testnet,
    /// Preview network running the next protocol.
    Futurenet,
    /// Standalone network on the local machine.
    Localnet,
    /// Any other endpoint.
    Custom,
}

impl NetworkKind {
    /// Returns true if this is testnet.
    pub fn is_testnet(&self) -> bool {
        matches!(self, NetworkKind::Testnet)
    }

    /// Returns true if this is futurenet.
    pub fn is_futurenet(&self) -> bool {
        matches!(self, NetworkKind::Futurenet)
    }

    /// Returns true if this is a local standalone network.
    pub fn is_local(&self) -> bool {
        matches!(self, NetworkKind::Localnet)
    }

    /// Returns the network identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Testnet => "testnet",
            NetworkKind::Futurenet => "futurenet",
            NetworkKind::Localnet => "localnet",
            NetworkKind::Custom => "custom",
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An RPC endpoint together with the passphrase transactions are bound to.
///
/// Values are immutable once built; sessions share them behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NetworkConfig {
    kind: NetworkKind,
    name: Cow<'static, str>,
    rpc_url: Cow<'static, str>,
    passphrase: Cow<'static, str>,
}

/// Public test network.
pub static TESTNET: NetworkConfig = NetworkConfig {
    kind: NetworkKind::Testnet,
    name: Cow::Borrowed("TESTNET"),
    rpc_url: Cow::Borrowed("https://soroban-testnet.stellar.org"),
    passphrase: Cow::Borrowed(TESTNET_PASSPHRASE),
};

/// Future-protocol preview network.
pub static FUTURENET: NetworkConfig = NetworkConfig {
    kind: NetworkKind::Futurenet,
    name: Cow::Borrowed("FUTURENET"),
    rpc_url: Cow::Borrowed("https://rpc-futurenet.stellar.org"),
    passphrase: Cow::Borrowed(FUTURENET_PASSPHRASE),
};

/// Standalone network served by a local quickstart container.
pub static LOCALNET: NetworkConfig = NetworkConfig {
    kind: NetworkKind::Localnet,
    name: Cow::Borrowed("LOCALNET"),
    rpc_url: Cow::Borrowed("http://localhost:8000/soroban/rpc"),
    passphrase: Cow::Borrowed(LOCALNET_PASSPHRASE),
};

static PRESETS: [&NetworkConfig; 3] = [&TESTNET, &FUTURENET, &LOCALNET];

impl NetworkConfig {
    /// A network outside the presets.
    pub fn custom(
        name: impl Into<String>,
        rpc_url: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            kind: NetworkKind::Custom,
            name: Cow::Owned(name.into()),
            rpc_url: Cow::Owned(rpc_url.into()),
            passphrase: Cow::Owned(passphrase.into()),
        }
    }

    /// All preset networks.
    pub fn presets() -> &'static [&'static NetworkConfig] {
        &PRESETS
    }

    /// Look up a preset by name, ignoring case.
    pub fn by_name(name: &str) -> Option<&'static NetworkConfig> {
        PRESETS
            .iter()
            .copied()
            .find(|network| network.name.eq_ignore_ascii_case(name))
    }

    /// Build a network from environment variables.
    ///
    /// - `SOROBAN_NETWORK`: a preset name, or an RPC URL
    /// - `SOROBAN_NETWORK_PASSPHRASE`: required when `SOROBAN_NETWORK` is a URL
    ///
    /// Falls back to [`TESTNET`] when `SOROBAN_NETWORK` is unset.
    pub fn from_env() -> Result<Self, Error> {
        let network = std::env::var("SOROBAN_NETWORK").ok();
        let passphrase = std::env::var("SOROBAN_NETWORK_PASSPHRASE").ok();
        Self::from_values(network.as_deref(), passphrase.as_deref())
    }

    fn from_values(network: Option<&str>, passphrase: Option<&str>) -> Result<Self, Error> {
        let Some(network) = network.map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(TESTNET.clone());
        };

        if network.starts_with("http://") || network.starts_with("https://") {
            let passphrase = passphrase.ok_or_else(|| {
                Error::Config(
                    "SOROBAN_NETWORK_PASSPHRASE is required when SOROBAN_NETWORK is a URL"
                        .to_string(),
                )
            })?;
            return Ok(Self::custom("CUSTOM", network, passphrase));
        }

        Self::by_name(network)
            .cloned()
            .ok_or_else(|| Error::Config(format!("Unknown network: {network}")))
    }

    /// Which family this network belongs to.
    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    /// Display name (e.g. `TESTNET`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// JSON-RPC endpoint URL.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Passphrase transactions on this network are bound to.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Display for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
