//! Network profile and enterprise configuration types.

use serde::{Deserialize, Serialize};

/// EAP methods understood by the profile store.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EapMethod {
    /// Protected EAP.
    Peap,
    /// EAP-TLS.
    Tls,
    /// Tunneled TLS.
    Ttls,
    /// EAP-pwd.
    Pwd,
    /// EAP-SIM.
    Sim,
    /// EAP-AKA.
    Aka,
    /// EAP-AKA'.
    AkaPrime,
    /// Unauthenticated TLS (server certificate only).
    UnauthTls,
    /// WAPI certificate mode.
    WapiCert,
}

impl EapMethod {
    /// Whether the method authenticates the server with a certificate.
    #[must_use]
    pub const fn uses_server_cert(self) -> bool {
        matches!(self, Self::Peap | Self::Tls | Self::Ttls | Self::UnauthTls)
    }
}

impl std::fmt::Display for EapMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Peap => "PEAP",
            Self::Tls => "TLS",
            Self::Ttls => "TTLS",
            Self::Pwd => "PWD",
            Self::Sim => "SIM",
            Self::Aka => "AKA",
            Self::AkaPrime => "AKA'",
            Self::UnauthTls => "UNAUTH_TLS",
            Self::WapiCert => "WAPI_CERT",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for EapMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "PEAP" => Ok(Self::Peap),
            "TLS" => Ok(Self::Tls),
            "TTLS" => Ok(Self::Ttls),
            "PWD" => Ok(Self::Pwd),
            "SIM" => Ok(Self::Sim),
            "AKA" => Ok(Self::Aka),
            "AKA'" | "AKA_PRIME" => Ok(Self::AkaPrime),
            "UNAUTH_TLS" => Ok(Self::UnauthTls),
            "WAPI_CERT" => Ok(Self::WapiCert),
            other => Err(format!("Unsupported EAP method: {other}")),
        }
    }
}

/// A CA certificate pinned to a network after the user trusted it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledCaCert {
    /// Lowercase hex SHA-256 fingerprint of the DER bytes.
    pub fingerprint: String,
    /// Subject common name, kept for display.
    pub common_name: String,
    /// Hex-encoded DER bytes.
    pub der_hex: String,
}

/// Enterprise (802.1X) part of a network profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseConfig {
    pub eap_method: EapMethod,
    /// Administrator-provisioned or TOFU-pinned CA certificate.
    #[serde(default)]
    pub ca_certificate: Option<InstalledCaCert>,
    /// Trust On First Use is allowed for this profile.
    #[serde(default)]
    pub tofu_enabled: bool,
    /// Legacy flag: the user accepted this network without a CA once.
    #[serde(default)]
    pub user_approved_no_ca_cert: bool,
}

impl EnterpriseConfig {
    /// Create a config without any trust material.
    #[must_use]
    pub const fn new(eap_method: EapMethod) -> Self {
        Self {
            eap_method,
            ca_certificate: None,
            tofu_enabled: false,
            user_approved_no_ca_cert: false,
        }
    }

    #[must_use]
    pub const fn has_ca_certificate(&self) -> bool {
        self.ca_certificate.is_some()
    }
}

/// Saved Wi-Fi network profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// Persisted network id.
    pub network_id: u32,
    /// Network name.
    pub ssid: String,
    /// Whether the device may join this network on its own.
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,
    /// Present for enterprise networks only.
    #[serde(default)]
    pub enterprise: Option<EnterpriseConfig>,
}

const fn default_auto_connect() -> bool {
    true
}

impl NetworkProfile {
    /// Create an open (non-enterprise) profile.
    #[must_use]
    pub fn new(network_id: u32, ssid: impl Into<String>) -> Self {
        Self {
            network_id,
            ssid: ssid.into(),
            auto_connect: true,
            enterprise: None,
        }
    }

    /// Attach an enterprise configuration.
    #[must_use]
    pub fn with_enterprise(mut self, config: EnterpriseConfig) -> Self {
        self.enterprise = Some(config);
        self
    }

    #[must_use]
    pub const fn is_enterprise(&self) -> bool {
        self.enterprise.is_some()
    }
}
