//! Credential store: persisted network profiles and their trust flags.
//!
//! The approval state machine only talks to the [`CredentialStore`] trait.
//! [`JsonCredentialStore`] keeps every profile in a single JSON file and
//! rewrites it atomically after every change.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants;
use crate::core::certificate::ServerCertificate;
use crate::state::{InstalledCaCert, NetworkProfile};

/// Errors reported by a credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown network id {0}")]
    UnknownNetwork(u32),
    #[error("network {0} is not an enterprise network")]
    NotEnterprise(u32),
    #[error("failed to access profile store: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt profile store: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence of per-network trust state, keyed by network id.
pub trait CredentialStore {
    /// Whether the persisted profile already carries trust material.
    fn has_valid_trust(&self, profile: &NetworkProfile) -> bool;

    /// Set the legacy "approved without CA" flag.
    ///
    /// # Errors
    ///
    /// Fails if the network is unknown or the store cannot be written.
    fn mark_approved_without_ca(&mut self, network_id: u32, approved: bool)
        -> Result<(), StoreError>;

    /// Pin `certificate` as the network's CA certificate.
    ///
    /// # Errors
    ///
    /// Fails if the network is unknown, not enterprise, or the store cannot be written.
    fn install_ca_certificate(
        &mut self,
        network_id: u32,
        certificate: &ServerCertificate,
    ) -> Result<(), StoreError>;

    /// Enable or disable Trust On First Use for the network.
    ///
    /// # Errors
    ///
    /// Fails if the network is unknown or the store cannot be written.
    fn set_tofu_enabled(&mut self, network_id: u32, enabled: bool) -> Result<(), StoreError>;

    /// Allow or forbid automatic reconnection.
    ///
    /// # Errors
    ///
    /// Fails if the network is unknown or the store cannot be written.
    fn set_autoconnect_allowed(&mut self, network_id: u32, allowed: bool)
        -> Result<(), StoreError>;
}

/// JSON-file backed store of [`NetworkProfile`]s.
#[derive(Debug)]
pub struct JsonCredentialStore {
    path: PathBuf,
    profiles: BTreeMap<u32, NetworkProfile>,
}

impl JsonCredentialStore {
    /// Open the store file inside `dir`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(constants::PROFILES_FILE_NAME);
        let profiles = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let list: Vec<NetworkProfile> = serde_json::from_str(&content)?;
            list.into_iter().map(|p| (p.network_id, p)).collect()
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), count = profiles.len(), "Loaded profile store");
        Ok(Self { path, profiles })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a profile by network id.
    #[must_use]
    pub fn profile(&self, network_id: u32) -> Option<&NetworkProfile> {
        self.profiles.get(&network_id)
    }

    /// Look up a profile by SSID.
    #[must_use]
    pub fn find_by_ssid(&self, ssid: &str) -> Option<&NetworkProfile> {
        self.profiles.values().find(|p| p.ssid == ssid)
    }

    /// All profiles ordered by network id.
    pub fn profiles(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.profiles.values()
    }

    /// Insert or replace a profile and persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the store cannot be written.
    pub fn upsert(&mut self, profile: NetworkProfile) -> Result<(), StoreError> {
        self.commit(profile)
    }

    /// Drop every trust decision recorded for a network and persist.
    ///
    /// # Errors
    ///
    /// Fails if the network is unknown, not enterprise, or cannot be written.
    pub fn reset_trust(&mut self, network_id: u32) -> Result<(), StoreError> {
        self.update_enterprise(network_id, |ent| {
            ent.ca_certificate = None;
            ent.user_approved_no_ca_cert = false;
        })
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let list: Vec<&NetworkProfile> = self.profiles.values().collect();
        let json = serde_json::to_string_pretty(&list)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update_profile(
        &mut self,
        network_id: u32,
        apply: impl FnOnce(&mut NetworkProfile) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut profile = self
            .profiles
            .get(&network_id)
            .cloned()
            .ok_or(StoreError::UnknownNetwork(network_id))?;
        apply(&mut profile)?;
        self.commit(profile)
    }

    /// Replace a profile and persist, keeping the previous one if the write fails.
    fn commit(&mut self, profile: NetworkProfile) -> Result<(), StoreError> {
        let network_id = profile.network_id;
        let previous = self.profiles.insert(network_id, profile);
        if let Err(e) = self.save() {
            match previous {
                Some(previous) => self.profiles.insert(network_id, previous),
                None => self.profiles.remove(&network_id),
            };
            tracing::warn!(network_id, error = %e, "Profile store write failed, change rolled back");
            return Err(e);
        }
        Ok(())
    }

    fn update_enterprise(
        &mut self,
        network_id: u32,
        apply: impl FnOnce(&mut crate::state::EnterpriseConfig),
    ) -> Result<(), StoreError> {
        self.update_profile(network_id, |profile| {
            let ent = profile
                .enterprise
                .as_mut()
                .ok_or(StoreError::NotEnterprise(network_id))?;
            apply(ent);
            Ok(())
        })
    }
}

impl CredentialStore for JsonCredentialStore {
    fn has_valid_trust(&self, profile: &NetworkProfile) -> bool {
        self.profiles
            .get(&profile.network_id)
            .and_then(|p| p.enterprise.as_ref())
            .is_some_and(crate::state::EnterpriseConfig::has_ca_certificate)
    }

    fn mark_approved_without_ca(
        &mut self,
        network_id: u32,
        approved: bool,
    ) -> Result<(), StoreError> {
        self.update_enterprise(network_id, |ent| ent.user_approved_no_ca_cert = approved)
    }

    fn install_ca_certificate(
        &mut self,
        network_id: u32,
        certificate: &ServerCertificate,
    ) -> Result<(), StoreError> {
        let common_name = certificate
            .parse_subject()
            .map(|info| info.common_name)
            .unwrap_or_default();
        let installed = InstalledCaCert {
            fingerprint: certificate.fingerprint().to_string(),
            common_name,
            der_hex: hex::encode(certificate.der()),
        };
        self.update_enterprise(network_id, move |ent| ent.ca_certificate = Some(installed))
    }

    fn set_tofu_enabled(&mut self, network_id: u32, enabled: bool) -> Result<(), StoreError> {
        self.update_enterprise(network_id, |ent| ent.tofu_enabled = enabled)
    }

    fn set_autoconnect_allowed(
        &mut self,
        network_id: u32,
        allowed: bool,
    ) -> Result<(), StoreError> {
        self.update_profile(network_id, |profile| {
            profile.auto_connect = allowed;
            Ok(())
        })
    }
}
