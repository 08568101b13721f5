//! Trust policy evaluation.
//!
//! Decides, for one connection attempt, whether the user must approve an
//! enterprise network that has no CA certificate and which policy applies.
//! The result is never cached; callers evaluate again on every attempt.

use crate::state::{NetworkProfile, TrustPolicy};

/// Why no approval flow is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotRequiredReason {
    /// Not an 802.1X network.
    NotEnterprise,
    /// The EAP method does not authenticate the server by certificate.
    NoServerCertificate,
    /// A CA certificate is already configured.
    CaCertificatePresent,
    /// TOFU-capable device, but TOFU is off for this profile.
    TofuDisabled,
    /// Pre-TOFU device and the user approved this network before.
    PreviouslyApproved,
}

impl std::fmt::Display for NotRequiredReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotEnterprise => "not an enterprise network",
            Self::NoServerCertificate => "EAP method does not use a server certificate",
            Self::CaCertificatePresent => "a CA certificate is configured",
            Self::TofuDisabled => "Trust On First Use is disabled for this network",
            Self::PreviouslyApproved => "the user approved this network before",
        };
        write!(f, "{text}")
    }
}

/// Result of [`needs_approval`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalRequirement {
    NotRequired(NotRequiredReason),
    Required(TrustPolicy),
}

impl ApprovalRequirement {
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(self, Self::Required(_))
    }

    /// Policy to run the flow under, if one is needed.
    #[must_use]
    pub const fn policy(self) -> Option<TrustPolicy> {
        match self {
            Self::Required(policy) => Some(policy),
            Self::NotRequired(_) => None,
        }
    }
}

/// Evaluate whether a connection to `profile` needs user approval.
#[must_use]
pub fn needs_approval(profile: &NetworkProfile, device_supports_tofu: bool) -> ApprovalRequirement {
    let Some(enterprise) = profile.enterprise.as_ref() else {
        return ApprovalRequirement::NotRequired(NotRequiredReason::NotEnterprise);
    };
    if !enterprise.eap_method.uses_server_cert() {
        return ApprovalRequirement::NotRequired(NotRequiredReason::NoServerCertificate);
    }
    if enterprise.has_ca_certificate() {
        return ApprovalRequirement::NotRequired(NotRequiredReason::CaCertificatePresent);
    }

    // Strict mode: a TOFU-capable device defers to the administrator's CA.
    if device_supports_tofu && !enterprise.tofu_enabled {
        return ApprovalRequirement::NotRequired(NotRequiredReason::TofuDisabled);
    }
    if !device_supports_tofu && enterprise.user_approved_no_ca_cert {
        return ApprovalRequirement::NotRequired(NotRequiredReason::PreviouslyApproved);
    }

    if device_supports_tofu {
        ApprovalRequirement::Required(TrustPolicy::Tofu)
    } else {
        ApprovalRequirement::Required(TrustPolicy::Legacy)
    }
}
