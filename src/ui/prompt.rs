//! Approval prompts and their responses.
//!
//! Both display surfaces are built from the same flow data and are modelled
//! as one tagged union, [`ApprovalRequest`]. Whatever the user does on either
//! surface is routed back as a single [`ApprovalResponse`], bound to the SSID
//! the prompt was created for so stale answers can be told apart.

use crate::constants;
use crate::state::{PendingCertificate, PendingConnection, TrustPolicy};

/// Opaque handle of a presented surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UiHandle(pub u64);

/// Button reported by a dialog, exactly once per presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogChoice {
    Positive,
    Negative,
    Neutral,
    Cancelled,
}

/// Action reported by a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationAction {
    /// The notification body was tapped.
    Tap,
    /// The accept button (legacy notification only).
    Accept,
    /// The reject button (legacy notification only).
    Reject,
}

/// What the state machine should do with a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseAction {
    Accept,
    Reject,
    /// Re-prompt with the dialog.
    Review,
}

/// Which surface a response came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseSource {
    Dialog,
    Notification,
}

/// A routed response from either surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovalResponse {
    /// SSID the prompt was built for. `None` means it is unknown.
    pub ssid: Option<String>,
    pub action: ResponseAction,
    pub source: ResponseSource,
}

impl ApprovalResponse {
    #[must_use]
    pub fn from_dialog(ssid: impl Into<String>, action: ResponseAction) -> Self {
        Self {
            ssid: Some(ssid.into()),
            action,
            source: ResponseSource::Dialog,
        }
    }

    #[must_use]
    pub fn from_notification(ssid: impl Into<String>, action: ResponseAction) -> Self {
        Self {
            ssid: Some(ssid.into()),
            action,
            source: ResponseSource::Notification,
        }
    }
}

/// Modal dialog for user-initiated connections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogRequest {
    pub ssid: String,
    pub policy: TrustPolicy,
    pub title: String,
    /// Body lines, rendered in order.
    pub message: Vec<String>,
    /// Optional link appended to the body.
    pub help_link: Option<String>,
    pub positive_label: String,
    pub negative_label: String,
}

impl DialogRequest {
    /// Route a button press. Neutral and cancel count as reject.
    #[must_use]
    pub fn respond(&self, choice: DialogChoice) -> ApprovalResponse {
        let action = match choice {
            DialogChoice::Positive => ResponseAction::Accept,
            DialogChoice::Negative | DialogChoice::Neutral | DialogChoice::Cancelled => {
                ResponseAction::Reject
            }
        };
        ApprovalResponse::from_dialog(self.ssid.clone(), action)
    }
}

/// What tapping the notification body does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationTap {
    /// Open the approval dialog.
    Review,
    /// Open a help page; the flow is unaffected.
    OpenLink(String),
}

/// A button on the notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationButton {
    pub label: String,
    pub action: NotificationAction,
}

/// Persistent notification for background connections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationRequest {
    pub ssid: String,
    pub policy: TrustPolicy,
    pub title: String,
    pub message: String,
    pub tap: NotificationTap,
    pub buttons: Vec<NotificationButton>,
}

impl NotificationRequest {
    /// Route a notification action.
    ///
    /// Returns `None` when the action does not concern the state machine
    /// (tapping a legacy notification only opens the help page) or is not
    /// offered by this notification.
    #[must_use]
    pub fn respond(&self, action: NotificationAction) -> Option<ApprovalResponse> {
        let routed = match action {
            NotificationAction::Tap => match self.tap {
                NotificationTap::Review => ResponseAction::Review,
                NotificationTap::OpenLink(_) => return None,
            },
            NotificationAction::Accept | NotificationAction::Reject => {
                if !self.buttons.iter().any(|b| b.action == action) {
                    return None;
                }
                if action == NotificationAction::Accept {
                    ResponseAction::Accept
                } else {
                    ResponseAction::Reject
                }
            }
        };
        Some(ApprovalResponse::from_notification(self.ssid.clone(), routed))
    }
}

/// One of the two approval surfaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApprovalRequest {
    Dialog(DialogRequest),
    Notification(NotificationRequest),
}

impl ApprovalRequest {
    #[must_use]
    pub fn ssid(&self) -> &str {
        match self {
            Self::Dialog(d) => &d.ssid,
            Self::Notification(n) => &n.ssid,
        }
    }

    #[must_use]
    pub const fn is_dialog(&self) -> bool {
        matches!(self, Self::Dialog(_))
    }
}

/// A surface able to present approval prompts.
///
/// Presentation is fire-and-forget: the answer arrives later through the
/// controller as an [`ApprovalResponse`].
pub trait ApprovalSurface {
    /// Present `request` and return a handle for dismissing it.
    fn show(&mut self, request: ApprovalRequest) -> UiHandle;

    /// Remove a presented surface. Unknown handles are ignored.
    fn dismiss(&mut self, handle: UiHandle);
}

/// Build the approval dialog for a flow.
///
/// Returns `None` for a TOFU flow without a certificate, which cannot be
/// reviewed.
#[must_use]
pub fn build_dialog(
    connection: &PendingConnection,
    certificate: Option<&PendingCertificate>,
    help_link: &str,
) -> Option<DialogRequest> {
    let ssid = connection.identity.ssid.clone();
    let request = match connection.policy {
        TrustPolicy::Tofu => {
            let cert = certificate?;
            let mut message = vec![
                constants::MSG_TOFU_DIALOG_HINT.to_string(),
                String::new(),
                format!("{}{}", constants::LABEL_SERVER_NAME, cert.subject.common_name),
                format!("{}{}", constants::LABEL_ISSUER_NAME, cert.issuer.common_name),
            ];
            if !cert.subject.organization.is_empty() {
                message.push(format!(
                    "{}{}",
                    constants::LABEL_ORGANIZATION,
                    cert.subject.organization
                ));
            }
            if !cert.subject.email.is_empty() {
                message.push(format!("{}{}", constants::LABEL_CONTACT, cert.subject.email));
            }
            let fingerprint = cert.certificate.fingerprint();
            let preview = &fingerprint[..constants::FINGERPRINT_PREVIEW_LEN.min(fingerprint.len())];
            message.push(format!("{}{preview}", constants::LABEL_FINGERPRINT));

            DialogRequest {
                ssid,
                policy: TrustPolicy::Tofu,
                title: constants::TITLE_TOFU_DIALOG.to_string(),
                message,
                help_link: None,
                positive_label: constants::BTN_TOFU_CONTINUE.to_string(),
                negative_label: constants::BTN_TOFU_ABORT.to_string(),
            }
        }
        TrustPolicy::Legacy => DialogRequest {
            message: vec![
                constants::fill(constants::MSG_LEGACY_DIALOG_HINT, &ssid),
                constants::MSG_LEGACY_DIALOG_LINK.to_string(),
            ],
            ssid,
            policy: TrustPolicy::Legacy,
            title: constants::TITLE_LEGACY_DIALOG.to_string(),
            help_link: Some(help_link.to_string()),
            positive_label: constants::BTN_LEGACY_CONTINUE.to_string(),
            negative_label: constants::BTN_LEGACY_ABORT.to_string(),
        },
    };
    Some(request)
}

/// Build the persistent notification for a flow.
#[must_use]
pub fn build_notification(connection: &PendingConnection, help_link: &str) -> NotificationRequest {
    let ssid = connection.identity.ssid.clone();
    match connection.policy {
        TrustPolicy::Tofu => NotificationRequest {
            title: constants::TITLE_TOFU_NOTIFICATION.to_string(),
            message: constants::fill(constants::MSG_TOFU_NOTIFICATION, &ssid),
            ssid,
            policy: TrustPolicy::Tofu,
            tap: NotificationTap::Review,
            buttons: vec![NotificationButton {
                label: constants::BTN_TOFU_REVIEW.to_string(),
                action: NotificationAction::Tap,
            }],
        },
        // Reject first, matching the order the buttons are laid out.
        TrustPolicy::Legacy => NotificationRequest {
            title: constants::TITLE_LEGACY_NOTIFICATION.to_string(),
            message: constants::fill(constants::MSG_LEGACY_NOTIFICATION, &ssid),
            ssid,
            policy: TrustPolicy::Legacy,
            tap: NotificationTap::OpenLink(help_link.to_string()),
            buttons: vec![
                NotificationButton {
                    label: constants::BTN_LEGACY_ABORT.to_string(),
                    action: NotificationAction::Reject,
                },
                NotificationButton {
                    label: constants::BTN_LEGACY_CONTINUE.to_string(),
                    action: NotificationAction::Accept,
                },
            ],
        },
    }
}
