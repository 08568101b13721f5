//! Server certificate decoding.
//!
//! The lower network stack hands over the server's certificate as PEM or DER.
//! Only the pieces the approval workflow needs are kept: the DER bytes, the
//! subject and issuer DN strings and a SHA-256 fingerprint.

use sha2::{Digest, Sha256};
use thiserror::Error;
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::{FromDer, X509Certificate, X509Name};

use crate::core::subject::{CertificateSubjectInfo, SubjectParseError};

/// Errors produced while decoding a certificate.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("invalid PEM block: {0}")]
    Pem(String),
    #[error("invalid DER certificate: {0}")]
    Der(String),
    #[error("empty certificate data")]
    Empty,
}

/// A decoded server certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerCertificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    fingerprint: String,
}

impl ServerCertificate {
    /// Decode a DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::Der`] if the bytes are not an X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        if der.is_empty() {
            return Err(CertificateError::Empty);
        }
        let (_, cert) =
            X509Certificate::from_der(der).map_err(|e| CertificateError::Der(e.to_string()))?;
        Ok(Self {
            der: der.to_vec(),
            subject: render_dn(cert.subject()),
            issuer: render_dn(cert.issuer()),
            fingerprint: fingerprint_sha256(der),
        })
    }

    /// Decode a certificate from PEM, or from DER if the data is not PEM.
    ///
    /// # Errors
    ///
    /// Returns a [`CertificateError`] when neither encoding yields a certificate.
    pub fn from_pem_or_der(data: &[u8]) -> Result<Self, CertificateError> {
        if data.is_empty() {
            return Err(CertificateError::Empty);
        }
        if data.trim_ascii_start().starts_with(b"-----BEGIN") {
            let (_, pem) = parse_x509_pem(data).map_err(|e| CertificateError::Pem(e.to_string()))?;
            return Self::from_der(&pem.contents);
        }
        Self::from_der(data)
    }

    /// Build a certificate from already-extracted parts.
    ///
    /// Used when the caller has its own parser and only passes DN strings along.
    #[must_use]
    pub fn from_parts(der: Vec<u8>, subject: impl Into<String>, issuer: impl Into<String>) -> Self {
        let fingerprint = fingerprint_sha256(&der);
        Self {
            der,
            subject: subject.into(),
            issuer: issuer.into(),
            fingerprint,
        }
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject DN, with separator characters escaped inside values.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer DN, escaped like [`Self::subject`].
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Lowercase hex SHA-256 fingerprint of the DER bytes.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Extract the structured subject fields.
    ///
    /// # Errors
    ///
    /// Propagates [`SubjectParseError`] for a malformed subject.
    pub fn parse_subject(&self) -> Result<CertificateSubjectInfo, SubjectParseError> {
        CertificateSubjectInfo::parse(&self.subject)
    }

    /// Extract the structured issuer fields.
    ///
    /// # Errors
    ///
    /// Propagates [`SubjectParseError`] for a malformed issuer.
    pub fn parse_issuer(&self) -> Result<CertificateSubjectInfo, SubjectParseError> {
        CertificateSubjectInfo::parse(&self.issuer)
    }
}

/// Render a name as `KEY=VALUE` components joined by `, `.
///
/// Unlike the parser's `Display`, separators inside values are escaped so the
/// string splits back into the same attributes.
fn render_dn(name: &X509Name<'_>) -> String {
    name.iter()
        .map(|rdn| {
            rdn.iter()
                .map(|attr| {
                    let key = oid2abbrev(attr.attr_type(), oid_registry())
                        .map_or_else(|_| attr.attr_type().to_id_string(), str::to_string);
                    let value = attr
                        .as_str()
                        .map_or_else(|_| format!("#{}", hex::encode(attr.as_slice())), escape_value);
                    format!("{key}={value}")
                })
                .collect::<Vec<_>>()
                .join(" + ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, ',' | '+' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Compute a SHA-256 fingerprint of a DER-encoded certificate as lowercase hex.
#[must_use]
pub fn fingerprint_sha256(der: &[u8]) -> String {
    hex::encode(Sha256::digest(der))
}
