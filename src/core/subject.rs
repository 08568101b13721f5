//! Distinguished name field extraction.
//!
//! Turns a subject or issuer DN string such as
//! `CN=radius.corp.example, O=Example Corp, Email=it@corp.example`
//! into the handful of fields shown to the user when a server certificate
//! needs review.

use thiserror::Error;

/// Errors produced while parsing a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectParseError {
    /// A component was not of the form `KEY=VALUE`.
    #[error("malformed distinguished name component: {0:?}")]
    MalformedComponent(String),
    /// No usable common name was present.
    #[error("distinguished name has no common name")]
    MissingCommonName,
}

/// Structured view of a certificate subject or issuer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateSubjectInfo {
    /// Common name (CN).
    pub common_name: String,
    /// Organization (O).
    pub organization: String,
    /// Organizational unit (OU).
    pub organizational_unit: String,
    /// Country code (C).
    pub country: String,
    /// State or province (ST).
    pub state: String,
    /// Locality (L).
    pub locality: String,
    /// Contact email (E / emailAddress).
    pub email: String,
    /// The whole DN with escapes removed.
    pub raw: String,
}

impl CertificateSubjectInfo {
    /// Parse a distinguished name string.
    ///
    /// Components are separated by unescaped commas. Unknown attribute types
    /// are ignored; a component without `=` or a DN without a common name is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`SubjectParseError`] when the DN is malformed or lacks a CN.
    pub fn parse(dn: &str) -> Result<Self, SubjectParseError> {
        let mut info = Self {
            raw: unescape(dn),
            ..Self::default()
        };

        for component in split_unescaped(dn) {
            let component = component.trim();
            if component.is_empty() {
                continue;
            }
            let Some((key, value)) = component.split_once('=') else {
                return Err(SubjectParseError::MalformedComponent(component.to_string()));
            };
            let value = unescape(value.trim());
            match key.trim().to_ascii_uppercase().as_str() {
                "CN" => info.common_name = value,
                "O" => info.organization = value,
                "OU" => info.organizational_unit = value,
                "C" => info.country = value,
                "ST" => info.state = value,
                "L" => info.locality = value,
                "E" | "EMAIL" | "EMAILADDRESS" => info.email = value,
                _ => {}
            }
        }

        if info.common_name.is_empty() {
            return Err(SubjectParseError::MissingCommonName);
        }
        Ok(info)
    }
}

/// Split on commas that are not preceded by a backslash.
fn split_unescaped(dn: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, ch) in dn.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            ',' if !escaped => {
                parts.push(&dn[start..idx]);
                start = idx + 1;
            }
            _ => escaped = false,
        }
    }
    parts.push(&dn[start..]);
    parts
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}
