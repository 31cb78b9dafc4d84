// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Sealed administrative metadata for Carta records.
//!
//! Administrative metadata is side-channel data (access permissions, issue
//! links) embedded in a record's supplemental information as a JWE-wrapped
//! JWT. The JWT gives integrity via an ES256 signature; the JWE wrapper gives
//! confidentiality via ECDH-ES+A128KW key management with A256GCM content
//! encryption. Keys arrive as JWKs.

mod keys;
mod kv;
mod model;
mod seal;

pub use keys::AdministrationKeys;
pub use kv::{get_kv, set_kv};
pub use model::{AccessLevel, Administration, Permission, bas_staff, open_access};
pub use seal::{AdministrationSealer, get_admin, set_admin};

/// Errors raised by administrative metadata handling.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Administrative metadata does not relate to the containing record.
    #[error("administrative metadata subject does not match record")]
    SubjectMismatch,

    /// Token subject does not match the administrative metadata id.
    #[error("administrative metadata integrity check failed")]
    Integrity,

    /// A private signing key is required for writing metadata.
    #[error("private signing key is required for writing metadata")]
    MissingSigningKey,

    /// A public or private signing key must be provided.
    #[error("public or private signing key must be provided")]
    MissingKeys,

    /// Token decode, verification or crypto failure.
    #[error("token processing failed: {0}")]
    Jose(#[from] josekit::JoseError),

    /// Metadata payload (de)serialisation failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Supplemental information is not a JSON key/value object.
    #[error("supplemental information is not a key/value object")]
    InvalidSupplementalInfo,
}
