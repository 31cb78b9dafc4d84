// SPDX-License-Identifier: MIT OR Apache-2.0
//! Encryption and signing keys for administrative metadata.

use josekit::jwk::Jwk;

use crate::AdminError;

/// Key material for sealing and unsealing administrative metadata.
///
/// The private encryption key is always required (reading needs it; writing
/// derives the public half). One of the public or private signing keys is
/// needed depending on whether metadata is verified or written; the public
/// key is derived from the private key when only the latter is supplied.
#[derive(Clone, Debug)]
pub struct AdministrationKeys {
    pub encryption_private: Jwk,
    pub signing_public: Jwk,
    pub signing_private: Option<Jwk>,
}

impl AdministrationKeys {
    pub fn new(
        encryption_private: Jwk,
        signing_public: Option<Jwk>,
        signing_private: Option<Jwk>,
    ) -> Result<Self, AdminError> {
        let signing_public = match (signing_public, &signing_private) {
            (Some(key), _) => key,
            (None, Some(private)) => private.to_public_key()?,
            (None, None) => return Err(AdminError::MissingKeys),
        };
        Ok(Self {
            encryption_private,
            signing_public,
            signing_private,
        })
    }

    /// Parse keys from JWK JSON strings.
    pub fn from_json(
        encryption_private: &str,
        signing_public: Option<&str>,
        signing_private: Option<&str>,
    ) -> Result<Self, AdminError> {
        let parse = |raw: &str| Jwk::from_bytes(raw.as_bytes());
        Self::new(
            parse(encryption_private)?,
            signing_public.map(parse).transpose()?,
            signing_private.map(parse).transpose()?,
        )
    }
}
