// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sealing and unsealing administrative metadata.
//!
//! Metadata is signed as a JWT (ES256) then encrypted as a compact JWE
//! (ECDH-ES+A128KW key management, A256GCM content encryption). The signature
//! lets holders of the public signing key verify metadata without being able
//! to alter it; the encryption keeps the contents confidential.

use std::time::{Duration, SystemTime};

use josekit::jwe::{JweHeader, ECDH_ES_A128KW};
use josekit::jws::{ES256, JwsHeader};
use josekit::jwt::{self, JwtPayload, JwtPayloadValidator};
use serde_json::{Map, Value};

use carta_record::{ADMIN_METADATA_KEY, Record};

use crate::keys::AdministrationKeys;
use crate::kv::{get_kv, set_kv};
use crate::model::Administration;
use crate::AdminError;

const ISSUER: &str = "magic.data.bas.ac.uk";
const AUDIENCE: &str = "data.bas.ac.uk";
const LIFETIME_SECS: u64 = 3_153_600_000; // 100 years
const ENC_ALG: &str = "A256GCM";
const PAYLOAD_CLAIM: &str = "pyd";

/// Sealer for encrypting/decrypting and signing/verifying admin metadata.
///
/// Checks the metadata id corresponds to the token subject (internal
/// integrity). It does not check metadata relates to a particular record;
/// [`get_admin`] and [`set_admin`] do.
pub struct AdministrationSealer<'a> {
    keys: &'a AdministrationKeys,
}

impl<'a> AdministrationSealer<'a> {
    pub fn new(keys: &'a AdministrationKeys) -> Self {
        Self { keys }
    }

    /// Sign and encrypt metadata.
    ///
    /// The JWT is signed with the private signing key (for anyone holding the
    /// public key to verify). The JWE is encrypted to the public half of the
    /// encryption key (for only us to read).
    pub fn encode(&self, metadata: &Administration) -> Result<String, AdminError> {
        let signing_key = self
            .keys
            .signing_private
            .as_ref()
            .ok_or(AdminError::MissingSigningKey)?;

        let mut payload = JwtPayload::new();
        payload.set_issuer(ISSUER);
        payload.set_audience(vec![AUDIENCE]);
        payload.set_subject(&metadata.id);
        let now = SystemTime::now();
        payload.set_issued_at(&now);
        payload.set_expires_at(&(now + Duration::from_secs(LIFETIME_SECS)));
        payload.set_claim(
            PAYLOAD_CLAIM,
            Some(Value::String(metadata.dumps_json()?)),
        )?;

        let signer = ES256.signer_from_jwk(signing_key)?;
        let jws_header = JwsHeader::new();
        let token = jwt::encode_with_signer(&payload, &jws_header, &signer)?;

        let mut jwe_header = JweHeader::new();
        jwe_header.set_content_encryption(ENC_ALG);
        jwe_header.set_content_type("JWT");
        let encryption_public = self.keys.encryption_private.to_public_key()?;
        let encrypter = ECDH_ES_A128KW.encrypter_from_jwk(&encryption_public)?;
        Ok(josekit::jwe::serialize_compact(
            token.as_bytes(),
            &jwe_header,
            &encrypter,
        )?)
    }

    /// Decrypt and verify metadata.
    pub fn decode(&self, token: &str) -> Result<Administration, AdminError> {
        let decrypter = ECDH_ES_A128KW.decrypter_from_jwk(&self.keys.encryption_private)?;
        let (inner, _header) = josekit::jwe::deserialize_compact(token, &decrypter)?;
        let inner = String::from_utf8(inner).map_err(|_| AdminError::Integrity)?;

        let verifier = ES256.verifier_from_jwk(&self.keys.signing_public)?;
        let (payload, _jws_header) = jwt::decode_with_verifier(&inner, &verifier)?;

        let mut validator = JwtPayloadValidator::new();
        validator.set_issuer(ISSUER);
        validator.set_audience(AUDIENCE);
        validator.set_base_time(SystemTime::now());
        validator.validate(&payload)?;

        let raw = payload
            .claim(PAYLOAD_CLAIM)
            .and_then(Value::as_str)
            .ok_or(AdminError::Integrity)?;
        let metadata = Administration::loads_json(raw)?;
        if payload.subject() != Some(metadata.id.as_str()) {
            return Err(AdminError::Integrity);
        }
        Ok(metadata)
    }
}

/// Get administrative metadata for a record if present.
///
/// Checks the unsealed metadata relates to the containing record via the
/// resource (file) identifier.
pub fn get_admin(
    keys: &AdministrationKeys,
    record: &Record,
) -> Result<Option<Administration>, AdminError> {
    let kv = get_kv(record);
    let Some(raw) = kv.get(ADMIN_METADATA_KEY).and_then(Value::as_str) else {
        return Ok(None);
    };

    let metadata = AdministrationSealer::new(keys).decode(raw)?;
    if record.file_identifier.as_deref() != Some(metadata.id.as_str()) {
        return Err(AdminError::SubjectMismatch);
    }
    Ok(Some(metadata))
}

/// Seal administrative metadata into a record.
///
/// Other supplemental keys are preserved. Fails when the metadata subject
/// does not match the record.
pub fn set_admin(
    keys: &AdministrationKeys,
    record: &mut Record,
    metadata: &Administration,
) -> Result<(), AdminError> {
    if record.file_identifier.as_deref() != Some(metadata.id.as_str()) {
        return Err(AdminError::SubjectMismatch);
    }
    let token = AdministrationSealer::new(keys).encode(metadata)?;
    let mut kv = Map::new();
    kv.insert(ADMIN_METADATA_KEY.into(), Value::String(token));
    set_kv(record, kv)
}
