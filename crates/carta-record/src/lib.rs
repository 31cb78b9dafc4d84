// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! ISO 19115 record model for the Carta catalogue.
//!
//! Provides the typed record model with explicit JSON codecs, the canonical
//! form and its SHA-1 content hash, JSON Schema plus catalogue invariant
//! validation, and the [`RecordRevision`] type carried through the store.

mod clean;
mod codec;
mod error;

pub mod catalogue;
pub mod elements;
pub mod enums;
pub mod record;
pub mod xml;

pub use catalogue::{
    ALIAS_NAMESPACE, CATALOGUE_NAMESPACE, RecordRevision, record_aliases,
    validate_catalogue_record,
};
pub use clean::{clean_list, clean_map, dumps_ascii};
pub use error::RecordError;
pub use record::{
    ADMIN_METADATA_KEY, PROFILE_DISCOVERY_URL, RECORD_SCHEMA_URL, Record, RecordSchema,
    config_supported, normalise_config,
};
pub use xml::{IsoXmlCodec, IsoXmlError};
