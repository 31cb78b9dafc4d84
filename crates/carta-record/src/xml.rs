// SPDX-License-Identifier: MIT OR Apache-2.0
//! Seam for the external ISO 19115 XML codec.
//!
//! XML encoding is delegated to a pre-existing codec library; this crate only
//! defines the boundary. Implementations receive the record's canonical JSON
//! configuration and return an XML document.

use serde_json::Value;

/// Errors from an ISO XML codec implementation.
#[derive(Debug, thiserror::Error)]
#[error("iso xml encoding failed: {0}")]
pub struct IsoXmlError(pub String);

/// Encoder from a record configuration to an ISO 19115 XML document.
pub trait IsoXmlCodec: Send + Sync {
    /// Encode a canonical record configuration as an XML document string.
    fn encode(&self, config: &Value) -> Result<String, IsoXmlError>;
}
