// SPDX-License-Identifier: MIT OR Apache-2.0
//! Record error taxonomy.

/// Errors raised when decoding or validating records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// A record configuration could not be decoded into the typed model.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// A record failed JSON Schema validation or a structural invariant.
    ///
    /// Carries the underlying validator message.
    #[error("invalid record: {0}")]
    Invalid(String),

    /// A record declared a `$schema` other than the supported schema.
    #[error("unsupported JSON Schema in data")]
    UnsupportedSchema,

    /// JSON (de)serialisation failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RecordError {
    pub(crate) fn malformed(context: &str, detail: impl std::fmt::Display) -> Self {
        Self::Malformed(format!("{context}: {detail}"))
    }
}
