//! Key extraction
//!
//! Turns a record into the byte sequence that decides uniqueness. Identity
//! keys borrow the record directly; composite keys are assembled in a scratch
//! buffer that lives as long as the extractor.

use crate::error::{DedupError, Result};
use crate::record::Record;

/// Default separator placed between selected fields of a composite key
pub const DEFAULT_SEPARATOR: &str = "|||";

/// How the uniqueness key is derived from a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMode {
    /// The whole record
    Identity,
    /// Selected fields, in the given order, joined by `separator`
    Composite {
        columns: Vec<usize>,
        separator: Vec<u8>,
    },
}

impl KeyMode {
    /// Composite key over `columns` joined by `separator`
    pub fn composite(columns: Vec<usize>, separator: impl Into<Vec<u8>>) -> Self {
        Self::Composite {
            columns,
            separator: separator.into(),
        }
    }

    /// Reject configurations that can never yield a well-defined key
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Identity => Ok(()),
            Self::Composite { columns, separator } => {
                if columns.is_empty() {
                    return Err(DedupError::Config(
                        "at least one key column is required".to_string(),
                    ));
                }
                if separator.is_empty() && columns.len() > 1 {
                    return Err(DedupError::Config(
                        "an empty separator makes multi-column keys ambiguous".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// A configured key column the record does not have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField {
    pub index: usize,
    pub field_count: usize,
}

/// Derives keys from records according to a validated [`KeyMode`]
#[derive(Debug)]
pub struct KeyExtractor {
    mode: KeyMode,
    scratch: Vec<u8>,
}

impl KeyExtractor {
    pub fn new(mode: KeyMode) -> Result<Self> {
        mode.validate()?;
        Ok(Self {
            mode,
            scratch: Vec::with_capacity(256),
        })
    }

    pub fn mode(&self) -> &KeyMode {
        &self.mode
    }

    /// Extract the key for `record`.
    ///
    /// The returned slice borrows either the record or the extractor's scratch
    /// buffer and is only valid until the next call.
    pub fn extract<'a, R: Record>(
        &'a mut self,
        record: &'a R,
    ) -> std::result::Result<&'a [u8], MissingField> {
        let Self { mode, scratch } = self;

        match mode {
            KeyMode::Identity => Ok(record.identity_key(scratch)),
            KeyMode::Composite { columns, separator } => {
                scratch.clear();
                for (i, &index) in columns.iter().enumerate() {
                    let field = record.field(index).ok_or(MissingField {
                        index,
                        field_count: record.field_count(),
                    })?;
                    if i > 0 {
                        scratch.extend_from_slice(separator);
                    }
                    scratch.extend_from_slice(field);
                }
                Ok(scratch.as_slice())
            }
        }
    }
}
