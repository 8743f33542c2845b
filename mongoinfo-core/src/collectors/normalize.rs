//! Type normalization for the few response fields collectors inspect.

use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Bson, Document};
use thiserror::Error;
use uuid::Uuid;

/// A size field that could not be represented as an `i64`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizeError {
    #[error("field '{field}' has unsupported type {element_type}")]
    UnsupportedType {
        /// Response field name
        field: String,
        /// BSON element type found instead of a number
        element_type: String,
    },

    #[error("field '{field}' is not a finite number")]
    NonFinite {
        /// Response field name
        field: String,
    },

    #[error("field '{field}' value {value} does not fit in a 64-bit integer")]
    OutOfRange {
        /// Response field name
        field: String,
        /// Reported value before truncation
        value: f64,
    },
}

/// Normalizes a numeric size value to `i64`.
///
/// Servers report sizes as Int32, Int64 or Double depending on magnitude
/// and version. Doubles are truncated toward zero.
///
/// # Errors
/// Returns [`SizeError`] for non-numeric, non-finite or out-of-range values
///
/// # Example
/// ```rust
/// use mongodb::bson::Bson;
/// use mongoinfo_core::collectors::normalize_size;
///
/// assert_eq!(normalize_size("sizeOnDisk", &Bson::Double(8192.0)).unwrap(), 8192);
/// assert!(normalize_size("sizeOnDisk", &Bson::String("8k".into())).is_err());
/// ```
pub fn normalize_size(field: &str, value: &Bson) -> Result<i64, SizeError> {
    match value {
        Bson::Int32(n) => Ok(i64::from(*n)),
        Bson::Int64(n) => Ok(*n),
        Bson::Double(f) if !f.is_finite() => Err(SizeError::NonFinite {
            field: field.to_string(),
        }),
        Bson::Double(f) => {
            let truncated = f.trunc();
            // i64::MAX as f64 rounds up to 2^63, which is itself out of range
            if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(truncated as i64)
            } else {
                Err(SizeError::OutOfRange {
                    field: field.to_string(),
                    value: *f,
                })
            }
        }
        other => Err(SizeError::UnsupportedType {
            field: field.to_string(),
            element_type: format!("{:?}", other.element_type()),
        }),
    }
}

/// Renders a UUID binary as lowercase 32-character hex.
///
/// Returns `None` for anything other than a 16-byte binary of subtype 3
/// (legacy UUID) or 4 (UUID).
pub fn uuid_to_hex(value: &Bson) -> Option<String> {
    match value {
        Bson::Binary(binary)
            if matches!(binary.subtype, BinarySubtype::Uuid | BinarySubtype::UuidOld) =>
        {
            Uuid::from_slice(&binary.bytes)
                .ok()
                .map(|uuid| uuid.simple().to_string())
        }
        _ => None,
    }
}

/// Replaces every top-level UUID binary in `document` with its hex form.
pub fn convert_uuid_fields(document: Document) -> Document {
    document
        .into_iter()
        .map(|(key, value)| match uuid_to_hex(&value) {
            Some(hex) => (key, Bson::String(hex)),
            None => (key, value),
        })
        .collect()
}
