//! `data:` prefixed configuration values.
//!
//! A configuration value of the form `data:<base64>` is replaced by its
//! decoded text when the configuration is resolved. This only keeps
//! credentials from being readable at a glance in a config file. It is NOT
//! encryption: anyone holding the file can decode them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::Error;

const PREFIX: &str = "data:";

/// Decode `value` if it carries the `data:` prefix, otherwise return it as is.
pub fn reveal(field: &'static str, value: &str) -> Result<String, Error> {
    let Some(encoded) = value.strip_prefix(PREFIX) else {
        return Ok(value.to_string());
    };

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Decode {
            field,
            reason: e.to_string(),
        })?;

    String::from_utf8(bytes).map_err(|e| Error::Decode {
        field,
        reason: e.to_string(),
    })
}

/// Encode `value` in the `data:` form accepted by [`reveal`].
#[must_use]
pub fn conceal(value: &str) -> String {
    format!("{PREFIX}{}", STANDARD.encode(value))
}

/// Whether `value` is in the `data:` form.
#[must_use]
pub fn is_concealed(value: &str) -> bool {
    value.starts_with(PREFIX)
}
