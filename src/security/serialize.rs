//! Length-prefixed string serialization used by the framework on the other
//! side of the wire: `s:<byte length>:"<content>";`.

use crate::error::{GateError, GateResult};

/// Marker every serialized string starts with.
pub const STRING_MARKER: &str = "s:";

pub fn serialize(value: &str) -> String {
    format!("s:{}:\"{}\";", value.len(), value)
}

/// Recover the content of a serialized string.
///
/// The declared length drives extraction, so content may itself contain
/// `:`, `;` or quotes. Anything after the closing `";` is ignored.
pub fn deserialize(value: &str) -> GateResult<String> {
    let rest = value
        .strip_prefix(STRING_MARKER)
        .ok_or_else(|| GateError::Format("not a serialized string".into()))?;

    let (len_field, rest) = rest
        .split_once(':')
        .ok_or_else(|| GateError::Format("missing length field".into()))?;

    if len_field.is_empty() || !len_field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GateError::Format(format!("invalid length {:?}", len_field)));
    }
    let length: usize = len_field
        .parse()
        .map_err(|_| GateError::Format(format!("invalid length {:?}", len_field)))?;

    let body = rest
        .strip_prefix('"')
        .ok_or_else(|| GateError::Format("content is not quoted".into()))?;

    let content = body.get(..length).ok_or_else(|| {
        GateError::Format(format!(
            "content length mismatch, expected {}, got {}",
            length,
            body.trim_end_matches(['"', ';', '\0']).len()
        ))
    })?;

    if !body[length..].starts_with("\";") {
        return Err(GateError::Format(format!(
            "content length mismatch, expected {} bytes before closing quote",
            length
        )));
    }

    Ok(content.to_string())
}
