use crate::error::{PlcollectError, Result};

/// Characters that are not allowed in a path component on common platforms.
pub const RESERVED_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Strips every reserved character. Everything else, non-ASCII included, passes through.
pub fn sanitize(name: &str) -> String {
    name.chars().filter(|c| !RESERVED_CHARS.contains(c)).collect()
}

/// Sanitizes `name` and rejects results that cannot name a file or directory.
pub fn safe_name(name: &str) -> Result<String> {
    let cleaned = sanitize(name);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(PlcollectError::InvalidName(name.to_string()));
    }
    Ok(cleaned.to_string())
}

/// True when `name` can only ever resolve to a file directly inside the
/// directory it is joined onto.
pub fn is_plain_file_name(name: &str) -> bool {
    safe_name(name).is_ok_and(|clean| clean == name)
}

/// Short random suffix used to sidestep an existing destination, e.g. `_3f9a`.
pub fn disambiguator() -> String {
    let bytes: [u8; 2] = rand::random();
    format!("_{:02x}{:02x}", bytes[0], bytes[1])
}
