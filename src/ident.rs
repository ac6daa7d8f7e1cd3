//! Stable channel identifiers
//!
//! Favorites and hidden items are keyed by these ids, so the algorithm is
//! fixed: 32-bit FNV-1a over the UTF-8 bytes of `"{name}:{group}"`,
//! rendered in lower-case base-36 with a `ch_` prefix.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Namespace tag on every synthesized id
pub const ID_PREFIX: &str = "ch_";

/// 32-bit FNV-1a
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Render in base-36 using `0-9a-z`
pub fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(7);
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    // Only ASCII digits were pushed
    String::from_utf8(out).unwrap_or_default()
}

/// Deterministic id for a channel with no usable tvg id.
/// Empty parts are replaced by `"unknown"`.
pub fn stable_id(name: &str, group: &str) -> String {
    let name = if name.is_empty() { "unknown" } else { name };
    let group = if group.is_empty() { "unknown" } else { group };
    let key = format!("{}:{}", name, group);
    format!("{}{}", ID_PREFIX, to_base36(fnv1a_32(key.as_bytes())))
}

/// Lower-case a display name and collapse whitespace runs into `_`
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
