// SPDX-License-Identifier: MIT

//! File name helpers for fixed-width, NUL-terminated directory name fields.

use alloc::borrow::Cow;
use alloc::string::String;

/// Checks that `name` fits a `width`-byte NUL-terminated field:
/// non-empty, at most `width - 1` bytes, no interior NUL.
pub fn is_valid_name(name: &str, width: usize) -> bool {
    !name.is_empty() && name.len() < width && !name.as_bytes().contains(&0)
}

/// Writes `name` into `field`, zero-padding the rest.
///
/// Callers validate with [`is_valid_name`] first; oversized names are truncated
/// so that the terminator is always kept.
pub fn encode_name(name: &str, field: &mut [u8]) {
    field.fill(0);
    let max = field.len().saturating_sub(1);
    let bytes = name.as_bytes();
    let n = bytes.len().min(max);
    field[..n].copy_from_slice(&bytes[..n]);
}

/// Raw bytes of the name stored in `field`, up to the first NUL.
#[inline]
pub fn name_bytes(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Name stored in `field`. Invalid UTF-8 is replaced rather than rejected.
pub fn decode_name(field: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(name_bytes(field))
}

/// True when the NUL-terminated name in `field` equals `name`.
#[inline]
pub fn name_matches(field: &[u8], name: &str) -> bool {
    name_bytes(field) == name.as_bytes()
}
