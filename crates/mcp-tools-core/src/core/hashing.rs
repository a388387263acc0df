// mcp-tools-core/src/core/hashing.rs
// ============================================================================
// Module: Hashing
// Description: SHA-256 hex digests for client keys and identifiers.
// Purpose: Derive stable, opaque keys without storing raw client data.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Rate-limit buckets are keyed by a SHA-256 digest of client attributes so
//! that raw IPs and user agents never reach the state store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Returns the lowercase hex SHA-256 digest of `input`.
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Encodes bytes as lowercase hex.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
