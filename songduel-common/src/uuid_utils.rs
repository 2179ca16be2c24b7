//! Identifier utilities

use rand::RngCore;
use uuid::Uuid;

/// Generate a new song/user identifier (UUIDv4, hyphenated)
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate an opaque identity token: 32 random bytes, hex encoded
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
