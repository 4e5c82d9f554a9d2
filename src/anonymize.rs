//! Identity anonymization
//!
//! Identities are replaced by a truncated SHA-256 digest: 16 bytes rendered
//! as 32 lowercase hex characters. Equal inputs always hash equal, so hashed
//! senders and receivers can still be joined.

use sha2::{Digest, Sha256};

use crate::models::{ChannelType, RawRow};

/// Digest length in bytes (128 bits)
pub const DIGEST_BYTES: usize = 16;

/// Hash an identity (email, username or channel name)
#[must_use]
pub fn hash_identity(identity: &str) -> String {
    let digest = Sha256::digest(identity.as_bytes());
    hex::encode(&digest[..DIGEST_BYTES])
}

/// Channel name as written to the output: kept for public channels, hashed otherwise
#[must_use]
pub fn anonymize_channel(channel: &str, channel_type: ChannelType) -> String {
    if channel_type.is_public() {
        channel.to_string()
    } else {
        hash_identity(channel)
    }
}

/// Replace sender and receiver identities of a raw row by their hashes
#[must_use]
pub fn anonymize_row(row: RawRow) -> RawRow {
    RawRow {
        sender: hash_identity(&row.sender),
        receiver: row.receiver.as_deref().map(hash_identity),
        ..row
    }
}
