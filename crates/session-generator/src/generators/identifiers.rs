//! Identifier generators: record ids and key segments.

use hpk_core::TenantProfile;
use rand::Rng;
use uuid::Uuid;

const USER_PREFIX: &str = "user-";
const SESSION_PREFIX: &str = "session-";

/// Generate a random UUID v4 using the provided RNG.
pub fn generate_uuid_v4<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    // Set version (4) and variant (RFC 4122) bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// Format a user key segment.
pub fn user_id(user_number: u32) -> String {
    format!("{USER_PREFIX}{user_number}")
}

/// Draw a user key segment from the tenant's user range.
pub fn generate_user_id<R: Rng + ?Sized>(rng: &mut R, tenant: &TenantProfile) -> String {
    user_id(rng.gen_range(tenant.user_count_min..=tenant.user_count_max))
}

/// Numeric suffix of a `user-<n>` segment.
pub fn parse_user_number(user_id: &str) -> Option<u32> {
    user_id.strip_prefix(USER_PREFIX)?.parse().ok()
}

/// Generate a `session-<8 hex chars>` key segment.
///
/// Only the first eight hex digits of a fresh UUID are kept. Collisions are
/// possible; the segment adds spread to the key, it is not an identity.
pub fn generate_session_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let uuid = generate_uuid_v4(rng);
    let simple = uuid.simple().to_string();
    format!("{SESSION_PREFIX}{}", &simple[..8])
}
