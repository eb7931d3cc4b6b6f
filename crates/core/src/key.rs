//! Content-derived grid identifiers.

use uuid::Uuid;

/// Namespace for deriving grid ids (UUIDv5). Fixed forever: changing it would
/// re-key every grid ever seeded.
pub const GRID_ID_NAMESPACE: Uuid = Uuid::from_u128(0x129f7541_7655_4635_85bf_994f54ec2807);

/// Derive the natural key for a grid from its normalized content.
///
/// Identical content derives the identical id on every run and every machine,
/// which is what makes seeding idempotent. Inputs must already be normalized
/// (trimmed, uppercased); the validator guarantees that.
pub fn derive_grid_id(cells: &str, words_across: &[String], words_down: &[String]) -> Uuid {
    let payload = format!(
        "{}|{}|{}",
        cells,
        words_across.join("/"),
        words_down.join("/")
    );
    Uuid::new_v5(&GRID_ID_NAMESPACE, payload.as_bytes())
}
