//! Short request identifiers

use uuid::Uuid;

/// Length of the token embedded in artifact names and returned to clients
pub const UNIQUE_ID_LEN: usize = 9;

/// Generate a 9-character lowercase alphanumeric token.
///
/// Unique enough to keep concurrent artifacts apart in one temp directory;
/// not meant as a security token.
pub fn generate_unique_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(UNIQUE_ID_LEN);
    id
}
