//! UUID-backed id generation.

use crate::store::IdGenerator;
use uuid::Uuid;

/// Mints uuid-v4 hex identifiers.
#[derive(Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
