//! Event identifier generation.

use uuid::Uuid;

/// Generate a fresh, unique event identifier.
///
/// Uses UUIDv7 (time-ordered) rendered in hyphenated form. Prefer setting ids
/// explicitly in tests for determinism.
pub fn new_event_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = new_event_id();
        let b = new_event_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
