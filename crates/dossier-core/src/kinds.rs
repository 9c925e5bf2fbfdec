use crate::EntityType;

pub(crate) const PERSON: &str = "person";
pub(crate) const ORGANIZATION: &str = "organization";
pub(crate) const LOCATION: &str = "location";
pub(crate) const DATE: &str = "date";
pub(crate) const OTHER: &str = "other";

/// The entity types the NER pass emits out of the box.
/// Callers may use any other validated type via `EntityType::new`.
pub mod defaults {
    use super::*;

    pub fn person() -> EntityType {
        EntityType::builtin(PERSON)
    }
    pub fn organization() -> EntityType {
        EntityType::builtin(ORGANIZATION)
    }
    pub fn location() -> EntityType {
        EntityType::builtin(LOCATION)
    }
    pub fn date() -> EntityType {
        EntityType::builtin(DATE)
    }
    pub fn other() -> EntityType {
        EntityType::builtin(OTHER)
    }

    pub fn all() -> Vec<EntityType> {
        vec![person(), organization(), location(), date(), other()]
    }
}

#[cfg(test)]
mod tests {
    use super::defaults;
    use crate::EntityType;

    #[test]
    fn test_defaults_are_valid_types() {
        for kind in defaults::all() {
            assert_eq!(EntityType::new(kind.as_str()).unwrap(), kind);
        }
        assert!(defaults::person().is_person());
        assert!(defaults::organization().is_organization());
    }
}
