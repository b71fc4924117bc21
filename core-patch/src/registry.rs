//! The wrapped surface
//!
//! Every method named here must exist in the SDK's method table for its
//! entity, or patching fails before any call is made.

use bridge_traits::{EntityType, MethodKind};

/// Methods wrapped on one entity type.
#[derive(Debug, Clone, Copy)]
pub struct MethodSet {
    pub entity: EntityType,
    pub instance: &'static [&'static str],
    pub statics: &'static [&'static str],
}

impl MethodSet {
    pub fn names(&self, kind: MethodKind) -> &'static [&'static str] {
        match kind {
            MethodKind::Static => self.statics,
            MethodKind::Instance => self.instance,
        }
    }
}

pub const METHOD_REGISTRY: &[MethodSet] = &[
    MethodSet {
        entity: EntityType::Object,
        instance: &["save", "fetch", "destroy"],
        statics: &["save_all", "destroy_all", "fetch_all", "fetch_all_if_needed"],
    },
    MethodSet {
        entity: EntityType::Query,
        instance: &["count", "find", "first", "get"],
        statics: &[],
    },
    MethodSet {
        entity: EntityType::Cloud,
        instance: &[],
        statics: &["run"],
    },
    MethodSet {
        entity: EntityType::User,
        instance: &["upgrade_to_revocable_session", "log_in", "sign_up"],
        statics: &[
            "become",
            "current_async",
            "enable_revocable_session",
            "log_in",
            "log_out",
            "request_password_reset",
            "sign_up",
        ],
    },
    MethodSet {
        entity: EntityType::Config,
        instance: &[],
        statics: &["get"],
    },
    MethodSet {
        entity: EntityType::File,
        instance: &["save"],
        statics: &[],
    },
    MethodSet {
        entity: EntityType::Session,
        instance: &[],
        statics: &["current"],
    },
    MethodSet {
        entity: EntityType::Push,
        instance: &[],
        statics: &["send"],
    },
    MethodSet {
        entity: EntityType::GeoPoint,
        instance: &[],
        statics: &["current"],
    },
    MethodSet {
        entity: EntityType::Analytics,
        instance: &[],
        statics: &["track"],
    },
];

/// Whether `entity.method` (of the given kind) is part of the wrapped
/// surface.
pub fn is_registered(entity: EntityType, kind: MethodKind, method: &str) -> bool {
    METHOD_REGISTRY
        .iter()
        .filter(|set| set.entity == entity)
        .any(|set| set.names(kind).contains(&method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_entity_listed_once() {
        let entities: HashSet<_> = METHOD_REGISTRY.iter().map(|set| set.entity).collect();
        assert_eq!(entities.len(), METHOD_REGISTRY.len());
        assert_eq!(entities.len(), EntityType::ALL.len());
    }

    #[test]
    fn test_registered_lookup() {
        assert!(is_registered(EntityType::User, MethodKind::Static, "become"));
        assert!(is_registered(EntityType::User, MethodKind::Instance, "sign_up"));
        assert!(is_registered(EntityType::File, MethodKind::Instance, "save"));
        assert!(!is_registered(EntityType::File, MethodKind::Static, "save"));
        assert!(!is_registered(EntityType::Query, MethodKind::Instance, "each"));
    }

    #[test]
    fn test_wrapped_method_count() {
        let total: usize = METHOD_REGISTRY
            .iter()
            .map(|set| set.instance.len() + set.statics.len())
            .sum();
        assert_eq!(total, 28);
    }
}
