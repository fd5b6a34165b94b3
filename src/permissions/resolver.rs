//! Field permission resolution for one logical request.
//!
//! A resolver is constructed per top-level projection call and discarded
//! afterwards. Its cache is keyed by schema name and is never shared across
//! principals or across calls, so concurrent requests need no coordination.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::error::VisibilityResult;
use crate::permissions::store::PermissionStore;
use crate::permissions::types::Principal;
use crate::schema::types::Schema;

pub struct FieldPermissionResolver<'a> {
    store: &'a dyn PermissionStore,
    principal: Option<&'a Principal>,
    cache: HashMap<String, BTreeSet<String>>,
}

impl<'a> FieldPermissionResolver<'a> {
    #[must_use]
    pub fn new(store: &'a dyn PermissionStore, principal: Option<&'a Principal>) -> Self {
        Self {
            store,
            principal,
            cache: HashMap::new(),
        }
    }

    /// Computes the set of field names the principal may read on `schema`.
    ///
    /// Anonymous or absent principals see nothing. Superusers see every
    /// declared field without a store lookup. Everyone else sees their
    /// granted fields, restricted to names the schema currently declares:
    /// a stale grant naming a removed field is silently inert.
    pub fn allowed_fields(&mut self, schema: &Schema) -> VisibilityResult<BTreeSet<String>> {
        let principal = match self.principal {
            None => return Ok(BTreeSet::new()),
            Some(p) if p.is_anonymous => return Ok(BTreeSet::new()),
            Some(p) => p,
        };

        if principal.is_superuser {
            return Ok(schema.declared_names());
        }

        if let Some(cached) = self.cache.get(&schema.name) {
            debug!("Field permission cache hit for '{}'", schema.name);
            return Ok(cached.clone());
        }

        let granted = self.store.grants_for(&principal.id, &schema.name)?;
        let declared = schema.declared_names();
        let allowed: BTreeSet<String> = granted.intersection(&declared).cloned().collect();
        if allowed.len() < granted.len() {
            debug!(
                "Ignoring {} stale grant(s) for '{}' on '{}'",
                granted.len() - allowed.len(),
                principal.id,
                schema.name
            );
        }

        self.cache.insert(schema.name.clone(), allowed.clone());
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeSet;

    use super::*;
    use crate::permissions::store::InMemoryPermissionStore;
    use crate::schema::types::SchemaField;

    /// Store wrapper that counts grant lookups, for cache behavior tests.
    struct CountingStore {
        inner: InMemoryPermissionStore,
        grant_calls: RefCell<usize>,
    }

    impl PermissionStore for CountingStore {
        fn grants_for(
            &self,
            principal_id: &str,
            schema_name: &str,
        ) -> VisibilityResult<BTreeSet<String>> {
            *self.grant_calls.borrow_mut() += 1;
            self.inner.grants_for(principal_id, schema_name)
        }

        fn row_filter_for(
            &self,
            principal_id: &str,
            schema_name: &str,
        ) -> VisibilityResult<Option<String>> {
            self.inner.row_filter_for(principal_id, schema_name)
        }
    }

    fn user_schema() -> Schema {
        Schema::new("auth.user", "id")
            .with_field(SchemaField::scalar("id"))
            .with_field(SchemaField::scalar("username"))
            .with_field(SchemaField::scalar("email"))
    }

    #[test]
    fn test_superuser_sees_all_declared_fields() {
        let store = InMemoryPermissionStore::new();
        let admin = Principal::superuser("admin");
        let mut resolver = FieldPermissionResolver::new(&store, Some(&admin));

        let allowed = resolver.allowed_fields(&user_schema()).unwrap();
        assert_eq!(allowed, user_schema().declared_names());
    }

    #[test]
    fn test_anonymous_sees_nothing() {
        let mut store = InMemoryPermissionStore::new();
        store.grant("", "auth.user", "username");
        let anon = Principal::anonymous();
        let mut resolver = FieldPermissionResolver::new(&store, Some(&anon));

        assert!(resolver.allowed_fields(&user_schema()).unwrap().is_empty());
    }

    #[test]
    fn test_absent_principal_sees_nothing() {
        let store = InMemoryPermissionStore::new();
        let mut resolver = FieldPermissionResolver::new(&store, None);

        assert!(resolver.allowed_fields(&user_schema()).unwrap().is_empty());
    }

    #[test]
    fn test_granted_fields_only() {
        let mut store = InMemoryPermissionStore::new();
        store.grant("morgan", "auth.user", "id");
        store.grant("morgan", "auth.user", "username");
        let morgan = Principal::new("morgan");
        let mut resolver = FieldPermissionResolver::new(&store, Some(&morgan));

        let allowed = resolver.allowed_fields(&user_schema()).unwrap();
        assert_eq!(
            allowed.into_iter().collect::<Vec<_>>(),
            vec!["id".to_string(), "username".to_string()]
        );
    }

    #[test]
    fn test_stale_grant_is_inert() {
        let mut store = InMemoryPermissionStore::new();
        store.grant("morgan", "auth.user", "username");
        store.grant("morgan", "auth.user", "removed_field");
        let morgan = Principal::new("morgan");
        let mut resolver = FieldPermissionResolver::new(&store, Some(&morgan));

        let allowed = resolver.allowed_fields(&user_schema()).unwrap();
        assert_eq!(
            allowed.into_iter().collect::<Vec<_>>(),
            vec!["username".to_string()]
        );
    }

    #[test]
    fn test_cache_avoids_repeat_store_lookups() {
        let mut inner = InMemoryPermissionStore::new();
        inner.grant("morgan", "auth.user", "username");
        let store = CountingStore {
            inner,
            grant_calls: RefCell::new(0),
        };
        let morgan = Principal::new("morgan");
        let mut resolver = FieldPermissionResolver::new(&store, Some(&morgan));

        let schema = user_schema();
        resolver.allowed_fields(&schema).unwrap();
        resolver.allowed_fields(&schema).unwrap();
        resolver.allowed_fields(&schema).unwrap();
        assert_eq!(*store.grant_calls.borrow(), 1);
    }
}
