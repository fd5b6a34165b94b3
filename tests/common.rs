//! Common test utilities and fixtures for visibility engine tests
//!
//! This module provides shared functionality for the integration tests:
//! a schema registry with related record types, a permission store, and
//! the principals the scenarios revolve around.

use finegrain::{InMemoryPermissionStore, Principal, Schema, SchemaField, SchemaRegistry};

/// Common test fixture shared by the integration tests.
pub struct CommonTestFixture {
    pub registry: SchemaRegistry,
    pub store: InMemoryPermissionStore,
    pub admin: Principal,
    pub morgan: Principal,
    pub anon: Principal,
}

impl CommonTestFixture {
    /// Registry with an account/card pair that reference each other and a
    /// flat user schema.
    pub fn new() -> Self {
        let mut registry = SchemaRegistry::new();
        registry.register(
            Schema::new("billing.account", "id")
                .with_field(SchemaField::scalar("id"))
                .with_field(SchemaField::scalar("name"))
                .with_field(SchemaField::computed("balance"))
                .with_field(SchemaField::relation("cards", "billing.card", true)),
        );
        registry.register(
            Schema::new("billing.card", "id")
                .with_field(SchemaField::scalar("id"))
                .with_field(SchemaField::scalar("number"))
                .with_field(SchemaField::relation("account", "billing.account", true)),
        );
        registry.register(
            Schema::new("auth.user", "id")
                .with_field(SchemaField::scalar("id"))
                .with_field(SchemaField::scalar("username"))
                .with_field(SchemaField::scalar("joined")),
        );

        Self {
            registry,
            store: InMemoryPermissionStore::new(),
            admin: Principal::superuser("admin"),
            morgan: Principal::new("morgan"),
            anon: Principal::anonymous(),
        }
    }
}
