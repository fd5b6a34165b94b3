//! Recursive permission-narrowed schema projection.
//!
//! The projector is a pure recursive function over the schema registry: no
//! per-request types are generated, and the projected view is plain data.
//! An explicit depth parameter bounds expansion per branch, and an active
//! expansion chain (keyed by schema pair) turns mutual full expansion into
//! a configuration error instead of unbounded recursion.

use log::debug;

use crate::error::{VisibilityError, VisibilityResult};
use crate::permissions::resolver::FieldPermissionResolver;
use crate::permissions::store::PermissionStore;
use crate::permissions::types::Principal;
use crate::projection::view::{FieldShape, ProjectedField, ProjectedView};
use crate::schema::registry::SchemaRegistry;
use crate::schema::types::{FieldKind, Schema, SchemaField};

/// One relation expansion in progress, used for cycle detection.
struct ActiveEdge {
    source: String,
    target: String,
    /// Qualified `schema.field` name, reported on conflict
    field: String,
}

impl ActiveEdge {
    fn joins(&self, source: &str, target: &str) -> bool {
        (self.source == source && self.target == target)
            || (self.source == target && self.target == source)
    }
}

pub struct SchemaProjector<'a> {
    registry: &'a SchemaRegistry,
    store: &'a dyn PermissionStore,
}

impl<'a> SchemaProjector<'a> {
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry, store: &'a dyn PermissionStore) -> Self {
        Self { registry, store }
    }

    /// Builds the permission-narrowed view of `schema_name` for the
    /// principal.
    ///
    /// `max_depth` is the relation expansion budget: 0 means relation fields
    /// never expand and render reference-only; each expansion decrements the
    /// budget for that branch independently. A granted, permission-governed
    /// relation whose target projects to zero visible fields degrades to
    /// reference-only; an ungranted relation field is simply absent.
    pub fn project(
        &self,
        principal: Option<&Principal>,
        schema_name: &str,
        max_depth: usize,
    ) -> VisibilityResult<ProjectedView> {
        let mut resolver = FieldPermissionResolver::new(self.store, principal);
        let mut chain: Vec<ActiveEdge> = Vec::new();
        self.project_with(&mut resolver, schema_name, max_depth, &mut chain)
    }

    fn project_with(
        &self,
        resolver: &mut FieldPermissionResolver,
        schema_name: &str,
        depth: usize,
        chain: &mut Vec<ActiveEdge>,
    ) -> VisibilityResult<ProjectedView> {
        let schema = self.registry.get(schema_name)?;
        let allowed = resolver.allowed_fields(schema)?;

        let mut fields = Vec::new();
        for field in schema.fields_in_view_order() {
            if !allowed.contains(&field.name) {
                continue;
            }
            let shape = match &field.kind {
                FieldKind::Scalar | FieldKind::Computed => FieldShape::Value,
                FieldKind::Relation { target, governed } => {
                    self.relation_shape(resolver, schema, field, target, *governed, depth, chain)?
                }
            };
            fields.push(ProjectedField {
                name: field.name.clone(),
                shape,
            });
        }

        Ok(ProjectedView {
            schema_name: schema.name.clone(),
            fields,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn relation_shape(
        &self,
        resolver: &mut FieldPermissionResolver,
        schema: &Schema,
        field: &SchemaField,
        target: &str,
        governed: bool,
        depth: usize,
        chain: &mut Vec<ActiveEdge>,
    ) -> VisibilityResult<FieldShape> {
        if !governed || depth == 0 {
            return self.reference_shape(target);
        }

        let qualified = format!("{}.{}", schema.name, field.name);
        if let Some(active) = chain.iter().find(|edge| edge.joins(&schema.name, target)) {
            return Err(VisibilityError::RecursiveRelationConflict {
                field_a: qualified,
                field_b: active.field.clone(),
            });
        }

        debug!("Expanding relation {} -> {}", qualified, target);
        chain.push(ActiveEdge {
            source: schema.name.clone(),
            target: target.to_string(),
            field: qualified,
        });
        let nested = self.project_with(resolver, target, depth - 1, chain);
        chain.pop();
        let nested = nested?;

        if nested.is_empty() {
            // No visible fields on the target for this principal
            self.reference_shape(target)
        } else {
            Ok(FieldShape::Nested(nested))
        }
    }

    fn reference_shape(&self, target: &str) -> VisibilityResult<FieldShape> {
        let schema = self.registry.get(target)?;
        Ok(FieldShape::Reference {
            target: schema.name.clone(),
            key_field: schema.primary_key.clone(),
        })
    }
}
