//! Row-level filter enforcement.
//!
//! Shape (which fields appear) and row visibility are orthogonal: the
//! enforcer never consults field grants, and the projector never consults
//! row filters. Absence of a stored row filter means unrestricted rows:
//! the deliberate asymmetry with field permissions, where absence of grants
//! means nothing is visible.

use log::{debug, warn};
use serde_json::Value;

use crate::error::VisibilityResult;
use crate::filter::codec::ExpressionCodec;
use crate::filter::matcher;
use crate::permissions::store::PermissionStore;
use crate::permissions::types::Principal;

/// How anonymous (and absent) principals are treated by row filtering.
///
/// `DenyAll` hides every row, matching the "empty allowed-field set" default
/// on the shape side. `Exempt` passes rows through unfiltered, for callers
/// whose anonymous content exposure is already controlled entirely by field
/// permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnonymousFilterPolicy {
    #[default]
    DenyAll,
    Exempt,
}

pub struct RowFilterEnforcer<'a> {
    store: &'a dyn PermissionStore,
    codec: ExpressionCodec,
    anonymous_policy: AnonymousFilterPolicy,
}

impl<'a> RowFilterEnforcer<'a> {
    #[must_use]
    pub fn new(store: &'a dyn PermissionStore, codec: ExpressionCodec) -> Self {
        Self {
            store,
            codec,
            anonymous_policy: AnonymousFilterPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_anonymous_policy(mut self, policy: AnonymousFilterPolicy) -> Self {
        self.anonymous_policy = policy;
        self
    }

    /// Narrows a collection to the rows the principal may see.
    ///
    /// Superusers see the collection unchanged, as does any principal with
    /// no stored row filter for the schema. A stored filter is decoded and
    /// applied row by row; a filter that fails to decode is surfaced, never
    /// swallowed.
    pub fn filter_collection(
        &self,
        principal: Option<&Principal>,
        schema_name: &str,
        rows: Vec<Value>,
    ) -> VisibilityResult<Vec<Value>> {
        let principal = match principal {
            None => return Ok(self.anonymous_rows(rows)),
            Some(p) if p.is_anonymous => return Ok(self.anonymous_rows(rows)),
            Some(p) => p,
        };
        if principal.is_superuser {
            return Ok(rows);
        }

        let Some(encoded) = self.store.row_filter_for(&principal.id, schema_name)? else {
            return Ok(rows);
        };
        let predicate = self.codec.decode(&encoded).map_err(|e| {
            warn!(
                "Stored row filter for '{}' on '{}' is unreadable: {}",
                principal.id, schema_name, e
            );
            e
        })?;

        let total = rows.len();
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if matcher::matches(&row, &predicate)? {
                kept.push(row);
            }
        }
        debug!(
            "Row filter for '{}' on '{}' kept {}/{} rows",
            principal.id,
            schema_name,
            kept.len(),
            total
        );
        Ok(kept)
    }

    /// Decides whether the principal may see one object: membership of the
    /// singleton collection containing it after filtering. A no-match is
    /// `false`, never an error.
    pub fn check_object(
        &self,
        principal: Option<&Principal>,
        schema_name: &str,
        object: &Value,
    ) -> VisibilityResult<bool> {
        let kept = self.filter_collection(principal, schema_name, vec![object.clone()])?;
        Ok(!kept.is_empty())
    }

    fn anonymous_rows(&self, rows: Vec<Value>) -> Vec<Value> {
        match self.anonymous_policy {
            AnonymousFilterPolicy::DenyAll => Vec::new(),
            AnonymousFilterPolicy::Exempt => rows,
        }
    }
}
