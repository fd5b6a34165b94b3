use serde::{Deserialize, Serialize};

/// The actor whose visibility is being computed.
///
/// Superusers bypass all field-grant and row-filter checks. Anonymous
/// principals resolve to the empty field set; their row-filter treatment is
/// a policy of the enforcer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub is_superuser: bool,
    pub is_anonymous: bool,
}

impl Principal {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_superuser: false,
            is_anonymous: false,
        }
    }

    #[must_use]
    pub fn superuser(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_superuser: true,
            is_anonymous: false,
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            id: String::new(),
            is_superuser: false,
            is_anonymous: true,
        }
    }
}
