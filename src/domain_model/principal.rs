use crate::domain_model::UserId;
use serde::Serialize;

/// Identity attached to a request once the authenticator has let it
/// through. Immutable for the lifetime of the credential that produced it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(user_id: UserId, email: Option<String>) -> Self {
        Principal { user_id, email }
    }
}
