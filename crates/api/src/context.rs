use stocktrail_auth::{Role, is_admin, is_staff};
use stocktrail_core::UserId;
use stocktrail_store::Scope;

/// Principal context for a request (authenticated identity + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_staff(&self) -> bool {
        is_staff(&self.roles)
    }

    pub fn is_admin(&self) -> bool {
        is_admin(&self.roles)
    }

    /// Item/change visibility for this principal. Staff see everything,
    /// everyone else only what they created.
    pub fn scope(&self) -> Scope {
        if self.is_staff() {
            Scope::All
        } else {
            Scope::Owner(self.user_id)
        }
    }
}
