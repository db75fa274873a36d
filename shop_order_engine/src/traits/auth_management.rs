use thiserror::Error;

use crate::db_types::{Address, NewAddress, NewUser, Role, User};

/// The `AuthManagement` trait is the engine's view of the identity collaborator.
///
/// Authentication itself happens upstream: callers hand the engine a user id they have already verified. What the
/// engine needs from the store is
/// * who the user is (for example, the email address shipment notices are sent to),
/// * which roles the user holds, so that admin-only operations can be gated, and
/// * which addresses the user owns, so that nobody can ship an order to someone else's address.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    /// Checks whether a user holds **all** of the given roles. If any are missing,
    /// [`AuthApiError::RoleNotAllowed`] is returned with the number of missing roles.
    async fn check_user_has_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    /// The roles held by the user. Unknown users simply have no roles.
    async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError>;

    /// Assigns the given roles to the user. This function must be idempotent.
    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    /// Removes the given roles from the user, returning the number actually removed. This function must be
    /// idempotent.
    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;

    /// Returns the address only if it exists **and** belongs to `user_id`.
    async fn fetch_address_for_user(&self, user_id: i64, address_id: i64) -> Result<Option<Address>, AuthApiError>;

    async fn insert_address(&self, address: NewAddress) -> Result<Address, AuthApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("User is missing {0} of the required roles")]
    RoleNotAllowed(usize),
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
