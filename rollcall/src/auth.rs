//! Forwarded-identity extraction.
//!
//! Authentication itself lives in the fronting proxy; this service trusts
//! the identity headers it forwards and only enforces role requirements.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::Error;
use crate::types::Role;

pub const USER_HEADER: &str = "x-gym-user";
pub const ROLES_HEADER: &str = "x-gym-roles";

/// The authenticated caller, as asserted by the proxy.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn require(&self, role: Role) -> Result<(), Error> {
        if self.roles.contains(&role) {
            Ok(())
        } else {
            Err(Error::Forbidden(role))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(Error::Unauthorized)?;
        let user_id = user.trim().parse::<Uuid>().map_err(|_| Error::Unauthorized)?;

        let roles = parts
            .headers
            .get(ROLES_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<Role>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Error::Validation)?;

        Ok(Identity { user_id, roles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(user: Option<&str>, roles: Option<&str>) -> Result<Identity, Error> {
        let mut builder = Request::builder().uri("/");
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        if let Some(roles) = roles {
            builder = builder.header(ROLES_HEADER, roles);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn missing_user_header_is_unauthorized() {
        assert!(matches!(
            extract(None, Some("member")).await,
            Err(Error::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn parses_user_and_roles() {
        let id = Uuid::new_v4();
        let identity = extract(Some(&id.to_string()), Some("member, instructor"))
            .await
            .unwrap();
        assert_eq!(identity.user_id, id);
        assert_eq!(identity.roles, vec![Role::Member, Role::Instructor]);
        assert!(identity.require(Role::Instructor).is_ok());
        assert!(matches!(
            identity.require(Role::Manager),
            Err(Error::Forbidden(Role::Manager))
        ));
    }

    #[tokio::test]
    async fn unknown_role_is_a_validation_error() {
        let id = Uuid::new_v4();
        let result = extract(Some(&id.to_string()), Some("janitor")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
