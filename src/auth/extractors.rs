use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{jwt::JwtKeys, repo::Managers};
use crate::{error::AppError, state::AppState};

/// Identity carried by a valid bearer token.
///
/// A missing token rejects with 401, a present but invalid or expired one
/// with 403. `Option<AuthUser>` turns both into `None` for routes where
/// authentication is optional.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (_scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Access token required".into()))?;

        let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::forbidden("Invalid or expired token")
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            username: claims.username,
        })
    }
}

/// An authenticated user whose email is on the manager allow-list.
#[derive(Debug, Clone)]
pub struct ManagerUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for ManagerUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !Managers::contains(&state.db, &user.email).await? {
            warn!(user_id = %user.id, "manager route denied");
            return Err(AppError::forbidden("Manager access required"));
        }
        Ok(ManagerUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/");
        if let Some(v) = auth {
            req = req.header("Authorization", v);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn garbage_token_is_forbidden() {
        let state = AppState::fake();
        let mut parts = parts_with(Some("Bearer not.a.jwt"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let state = AppState::fake();
        let user = crate::auth::jwt::tests::make_user("alice", "alice@illinois.edu");
        let token = JwtKeys::from_ref(&state).sign(&user).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {token}")));
        let auth = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(auth.id, user.id);
        assert_eq!(auth.email, "alice@illinois.edu");
        assert_eq!(auth.username, "alice");
    }
}
