//! The authentication/authorization gate.
//!
//! Three stages, short-circuiting on first failure: extract the token
//! cookie, verify it and resolve the acting user from the database
//! (fail-closed when the account is gone), then check the user's role
//! against the allow-list the route declared at registration time.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::cookie;
use crate::database::models::{PublicUser, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// The resolved acting user, attached to the request for downstream
/// handlers.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<PublicUser> for CurrentUser {
    fn from(user: PublicUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Role allow-list a route declares at registration time, attached to the
/// route as an extension layer.
#[derive(Clone, Copy, Debug)]
pub struct Allowed(pub &'static [Role]);

pub const STAFF: Allowed = Allowed(&[Role::Admin, Role::Teacher]);
pub const INGEST: Allowed = Allowed(&[Role::Sensor, Role::Admin]);
pub const ADMIN_ONLY: Allowed = Allowed(&[Role::Admin]);

/// Stages 1 and 2: extract the cookie, verify the token, resolve the user.
///
/// A token whose user has since been deleted is rejected, never passed
/// through with a dangling identity.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookie::token_from_headers(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Login first to access this resource"))?;

    let claims = state.tokens.verify(&token)?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("The account for this session no longer exists"))?;

    request.extensions_mut().insert(CurrentUser::from(user));
    Ok(next.run(request).await)
}

/// Stage 3: compare the resolved user's role against the route's allow-list.
pub async fn authorize(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Login first to access this resource"))?;

    // A role-gated route without a declared allow-list stays closed
    let Allowed(roles) = request
        .extensions()
        .get::<Allowed>()
        .copied()
        .ok_or_else(|| ApiError::forbidden("No roles are permitted to access this resource"))?;

    if !roles.contains(&user.role) {
        return Err(ApiError::forbidden(format!(
            "Role ({}) is not allowed to access this resource",
            user.role
        )));
    }

    Ok(next.run(request).await)
}
