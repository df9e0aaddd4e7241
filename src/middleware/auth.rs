use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{decode_token, Claims};
use crate::config;
use crate::database::dal::{ApiKeyDal, RoleDal, SubscriptionDal, TokenBlocklistDal, UserDal};
use crate::database::models::role::RoleName;
use crate::database::models::user::User;
use crate::error::ApiError;

const ADMIN_ROLES: [RoleName; 2] = [RoleName::Admin, RoleName::SuperAdmin];

/// Authenticated caller resolved from a bearer access token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    /// Name of the user's role, if one is assigned
    pub role: Option<String>,
    pub claims: Claims,
}

impl CurrentUser {
    pub fn user_id(&self) -> Uuid {
        self.user.user_id
    }

    pub fn has_role(&self, allowed: &[RoleName]) -> bool {
        self.role
            .as_deref()
            .is_some_and(|name| allowed.iter().any(|r| r.as_str() == name))
    }

    pub fn require_role(&self, allowed: &[RoleName]) -> Result<(), ApiError> {
        if self.has_role(allowed) {
            Ok(())
        } else {
            Err(ApiError::forbidden("You do not have the required role to access this resource."))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&ADMIN_ROLES)
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_role(&ADMIN_ROLES)
    }

    /// Callers may act on their own records; admins may act on any
    pub fn require_self_or_admin(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.user_id() == user_id {
            return Ok(());
        }
        self.require_admin()
    }
}

/// Caller of a metered endpoint, authenticated by API key or access token
#[derive(Clone, Copy, Debug)]
pub struct MeteredUser {
    pub user_id: Uuid,
}

/// Requires a valid, unrevoked bearer access token and injects [`CurrentUser`]
pub async fn require_jwt(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())?;
    let claims = access_claims(&state, token).await?;

    let user = UserDal::new(state.db.clone())
        .find(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let role = match user.role_id {
        Some(role_id) => RoleDal::new(state.db.clone()).get(role_id).await.ok().map(|r| r.name),
        None => None,
    };

    tracing::debug!("Authenticated user {} (role {:?})", user.user_id, role);
    request.extensions_mut().insert(CurrentUser { user, role, claims });
    Ok(next.run(request).await)
}

/// Accepts `X-API-Key` or a bearer access token, then requires the caller's
/// subscription to hold the configured minimum token balance
pub async fn require_credentials(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = if let Some(value) = request.headers().get("x-api-key") {
        let api_key = value.to_str().map_err(|_| ApiError::unauthorized("Invalid API key."))?;
        let key = ApiKeyDal::new(state.db.clone())
            .find(api_key.trim())
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid API key."))?;
        if key.is_expired(Utc::now()) {
            return Err(ApiError::unauthorized("API key has expired."));
        }
        key.user_id
    } else if request.headers().contains_key("authorization") {
        let token = extract_bearer(request.headers())?;
        access_claims(&state, token).await?.sub
    } else {
        return Err(ApiError::unauthorized("API key is required. Please provide X-API-Key header."));
    };

    let minimum = config::config().agent.min_tokens_required;
    let enough = SubscriptionDal::new(state.db.clone())
        .has_minimum_tokens(user_id, minimum)
        .await?;
    if !enough {
        return Err(ApiError::forbidden(format!(
            "Insufficient tokens. You need at least {} tokens to access this resource.",
            minimum
        )));
    }

    request.extensions_mut().insert(MeteredUser { user_id });
    Ok(next.run(request).await)
}

/// Decode an access token and make sure it was not revoked
async fn access_claims(state: &AppState, token: &str) -> Result<Claims, ApiError> {
    let claims = decode_token(token).map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;
    if claims.refresh {
        return Err(ApiError::forbidden("Please provide an access token"));
    }
    if TokenBlocklistDal::new(state.db.clone()).is_revoked(&claims.jti).await? {
        return Err(ApiError::forbidden("Token has been blacklisted"));
    }
    Ok(claims)
}

/// Extract the token from an `Authorization: Bearer` header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(ApiError::unauthorized("Empty bearer token")),
        None => Err(ApiError::unauthorized("Authorization header must use Bearer token format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")).unwrap(), "abc.def");

        let err = extract_bearer(&headers("Basic abc")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = extract_bearer(&headers("Bearer   ")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = extract_bearer(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.message(), "Missing Authorization header");
    }

    fn current(role: Option<&str>) -> CurrentUser {
        let now = Utc::now();
        let user = User {
            user_id: Uuid::new_v4(),
            email: "ops@example.com".into(),
            phone_number: None,
            otp_code: None,
            otp_expiry: None,
            password_hash: None,
            first_name: "Ops".into(),
            last_name: "Team".into(),
            role_id: None,
            status_active: true,
            is_verified: true,
            created_at: now,
            updated_at: now,
        };
        let claims = Claims::new(&user, chrono::Duration::minutes(5), false);
        CurrentUser { user, role: role.map(str::to_string), claims }
    }

    #[test]
    fn role_checks() {
        assert!(current(Some("admin")).require_admin().is_ok());
        assert!(current(Some("super_admin")).require_admin().is_ok());

        let err = current(Some("user")).require_admin().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(current(None).require_role(&[RoleName::User]).is_err());
    }

    #[test]
    fn self_or_admin() {
        let user = current(Some("user"));
        assert!(user.require_self_or_admin(user.user_id()).is_ok());

        let err = user.require_self_or_admin(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(current(Some("admin")).require_self_or_admin(Uuid::new_v4()).is_ok());
    }
}
