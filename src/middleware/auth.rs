use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    dto::auth::{Claims, SessionUser},
    error::AppError,
    models::Role,
    state::AppState,
};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<SessionUser> for AuthUser {
    fn from(user: SessionUser) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Signing material for session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user: &SessionUser) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AppError> {
        let decoded = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::Unauthorized)?;
        let claims = decoded.claims;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| AppError::Unauthorized)?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            name: claims.name,
            role,
        })
    }
}

pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_seconds}")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Bearer header first, then the session cookie.
fn session_token(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = value.to_str().map_err(|_| AppError::Unauthorized)?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();
        return Ok(Some(token.to_string()));
    }

    let token = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string());
    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let token = session_token(parts)?.ok_or(AppError::Unauthorized)?;
        state.sessions.verify(&token)
    }
}

/// Absent credentials yield `None`; present but invalid credentials still reject.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match session_token(parts)? {
            Some(token) => state.sessions.verify(&token).map(Some),
            None => Ok(None),
        }
    }
}

/// Route guard for the admin surface.
pub async fn require_admin(
    user: AuthUser,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    ensure_admin(&user)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn session_user(role: Role) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "grower@example.com".into(),
            name: "Grower".into(),
            role,
        }
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let keys = SessionKeys::new("test-secret", 1);
        let user = session_user(Role::Admin);
        let token = keys.issue(&user).expect("token");
        let auth = keys.verify(&token).expect("verify");
        assert_eq!(auth, AuthUser::from(user));
        assert!(auth.is_admin());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = SessionKeys::new("one", 1)
            .issue(&session_user(Role::User))
            .expect("token");
        let err = SessionKeys::new("two", 1).verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn non_admin_fails_admin_check() {
        let user = AuthUser::from(session_user(Role::User));
        assert!(matches!(ensure_admin(&user), Err(AppError::Unauthorized)));
    }

    #[test]
    fn token_is_read_from_cookie_or_bearer() {
        let (parts, _) = HttpRequest::builder()
            .header(header::COOKIE, "theme=dark; session=abc.def.ghi")
            .body(())
            .expect("request")
            .into_parts();
        assert_eq!(session_token(&parts).expect("ok").as_deref(), Some("abc.def.ghi"));

        let (parts, _) = HttpRequest::builder()
            .header(header::AUTHORIZATION, "Bearer xyz")
            .body(())
            .expect("request")
            .into_parts();
        assert_eq!(session_token(&parts).expect("ok").as_deref(), Some("xyz"));

        let (parts, _) = HttpRequest::builder()
            .header(header::AUTHORIZATION, "Basic xyz")
            .body(())
            .expect("request")
            .into_parts();
        assert!(session_token(&parts).is_err());

        let (parts, _) = HttpRequest::builder().body(()).expect("request").into_parts();
        assert_eq!(session_token(&parts).expect("ok"), None);
    }
}
