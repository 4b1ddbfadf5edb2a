use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Json, Router,
};
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::{
    models::{
        dto::{
            AuthStatus, LoginForm, LoginResponse, LogoutForm, Message, UserInfo, SESSION_COOKIE,
        },
        Error,
    },
    security, AppState,
};

use super::middlewares::{auth_guard, resolve_session, session_cookie, Session};

/// Defines the OpenAPI spec for the session endpoints
#[derive(OpenApi)]
#[openapi(paths(login_handler, logout_handler, user_info_handler, check_auth_handler))]
pub struct AuthApi;

pub const AUTH_API_GROUP: &str = "AUTH";

/// Session introspection routes nested under `/api/auth`
pub fn auth_api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let guarded = Router::new()
        .route("/userinfo", get(user_info_handler))
        .route_layer(middleware::from_fn_with_state(state, auth_guard));

    Router::new()
        .route("/check-auth", get(check_auth_handler))
        .merge(guarded)
}

/// JSON clients get a JSON answer from login instead of a redirect
fn wants_json(headers: &HeaderMap) -> bool {
    [header::ACCEPT, header::CONTENT_TYPE].iter().any(|name| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"))
    })
}

fn session_set_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn session_clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

// Login handler function
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_API_GROUP,
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logged in (JSON clients)", body = LoginResponse),
        (status = 303, description = "Logged in, redirected to the landing page"),
        (status = 401, description = "Bad credentials (JSON clients)", body = Message),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, Error> {
    let json = wants_json(&headers);
    let user = match state.db.get_user_by_email(&form.email).await? {
        Some(user) if security::verify_password(&form.password, &user.password_hash) => user,
        _ => {
            warn!(email = %form.email, "failed login attempt");
            if json {
                return Err(Error::new(StatusCode::UNAUTHORIZED, "Bad credentials"));
            }
            return Ok(Redirect::to("/login?error").into_response());
        }
    };

    let csrf = security::new_csrf_token();
    let token = security::issue_session_token(
        &user.email,
        &csrf,
        &state.config.jwt_secret,
        state.config.jwt_maxage_days,
    )?;
    let cookie = [(header::SET_COOKIE, session_set_cookie(&token))];
    info!(email = %user.email, admin = user.is_admin(), "user logged in");

    if json {
        let body = LoginResponse {
            success: true,
            is_admin: user.is_admin(),
        };
        return Ok((cookie, Json(body)).into_response());
    }

    let landing = if user.is_admin() { "/admin" } else { "/user" };
    Ok((cookie, Redirect::to(landing)).into_response())
}

// Logout handler function
#[utoipa::path(
    post,
    path = "/logout",
    tag = AUTH_API_GROUP,
    responses(
        (status = 303, description = "Session cleared, redirected to the login page"),
        (status = 403, description = "CSRF token does not match the session", body = Message),
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LogoutForm>,
) -> Result<Response, Error> {
    let claims = session_cookie(&headers)
        .and_then(|token| security::decode_session_token(&token, &state.config.jwt_secret).ok());

    if let Some(claims) = &claims {
        if state.config.csrf_protection && form.csrf.as_deref() != Some(claims.csrf.as_str()) {
            warn!(email = %claims.sub, "logout rejected, CSRF token mismatch");
            return Err(Error::new(StatusCode::FORBIDDEN, "Invalid CSRF token"));
        }
        info!(email = %claims.sub, "user logged out");
    }

    Ok((
        [(header::SET_COOKIE, session_clear_cookie())],
        Redirect::to("/login?logout"),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/auth/userinfo",
    tag = AUTH_API_GROUP,
    responses(
        (status = 200, description = "Identity of the session owner", body = UserInfo),
        (status = 401, description = "No valid session", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn user_info_handler(Extension(session): Extension<Session>) -> Json<UserInfo> {
    Json(UserInfo::from(session.user))
}

#[utoipa::path(
    get,
    path = "/api/auth/check-auth",
    tag = AUTH_API_GROUP,
    responses(
        (status = 200, description = "Whether the caller holds a valid session", body = AuthStatus),
    )
)]
pub async fn check_auth_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AuthStatus>, Error> {
    let status = match resolve_session(&state, &headers).await? {
        Some(session) => auth_status(session),
        None => AuthStatus::default(),
    };
    Ok(Json(status))
}

fn auth_status(session: Session) -> AuthStatus {
    AuthStatus {
        authenticated: true,
        username: Some(session.user.email),
        authorities: session
            .user
            .roles
            .iter()
            .map(|role| format!("ROLE_{}", role.to_uppercase()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn json_detected_from_accept_or_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!wants_json(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(wants_json(&headers));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = session_clear_cookie();
        assert!(cookie.starts_with("SESSION=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn authorities_carry_role_prefix() {
        let session = Session {
            user: crate::models::User {
                email: "ann@example.com".to_string(),
                roles: vec!["admin".to_string(), "user".to_string()],
                ..Default::default()
            },
            csrf: String::new(),
        };
        let status = auth_status(session);
        assert!(status.authenticated);
        assert_eq!(status.username.as_deref(), Some("ann@example.com"));
        assert_eq!(status.authorities, vec!["ROLE_ADMIN", "ROLE_USER"]);

        let anonymous = serde_json::to_value(AuthStatus::default()).unwrap();
        assert_eq!(anonymous, serde_json::json!({ "authenticated": false }));
    }
}
