use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::{debug, warn};

use crate::{
    models::{dto::SESSION_COOKIE, Error, User},
    security, AppState,
};

/// The authenticated caller, inserted into request extensions by [`auth_guard`]
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub csrf: String,
}

pub fn csrf_header() -> HeaderName {
    HeaderName::from_static("x-csrf-token")
}

/// Value of the session cookie, if the request carries a non-empty one
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_owned())
        })
        .next()
}

/// Resolves the session cookie to a user. Anonymous or stale sessions give `None`.
pub async fn resolve_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Session>, Error> {
    let Some(token) = session_cookie(headers) else {
        return Ok(None);
    };
    let claims = match security::decode_session_token(&token, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "rejected session token");
            return Ok(None);
        }
    };
    let user = state.db.get_user_by_email(&claims.sub).await?;
    Ok(user.map(|user| Session {
        user,
        csrf: claims.csrf,
    }))
}

/// Resolves the session cookie to a user, rejecting anonymous requests
pub async fn auth_guard(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let session = resolve_session(&state, req.headers())
        .await?
        .ok_or((StatusCode::UNAUTHORIZED, "User not authenticated"))?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Only lets sessions holding the `admin` role through. Must run after [`auth_guard`].
pub async fn admin_guard(
    Extension(session): Extension<Session>,
    req: Request,
    next: Next,
) -> Result<Response, Error> {
    if !session.user.is_admin() {
        warn!(email = %session.user.email, path = %req.uri().path(), "non-admin access denied");
        return Err(Error::new(StatusCode::FORBIDDEN, "Access denied"));
    }
    Ok(next.run(req).await)
}

/// Checks the anti-forgery header on state-changing requests. Must run after [`auth_guard`].
pub async fn csrf_guard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    req: Request,
    next: Next,
) -> Result<Response, Error> {
    let safe = matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS);
    if state.config.csrf_protection && !safe {
        let provided = req
            .headers()
            .get(csrf_header())
            .and_then(|value| value.to_str().ok());
        if provided != Some(session.csrf.as_str()) {
            warn!(
                email = %session.user.email,
                method = %req.method(),
                path = %req.uri().path(),
                "missing or invalid CSRF token"
            );
            return Err(Error::new(StatusCode::FORBIDDEN, "Invalid CSRF token"));
        }
    }
    Ok(next.run(req).await)
}
