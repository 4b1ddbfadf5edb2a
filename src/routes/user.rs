use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

use crate::{
    database::NewUser,
    models::{
        dto::{Message, UserPatch, UserPayload, UserRecord},
        Error, Role, User,
    },
    security, AppState,
};

use super::middlewares::{admin_guard, auth_guard, csrf_guard, Session};

#[derive(OpenApi)]
#[openapi(paths(
    get_current_user_handler,
    list_users_handler,
    get_user_handler,
    get_user_by_email_handler,
    create_user_handler,
    update_user_handler,
    patch_user_handler,
    delete_user_handler
))]
/// Defines the OpenAPI spec for user endpoints
pub struct UsersApi;

/// Used to group user endpoints together in the OpenAPI documentation
pub const USER_API_GROUP: &str = "USER";

/// Builds a router for all the user routes.
///
/// `/current` only needs a session; everything else needs the admin role, and
/// writes additionally go through the CSRF check.
pub fn user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let current = Router::new()
        .route("/current", get(get_current_user_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let admin = Router::new()
        .route("/", get(list_users_handler).post(create_user_handler))
        .route(
            "/:id",
            get(get_user_handler)
                .put(update_user_handler)
                .patch(patch_user_handler)
                .delete(delete_user_handler),
        )
        .route("/email/:email", get(get_user_by_email_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), csrf_guard))
        .route_layer(middleware::from_fn(admin_guard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    current.merge(admin)
}

// Current user handler function
#[utoipa::path(
    get,
    path = "/api/users/current",
    tag = USER_API_GROUP,
    responses(
        (status = 200, description = "The authenticated user", body = UserRecord),
        (status = 401, description = "No valid session", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn get_current_user_handler(Extension(session): Extension<Session>) -> impl IntoResponse {
    Json(UserRecord::from(session.user))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = USER_API_GROUP,
    responses(
        (status = 200, description = "All users ordered by id", body = [UserRecord]),
        (status = 403, description = "Caller is not an admin", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserRecord>>, Error> {
    let users = state.db.get_all_users().await?;
    Ok(Json(users.into_iter().map(UserRecord::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = USER_API_GROUP,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserRecord),
        (status = 404, description = "User not found", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserRecord>, Error> {
    let user = state.db.get_user_by_id(id).await?;
    let user = user.ok_or((StatusCode::NOT_FOUND, "User not found"))?;
    Ok(Json(UserRecord::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/email/{email}",
    tag = USER_API_GROUP,
    params(
        ("email" = String, Path, description = "Login email")
    ),
    responses(
        (status = 200, description = "User found", body = UserRecord),
        (status = 404, description = "User not found", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn get_user_by_email_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<UserRecord>, Error> {
    let user = state.db.get_user_by_email(email.trim()).await?;
    let user = user.ok_or((StatusCode::NOT_FOUND, "User not found"))?;
    Ok(Json(UserRecord::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = USER_API_GROUP,
    request_body = UserPayload,
    responses(
        (status = 201, description = "User successfully created", body = UserRecord),
        (status = 400, description = "Invalid user data", body = Message),
        (status = 409, description = "Email already taken", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UserPayload>,
) -> Result<impl IntoResponse, Error> {
    let age = validate_user_payload(&body)?;
    let password = new_password(&body)
        .ok_or((StatusCode::BAD_REQUEST, "Password cannot be empty"))?;

    if state.db.get_user_by_email(&body.email).await?.is_some() {
        return Err(Error::new(
            StatusCode::CONFLICT,
            "User with this email already exists",
        ));
    }

    let data = NewUser {
        first_name: body.first_name.clone(),
        last_name: body.last_name.clone(),
        email: body.email.clone(),
        age,
        password_hash: security::hash_password(password)?,
        roles: requested_roles(&body),
    };

    let user = state.db.create_user(&data).await?;
    info!(id = user.id, email = %user.email, "user created");
    Ok((StatusCode::CREATED, Json(UserRecord::from(user))))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = USER_API_GROUP,
    request_body = UserPayload,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User successfully updated", body = UserRecord),
        (status = 400, description = "Invalid user data", body = Message),
        (status = 404, description = "User not found", body = Message),
        (status = 409, description = "Email already taken", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UserPayload>,
) -> Result<Json<UserRecord>, Error> {
    let existing = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or((StatusCode::NOT_FOUND, "User not found"))?;
    let user = save_user(&state, existing, &body).await?;
    info!(id, email = %user.email, "user updated");
    Ok(Json(UserRecord::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = USER_API_GROUP,
    request_body = UserPatch,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User successfully updated", body = UserRecord),
        (status = 400, description = "Invalid user data", body = Message),
        (status = 404, description = "User not found", body = Message),
        (status = 409, description = "Email already taken", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn patch_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserRecord>, Error> {
    let existing = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or((StatusCode::NOT_FOUND, "User not found"))?;
    let body = patch.merge_into(UserPayload::from(UserRecord::from(existing.clone())));
    let user = save_user(&state, existing, &body).await?;
    info!(id, email = %user.email, "user patched");
    Ok(Json(UserRecord::from(user)))
}

/// Validates `body` and writes it over `existing`
async fn save_user(state: &AppState, existing: User, body: &UserPayload) -> Result<User, Error> {
    let age = validate_user_payload(body)?;

    if let Some(other) = state.db.get_user_by_email(&body.email).await? {
        if other.id != existing.id {
            return Err(Error::new(StatusCode::CONFLICT, "Email already exists"));
        }
    }

    // A blank password keeps the stored hash
    let password_hash = match new_password(body) {
        Some(password) => security::hash_password(password)?,
        None => existing.password_hash,
    };

    let user = User {
        id: existing.id,
        first_name: body.first_name.clone(),
        last_name: body.last_name.clone(),
        email: body.email.clone(),
        age,
        password_hash,
        roles: requested_roles(body),
    };

    Ok(state.db.update_user(&user).await?)
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = USER_API_GROUP,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User successfully deleted", body = Message),
        (status = 404, description = "User not found", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, Error> {
    if !state.db.delete_user(id).await? {
        return Err(Error::new(StatusCode::NOT_FOUND, "User not found"));
    }
    info!(id, "user deleted");
    Ok(Json(Message::new("User deleted successfully")))
}

/// Checks the required fields, returning the validated age
fn validate_user_payload(body: &UserPayload) -> Result<i32, Error> {
    if body.first_name.trim().is_empty() {
        return Err(Error::new(StatusCode::BAD_REQUEST, "First name cannot be empty"));
    }
    if body.last_name.trim().is_empty() {
        return Err(Error::new(StatusCode::BAD_REQUEST, "Last name cannot be empty"));
    }
    if body.email.trim().is_empty() {
        return Err(Error::new(StatusCode::BAD_REQUEST, "Email cannot be empty"));
    }
    match body.age {
        Some(age) if age > 0 => Ok(age),
        _ => Err(Error::new(StatusCode::BAD_REQUEST, "Age must be positive")),
    }
}

fn new_password(body: &UserPayload) -> Option<&str> {
    body.password
        .as_deref()
        .filter(|password| !password.trim().is_empty())
}

/// An empty role set falls back to plain `user`
fn requested_roles(body: &UserPayload) -> Vec<String> {
    if body.roles.is_empty() {
        vec![Role::User.as_str().to_owned()]
    } else {
        body.roles.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> UserPayload {
        UserPayload {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            age: Some(30),
            ..Default::default()
        }
    }

    #[test]
    fn validation_rejects_blank_names_and_bad_age() {
        assert_eq!(validate_user_payload(&payload()).unwrap(), 30);

        let blank_name = UserPayload {
            first_name: "  ".to_string(),
            ..payload()
        };
        let err = validate_user_payload(&blank_name).unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.message, "First name cannot be empty");

        for age in [None, Some(0), Some(-3)] {
            let bad_age = UserPayload { age, ..payload() };
            let err = validate_user_payload(&bad_age).unwrap_err();
            assert_eq!(err.body.message, "Age must be positive");
        }
    }

    #[test]
    fn blank_password_counts_as_absent() {
        let blank = UserPayload {
            password: Some("   ".to_string()),
            ..payload()
        };
        assert_eq!(new_password(&blank), None);

        let set = UserPayload {
            password: Some(" pw ".to_string()),
            ..payload()
        };
        assert_eq!(new_password(&set), Some(" pw "));
    }

    #[test]
    fn empty_roles_default_to_user() {
        assert_eq!(requested_roles(&payload()), vec!["user"]);

        let admin = UserPayload {
            roles: vec!["admin".to_string()],
            ..payload()
        };
        assert_eq!(requested_roles(&admin), vec!["admin"]);
    }
}
