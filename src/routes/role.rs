use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tracing::info;
use utoipa::OpenApi;

use crate::{
    models::{
        dto::{Message, RolePayload},
        Error, Role, RoleEntity,
    },
    AppState,
};

use super::middlewares::{admin_guard, auth_guard, csrf_guard};

/// Defines the OpenAPI spec for role endpoints
#[derive(OpenApi)]
#[openapi(paths(
    list_roles_handler,
    get_role_handler,
    get_role_by_name_handler,
    create_role_handler,
    update_role_handler,
    delete_role_handler
))]
pub struct RolesApi;

/// Used to group role endpoints together in the OpenAPI documentation
pub const ROLE_API_GROUP: &str = "ROLE";

/// Builds a router for role routes. Reads need a session, writes need the admin role.
pub fn role_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let read = Router::new()
        .route("/", get(list_roles_handler))
        .route("/:id", get(get_role_handler))
        .route("/name/:name", get(get_role_by_name_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let admin = Router::new()
        .route("/", post(create_role_handler))
        .route("/:id", put(update_role_handler).delete(delete_role_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), csrf_guard))
        .route_layer(middleware::from_fn(admin_guard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    read.merge(admin)
}

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = ROLE_API_GROUP,
    responses(
        (status = 200, description = "All roles", body = [RoleEntity]),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn list_roles_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoleEntity>>, Error> {
    Ok(Json(state.db.get_all_roles().await?))
}

#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = ROLE_API_GROUP,
    params(
        ("id" = i64, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role found", body = RoleEntity),
        (status = 404, description = "Role not found", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn get_role_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<RoleEntity>, Error> {
    let role = state.db.get_role_by_id(id).await?;
    let role = role.ok_or((StatusCode::NOT_FOUND, "Role not found"))?;
    Ok(Json(role))
}

#[utoipa::path(
    get,
    path = "/api/roles/name/{name}",
    tag = ROLE_API_GROUP,
    params(
        ("name" = String, Path, description = "Role name, surrounding whitespace ignored")
    ),
    responses(
        (status = 200, description = "Role found", body = RoleEntity),
        (status = 404, description = "Role not found", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn get_role_by_name_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<RoleEntity>, Error> {
    let role = state.db.get_role_by_name(name.trim()).await?;
    let role = role.ok_or((StatusCode::NOT_FOUND, "Role not found"))?;
    Ok(Json(role))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    tag = ROLE_API_GROUP,
    request_body = RolePayload,
    responses(
        (status = 201, description = "Role successfully created", body = RoleEntity),
        (status = 400, description = "Blank role name", body = Message),
        (status = 409, description = "Role already exists", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn create_role_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RolePayload>,
) -> Result<impl IntoResponse, Error> {
    let name = role_name(&body)?;
    if state.db.get_role_by_name(name).await?.is_some() {
        return Err(Error::new(StatusCode::CONFLICT, "Role already exists"));
    }
    let role = state.db.create_role(name).await?;
    info!(id = role.id, name = %role.name, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = ROLE_API_GROUP,
    request_body = RolePayload,
    params(
        ("id" = i64, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role successfully renamed", body = RoleEntity),
        (status = 400, description = "Blank role name", body = Message),
        (status = 404, description = "Role not found", body = Message),
        (status = 409, description = "Name taken or built-in role", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn update_role_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<RolePayload>,
) -> Result<Json<RoleEntity>, Error> {
    let name = role_name(&body)?;
    let existing = state
        .db
        .get_role_by_id(id)
        .await?
        .ok_or((StatusCode::NOT_FOUND, "Role not found"))?;
    if existing.name == name {
        return Ok(Json(existing));
    }
    ensure_custom(&existing)?;
    if state.db.get_role_by_name(name).await?.is_some() {
        return Err(Error::new(StatusCode::CONFLICT, "Role already exists"));
    }

    let role = state
        .db
        .update_role(id, name)
        .await?
        .ok_or((StatusCode::NOT_FOUND, "Role not found"))?;
    info!(id, from = %existing.name, to = %role.name, "role renamed");
    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    tag = ROLE_API_GROUP,
    params(
        ("id" = i64, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role successfully deleted", body = Message),
        (status = 404, description = "Role not found", body = Message),
        (status = 409, description = "Built-in role", body = Message),
    ),
    security(
        ("sessionCookie" = [])
    )
)]
pub async fn delete_role_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, Error> {
    let existing = state
        .db
        .get_role_by_id(id)
        .await?
        .ok_or((StatusCode::NOT_FOUND, "Role not found"))?;
    ensure_custom(&existing)?;
    state.db.delete_role(id).await?;
    info!(id, name = %existing.name, "role deleted");
    Ok(Json(Message::new("Role deleted successfully")))
}

fn role_name(body: &RolePayload) -> Result<&str, Error> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(Error::new(StatusCode::BAD_REQUEST, "Role name cannot be empty"));
    }
    Ok(name)
}

/// `admin` and `user` back the access checks and stay fixed
fn ensure_custom(role: &RoleEntity) -> Result<(), Error> {
    match Role::parse(&role.name) {
        Some(_) => Err(Error::new(
            StatusCode::CONFLICT,
            "Built-in roles cannot be changed",
        )),
        None => Ok(()),
    }
}
