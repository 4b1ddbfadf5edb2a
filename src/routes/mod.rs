mod auth;
mod health;
pub mod middlewares;
mod pages;
mod role;
mod swagger;
mod user;
use crate::database;
use health::health_checker_handler;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{AppState, Config};

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::error::Error;
use std::sync::Arc;

/// Opens the database, brings the schema and seed data up to date and builds the router
pub async fn make_app(config: Config) -> Result<Router, Box<dyn Error>> {
    info!("Connecting to SQLite...");
    let sqlx_db_connection = database::connect_sqlx(&config.db_url).await?;
    info!("Connected to SQLite!");

    let db = database::Database::new(sqlx_db_connection);
    db.migrate().await?;
    db.seed_defaults().await?;

    let cors = match &config.cors_origin {
        Some(origin) => Some(
            CorsLayer::new()
                .allow_origin(HeaderValue::from_str(origin)?)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_credentials(true)
                .allow_headers([
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    middlewares::csrf_header(),
                ]),
        ),
        None => None,
    };

    let state = Arc::new(AppState { db, config });
    let app = build_router(state);

    Ok(match cors {
        Some(cors) => app.layer(cors),
        None => app,
    })
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(health_checker_handler))
        .route("/api/health", get(health_checker_handler))
        .route("/login", get(pages::login_page).post(auth::login_handler))
        .route("/logout", post(auth::logout_handler))
        .merge(pages::page_routes(state.clone()))
        .nest("/api/auth", auth::auth_api_routes(state.clone()))
        .nest("/api/users", user::user_routes(state.clone()))
        .nest("/api/roles", role::role_routes(state.clone()))
        .merge(swagger::build_documentation())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
