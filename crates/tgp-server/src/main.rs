use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use tgp_api::middleware::{require_auth, require_capability};
use tgp_api::storage::DocumentStore;
use tgp_api::{AppState, AppStateInner, applications, auth, comments};
use tgp_db::Database;
use tgp_types::role::Capability;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tgp=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("TGP_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: TGP_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let db_path = std::env::var("TGP_DB_PATH").unwrap_or_else(|_| "tgp.db".into());
    let upload_dir: PathBuf = std::env::var("TGP_UPLOAD_DIR")
        .unwrap_or_else(|_| "./uploads".into())
        .into();
    let host = std::env::var("TGP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("TGP_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()?;

    // Init database and document storage
    let db = Database::open(Path::new(&db_path))?;
    let docs = DocumentStore::new(upload_dir.clone()).await?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        docs,
    });

    // Routes, gated by the capability table
    let public_routes = Router::new()
        .route("/api/auth/signup/{role}", post(auth::signup))
        .route("/api/auth/login/{role}", post(auth::login))
        .with_state(state.clone());

    let applicant_routes = Router::new()
        .route("/api/applications", post(applications::submit))
        .layer(DefaultBodyLimit::max(512 * 1024))
        .layer(from_fn_with_state(
            Capability::SubmitApplication,
            require_capability,
        ))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let reviewer_routes = Router::new()
        .route("/api/applications/submitted", get(applications::list_submitted))
        .route("/api/applications/approved", get(applications::list_approved))
        .route("/api/applications/{id}", get(applications::get_application))
        .route("/api/applications/{id}/approve", post(applications::approve))
        .route("/api/applications/{id}/reject", post(applications::reject))
        .layer(from_fn_with_state(
            Capability::ReviewApplications,
            require_capability,
        ))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let discussion_routes = Router::new()
        .route("/api/applications/{id}/comments", get(comments::list_comments))
        .route("/api/applications/{id}/comments", post(comments::add_comment))
        .route(
            "/api/applications/{id}/comments/count",
            get(comments::count_comments),
        )
        .route("/api/comments/{id}", put(comments::edit_comment))
        .route("/api/comments/{id}", delete(comments::delete_comment))
        .layer(from_fn_with_state(Capability::Discuss, require_capability))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .route("/", get(|| async { "TGP Backend API Running" }))
        .merge(public_routes)
        .merge(applicant_routes)
        .merge(reviewer_routes)
        .merge(discussion_routes)
        .nest_service("/files", ServeDir::new(upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("TGP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
