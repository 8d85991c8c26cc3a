//! HTTP server implementation using axum.

use std::net::SocketAddr;

use axum::extract::Extension;
use axum::middleware;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth;
use crate::handlers;
use crate::session::{require_session, Session};
use crate::signals::SpotigoSignals;
use crate::state::AppState;
use crate::views::home_page;

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback));

    let protected = Router::new()
        .route("/", get(serve_home))
        .route("/rpc/get-playing-song", post(handlers::get_playing_song_route))
        .route("/rpc/queue-track", post(handlers::queue_track_route))
        .route("/rpc/add-to-playlist", post(handlers::add_to_playlist_route))
        .route(
            "/rpc/update-selected-song",
            post(handlers::update_selected_song_route),
        )
        .route("/rpc/get-top-songs", post(handlers::get_top_songs_route))
        .route(
            "/rpc/get-detailed-track-info",
            post(handlers::get_detailed_track_info_route),
        )
        .route("/auth/logout", get(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let assets = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/assets", assets)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Serve the page shell.
async fn serve_home(Extension(_session): Extension<Session>) -> Html<String> {
    Html(home_page(&SpotigoSignals::default()))
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn run_server(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Serve on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = create_router(state);

    info!(addr = %listener.local_addr()?, "Starting spotigo web server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
