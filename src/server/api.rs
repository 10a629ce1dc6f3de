use crate::cli::ServeArgs;
use crate::models::relay::ReplyBody;
use super::relay::{ Relay, RelayError };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    routing::post,
    Router,
    extract::{ DefaultBodyLimit, State },
    Json,
};
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error };

#[derive(Clone)]
pub struct AppState {
    relay: Arc<Relay>,
}

impl AppState {
    pub fn new(relay: Arc<Relay>) -> Self {
        Self { relay }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/message", post(message_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: SocketAddr,
    state: AppState,
    args: &ServeArgs,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = router(state);

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("TLS enabled without cert/key".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Relay listening on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind relay to {}: {}. Try a different port.", addr, e);
            e
        })?;
        info!("Relay listening on: http://{}", addr);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

/// The body is read raw and unbounded so that every failure lands in the JSON error contract.
async fn message_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ReplyBody>, RelayError> {
    match state.relay.handle(&body).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            match &e {
                RelayError::Validation => warn!("Rejected empty message"),
                RelayError::Upstream(detail) => error!("Relay failed: {}", detail),
            }
            Err(e)
        }
    }
}
