use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use url::Url;

use crate::{files::FileStore, notify::SmsClient, storage::Store};

mod handlers;
mod models;
mod session;

pub use session::{Session, SessionSigner, SESSION_COOKIE};

use handlers::{
    complete_order, create_order, create_technician, dealer_create_order, delete_order,
    download_photos, health, list_orders, login, logout, not_found, open_installations,
    public_order_summary, public_upload_invoice, serve_invoice, serve_photo, setup, update_order,
    upload_invoice,
};

/// Uploads are completion photo batches; keep headroom over the axum
/// default.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState<S: Store> {
    pub store: S,
    pub files: FileStore,
    pub sms: SmsClient,
    pub signer: SessionSigner,
    pub started_at: std::time::SystemTime,
}

pub fn router<S: Store + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route("/api/setup", post(setup::<S>))
        .route("/api/login", post(login::<S>))
        .route("/api/logout", post(logout::<S>))
        .route("/api/orders", get(list_orders::<S>).post(create_order::<S>))
        .route(
            "/api/orders/open-installations",
            get(open_installations::<S>),
        )
        .route(
            "/api/orders/:job_no",
            put(update_order::<S>).delete(delete_order::<S>),
        )
        .route("/api/orders/:job_no/invoice", post(upload_invoice::<S>))
        .route("/api/orders/:job_no/complete", post(complete_order::<S>))
        .route(
            "/api/orders/:job_no/photos/download",
            get(download_photos::<S>),
        )
        .route("/api/technicians", post(create_technician::<S>))
        .route("/invoices/:name", get(serve_invoice::<S>))
        .route("/photos/:name", get(serve_photo::<S>))
        .route("/u/:token", get(public_order_summary::<S>))
        .route("/u/:token/invoice", post(public_upload_invoice::<S>))
        .route("/dealer/orders", post(dealer_create_order::<S>))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[allow(clippy::too_many_arguments)]
pub async fn serve<S: Store + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    store: S,
    files: FileStore,
    sms_config: Option<crate::notify::SmsConfig>,
    public_base: Url,
    session_secret: String,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let state = AppState {
        store,
        files,
        sms: SmsClient::new(sms_config, public_base)?,
        signer: SessionSigner::new(session_secret),
        started_at: std::time::SystemTime::now(),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
