mod wiring;

use std::path::Path;

use anyhow::{Context as AnyhowContext, Result};
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;

use crate::{cli, context, files, rest, storage};

pub struct App {
    pub ctx: context::Context,
    pub store: storage::SqliteStore,
    pub files: files::FileStore,
    _log_guard: Option<WorkerGuard>,
}

impl App {
    pub fn from_cli() -> Result<Self> {
        let cli = cli::parse();
        let ctx = context::Context::from_cli(&cli)?;

        let log_guard = crate::tracing::init(ctx.config.log_file.as_deref().map(Path::new));
        log::info!("🚀 Starting fieldops");
        log::info!("📂 Data dir: {}", ctx.config.data_dir);
        log::info!("🔗 Public base URL: {}", ctx.config.public_base);
        log::info!(
            "✉️ SMS gateway: {}",
            if ctx.config.sms.is_some() {
                "configured"
            } else {
                "disabled"
            }
        );
        if let Some(path) = ctx.config.log_file.as_deref() {
            log::info!("📝 Log file: {}", path);
        }

        wiring::init_data_dir(&ctx).context("initializing data dir")?;
        let store = wiring::init_store(&ctx)?;
        let files = wiring::init_file_store(&ctx)?;

        Ok(Self {
            ctx,
            store,
            files,
            _log_guard: log_guard,
        })
    }
}

pub async fn run_daemon(app: App) -> Result<()> {
    let shutdown = CancellationToken::new();

    let addr = app.ctx.config.listen;
    let store = app.store.clone();
    let files = app.files.clone();
    let sms_config = app.ctx.config.sms.clone();
    let public_base = app.ctx.config.public_base.clone();
    let session_secret = app.ctx.config.session_secret.clone();
    let rest_shutdown = shutdown.clone();

    let mut rest_handle = tokio::spawn(async move {
        if let Err(e) = rest::serve(
            addr,
            store,
            files,
            sms_config,
            public_base,
            session_secret,
            rest_shutdown,
        )
        .await
        {
            log::error!("REST server error: {}", e);
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("🧨 Ctrl-C received, shutting down");
        }
        _ = &mut rest_handle => {
            return Err(anyhow::anyhow!("REST server exited unexpectedly"));
        }
    }

    shutdown.cancel();
    rest_handle.await.context("joining REST server")?;

    log::info!("✅ Shutdown complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let app = App::from_cli()?;
    run_daemon(app).await
}
