mod app;
mod cli;
mod configuration;
mod context;
mod files;
mod notify;
mod rest;
mod storage;
mod tracing;
mod types;

use dotenvy::dotenv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    app::run().await
}
