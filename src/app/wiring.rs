use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::{context, files, storage};

pub fn init_data_dir(ctx: &context::Context) -> Result<()> {
    let data_dir = PathBuf::from(&ctx.config.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    Ok(())
}

pub fn init_store(ctx: &context::Context) -> Result<storage::SqliteStore> {
    let db_path = PathBuf::from(&ctx.config.data_dir).join("fieldops.sqlite");
    let store = storage::SqliteStore::new(&db_path);
    if ctx.config.reset {
        store.reset_all().context("resetting storage")?;
    }
    store.init().context("initializing storage")?;
    Ok(store)
}

pub fn init_file_store(ctx: &context::Context) -> Result<files::FileStore> {
    let file_store = files::FileStore::new(&ctx.config.data_dir);
    file_store.init().context("initializing upload dirs")?;
    Ok(file_store)
}
