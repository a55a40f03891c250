use thiserror::Error;

use crate::types::{Order, Technician};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write (job number or username).
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait StoreRead {
    fn find_order(&self, job_no: &str) -> StoreResult<Option<Order>>;
    /// All orders, newest first.
    fn list_orders(&self) -> StoreResult<Vec<Order>>;
    /// Installation orders not yet completed, most urgent first and
    /// newest first within the same priority.
    fn list_open_installations(&self) -> StoreResult<Vec<Order>>;
    fn find_technician(&self, username: &str) -> StoreResult<Option<Technician>>;
    fn count_admins(&self) -> StoreResult<u64>;
}

pub trait StoreWrite {
    fn insert_order(&self, order: &Order) -> StoreResult<()>;
    /// Replaces the whole document identified by `order.job_no`.
    fn update_order(&self, order: &Order) -> StoreResult<()>;
    /// Returns whether a document was actually removed.
    fn delete_order(&self, job_no: &str) -> StoreResult<bool>;
    fn insert_technician(&self, technician: &Technician) -> StoreResult<()>;
}

pub trait Store: StoreRead + StoreWrite {}

impl<T: StoreRead + StoreWrite> Store for T {}
