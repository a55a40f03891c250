mod job_no;
mod order;
mod technician;

pub use job_no::{job_no_to_token, random_job_no, token_to_job_no};
pub use order::{
    normalize_text, Completion, FileEntry, MountType, Order, OrderDraft, OrderUpdate, Priority,
};
pub use technician::{normalize_password, Technician, ADMIN_LEVEL, CREATABLE_LEVELS};
