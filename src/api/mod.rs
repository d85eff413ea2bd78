pub mod envelope;

pub use envelope::{ensure_success, item_data, ListEnvelope, ListResult, PageInfo, PageMeta};
