pub mod error;
pub mod record;
pub mod store;
pub mod util;

pub use error::{ErrorKind, StoreError};
pub use record::{Document, Record, RecordId};
pub use store::{RecordStore, StoreFactory, StoreFuture};
pub use util::now_ms;
