pub mod coerce;
pub mod files;
pub mod gateway;
pub mod store;

pub use coerce::{decode_state, DecodeError};
pub use files::{atomic_write, ensure_dir, find_local_data_dir, read_file, DATA_DIR_NAME};
pub use gateway::{Gateway, SaveOutcome, DEFAULT_STORAGE_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore};
