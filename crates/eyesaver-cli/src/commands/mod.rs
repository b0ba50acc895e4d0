pub mod config;
pub mod log;
pub mod run;
pub mod stats;
pub mod status;

use chrono::Utc;
use eyesaver_core::timer::ManualTicker;
use eyesaver_core::{Dispatcher, EyeSaver, FileKvStore, KvStore, MemoryKvStore};

/// File store in the data directory. Commands that exist to change stored
/// data use this and fail when it cannot be opened.
pub fn open_store() -> Result<FileKvStore, Box<dyn std::error::Error>> {
    Ok(FileKvStore::open()?)
}

/// File store, or an in-memory one when the data directory is unusable, so
/// the timer still runs without persistence.
pub fn open_store_or_memory() -> Box<dyn KvStore> {
    match FileKvStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!("storage unavailable, running without persistence: {e}");
            Box::new(MemoryKvStore::new())
        }
    }
}

/// Idle app over the file store with silent channels, for one-shot commands.
pub fn open_app() -> Result<EyeSaver, Box<dyn std::error::Error>> {
    let store = open_store()?;
    Ok(EyeSaver::init(
        Box::new(store),
        Dispatcher::default(),
        Box::new(ManualTicker::new()),
        Utc::now(),
    ))
}

/// Fail the command if the last mutation could not be written.
pub fn ensure_persisted(app: &mut EyeSaver) -> Result<(), Box<dyn std::error::Error>> {
    match app.take_persist_error() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
