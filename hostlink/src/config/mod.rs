//! Configuration.
//!
//! Re-exports the configuration crate and owns the process-wide
//! snapshot for embedding applications. The redirector and classifier
//! take explicit config values; nothing in the library reads the
//! global behind the caller's back.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

pub use hostlink_config::{Config, Connection, Error, Naming, PackageCriteria, Sql};

static CONFIG: Lazy<ArcSwap<Config>> = Lazy::new(|| ArcSwap::from_pointee(Config::default()));
static LOAD_LOCK: Mutex<()> = Mutex::new(());

/// Current config snapshot.
pub fn config() -> Arc<Config> {
    CONFIG.load_full()
}

/// Replace the process-wide config.
pub fn set(config: Config) {
    CONFIG.store(Arc::new(config));
}

/// Load configuration from disk and install it.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<Config>, Error> {
    let _guard = LOAD_LOCK.lock();
    let config = Config::load(path)?;
    CONFIG.store(Arc::new(config));
    Ok(CONFIG.load_full())
}
