//! Values every component needs, built once in `main`

use backup_stream::ErrorCatalog;

use crate::config::Config;
use crate::signals::InterruptFlag;

/// Startup-time context handed to the session driver
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub config: Config,
    pub catalog: ErrorCatalog,
    pub interrupt: InterruptFlag,
}

impl SessionContext {
    pub fn new(config: Config, interrupt: InterruptFlag) -> Self {
        let catalog = config.error_catalog();
        tracing::debug!(codes = catalog.len(), "error catalog built");
        Self {
            config,
            catalog,
            interrupt,
        }
    }
}
