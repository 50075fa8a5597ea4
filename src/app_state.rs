// =============================================================================
// Central Application State
// =============================================================================
//
// Read-only after startup: the loaded configuration and the market-data
// provider.  Every request computes its own series and indicator table, so
// nothing here needs a lock.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use crate::market_data::MarketDataProvider;
use crate::runtime_config::RuntimeConfig;

/// State shared across all request handlers via `Arc<AppState>`.
pub struct AppState {
    pub config: RuntimeConfig,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, market_data: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            config,
            market_data,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
