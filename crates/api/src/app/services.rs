use std::sync::Arc;

use stocktrail_store::{InventoryStore, MemoryStore};

#[cfg(feature = "postgres")]
use stocktrail_store::PgStore;

/// Shared per-process services injected into handlers via `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn InventoryStore>,
}

/// Wire the storage backend.
///
/// With the `postgres` feature and `DATABASE_URL` set, connects to Postgres
/// and runs migrations; otherwise (or if the connection fails) the in-memory
/// store is used.
pub async fn build_services() -> AppServices {
    #[cfg(feature = "postgres")]
    if let Ok(url) = std::env::var("DATABASE_URL") {
        match PgStore::connect(&url).await {
            Ok(store) => {
                tracing::info!("using postgres store");
                return AppServices {
                    store: Arc::new(store),
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "postgres unavailable, falling back to in-memory");
            }
        }
    }

    AppServices {
        store: Arc::new(MemoryStore::new()),
    }
}
