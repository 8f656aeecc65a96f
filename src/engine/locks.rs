use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use super::errors::EngineError;

/// One async mutex per order id.
///
/// Mutations on the same order queue up; different orders never block each
/// other. Waiting longer than the configured budget aborts the operation.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

pub struct KeyedGuard {
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: Uuid, timeout: Duration) -> Result<KeyedGuard, EngineError> {
        let lock = {
            let mut locks = self.locks.lock();
            // Drop entries nobody holds or waits on
            if locks.len() > 1024 {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(key).or_default().clone()
        };

        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(KeyedGuard { _guard: guard }),
            Err(_) => {
                tracing::warn!(order_id = %key, timeout_ms = timeout.as_millis(), "Timed out waiting for order lock");
                Err(EngineError::ConcurrencyConflict { order_id: key })
            }
        }
    }
}
