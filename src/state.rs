use std::sync::Arc;

use actix_web::web;
use failsafe::backoff::EqualJittered;
use failsafe::failure_policy::{ConsecutiveFailures, OrElse, SuccessRateOverTimeWindow};
use failsafe::{CircuitBreaker, Config, StateMachine};
use log::warn;

use crate::error::ApiError;
use crate::store::{Store, StoreError};

type CircuitBreakerType = StateMachine<
    OrElse<SuccessRateOverTimeWindow<EqualJittered>, ConsecutiveFailures<EqualJittered>>,
    (),
>;

/// Shared by every worker: the store plus the circuit breaker guarding it.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    circuit_breaker: CircuitBreakerType,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let circuit_breaker = Config::new().build();
        AppState {
            store,
            circuit_breaker,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Runs one read on the blocking pool, through the breaker. Only outages
    /// count as breaker failures.
    pub async fn run<R, F>(&self, f: F) -> Result<R, ApiError>
    where
        R: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<R, StoreError> + Send + 'static,
    {
        self.call(StoreError::is_outage, f).await
    }

    /// Runs one write. A refused write is reported to the client and never
    /// counts against the breaker, but an open breaker still refuses it.
    pub async fn run_write<R, F>(&self, f: F) -> Result<R, ApiError>
    where
        R: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<R, StoreError> + Send + 'static,
    {
        self.call(|_: &StoreError| false, f).await
    }

    async fn call<R, F>(&self, counts: fn(&StoreError) -> bool, f: F) -> Result<R, ApiError>
    where
        R: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<R, StoreError> + Send + 'static,
    {
        let store = self.store.clone();
        let circuit_breaker = self.circuit_breaker.clone();
        let result = web::block(move || circuit_breaker.call_with(counts, || f(store.as_ref())))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        match result {
            Ok(value) => Ok(value),
            Err(failsafe::Error::Rejected) => {
                //store has been failing, don't hit it until the breaker closes
                warn!("Circuit breaker rejected store call");
                Err(ApiError::Unavailable)
            }
            Err(failsafe::Error::Inner(e)) => Err(ApiError::Storage(e)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::MemoryStore;

    #[actix_web::test]
    async fn refused_writes_should_not_open_breaker() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone());
        store.set_failing(true);

        for _ in 0..20 {
            let result = state.run_write(|s| s.insert_ingredients(&[])).await;
            assert!(matches!(result, Err(ApiError::Storage(_))), "got {:?}", result);
        }

        store.set_failing(false);
        assert!(state.run(|s| s.count_ingredients()).await.is_ok());
    }

    #[actix_web::test]
    async fn repeated_outages_should_open_breaker() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone());
        store.set_failing(true);

        let mut rejected = false;
        for _ in 0..20 {
            match state.run(|s| s.count_ingredients()).await {
                Err(ApiError::Storage(_)) => {}
                Err(ApiError::Unavailable) => {
                    rejected = true;
                    break;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(rejected);

        store.set_failing(false);
        let result = state.run(|s| s.count_ingredients()).await;
        assert!(matches!(result, Err(ApiError::Unavailable)), "got {:?}", result);
    }

    #[test]
    fn only_outages_should_count_as_failures() {
        assert!(StoreError::Unavailable("down".to_string()).is_outage());
        assert!(!StoreError::Malformed("bad id".to_string()).is_outage());
        assert!(!StoreError::Query(diesel::result::Error::NotFound).is_outage());
    }
}
