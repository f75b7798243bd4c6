#[macro_use]
extern crate diesel;

use log::{error, info};

pub mod config;
pub mod error;
pub mod gate;
pub mod memory;
pub mod models;
pub mod query;
pub mod routes;
mod schema;
pub mod seed;
pub mod state;
pub mod store;

use crate::gate::Readiness;
use crate::seed::SeedReport;
use crate::store::{Store, StoreError};

/// Startup sequence: connect, seed (when enabled), then open the gate.
///
/// Runs at most once per readiness flag; a second call on an already ready
/// service does nothing. On a connection failure the gate stays closed and
/// nothing is retried.
pub fn bootstrap(
    store: &dyn Store,
    readiness: &Readiness,
    seed_sample_data: bool,
) -> Result<Option<SeedReport>, StoreError> {
    if readiness.is_ready() {
        return Ok(None);
    }
    if let Err(e) = store.setup() {
        error!("Database connection error: {}", e);
        return Err(e);
    }
    info!("Connected to database");

    let report = if seed_sample_data {
        Some(seed::seed(store))
    } else {
        None
    };
    readiness.mark_ready();
    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::seed::SeedOutcome;

    #[test]
    fn should_seed_once_and_open_gate() {
        let store = MemoryStore::new();
        let readiness = Readiness::new();

        let report = bootstrap(&store, &readiness, true).expect("bootstrap");

        assert!(readiness.is_ready());
        assert_eq!(
            report.map(|r| r.ingredients),
            Some(SeedOutcome::Inserted(3))
        );
        assert_eq!(bootstrap(&store, &readiness, true).expect("again"), None);
        assert_eq!(store.count_ingredients().expect("count"), 3);
    }

    #[test]
    fn connection_failure_should_leave_gate_closed() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let readiness = Readiness::new();

        assert!(bootstrap(&store, &readiness, true).is_err());
        assert!(!readiness.is_ready());
    }

    #[test]
    fn should_skip_seeding_when_disabled() {
        let store = MemoryStore::new();
        let readiness = Readiness::new();

        let report = bootstrap(&store, &readiness, false).expect("bootstrap");

        assert_eq!(report, None);
        assert!(readiness.is_ready());
        assert_eq!(store.count_restaurants().expect("count"), 0);
    }
}
