//! Experiment registry.
//!
//! An explicitly constructed, injected registry owning its own lock,
//! populated at process startup and read-mostly afterwards. Admin status
//! changes swap the stored experiment atomically under the write lock so a
//! reader never observes a half-updated variant list.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use crate::errors::SearchError;
use crate::experiments::{stock_experiments, Experiment, ExperimentStatus};

/// Registry of search experiments.
pub struct ExperimentRegistry {
    experiments: RwLock<HashMap<String, Arc<Experiment>>>,
}

impl ExperimentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            experiments: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry pre-populated with the stock experiments.
    pub fn with_stock_experiments() -> Self {
        let registry = Self::new();
        for experiment in stock_experiments() {
            if let Err(e) = registry.register(experiment) {
                warn!(error = %e, "Failed to register stock experiment");
            }
        }
        registry
    }

    /// Register an experiment, validating its variant weights. Replaces any
    /// experiment already registered under the same id.
    pub fn register(&self, experiment: Experiment) -> Result<(), SearchError> {
        experiment
            .validate()
            .map_err(SearchError::experiment_config)?;

        let id = experiment.id.clone();
        let name = experiment.name.clone();
        let replaced = self
            .write_lock()
            .insert(id.clone(), Arc::new(experiment))
            .is_some();

        if replaced {
            warn!(experiment_id = %id, "Replaced existing experiment registration");
        } else {
            info!(experiment_id = %id, name = %name, "Registered experiment");
        }
        Ok(())
    }

    /// Look up an experiment by id.
    pub fn get(&self, experiment_id: &str) -> Option<Arc<Experiment>> {
        self.read_lock().get(experiment_id).cloned()
    }

    /// All registered experiments, in unspecified order.
    pub fn list(&self) -> Vec<Arc<Experiment>> {
        self.read_lock().values().cloned().collect()
    }

    /// Apply an admin status change, validating the transition.
    ///
    /// The stored experiment is replaced in one step under the write lock.
    pub fn set_status(
        &self,
        experiment_id: &str,
        status: ExperimentStatus,
    ) -> Result<(), SearchError> {
        let mut experiments = self.write_lock();

        let current = experiments.get(experiment_id).ok_or_else(|| {
            SearchError::experiment_config(format!("unknown experiment '{}'", experiment_id))
        })?;

        if !current.status.can_transition_to(status) {
            return Err(SearchError::experiment_config(format!(
                "experiment '{}' cannot move from {:?} to {:?}",
                experiment_id, current.status, status
            )));
        }

        let mut updated = (**current).clone();
        updated.status = status;
        experiments.insert(experiment_id.to_string(), Arc::new(updated));

        info!(experiment_id = %experiment_id, status = ?status, "Experiment status changed");
        Ok(())
    }

    // A poisoned lock only means a writer panicked mid-insert; the map
    // itself is still the last consistent state, so readers continue.
    fn read_lock(
        &self,
    ) -> RwLockReadGuard<'_, HashMap<String, Arc<Experiment>>> {
        self.experiments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(
        &self,
    ) -> RwLockWriteGuard<'_, HashMap<String, Arc<Experiment>>> {
        self.experiments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ExperimentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
