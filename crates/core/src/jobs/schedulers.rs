use std::collections::HashMap;
use std::sync::Arc;

use super::ports::JobScheduler;
use crate::constants::DEFAULT_SCHEDULER_NAME;
use crate::errors::{SecureCacheError, SecureCacheResult};

/// Named schedulers available to `enqueue_at` and recurring registration.
#[derive(Clone, Default)]
pub struct Schedulers {
    by_name: HashMap<String, Arc<dyn JobScheduler>>,
}

impl std::fmt::Debug for Schedulers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("Schedulers").field("names", &names).finish()
    }
}

impl Schedulers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding a single scheduler under the default name.
    pub fn single(scheduler: Arc<dyn JobScheduler>) -> Self {
        Self::new().with(DEFAULT_SCHEDULER_NAME, scheduler)
    }

    pub fn with(mut self, name: impl Into<String>, scheduler: Arc<dyn JobScheduler>) -> Self {
        self.by_name.insert(name.into(), scheduler);
        self
    }

    pub fn get(&self, name: &str) -> SecureCacheResult<Arc<dyn JobScheduler>> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| SecureCacheError::config(format!("no scheduler named '{name}'")))
    }

    pub fn default_scheduler(&self) -> SecureCacheResult<Arc<dyn JobScheduler>> {
        self.get(DEFAULT_SCHEDULER_NAME)
    }
}
