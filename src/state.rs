// state.rs

use crate::*;

/// Everything the running device shares between its tasks. There is one of
/// these, built in `main` and passed around by handle.
pub struct DeviceState<B: Backing> {
    pub config: RwLock<SensorConfig<B>>,
    pub restart: RwLock<RestartSchedule>,
}

impl<B: Backing> DeviceState<B> {
    pub fn new(config: SensorConfig<B>) -> Self {
        Self {
            config: RwLock::new(config),
            restart: RwLock::new(RestartSchedule::default()),
        }
    }

    /// Arrange for the system to restart once [`RESTART_DELAY`] has passed.
    pub async fn schedule_restart(&self) {
        self.restart.write().await.arm(RESTART_DELAY);
        info!("Restart scheduled in {} ms", RESTART_DELAY.as_millis());
    }

    /// Run `change` against the configuration and schedule a restart when it
    /// actually wrote something.
    pub async fn reconfigure<F>(&self, change: F) -> Result<Outcome, StoreError>
    where
        F: FnOnce(&mut SensorConfig<B>) -> Result<Outcome, StoreError>,
    {
        let outcome = change(&mut *self.config.write().await)?;
        if outcome == Outcome::Written {
            self.schedule_restart().await;
        }
        Ok(outcome)
    }
}


// EOF
