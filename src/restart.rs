// restart.rs
//
// Deferred restart after a configuration change and the hold-to-reset
// button. The restart delay is best effort: it gives an in-flight response a
// chance to reach the client, nothing more.

use tokio::time::Instant;

use crate::*;

/// Time between a configuration change and the restart that applies it.
pub const RESTART_DELAY: Duration = Duration::from_millis(6000);

/// How often the supervisor looks at the schedule and the button.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Button ticks to hold before a factory reset happens.
pub const CONFIG_RESET_COUNT: i32 = 9;
pub const RESET_TICK: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestartSchedule {
    deadline: Option<Instant>,
}

impl RestartSchedule {
    /// Arm a restart `delay` after `now`. An earlier pending deadline wins.
    pub fn arm_at(&mut self, now: Instant, delay: Duration) {
        let deadline = now + delay;
        self.deadline = Some(match self.deadline {
            Some(d) if d <= deadline => d,
            _ => deadline,
        });
    }

    pub fn arm(&mut self, delay: Duration) {
        self.arm_at(Instant::now(), delay);
    }

    pub fn pending(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(d) if now >= d)
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

pub trait SystemControl {
    fn restart(&mut self);
}

pub trait ResetButton {
    fn is_pressed(&self) -> bool;
}

/// Poll for a due restart or a held reset button until the system restarts.
pub async fn supervise<B, R, S>(
    state: Arc<Pin<Box<DeviceState<B>>>>,
    button: R,
    system: &mut S,
) -> anyhow::Result<()>
where
    B: Backing,
    R: ResetButton,
    S: SystemControl,
{
    loop {
        sleep(POLL_INTERVAL).await;

        if state.restart.read().await.is_due(Instant::now()) {
            info!("Scheduled restart is due, restarting.");
            system.restart();
            return Ok(());
        }

        if button.is_pressed() && Box::pin(reset_button(&state, &button)).await? {
            system.restart();
            return Ok(());
        }
    }
}

// Returns true once the button was held long enough and the defaults are
// back in place.
async fn reset_button<B, R>(state: &Arc<Pin<Box<DeviceState<B>>>>, button: &R) -> anyhow::Result<bool>
where
    B: Backing,
    R: ResetButton,
{
    let mut reset_cnt = CONFIG_RESET_COUNT;

    while button.is_pressed() {
        error!("Reset? {reset_cnt}");

        if reset_cnt == 0 {
            error!("Factory resetting...");
            state.config.write().await.factory_reset()?;
            sleep(Duration::from_millis(2000)).await;
            return Ok(true);
        }

        reset_cnt -= 1;
        sleep(RESET_TICK).await;
    }
    info!("Reset button released, reset cancelled.");
    Ok(false)
}


// EOF
