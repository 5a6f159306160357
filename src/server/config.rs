//! Service configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MahjongError, MahjongResult};
use crate::scheduler::SchedulerConfig;

/// Settings shared by every table the service runs. Missing JSON fields
/// take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How often each table checks its deadlines.
    pub tick_ms: u64,

    /// Disconnect time before a bot takes the seat.
    pub grace_ms: u64,

    pub bot_delay_ms: u64,

    /// Pause between a settlement and the next deal.
    pub settle_delay_ms: u64,

    /// Queued commands per table.
    pub inbox_capacity: usize,

    /// Queued messages per observer before messages are dropped.
    pub observer_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tick_ms: 200,
            grace_ms: 15_000,
            bot_delay_ms: 1_000,
            settle_delay_ms: 10_000,
            inbox_capacity: 100,
            observer_capacity: 64,
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    #[must_use]
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::default()
            .with_grace(Duration::from_millis(self.grace_ms))
            .with_bot_delay(Duration::from_millis(self.bot_delay_ms))
            .with_settle_delay(Duration::from_millis(self.settle_delay_ms))
    }

    pub fn validate(&self) -> MahjongResult<()> {
        if self.tick_ms == 0 {
            return Err(MahjongError::Config("tick_ms must be positive".into()));
        }
        if self.inbox_capacity == 0 || self.observer_capacity == 0 {
            return Err(MahjongError::Config(
                "channel capacities must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> MahjongResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> MahjongResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
