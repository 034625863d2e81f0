use std::time::Duration;

use pipeflow_core::{AnimationTable, GridSize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest row or column count for which start and end placement always
/// succeeds.
pub const MINIMUM_GRID_EDGE: u32 = 3;

/// Largest row or column count a grid may have, generated or hand-authored.
pub const MAXIMUM_GRID_EDGE: u32 = 256;

/// Tunable parameters of a play session.
///
/// Durations are expressed in whole milliseconds when serialized so the
/// configuration reads naturally from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of grid rows.
    pub rows: u32,
    /// Number of grid columns.
    pub columns: u32,
    /// Countdown granted on the first stage.
    #[serde(rename = "stage_duration_ms", with = "millis")]
    pub stage_duration: Duration,
    /// Amount the countdown shrinks with every cleared stage.
    #[serde(rename = "stage_duration_step_ms", with = "millis")]
    pub stage_duration_step: Duration,
    /// Floor the countdown never shrinks below.
    #[serde(rename = "minimum_stage_duration_ms", with = "millis")]
    pub minimum_stage_duration: Duration,
    /// Interval between two animation frames.
    #[serde(rename = "flow_step_ms", with = "millis")]
    pub flow_step: Duration,
    /// Score every new game begins with.
    pub initial_score: i64,
    /// Points deducted for every placed pipe.
    pub placement_cost: i64,
    /// Points awarded whenever flow enters a pipe.
    pub hop_bonus: i64,
    /// Points awarded when flow reaches the end piece.
    pub win_bonus: i64,
    /// Number of shapes held by the piece queue, the current one included.
    pub queue_length: usize,
    /// Starts playing immediately instead of waiting for the new-game button.
    pub skip_lobby: bool,
    /// Frame counts of every animated piece.
    pub animations: AnimationTable,
}

impl SessionConfig {
    /// Configuration for the short-fuse variant: a fixed five
    /// second countdown, no stage shortening and no lobby.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            stage_duration: Duration::from_secs(5),
            stage_duration_step: Duration::ZERO,
            minimum_stage_duration: Duration::from_secs(5),
            skip_lobby: true,
            ..Self::default()
        }
    }

    /// Dimensions of the generated grid.
    #[must_use]
    pub const fn grid_size(&self) -> GridSize {
        GridSize::new(self.rows, self.columns)
    }

    /// Countdown for the zero-based `stage` before any banked time is added.
    ///
    /// The duration shrinks by [`SessionConfig::stage_duration_step`] per
    /// stage but never drops below the configured floor, nor above the
    /// first-stage duration.
    #[must_use]
    pub fn stage_countdown(&self, stage: u32) -> Duration {
        let shrink = self.stage_duration_step.saturating_mul(stage);
        let floor = self.minimum_stage_duration.min(self.stage_duration);
        self.stage_duration.saturating_sub(shrink).max(floor)
    }

    /// Checks the configuration for values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < MINIMUM_GRID_EDGE || self.columns < MINIMUM_GRID_EDGE {
            return Err(ConfigError::GridTooSmall {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.rows > MAXIMUM_GRID_EDGE || self.columns > MAXIMUM_GRID_EDGE {
            return Err(ConfigError::GridTooLarge {
                rows: self.rows,
                columns: self.columns,
            });
        }
        self.validate_rules()
    }

    /// Checks everything [`SessionConfig::validate`] does except the grid
    /// dimensions, which a fixed layout supplies on its own.
    pub fn validate_rules(&self) -> Result<(), ConfigError> {
        if self.flow_step.is_zero() {
            return Err(ConfigError::ZeroFlowStep);
        }
        if self.stage_duration.is_zero() {
            return Err(ConfigError::ZeroStageDuration);
        }
        if self.queue_length == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rows: 12,
            columns: 12,
            stage_duration: Duration::from_secs(30),
            stage_duration_step: Duration::from_secs(1),
            minimum_stage_duration: Duration::from_secs(5),
            flow_step: Duration::from_millis(50),
            initial_score: 500,
            placement_cost: 50,
            hop_bonus: 100,
            win_bonus: 1000,
            queue_length: 6,
            skip_lobby: false,
            animations: AnimationTable::default(),
        }
    }
}

/// Reasons a [`SessionConfig`] is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The grid cannot host both a start and an end piece.
    #[error(
        "grid of {rows}x{columns} cells is too small; both dimensions must be at least {}",
        MINIMUM_GRID_EDGE
    )]
    GridTooSmall {
        /// Requested row count.
        rows: u32,
        /// Requested column count.
        columns: u32,
    },
    /// The grid exceeds [`MAXIMUM_GRID_EDGE`] on some side.
    #[error(
        "grid of {rows}x{columns} cells is too large; neither dimension may exceed {}",
        MAXIMUM_GRID_EDGE
    )]
    GridTooLarge {
        /// Requested row count.
        rows: u32,
        /// Requested column count.
        columns: u32,
    },
    /// Animations would never advance.
    #[error("flow step must be longer than zero")]
    ZeroFlowStep,
    /// The first stage would end before it starts.
    #[error("stage duration must be longer than zero")]
    ZeroStageDuration,
    /// There would be no current piece to place.
    #[error("piece queue must hold at least one shape")]
    EmptyQueue,
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
