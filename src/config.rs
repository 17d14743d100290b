use std::time::Duration;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_WIDTH: usize = 15;
pub const DEFAULT_HEIGHT: usize = 26;

// Timing (in milliseconds)
const BASE_GRAVITY_MS: u64 = 700;
const GRAVITY_STEP_MS: u64 = 100;
const MIN_GRAVITY_MS: u64 = 100;
const LEVEL_PERIOD_MS: u64 = 15_000;

/// Rows a level needs on top of its own number before the next level.
pub const LEVEL_ROW_THRESHOLD: u32 = 5;

/// Named rule sets.
///
/// `Current` is the table rotation with row-driven leveling; `Legacy` keeps
/// the older rotation revert, neighbour-scan collision and timed leveling.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Profile {
    #[default]
    Current,
    Legacy,
}

/// What happens after a rotation is shifted back inside the field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RotationMode {
    /// Keep the shifted rotation as is.
    Clamp,
    /// Undo the rotation when the horizontal check fails at the shifted column.
    Revert,
}

/// How a sideways move is checked against settled cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CollisionMode {
    /// The cells the piece would occupy must all be empty.
    Footprint,
    /// No settled cell may sit directly left or right of any cell the piece
    /// would occupy.
    Adjacency,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelMode {
    /// Level up once `threshold + level` rows were cleared in the level.
    Rows { threshold: u32 },
    /// Level up every `period` of play while gravity can still speed up.
    Timed { period: Duration },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GravityCurve {
    pub start: Duration,
    pub step: Duration,
    pub floor: Duration,
}

impl GravityCurve {
    /// Interval after one more level, never below the floor.
    pub fn faster(&self, interval: Duration) -> Duration {
        interval.saturating_sub(self.step).max(self.floor)
    }

    /// Interval for a session that starts at `level`.
    pub fn interval_at(&self, level: u32) -> Duration {
        self.start
            .saturating_sub(self.step.saturating_mul(level.saturating_sub(1)))
            .max(self.floor)
    }
}

impl Default for GravityCurve {
    fn default() -> Self {
        Self {
            start: Duration::from_millis(BASE_GRAVITY_MS),
            step: Duration::from_millis(GRAVITY_STEP_MS),
            floor: Duration::from_millis(MIN_GRAVITY_MS),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    pub start_level: u32,
    pub rotation: RotationMode,
    pub collision: CollisionMode,
    pub leveling: LevelMode,
    pub gravity: GravityCurve,
}

impl EngineConfig {
    pub fn current(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            start_level: 1,
            rotation: RotationMode::Clamp,
            collision: CollisionMode::Footprint,
            leveling: LevelMode::Rows {
                threshold: LEVEL_ROW_THRESHOLD,
            },
            gravity: GravityCurve::default(),
        }
    }

    pub fn legacy(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            start_level: 1,
            rotation: RotationMode::Revert,
            collision: CollisionMode::Adjacency,
            leveling: LevelMode::Timed {
                period: Duration::from_millis(LEVEL_PERIOD_MS),
            },
            gravity: GravityCurve::default(),
        }
    }

    pub fn for_profile(profile: Profile, width: usize, height: usize) -> Self {
        match profile {
            Profile::Current => Self::current(width, height),
            Profile::Legacy => Self::legacy(width, height),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::current(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_never_drops_below_floor() {
        let curve = GravityCurve::default();
        let mut interval = curve.start;
        for _ in 0..20 {
            interval = curve.faster(interval);
        }
        assert_eq!(interval, curve.floor);
        assert_eq!(curve.faster(Duration::from_millis(700)), Duration::from_millis(600));
    }

    #[test]
    fn starting_level_sets_initial_interval() {
        let curve = GravityCurve::default();
        assert_eq!(curve.interval_at(0), curve.start);
        assert_eq!(curve.interval_at(1), curve.start);
        assert_eq!(curve.interval_at(3), Duration::from_millis(500));
        assert_eq!(curve.interval_at(50), curve.floor);
    }

    #[test]
    fn profiles_pick_their_rules() {
        let current = EngineConfig::for_profile(Profile::Current, 10, 20);
        assert_eq!(current.rotation, RotationMode::Clamp);
        assert_eq!(current.collision, CollisionMode::Footprint);
        assert!(matches!(current.leveling, LevelMode::Rows { .. }));

        let legacy = EngineConfig::for_profile(Profile::Legacy, 10, 20);
        assert_eq!(legacy.rotation, RotationMode::Revert);
        assert_eq!(legacy.collision, CollisionMode::Adjacency);
        assert_eq!(
            legacy.leveling,
            LevelMode::Timed {
                period: Duration::from_secs(15)
            }
        );
        assert_eq!((legacy.width, legacy.height), (10, 20));
    }

    #[test]
    fn default_is_current_profile_at_full_size() {
        let config = EngineConfig::default();
        assert_eq!(config, EngineConfig::current(DEFAULT_WIDTH, DEFAULT_HEIGHT));
    }
}
