use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Configuration for the overlay, provided by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Upper bound for a single physics step, guards against frame hitches.
    pub max_dt: f32,
    /// Seconds between widget index refreshes (default: 0.1, i.e. 10 Hz).
    pub index_rebuild_interval: f32,
    /// Collision grid cell size in pixels.
    pub grid_cell_size: f32,
    pub physics: PhysicsParams,
    pub behavior: BehaviorParams,
    pub camera: CameraParams,
    pub shadow: ShadowParams,
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_dt: 0.1,
            index_rebuild_interval: 0.1,
            grid_cell_size: 20.0,
            physics: PhysicsParams::default(),
            behavior: BehaviorParams::default(),
            camera: CameraParams::default(),
            shadow: ShadowParams::default(),
            seed: None,
        }
    }
}

/// Integration constants shared by the character and the items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub gravity: f32,
    /// Horizontal velocity multiplier applied once per tick.
    pub friction: f32,
    /// Fraction of vertical speed kept on each item bounce.
    pub bounce_damping: f32,
    /// Items stop bouncing below this vertical speed.
    pub settle_epsilon: f32,
    pub character_ground_y: f32,
    pub item_ground_y: f32,
    /// Fraction of the remaining squash delta recovered per tick.
    pub squash_recovery: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            friction: 0.92,
            bounce_damping: 0.6,
            settle_epsilon: 0.1,
            character_ground_y: -0.5,
            item_ground_y: -0.8,
            squash_recovery: 0.1,
        }
    }
}

/// Relative weights for the memoryless behavior resampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateWeights {
    pub idle: f32,
    pub walking: f32,
    pub interacting: f32,
    pub investigating: f32,
}

impl Default for StateWeights {
    fn default() -> Self {
        Self {
            idle: 0.4,
            walking: 0.3,
            interacting: 0.2,
            investigating: 0.1,
        }
    }
}

impl StateWeights {
    pub fn as_array(&self) -> [f32; 4] {
        [self.idle, self.walking, self.interacting, self.investigating]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorParams {
    /// Shortest time between two decisions, seconds.
    pub min_interval: f32,
    /// Longest time between two decisions, seconds.
    pub max_interval: f32,
    pub weights: StateWeights,
    /// World units per second.
    pub walk_speed: f32,
    /// Degrees per second while investigating.
    pub turn_rate: f32,
    /// Per-tick chance that investigating turns into interacting,
    /// at the default mischievousness.
    pub investigate_trigger_chance: f32,
    /// World distance at which a walk target counts as reached.
    pub arrival_epsilon: f32,
    /// Pixel radius around the head for picking interaction targets.
    pub detection_radius: f32,
    /// Random wander targets are drawn from [-extent, extent] on X and Z.
    pub wander_extent: f32,
    /// 0.0-1.0, how eager the character is to go after controls.
    pub mischievousness: f32,
    /// 0.0-1.0, how exaggerated squash and hop animations are.
    pub playfulness: f32,
}

impl Default for BehaviorParams {
    fn default() -> Self {
        Self {
            min_interval: 5.0,
            max_interval: 15.0,
            weights: StateWeights::default(),
            walk_speed: 1.0,
            turn_rate: 30.0,
            investigate_trigger_chance: 0.1,
            arrival_epsilon: 0.1,
            detection_radius: 200.0,
            wander_extent: 2.0,
            mischievousness: DEFAULT_MISCHIEVOUSNESS,
            playfulness: DEFAULT_PLAYFULNESS,
        }
    }
}

pub const DEFAULT_MISCHIEVOUSNESS: f32 = 0.7;
pub const DEFAULT_PLAYFULNESS: f32 = 0.8;

/// Perspective camera looking at the overlay stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub distance: f32,
    /// Rotation about X in degrees.
    pub pitch_deg: f32,
    /// Rotation about Y in degrees.
    pub yaw_deg: f32,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            distance: 5.0,
            pitch_deg: 20.0,
            yaw_deg: 0.0,
            fov_y_deg: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowParams {
    pub enabled: bool,
    pub opacity: f32,
    /// Blur radius in pixels, forwarded to the backend.
    pub blur: f32,
    pub radius_x: f32,
    pub radius_z: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            enabled: true,
            opacity: 0.3,
            blur: 10.0,
            radius_x: 0.3,
            radius_z: 0.2,
        }
    }
}

impl OverlayConfig {
    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: OverlayConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("fixed_dt", self.fixed_dt, 1e-4, 1.0, "in (0, 1]")?;
        check_range("max_dt", self.max_dt, self.fixed_dt, 1.0, ">= fixed_dt and <= 1")?;
        check_range("index_rebuild_interval", self.index_rebuild_interval, 0.0, 60.0, "in [0, 60]")?;
        check_range("grid_cell_size", self.grid_cell_size, 1.0, 1024.0, "in [1, 1024]")?;

        let p = &self.physics;
        check_range("physics.gravity", p.gravity, 0.0, 1000.0, "non-negative")?;
        check_range("physics.friction", p.friction, 0.0, 1.0, "in [0, 1]")?;
        check_range("physics.bounce_damping", p.bounce_damping, 0.0, 0.999, "in [0, 1)")?;
        check_range("physics.settle_epsilon", p.settle_epsilon, 1e-6, 100.0, "positive")?;
        check_range("physics.squash_recovery", p.squash_recovery, 1e-3, 1.0, "in (0, 1]")?;

        let b = &self.behavior;
        check_range("behavior.min_interval", b.min_interval, 1e-3, 3600.0, "positive")?;
        check_range("behavior.max_interval", b.max_interval, b.min_interval, 3600.0, ">= min_interval")?;
        check_range("behavior.mischievousness", b.mischievousness, 0.0, 1.0, "in [0, 1]")?;
        check_range("behavior.playfulness", b.playfulness, 0.0, 1.0, "in [0, 1]")?;
        check_range("behavior.walk_speed", b.walk_speed, 1e-3, 100.0, "positive")?;
        check_range("behavior.arrival_epsilon", b.arrival_epsilon, 1e-4, 10.0, "positive")?;
        let weights = b.weights.as_array();
        for w in weights {
            check_range("behavior.weights", w, 0.0, 1000.0, "non-negative")?;
        }
        let total: f32 = weights.iter().sum();
        check_range("behavior.weights (sum)", total, 1e-6, 4000.0, "positive")?;

        let c = &self.camera;
        check_range("camera.fov_y_deg", c.fov_y_deg, 1.0, 179.0, "in [1, 179]")?;
        check_range("camera.near", c.near, 1e-4, c.far, "in (0, far)")?;
        Ok(())
    }
}

fn check_range(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected,
            value: value as f64,
        })
    }
}
