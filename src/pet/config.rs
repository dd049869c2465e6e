//! Tuning constants for the pet simulation.
//!
//! Units follow the host: lengths in CSS pixels, velocities in pixels per frame,
//! angles in degrees and times in milliseconds.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete configuration for one pet instance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PetConfig {
    pub physics: PhysicsConfig,
    pub walk: WalkConfig,
    pub drag: DragConfig,
    pub recovery: RecoveryConfig,
    pub sprite: SpriteConfig,
    /// Gap kept between the sprite and the viewport edges.
    pub padding: f64,
    /// Quiet time after the last user input before the pet starts wandering.
    pub idle_timeout_ms: f64,
    /// How far past a bound the pet may drift before the safety net teleports it.
    pub teleport_margin: f64,
    /// Distance from the wall a horizontal (or ceiling) teleport lands at.
    pub teleport_inset: f64,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            walk: WalkConfig::default(),
            drag: DragConfig::default(),
            recovery: RecoveryConfig::default(),
            sprite: SpriteConfig::default(),
            padding: 10.0,
            idle_timeout_ms: 3000.0,
            teleport_margin: 50.0,
            teleport_inset: 50.0,
        }
    }
}

#[cfg(feature = "serde_json")]
impl PetConfig {
    /// Parse a (possibly partial) JSON override; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhysicsConfig {
    pub gravity: f64,
    /// Horizontal damping applied on floor contact.
    pub friction: f64,
    /// Per-frame velocity retention while airborne.
    pub air_resistance: f64,
    pub wall_bounce_factor: f64,
    pub ground_bounce_factor: f64,
    /// Vertical impact speed below which the pet lands instead of bouncing.
    pub min_bounce_velocity: f64,
    pub max_velocity: f64,
    pub rotation_damping: f64,
    /// Spin imparted per unit of vertical speed on wall contact.
    pub wall_spin: f64,
    /// Spin added per unit of horizontal speed on a floor bounce.
    pub bounce_spin: f64,
    /// Extra friction multiplier when the pet comes to rest on the floor.
    pub landing_friction: f64,
    /// Horizontal speed under which a pet resting on the floor is considered stopped.
    pub rest_speed: f64,
    /// Distance above the floor still counted as touching it.
    pub ground_tolerance: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.4,
            friction: 0.7,
            air_resistance: 0.99,
            wall_bounce_factor: 0.25,
            ground_bounce_factor: 0.2,
            min_bounce_velocity: 1.5,
            max_velocity: 18.0,
            rotation_damping: 0.95,
            wall_spin: 0.02,
            bounce_spin: 0.03,
            landing_friction: 0.3,
            rest_speed: 0.3,
            ground_tolerance: 1.0,
        }
    }
}

/// Autonomous hopping while the pet is left alone.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WalkConfig {
    /// Upward speed of a hop.
    pub jump_speed: f64,
    pub walk_speed: f64,
    pub min_jump_interval_ms: f64,
    pub max_jump_interval_ms: f64,
    /// Distance from a side bound considered "near the edge".
    pub edge_threshold: f64,
    /// Chance of heading back toward the middle when near an edge.
    pub turn_back_chance: f64,
    /// Chance of reversing direction when away from the edges.
    pub flip_chance: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            jump_speed: 6.0,
            walk_speed: 1.5,
            min_jump_interval_ms: 1000.0,
            max_jump_interval_ms: 2500.0,
            edge_threshold: 150.0,
            turn_back_chance: 0.85,
            flip_chance: 0.25,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DragConfig {
    /// Pointer samples kept while dragging.
    pub history_len: usize,
    /// Most recent samples averaged into the throw velocity.
    pub release_window: usize,
    pub throw_scale: f64,
    /// Spin per unit of horizontal throw speed.
    pub throw_spin: f64,
    /// How far past the bounds a held pet may be pulled.
    pub overflow: f64,
    /// Phase advance of the dangling swing per frame (radians).
    pub swing_step: f64,
    /// Peak swing angle in degrees.
    pub swing_amplitude: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            history_len: 5,
            release_window: 3,
            throw_scale: 1.2,
            throw_spin: 0.15,
            overflow: 20.0,
            swing_step: 0.08,
            swing_amplitude: 5.0,
        }
    }
}

/// Straightening up after a tilted landing.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RecoveryConfig {
    /// Landings tilted more than this go through Recovering; the rest snap upright.
    pub settle_angle: f64,
    /// Fraction of the remaining tilt removed each frame.
    pub decay: f64,
    /// Tilt below which recovery snaps to zero.
    pub snap_angle: f64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            settle_angle: 15.0,
            decay: 0.15,
            snap_angle: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpriteConfig {
    pub width: f64,
    pub height: f64,
    pub idle_image: String,
    pub dragged_image: String,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            width: 120.0,
            height: 150.0,
            idle_image: "images/pet_idle.png".to_string(),
            dragged_image: "images/pet_dragged.png".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let cfg = PetConfig::default();
        assert_eq!(cfg.physics.max_velocity, 18.0);
        assert_eq!(cfg.drag.history_len, 5);
        assert_eq!(cfg.drag.release_window, 3);
        assert_eq!(cfg.recovery.settle_angle, 15.0);
        assert_eq!(cfg.teleport_margin, 50.0);
        assert!(cfg.walk.min_jump_interval_ms < cfg.walk.max_jump_interval_ms);
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn partial_json_keeps_defaults() {
        let cfg =
            PetConfig::from_json(r#"{ "physics": { "gravity": 0.6 }, "padding": 4 }"#).unwrap();
        assert_eq!(cfg.physics.gravity, 0.6);
        assert_eq!(cfg.physics.max_velocity, 18.0);
        assert_eq!(cfg.padding, 4.0);
        assert_eq!(cfg.sprite, SpriteConfig::default());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn malformed_json_is_an_error() {
        assert!(PetConfig::from_json("{ physics: ").is_err());
    }
}
