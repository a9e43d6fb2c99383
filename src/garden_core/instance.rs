use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::garden_core::catalogue::PlantDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A per-instance value that either replaces the catalogue default or leaves it alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Override<T> {
    Unset,
    Set(T),
}

impl<T> Default for Override<T> {
    fn default() -> Self {
        Override::Unset
    }
}

impl<T> Override<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Override::Set(_))
    }

    pub fn as_ref(&self) -> Override<&T> {
        match self {
            Override::Unset => Override::Unset,
            Override::Set(v) => Override::Set(v),
        }
    }

    pub fn or<'a>(&'a self, fallback: &'a T) -> &'a T {
        match self {
            Override::Unset => fallback,
            Override::Set(v) => v,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Override::Unset => None,
            Override::Set(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for Override<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Override::Set(v),
            None => Override::Unset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Customization {
    pub color: Override<String>,
    pub height: Override<f32>,
    pub spread: Override<f32>,
}

impl Customization {
    pub fn is_empty(&self) -> bool {
        !self.color.is_set() && !self.height.is_set() && !self.spread.is_set()
    }
}

pub const MAX_HEALTH: f32 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPlant {
    pub id: InstanceId,
    pub definition: PlantDefinition,
    pub position: Vec3,
    /// Euler angles in radians; placement only ever sets the Y component.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub spawn_scale: Vec3,
    #[serde(default = "full_health")]
    pub health: f32,
    #[serde(default)]
    pub growth_rate: f32,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub customization: Customization,
}

fn full_health() -> f32 {
    MAX_HEALTH
}

impl PlacedPlant {
    pub fn new(
        id: InstanceId,
        definition: PlantDefinition,
        position: Vec3,
        yaw: f32,
        scale: Vec3,
    ) -> Self {
        Self {
            id,
            definition,
            position,
            rotation: Vec3::new(0.0, yaw, 0.0),
            scale,
            spawn_scale: scale,
            health: MAX_HEALTH,
            growth_rate: 0.0,
            selected: false,
            customization: Customization::default(),
        }
    }

    /// Pulls loaded values back into range: health into `[0, MAX_HEALTH]`
    /// and every scale axis to a positive finite factor. Returns whether
    /// anything changed.
    pub fn sanitize(&mut self) -> bool {
        let health = if self.health.is_nan() {
            MAX_HEALTH
        } else {
            self.health.clamp(0.0, MAX_HEALTH)
        };
        let valid = |v: Vec3| v.is_finite() && v.min_element() > 0.0;
        let spawn_scale = if valid(self.spawn_scale) { self.spawn_scale } else { Vec3::ONE };
        let scale = if valid(self.scale) { self.scale } else { spawn_scale };

        let changed = health != self.health || scale != self.scale || spawn_scale != self.spawn_scale;
        self.health = health;
        self.scale = scale;
        self.spawn_scale = spawn_scale;
        changed
    }

    pub fn height(&self) -> f32 {
        *self.customization.height.or(&self.definition.height)
    }

    pub fn spread(&self) -> f32 {
        *self.customization.spread.or(&self.definition.spread)
    }

    pub fn color(&self) -> Option<&str> {
        match &self.customization.color {
            Override::Set(c) => Some(c.as_str()),
            Override::Unset => self.definition.color.as_deref(),
        }
    }
}
