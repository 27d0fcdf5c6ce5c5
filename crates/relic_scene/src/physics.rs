//! Rigid body component

use crate::component::Component;
use crate::value::Value;
use core::any::Any;
use relic_math::Vec3;
use serde::{Deserialize, Serialize};

/// Dynamic body state attached to a scene object.
///
/// Only the state the save system cares about is modeled here; simulation
/// itself belongs to the host.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub use_gravity: bool,
    pub kinematic: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            use_gravity: true,
            kinematic: false,
        }
    }
}

impl Component for RigidBody {
    fn short_name(&self) -> &'static str {
        "RigidBody"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn get_member(&self, name: &str) -> Option<Value> {
        match name {
            "velocity" => Some(Value::Vec3(self.velocity)),
            "angular_velocity" => Some(Value::Vec3(self.angular_velocity)),
            "mass" => Some(Value::F32(self.mass)),
            "use_gravity" => Some(Value::Bool(self.use_gravity)),
            "kinematic" => Some(Value::Bool(self.kinematic)),
            _ => None,
        }
    }

    fn set_member(&mut self, name: &str, value: Value) -> bool {
        match (name, value) {
            ("velocity", Value::Vec3(v)) => self.velocity = v,
            ("angular_velocity", Value::Vec3(v)) => self.angular_velocity = v,
            ("mass", Value::F32(v)) => self.mass = v,
            ("use_gravity", Value::Bool(v)) => self.use_gravity = v,
            ("kinematic", Value::Bool(v)) => self.kinematic = v,
            _ => return false,
        }
        true
    }

    fn member_names(&self) -> &'static [&'static str] {
        &["velocity", "angular_velocity", "mass", "use_gravity", "kinematic"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members() {
        let mut body = RigidBody::default();
        assert!(body.set_member("velocity", Value::Vec3(Vec3::new(0.0, -9.8, 0.0))));
        assert_eq!(
            body.get_member("velocity"),
            Some(Value::Vec3(Vec3::new(0.0, -9.8, 0.0)))
        );
        assert!(!body.set_member("velocity", Value::F32(1.0)));
    }
}
