//! # relic_scene - Scene Graph and Host Object Model
//!
//! The live object model the save/restore protocol operates on:
//!
//! - [`ObjectId`] - generational identifiers, valid for one session only
//! - [`Scene`] - hierarchy of named objects with dynamic components
//! - [`Component`] - capability trait with name-based member access
//! - [`Template`] - instantiatable object recipe (prefab template)
//! - Built-in saveable components: [`RigidBody`], [`MeshRenderer`]
//!
//! Components are addressed by their simple type name and expose selected
//! members through an explicit get/set capability instead of open-ended
//! runtime introspection, so the name-based save format stays stable while
//! the set of supported types remains closed.
//!
//! # Example
//!
//! ```ignore
//! use relic_scene::prelude::*;
//!
//! let mut scene = Scene::new("level1");
//! let platform = scene.spawn("platform");
//! let crate_id = scene.spawn_child("crate", platform);
//! scene.add_component(crate_id, RigidBody::default());
//! ```

pub mod component;
pub mod object;
pub mod physics;
pub mod render;
pub mod scene;
pub mod template;
pub mod transform;
pub mod value;

pub mod prelude {
    pub use crate::component::Component;
    pub use crate::object::ObjectId;
    pub use crate::physics::RigidBody;
    pub use crate::render::{Material, MeshRenderer, PropertyValue};
    pub use crate::scene::Scene;
    pub use crate::template::Template;
    pub use crate::transform::Transform;
    pub use crate::value::Value;
}

pub use prelude::*;
