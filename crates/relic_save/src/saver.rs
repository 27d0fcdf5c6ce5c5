//! Per-object persistence configuration
//!
//! The component a designer attaches to opt an object into saving. It
//! carries the flag set that gates every block of the object's record,
//! the member/property selections, and - for prefab instances - the
//! template and instance hashes that form the object's cross-session
//! identity.

use crate::material::MaterialProperty;
use crate::member::SavedMember;
use core::any::Any;
use relic_scene::Component;
use serde::{Deserialize, Serialize};

/// Persistence settings for one scene object
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaverConfig {
    /// Disabled objects contribute an empty record
    pub enabled: bool,

    pub save_transform: bool,
    /// Save and restore position/rotation in parent-local space instead
    /// of world space (scale is always local)
    pub use_local: bool,
    pub save_position: bool,
    pub save_rotation: bool,
    pub save_scale: bool,

    /// Only takes effect when the object has a rigid body at save time
    pub save_body: bool,
    pub save_velocity: bool,
    pub save_angular_velocity: bool,

    /// Only takes effect when the object has a renderer at save time
    pub save_renderer: bool,
    pub save_color: bool,
    pub save_texture: bool,
    /// Shader properties to persist, in stream order
    pub properties: Vec<MaterialProperty>,

    /// Gates the custom-member block
    pub custom_members: bool,
    /// Selected members, in stream order, unique pairs
    pub members: Vec<SavedMember>,

    /// Identity: prefab instances persist template + instance hashes,
    /// static objects only ever link by session-local reference
    pub is_prefab: bool,
    pub prefab_hash: Option<String>,
    pub instance_hash: Option<String>,

    /// Pass-scoped duplicate guard, reset after every save pass
    #[serde(skip)]
    pub(crate) saved: bool,
}

impl Default for SaverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            save_transform: true,
            use_local: false,
            save_position: true,
            save_rotation: true,
            save_scale: true,
            save_body: false,
            save_velocity: true,
            save_angular_velocity: true,
            save_renderer: false,
            save_color: true,
            save_texture: true,
            properties: Vec::new(),
            custom_members: false,
            members: Vec::new(),
            is_prefab: false,
            prefab_hash: None,
            instance_hash: None,
            saved: false,
        }
    }
}

impl SaverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Save position/rotation in parent-local space
    pub fn with_local_space(mut self) -> Self {
        self.use_local = true;
        self
    }

    pub fn without_transform(mut self) -> Self {
        self.save_transform = false;
        self
    }

    /// Persist rigid-body velocity state
    pub fn with_body(mut self) -> Self {
        self.save_body = true;
        self
    }

    /// Persist renderer color/texture state
    pub fn with_renderer(mut self) -> Self {
        self.save_renderer = true;
        self
    }

    /// Add a shader property selection (implies the renderer block)
    pub fn with_property(mut self, property: MaterialProperty) -> Self {
        self.save_renderer = true;
        self.properties.push(property);
        self
    }

    /// Select a component member for saving. Duplicate pairs are ignored.
    pub fn with_member(
        mut self,
        component: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        self.add_member(SavedMember::new(component, member));
        self
    }

    /// Select a member; duplicates are ignored
    pub fn add_member(&mut self, member: SavedMember) {
        if !self.members.contains(&member) {
            self.members.push(member);
        }
        self.custom_members = true;
    }

    pub fn remove_member(&mut self, member: &SavedMember) {
        self.members.retain(|m| m != member);
    }
}

impl Component for SaverConfig {
    fn short_name(&self) -> &'static str {
        "Saver"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SaverConfig::default();
        assert!(cfg.enabled);
        assert!(cfg.save_transform);
        assert!(!cfg.save_body);
        assert!(!cfg.is_prefab);
        assert!(!cfg.saved);
    }

    #[test]
    fn test_member_dedup() {
        let cfg = SaverConfig::new()
            .with_member("Health", "current")
            .with_member("Health", "current")
            .with_member("Health", "max");
        assert_eq!(cfg.members.len(), 2);
        assert!(cfg.custom_members);
    }

    #[test]
    fn test_property_implies_renderer() {
        use crate::material::PropertyKind;
        let cfg = SaverConfig::new().with_property(MaterialProperty::new(
            0,
            PropertyKind::Float,
            "Glossiness",
        ));
        assert!(cfg.save_renderer);
    }
}
