//! Object templates
//!
//! A template is a recipe that can instantiate a configured object (or
//! subtree) into a scene, the host-side half of prefab support. The save
//! system refers to templates only by registered hash; how a template
//! builds its objects is entirely up to the host.

use crate::object::ObjectId;
use crate::scene::Scene;
use core::fmt;

type BuildFn = dyn Fn(&mut Scene, Option<ObjectId>) -> ObjectId + Send + Sync;

/// An instantiatable object recipe
pub struct Template {
    name: String,
    build: Box<BuildFn>,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        build: impl Fn(&mut Scene, Option<ObjectId>) -> ObjectId + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            build: Box::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a fresh copy under `parent` (or at the scene root)
    pub fn instantiate(&self, scene: &mut Scene, parent: Option<ObjectId>) -> ObjectId {
        (self.build)(scene, parent)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_under_parent() {
        let mut scene = Scene::new("test");
        let root = scene.spawn("root");
        let template = Template::new("barrel", |scene, parent| match parent {
            Some(p) => scene.spawn_child("barrel", p),
            None => scene.spawn("barrel"),
        });

        let id = template.instantiate(&mut scene, Some(root));
        assert_eq!(scene.parent(id), Some(root));
        assert_eq!(scene.name_of(id), Some("barrel"));
    }
}
