//! Scene - the live object hierarchy
//!
//! Slot-based storage with generational ids. Ids are allocated
//! deterministically in spawn order, so a host that rebuilds a scene the
//! same way gets the same ids - the property session-local references in
//! a save stream rely on. Destroying an object bumps its slot generation,
//! invalidating every outstanding id for it.

use crate::component::Component;
use crate::object::ObjectId;
use crate::transform::Transform;
use log::warn;
use relic_math::{Quat, Vec3};

struct ObjectData {
    name: String,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    transform: Transform,
    components: Vec<Box<dyn Component>>,
}

struct Slot {
    generation: u32,
    data: Option<ObjectData>,
}

/// A named scene holding a hierarchy of objects
pub struct Scene {
    name: String,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Scene name, recorded in save stream headers
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn a root object
    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        self.spawn_internal(name.into(), None)
    }

    /// Spawn an object under `parent`
    pub fn spawn_child(&mut self, name: impl Into<String>, parent: ObjectId) -> ObjectId {
        let parent = if self.is_alive(parent) {
            Some(parent)
        } else {
            warn!("spawn_child: parent {parent} is not alive, spawning at root");
            None
        };
        self.spawn_internal(name.into(), parent)
    }

    fn spawn_internal(&mut self, name: String, parent: Option<ObjectId>) -> ObjectId {
        let data = ObjectData {
            name,
            parent,
            children: Vec::new(),
            transform: Transform::IDENTITY,
            components: Vec::new(),
        };

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.data = Some(data);
                ObjectId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                // generation 1: live id bits are never zero
                self.slots.push(Slot {
                    generation: 1,
                    data: Some(data),
                });
                ObjectId::new(index, 1)
            }
        };

        if let Some(p) = parent {
            if let Some(pd) = self.data_mut(p) {
                pd.children.push(id);
            }
        }
        id
    }

    /// Destroy an object and its entire subtree. Returns false if the id
    /// was already dead.
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(pd) = self.data_mut(parent) {
                pd.children.retain(|c| *c != id);
            }
        }
        self.destroy_subtree(id);
        true
    }

    fn destroy_subtree(&mut self, id: ObjectId) {
        let children = self
            .data(id)
            .map(|d| d.children.clone())
            .unwrap_or_default();
        for child in children {
            self.destroy_subtree(child);
        }
        let slot = &mut self.slots[id.index() as usize];
        slot.data = None;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(id.index());
    }

    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.data(id).is_some()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live object ids, in slot order
    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.data.as_ref().map(|_| ObjectId::new(i as u32, s.generation))
        })
    }

    pub fn name_of(&self, id: ObjectId) -> Option<&str> {
        self.data(id).map(|d| d.name.as_str())
    }

    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.data(id).and_then(|d| d.parent)
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    /// Re-parent an object. `None` moves it to the root. Rejects dead ids
    /// and cycles.
    pub fn set_parent(&mut self, id: ObjectId, parent: Option<ObjectId>) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(p) = parent {
            if !self.is_alive(p) {
                warn!("set_parent: parent {p} is not alive");
                return false;
            }
            // walking up from the new parent must not reach `id`
            let mut cursor = Some(p);
            while let Some(c) = cursor {
                if c == id {
                    warn!("set_parent: {id} -> {p} would create a cycle");
                    return false;
                }
                cursor = self.parent(c);
            }
        }

        if let Some(old) = self.parent(id) {
            if let Some(od) = self.data_mut(old) {
                od.children.retain(|c| *c != id);
            }
        }
        if let Some(p) = parent {
            if let Some(pd) = self.data_mut(p) {
                pd.children.push(id);
            }
        }
        if let Some(d) = self.data_mut(id) {
            d.parent = parent;
        }
        true
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a component. Multiple components of the same type may
    /// coexist; name lookups return the first.
    pub fn add_component<T: Component>(&mut self, id: ObjectId, component: T) -> bool {
        match self.data_mut(id) {
            Some(d) => {
                d.components.push(Box::new(component));
                true
            }
            None => false,
        }
    }

    pub fn component<T: Component>(&self, id: ObjectId) -> Option<&T> {
        self.data(id)?
            .components
            .iter()
            .find_map(|c| c.as_ref().downcast_ref::<T>())
    }

    pub fn component_mut<T: Component>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.data_mut(id)?
            .components
            .iter_mut()
            .find_map(|c| c.as_mut().downcast_mut::<T>())
    }

    pub fn has_component<T: Component>(&self, id: ObjectId) -> bool {
        self.component::<T>(id).is_some()
    }

    /// Look up a component by its simple type name
    pub fn component_by_name(&self, id: ObjectId, name: &str) -> Option<&dyn Component> {
        self.data(id)?
            .components
            .iter()
            .find(|c| c.short_name() == name)
            .map(|c| c.as_ref())
    }

    pub fn component_by_name_mut(
        &mut self,
        id: ObjectId,
        name: &str,
    ) -> Option<&mut dyn Component> {
        self.data_mut(id)?
            .components
            .iter_mut()
            .find(|c| c.short_name() == name)
            .map(|c| c.as_mut())
    }

    /// Simple names of all components on an object
    pub fn component_names(&self, id: ObjectId) -> Vec<&'static str> {
        self.data(id)
            .map(|d| d.components.iter().map(|c| c.short_name()).collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    pub fn transform(&self, id: ObjectId) -> Option<&Transform> {
        self.data(id).map(|d| &d.transform)
    }

    pub fn transform_mut(&mut self, id: ObjectId) -> Option<&mut Transform> {
        self.data_mut(id).map(|d| &mut d.transform)
    }

    /// World-space position, rotation and scale through the parent chain
    pub fn world_trs(&self, id: ObjectId) -> Option<(Vec3, Quat, Vec3)> {
        let t = *self.transform(id)?;
        Some(match self.parent(id).and_then(|p| self.world_trs(p)) {
            Some((pp, pr, ps)) => (
                pp + pr.mul_vec3(t.position.scale(ps)),
                pr * t.rotation,
                ps.scale(t.scale),
            ),
            None => (t.position, t.rotation, t.scale),
        })
    }

    pub fn world_position(&self, id: ObjectId) -> Option<Vec3> {
        self.world_trs(id).map(|(p, _, _)| p)
    }

    pub fn world_rotation(&self, id: ObjectId) -> Option<Quat> {
        self.world_trs(id).map(|(_, r, _)| r)
    }

    /// Set position in world space by converting through the parent chain
    pub fn set_world_position(&mut self, id: ObjectId, position: Vec3) -> bool {
        let local = match self.parent(id).and_then(|p| self.world_trs(p)) {
            Some((pp, pr, ps)) => pr
                .inverse()
                .mul_vec3(position - pp)
                .scale(ps.recip_or_zero()),
            None => position,
        };
        match self.transform_mut(id) {
            Some(t) => {
                t.position = local;
                true
            }
            None => false,
        }
    }

    /// Set rotation in world space by converting through the parent chain
    pub fn set_world_rotation(&mut self, id: ObjectId, rotation: Quat) -> bool {
        let local = match self.parent(id).and_then(|p| self.world_trs(p)) {
            Some((_, pr, _)) => pr.inverse() * rotation,
            None => rotation,
        };
        match self.transform_mut(id) {
            Some(t) => {
                t.rotation = local;
                true
            }
            None => false,
        }
    }

    fn data(&self, id: ObjectId) -> Option<&ObjectData> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.data.as_ref()
    }

    fn data_mut(&mut self, id: ObjectId) -> Option<&mut ObjectData> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.data.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RigidBody;
    use relic_math::consts::PI;

    #[test]
    fn test_spawn_destroy_generation() {
        let mut scene = Scene::new("test");
        let a = scene.spawn("a");
        assert!(scene.is_alive(a));
        assert!(scene.destroy(a));

        // slot is reused with a bumped generation; the old id stays dead
        let b = scene.spawn("b");
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert!(!scene.is_alive(a));
        assert!(scene.is_alive(b));
    }

    #[test]
    fn test_deterministic_spawn_order() {
        let build = |scene: &mut Scene| {
            let root = scene.spawn("root");
            scene.spawn_child("child", root);
            scene.spawn("other");
        };
        let mut s1 = Scene::new("a");
        let mut s2 = Scene::new("a");
        build(&mut s1);
        build(&mut s2);
        let ids1: Vec<u64> = s1.iter().map(|i| i.to_bits()).collect();
        let ids2: Vec<u64> = s2.iter().map(|i| i.to_bits()).collect();
        assert_eq!(ids1, ids2);
    }

    #[test]
    fn test_destroy_subtree() {
        let mut scene = Scene::new("test");
        let root = scene.spawn("root");
        let child = scene.spawn_child("child", root);
        let grandchild = scene.spawn_child("grandchild", child);

        scene.destroy(root);
        assert!(!scene.is_alive(child));
        assert!(!scene.is_alive(grandchild));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let mut scene = Scene::new("test");
        let a = scene.spawn("a");
        let b = scene.spawn_child("b", a);
        assert!(!scene.set_parent(a, Some(b)));
        assert!(!scene.set_parent(a, Some(a)));
        assert!(scene.set_parent(b, None));
        assert_eq!(scene.parent(b), None);
    }

    #[test]
    fn test_component_by_name() {
        let mut scene = Scene::new("test");
        let id = scene.spawn("obj");
        scene.add_component(id, RigidBody::default());

        assert!(scene.component_by_name(id, "RigidBody").is_some());
        assert!(scene.component_by_name(id, "MeshRenderer").is_none());
        assert!(scene.has_component::<RigidBody>(id));
    }

    #[test]
    fn test_world_position_through_chain() {
        let mut scene = Scene::new("test");
        let root = scene.spawn("root");
        let child = scene.spawn_child("child", root);

        scene.transform_mut(root).unwrap().position = Vec3::new(10.0, 0.0, 0.0);
        scene.transform_mut(child).unwrap().position = Vec3::new(5.0, 0.0, 0.0);
        assert_eq!(scene.world_position(child), Some(Vec3::new(15.0, 0.0, 0.0)));

        // rotating the root 90 degrees about Y swings the child around
        scene.transform_mut(root).unwrap().rotation = Quat::from_axis_angle(Vec3::Y, PI / 2.0);
        let p = scene.world_position(child).unwrap();
        assert!((p - Vec3::new(10.0, 0.0, -5.0)).length() < 1e-5);
    }

    #[test]
    fn test_set_world_position_round_trip() {
        let mut scene = Scene::new("test");
        let root = scene.spawn("root");
        let child = scene.spawn_child("child", root);
        scene.transform_mut(root).unwrap().position = Vec3::new(1.0, 2.0, 3.0);
        scene.transform_mut(root).unwrap().scale = Vec3::splat(2.0);

        scene.set_world_position(child, Vec3::new(7.0, 8.0, 9.0));
        let p = scene.world_position(child).unwrap();
        assert!((p - Vec3::new(7.0, 8.0, 9.0)).length() < 1e-5);
    }
}
