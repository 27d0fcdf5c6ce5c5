//! Saved member selection
//!
//! A selector names a (component, member) pair chosen at design time. The
//! names are simple strings on purpose: they survive sessions and type
//! reloads where handles would not. Resolution failures on either side
//! are warnings, never aborts - save must succeed with stale selectors,
//! and a stream must load after the object's composition changed.

use crate::codec::{ByteReader, ByteWriter};
use crate::error::SaveError;
use log::warn;
use relic_scene::{ObjectId, Scene, Value};
use serde::{Deserialize, Serialize};

/// A designer-selected component member
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SavedMember {
    /// Simple (unqualified) component type name
    pub component: String,
    /// Field or property name on that component
    pub member: String,
}

impl SavedMember {
    pub fn new(component: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            member: member.into(),
        }
    }
}

/// One captured member slot in a record's custom-member block.
///
/// `Absent` is written when the selector did not resolve at save time, so
/// the stream stays aligned no matter how stale the selection list is.
#[derive(Clone, Debug, PartialEq)]
pub enum MemberEntry {
    Absent,
    Present {
        component: String,
        member: String,
        value: Value,
    },
}

impl MemberEntry {
    pub fn encode(&self, w: &mut ByteWriter) {
        match self {
            MemberEntry::Absent => w.write_bool(false),
            MemberEntry::Present {
                component,
                member,
                value,
            } => {
                w.write_bool(true);
                w.write_str(component);
                w.write_str(member);
                w.write_value(value);
            }
        }
    }

    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, SaveError> {
        if !r.read_bool()? {
            return Ok(MemberEntry::Absent);
        }
        Ok(MemberEntry::Present {
            component: r.read_str()?,
            member: r.read_str()?,
            value: r.read_value()?,
        })
    }
}

/// Resolve a selector against the live object and capture its value
pub fn capture(scene: &Scene, id: ObjectId, selector: &SavedMember) -> MemberEntry {
    let Some(component) = scene.component_by_name(id, &selector.component) else {
        warn!(
            "cannot save {id} member {}.{}: component not found",
            selector.component, selector.member
        );
        return MemberEntry::Absent;
    };
    match component.get_member(&selector.member) {
        Some(value) => MemberEntry::Present {
            component: selector.component.clone(),
            member: selector.member.clone(),
            value,
        },
        None => {
            warn!(
                "cannot save {id} member {}.{}: member not found",
                selector.component, selector.member
            );
            MemberEntry::Absent
        }
    }
}

/// Reapply a captured member to the current object
pub fn apply(scene: &mut Scene, id: ObjectId, entry: &MemberEntry) {
    let MemberEntry::Present {
        component,
        member,
        value,
    } = entry
    else {
        return;
    };
    match scene.component_by_name_mut(id, component) {
        Some(target) => {
            if !target.set_member(member, value.clone()) {
                warn!("cannot load {id} member {component}.{member}: member not found");
            }
        }
        None => {
            warn!("cannot load {id} member {component}.{member}: component not found");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::any::Any;
    use relic_scene::Component;

    struct Counter {
        value: i32,
    }

    impl Component for Counter {
        fn short_name(&self) -> &'static str {
            "Counter"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn get_member(&self, name: &str) -> Option<Value> {
            (name == "value").then_some(Value::I32(self.value))
        }

        fn set_member(&mut self, name: &str, value: Value) -> bool {
            match (name, value) {
                ("value", Value::I32(v)) => {
                    self.value = v;
                    true
                }
                _ => false,
            }
        }

        fn member_names(&self) -> &'static [&'static str] {
            &["value"]
        }
    }

    #[test]
    fn test_capture_and_apply() {
        let mut scene = Scene::new("test");
        let id = scene.spawn("obj");
        scene.add_component(id, Counter { value: 7 });

        let entry = capture(&scene, id, &SavedMember::new("Counter", "value"));
        assert_eq!(
            entry,
            MemberEntry::Present {
                component: "Counter".into(),
                member: "value".into(),
                value: Value::I32(7),
            }
        );

        scene.component_mut::<Counter>(id).unwrap().value = 0;
        apply(&mut scene, id, &entry);
        assert_eq!(scene.component::<Counter>(id).unwrap().value, 7);
    }

    #[test]
    fn test_capture_missing_is_absent() {
        let mut scene = Scene::new("test");
        let id = scene.spawn("obj");
        scene.add_component(id, Counter { value: 1 });

        let missing_component = capture(&scene, id, &SavedMember::new("Ghost", "value"));
        assert_eq!(missing_component, MemberEntry::Absent);

        let missing_member = capture(&scene, id, &SavedMember::new("Counter", "ghost"));
        assert_eq!(missing_member, MemberEntry::Absent);
    }

    #[test]
    fn test_apply_missing_is_silent() {
        let mut scene = Scene::new("test");
        let id = scene.spawn("obj");

        // no Counter on this object: must not panic or abort
        apply(
            &mut scene,
            id,
            &MemberEntry::Present {
                component: "Counter".into(),
                member: "value".into(),
                value: Value::I32(3),
            },
        );
    }

    #[test]
    fn test_entry_encode_decode() {
        let entries = vec![
            MemberEntry::Absent,
            MemberEntry::Present {
                component: "Counter".into(),
                member: "value".into(),
                value: Value::I32(-5),
            },
        ];
        let mut w = ByteWriter::new();
        for e in &entries {
            e.encode(&mut w);
        }
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        for e in &entries {
            assert_eq!(&MemberEntry::decode(&mut r).unwrap(), e);
        }
        assert!(r.is_empty());
    }

    #[test]
    fn test_selector_equality() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(SavedMember::new("Counter", "value"));
        assert!(set.contains(&SavedMember::new("Counter", "value")));
        assert!(!set.contains(&SavedMember::new("Counter", "other")));
    }
}
