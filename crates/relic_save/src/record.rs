//! Object records
//!
//! One record per saveable object, in the flag-gated layout the stream
//! fixes. There is no record length on the wire: a reader must consume
//! every flag in exactly the written order, which is why decode always
//! parses a record completely - even one that will not be applied -
//! before the next record is touched.

use crate::codec::{ByteReader, ByteWriter};
use crate::error::SaveError;
use crate::material::PropertyRecord;
use crate::member::MemberEntry;
use relic_math::{Color, Quat, Vec3};

/// Parent link sentinel: no parent
const PARENT_NONE: u64 = u64::MAX;
/// Parent link sentinel: a tracked prefab instance, instance hash follows
const PARENT_PREFAB: u64 = 0;

/// Parent linkage of a record.
///
/// Live object-id bits are never `0` or `u64::MAX`, so the sentinels
/// cannot collide with a real session-local reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentRef {
    /// Root object
    None,
    /// Parent is a tracked prefab instance, matched by instance hash
    Instance(String),
    /// Parent is matched by session-local id bits
    Object(u64),
}

/// Self-identity of a record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityRef {
    /// Prefab instance: template hash + session-unique instance hash
    Prefab {
        prefab_hash: String,
        instance_hash: String,
    },
    /// Static object, matched by session-local id bits
    Object(u64),
}

/// Saved transform state, gated per field
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TransformBlock {
    pub use_local: bool,
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
    /// Always parent-local
    pub scale: Option<Vec3>,
}

/// Saved rigid-body state
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PhysicsBlock {
    pub velocity: Option<Vec3>,
    pub angular_velocity: Option<Vec3>,
}

/// Saved renderer state
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RenderBlock {
    pub color: Option<Color>,
    /// Host-resolvable texture asset key
    pub texture: Option<String>,
    pub properties: Vec<PropertyRecord>,
}

/// One object's serialized state within the save stream
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    /// When false the record is this single flag and nothing else
    pub enabled: bool,
    pub parent: ParentRef,
    pub identity: IdentityRef,
    pub transform: Option<TransformBlock>,
    pub physics: Option<PhysicsBlock>,
    pub render: Option<RenderBlock>,
    pub members: Option<Vec<MemberEntry>>,
}

impl ObjectRecord {
    /// The record a disabled object contributes
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            parent: ParentRef::None,
            identity: IdentityRef::Object(0),
            transform: None,
            physics: None,
            render: None,
            members: None,
        }
    }

    pub fn encode(&self, w: &mut ByteWriter) {
        w.write_bool(self.enabled);
        if !self.enabled {
            return;
        }

        match &self.parent {
            ParentRef::None => w.write_u64(PARENT_NONE),
            ParentRef::Instance(hash) => {
                w.write_u64(PARENT_PREFAB);
                w.write_str(hash);
            }
            ParentRef::Object(bits) => {
                debug_assert!(*bits != PARENT_NONE && *bits != PARENT_PREFAB);
                w.write_u64(*bits);
            }
        }

        match &self.identity {
            IdentityRef::Prefab {
                prefab_hash,
                instance_hash,
            } => {
                w.write_bool(true);
                w.write_str(prefab_hash);
                w.write_str(instance_hash);
            }
            IdentityRef::Object(bits) => {
                w.write_bool(false);
                w.write_u64(*bits);
            }
        }

        w.write_bool(self.transform.is_some());
        if let Some(t) = &self.transform {
            w.write_bool(t.use_local);
            w.write_bool(t.position.is_some());
            if let Some(p) = t.position {
                w.write_vec3(p);
            }
            w.write_bool(t.rotation.is_some());
            if let Some(r) = t.rotation {
                w.write_quat(r);
            }
            w.write_bool(t.scale.is_some());
            if let Some(s) = t.scale {
                w.write_vec3(s);
            }
        }

        w.write_bool(self.physics.is_some());
        if let Some(p) = &self.physics {
            w.write_bool(p.velocity.is_some());
            if let Some(v) = p.velocity {
                w.write_vec3(v);
            }
            w.write_bool(p.angular_velocity.is_some());
            if let Some(v) = p.angular_velocity {
                w.write_vec3(v);
            }
        }

        w.write_bool(self.render.is_some());
        if let Some(rb) = &self.render {
            w.write_bool(rb.color.is_some());
            if let Some(c) = rb.color {
                w.write_color(c);
            }
            w.write_bool(rb.texture.is_some());
            if let Some(t) = &rb.texture {
                w.write_str(t);
            }
            w.write_u32(rb.properties.len() as u32);
            for prop in &rb.properties {
                prop.encode(w);
            }
        }

        w.write_bool(self.members.is_some());
        if let Some(members) = &self.members {
            w.write_u32(members.len() as u32);
            for entry in members {
                entry.encode(w);
            }
        }
    }

    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, SaveError> {
        if !r.read_bool()? {
            return Ok(Self::disabled());
        }

        let parent = match r.read_u64()? {
            PARENT_NONE => ParentRef::None,
            PARENT_PREFAB => ParentRef::Instance(r.read_str()?),
            bits => ParentRef::Object(bits),
        };

        let identity = if r.read_bool()? {
            IdentityRef::Prefab {
                prefab_hash: r.read_str()?,
                instance_hash: r.read_str()?,
            }
        } else {
            IdentityRef::Object(r.read_u64()?)
        };

        let transform = if r.read_bool()? {
            let use_local = r.read_bool()?;
            let position = r.read_bool()?.then(|| r.read_vec3()).transpose()?;
            let rotation = r.read_bool()?.then(|| r.read_quat()).transpose()?;
            let scale = r.read_bool()?.then(|| r.read_vec3()).transpose()?;
            Some(TransformBlock {
                use_local,
                position,
                rotation,
                scale,
            })
        } else {
            None
        };

        let physics = if r.read_bool()? {
            let velocity = r.read_bool()?.then(|| r.read_vec3()).transpose()?;
            let angular_velocity = r.read_bool()?.then(|| r.read_vec3()).transpose()?;
            Some(PhysicsBlock {
                velocity,
                angular_velocity,
            })
        } else {
            None
        };

        let render = if r.read_bool()? {
            let color = r.read_bool()?.then(|| r.read_color()).transpose()?;
            let texture = r.read_bool()?.then(|| r.read_str()).transpose()?;
            let count = r.read_u32()?;
            let mut properties = Vec::with_capacity(count.min(1024) as usize);
            for _ in 0..count {
                properties.push(PropertyRecord::decode(r)?);
            }
            Some(RenderBlock {
                color,
                texture,
                properties,
            })
        } else {
            None
        };

        let members = if r.read_bool()? {
            let count = r.read_u32()?;
            let mut entries = Vec::with_capacity(count.min(1024) as usize);
            for _ in 0..count {
                entries.push(MemberEntry::decode(r)?);
            }
            Some(entries)
        } else {
            None
        };

        Ok(Self {
            enabled: true,
            parent,
            identity,
            transform,
            physics,
            render,
            members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{PropertyKind, PropertyRecord};
    use relic_scene::{PropertyValue, Value};

    fn full_record() -> ObjectRecord {
        ObjectRecord {
            enabled: true,
            parent: ParentRef::Instance("inst42".into()),
            identity: IdentityRef::Prefab {
                prefab_hash: "abc123".into(),
                instance_hash: "inst43".into(),
            },
            transform: Some(TransformBlock {
                use_local: true,
                position: Some(Vec3::new(1.0, 2.0, 3.0)),
                rotation: Some(Quat::IDENTITY),
                scale: None,
            }),
            physics: Some(PhysicsBlock {
                velocity: Some(Vec3::new(0.0, -1.0, 0.0)),
                angular_velocity: None,
            }),
            render: Some(RenderBlock {
                color: Some(Color::RED),
                texture: Some("textures/crate.png".into()),
                properties: vec![PropertyRecord {
                    material_index: 0,
                    kind: PropertyKind::Float,
                    name: "Glossiness".into(),
                    value: PropertyValue::Float(0.5),
                }],
            }),
            members: Some(vec![
                MemberEntry::Absent,
                MemberEntry::Present {
                    component: "Health".into(),
                    member: "current".into(),
                    value: Value::F32(12.0),
                },
            ]),
        }
    }

    #[test]
    fn test_full_round_trip() {
        let record = full_record();
        let mut w = ByteWriter::new();
        record.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(ObjectRecord::decode(&mut r).unwrap(), record);
        assert!(r.is_empty());
    }

    #[test]
    fn test_static_identity_round_trip() {
        let record = ObjectRecord {
            enabled: true,
            parent: ParentRef::Object(0x0000_0001_0000_0007),
            identity: IdentityRef::Object(0x0000_0002_0000_0003),
            transform: None,
            physics: None,
            render: None,
            members: None,
        };
        let mut w = ByteWriter::new();
        record.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(ObjectRecord::decode(&mut r).unwrap(), record);
    }

    #[test]
    fn test_disabled_is_single_byte() {
        let mut w = ByteWriter::new();
        ObjectRecord::disabled().encode(&mut w);
        assert_eq!(w.as_bytes(), &[0]);

        let mut r = ByteReader::new(&[0]);
        let record = ObjectRecord::decode(&mut r).unwrap();
        assert!(!record.enabled);
        assert!(r.is_empty());
    }

    #[test]
    fn test_records_stay_aligned_in_sequence() {
        // a desynchronized reader would fail on the second record
        let first = full_record();
        let second = ObjectRecord {
            enabled: true,
            parent: ParentRef::None,
            identity: IdentityRef::Object(0x0000_0001_0000_0000),
            transform: Some(TransformBlock {
                use_local: false,
                position: Some(Vec3::ONE),
                rotation: None,
                scale: Some(Vec3::ONE),
            }),
            physics: None,
            render: None,
            members: None,
        };

        let mut w = ByteWriter::new();
        first.encode(&mut w);
        ObjectRecord::disabled().encode(&mut w);
        second.encode(&mut w);

        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(ObjectRecord::decode(&mut r).unwrap(), first);
        assert!(!ObjectRecord::decode(&mut r).unwrap().enabled);
        assert_eq!(ObjectRecord::decode(&mut r).unwrap(), second);
        assert!(r.is_empty());
    }

    #[test]
    fn test_truncated_record() {
        let mut w = ByteWriter::new();
        full_record().encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes[..bytes.len() - 3]);
        assert!(ObjectRecord::decode(&mut r).is_err());
    }
}
