//! Material property persistence
//!
//! A [`MaterialProperty`] is a designer-configured pointer into a
//! renderer's shader property table, resolved by name and kind on both
//! sides. Unresolvable properties are skipped with a warning; a stale
//! property list never aborts a save or load.

use crate::codec::{ByteReader, ByteWriter};
use crate::error::SaveError;
use log::warn;
use relic_scene::{MeshRenderer, ObjectId, PropertyValue, Scene};
use serde::{Deserialize, Serialize};

/// Shader property kinds the save stream understands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Int,
    Float,
    FloatArray,
    Color,
    ColorArray,
    Matrix,
    MatrixArray,
    Vector,
    VectorArray,
}

impl PropertyKind {
    pub(crate) fn tag(self) -> u8 {
        match self {
            PropertyKind::Int => 0,
            PropertyKind::Float => 1,
            PropertyKind::FloatArray => 2,
            PropertyKind::Color => 3,
            PropertyKind::ColorArray => 4,
            PropertyKind::Matrix => 5,
            PropertyKind::MatrixArray => 6,
            PropertyKind::Vector => 7,
            PropertyKind::VectorArray => 8,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Self, SaveError> {
        Ok(match tag {
            0 => PropertyKind::Int,
            1 => PropertyKind::Float,
            2 => PropertyKind::FloatArray,
            3 => PropertyKind::Color,
            4 => PropertyKind::ColorArray,
            5 => PropertyKind::Matrix,
            6 => PropertyKind::MatrixArray,
            7 => PropertyKind::Vector,
            8 => PropertyKind::VectorArray,
            other => {
                return Err(SaveError::Corrupted(format!(
                    "unknown material property kind {other}"
                )));
            }
        })
    }

    /// Does a live property value match this declared kind?
    pub fn matches(self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (PropertyKind::Int, PropertyValue::Int(_))
                | (PropertyKind::Float, PropertyValue::Float(_))
                | (PropertyKind::FloatArray, PropertyValue::FloatArray(_))
                | (PropertyKind::Color, PropertyValue::Color(_))
                | (PropertyKind::ColorArray, PropertyValue::ColorArray(_))
                | (PropertyKind::Matrix, PropertyValue::Matrix(_))
                | (PropertyKind::MatrixArray, PropertyValue::MatrixArray(_))
                | (PropertyKind::Vector, PropertyValue::Vector(_))
                | (PropertyKind::VectorArray, PropertyValue::VectorArray(_))
        )
    }
}

/// Designer-configured pointer into a renderer's shader property table
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialProperty {
    pub material_index: u32,
    pub kind: PropertyKind,
    pub name: String,
}

impl MaterialProperty {
    pub fn new(material_index: u32, kind: PropertyKind, name: impl Into<String>) -> Self {
        Self {
            material_index,
            kind,
            name: name.into(),
        }
    }
}

/// A resolved property value inside a record's render block
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyRecord {
    pub material_index: u32,
    pub kind: PropertyKind,
    pub name: String,
    pub value: PropertyValue,
}

impl PropertyRecord {
    pub fn encode(&self, w: &mut ByteWriter) {
        w.write_u32(self.material_index);
        w.write_u8(self.kind.tag());
        w.write_str(&self.name);
        match &self.value {
            PropertyValue::Int(v) => w.write_i32(*v),
            PropertyValue::Float(v) => w.write_f32(*v),
            PropertyValue::FloatArray(v) => w.write_f32_array(v),
            PropertyValue::Color(v) => w.write_color(*v),
            PropertyValue::ColorArray(v) => w.write_color_array(v),
            PropertyValue::Matrix(v) => w.write_mat4(v),
            PropertyValue::MatrixArray(v) => w.write_mat4_array(v),
            PropertyValue::Vector(v) => w.write_vec4(*v),
            PropertyValue::VectorArray(v) => w.write_vec4_array(v),
        }
    }

    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, SaveError> {
        let material_index = r.read_u32()?;
        let kind = PropertyKind::from_tag(r.read_u8()?)?;
        let name = r.read_str()?;
        let value = match kind {
            PropertyKind::Int => PropertyValue::Int(r.read_i32()?),
            PropertyKind::Float => PropertyValue::Float(r.read_f32()?),
            PropertyKind::FloatArray => PropertyValue::FloatArray(r.read_f32_array()?),
            PropertyKind::Color => PropertyValue::Color(r.read_color()?),
            PropertyKind::ColorArray => PropertyValue::ColorArray(r.read_color_array()?),
            PropertyKind::Matrix => PropertyValue::Matrix(r.read_mat4()?),
            PropertyKind::MatrixArray => PropertyValue::MatrixArray(r.read_mat4_array()?),
            PropertyKind::Vector => PropertyValue::Vector(r.read_vec4()?),
            PropertyKind::VectorArray => PropertyValue::VectorArray(r.read_vec4_array()?),
        };
        Ok(Self {
            material_index,
            kind,
            name,
            value,
        })
    }
}

/// Resolve a configured property against the live renderer.
///
/// Returns `None` (with a warning) when the renderer, the material slot,
/// the property, or its kind does not line up - the record then simply
/// omits this property and the stream stays aligned.
pub fn capture(scene: &Scene, id: ObjectId, prop: &MaterialProperty) -> Option<PropertyRecord> {
    let Some(renderer) = scene.component::<MeshRenderer>(id) else {
        warn!("cannot save {id} material property {}: no renderer", prop.name);
        return None;
    };
    let Some(material) = renderer.material(prop.material_index as usize) else {
        warn!(
            "cannot save {id} material property {}: no material slot {}",
            prop.name, prop.material_index
        );
        return None;
    };
    let Some(value) = material.properties.get(&prop.name) else {
        warn!("cannot save {id} material property {}: not found", prop.name);
        return None;
    };
    if !prop.kind.matches(value) {
        warn!(
            "cannot save {id} material property {}: kind mismatch (configured {:?})",
            prop.name, prop.kind
        );
        return None;
    }
    Some(PropertyRecord {
        material_index: prop.material_index,
        kind: prop.kind,
        name: prop.name.clone(),
        value: value.clone(),
    })
}

/// Reapply a saved property to the current renderer.
///
/// An existing property of a different kind is left untouched (warning);
/// otherwise the value is written into the table.
pub fn apply(scene: &mut Scene, id: ObjectId, record: &PropertyRecord) {
    let Some(renderer) = scene.component_mut::<MeshRenderer>(id) else {
        warn!("cannot load {id} material property {}: no renderer", record.name);
        return;
    };
    let Some(material) = renderer.material_mut(record.material_index as usize) else {
        warn!(
            "cannot load {id} material property {}: no material slot {}",
            record.name, record.material_index
        );
        return;
    };
    if let Some(existing) = material.properties.get(&record.name) {
        if !record.kind.matches(existing) {
            warn!(
                "cannot load {id} material property {}: kind mismatch",
                record.name
            );
            return;
        }
    }
    material
        .properties
        .insert(record.name.clone(), record.value.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_math::Color;

    fn scene_with_renderer() -> (Scene, ObjectId) {
        let mut scene = Scene::new("test");
        let id = scene.spawn("obj");
        let mut renderer = MeshRenderer::new();
        renderer.primary_mut().unwrap().properties.insert(
            "Glossiness".into(),
            PropertyValue::Float(0.5),
        );
        scene.add_component(id, renderer);
        (scene, id)
    }

    #[test]
    fn test_capture_resolves_by_name_and_kind() {
        let (scene, id) = scene_with_renderer();

        let ok = capture(
            &scene,
            id,
            &MaterialProperty::new(0, PropertyKind::Float, "Glossiness"),
        );
        assert_eq!(
            ok.unwrap().value,
            PropertyValue::Float(0.5)
        );

        // wrong kind, wrong name, wrong slot: all skipped
        assert!(capture(
            &scene,
            id,
            &MaterialProperty::new(0, PropertyKind::Color, "Glossiness")
        )
        .is_none());
        assert!(capture(
            &scene,
            id,
            &MaterialProperty::new(0, PropertyKind::Float, "Missing")
        )
        .is_none());
        assert!(capture(
            &scene,
            id,
            &MaterialProperty::new(3, PropertyKind::Float, "Glossiness")
        )
        .is_none());
    }

    #[test]
    fn test_apply_kind_mismatch_is_skipped() {
        let (mut scene, id) = scene_with_renderer();
        apply(
            &mut scene,
            id,
            &PropertyRecord {
                material_index: 0,
                kind: PropertyKind::Color,
                name: "Glossiness".into(),
                value: PropertyValue::Color(Color::RED),
            },
        );
        // untouched
        let renderer = scene.component::<MeshRenderer>(id).unwrap();
        assert_eq!(
            renderer.primary().unwrap().properties["Glossiness"],
            PropertyValue::Float(0.5)
        );
    }

    #[test]
    fn test_record_round_trip() {
        let records = vec![
            PropertyRecord {
                material_index: 0,
                kind: PropertyKind::Int,
                name: "Mode".into(),
                value: PropertyValue::Int(2),
            },
            PropertyRecord {
                material_index: 1,
                kind: PropertyKind::ColorArray,
                name: "Tints".into(),
                value: PropertyValue::ColorArray(vec![Color::RED, Color::WHITE]),
            },
        ];
        let mut w = ByteWriter::new();
        for rec in &records {
            rec.encode(&mut w);
        }
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        for rec in &records {
            assert_eq!(&PropertyRecord::decode(&mut r).unwrap(), rec);
        }
        assert!(r.is_empty());
    }

    #[test]
    fn test_material_slot_add_on_apply() {
        let (mut scene, id) = scene_with_renderer();
        apply(
            &mut scene,
            id,
            &PropertyRecord {
                material_index: 0,
                kind: PropertyKind::Vector,
                name: "Offset".into(),
                value: PropertyValue::Vector(relic_math::Vec4::ONE),
            },
        );
        let renderer = scene.component::<MeshRenderer>(id).unwrap();
        assert_eq!(
            renderer.primary().unwrap().properties["Offset"],
            PropertyValue::Vector(relic_math::Vec4::ONE)
        );
    }
}
