//! Renderable state
//!
//! Models the saveable surface of a renderer: per-material color, a
//! host-resolvable texture key, and a named shader property table. Mesh
//! data and drawing are host concerns.

use crate::component::Component;
use crate::value::Value;
use core::any::Any;
use relic_math::{Color, Mat4, Vec4};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A shader property value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Int(i32),
    Float(f32),
    FloatArray(Vec<f32>),
    Color(Color),
    ColorArray(Vec<Color>),
    Matrix(Mat4),
    MatrixArray(Vec<Mat4>),
    Vector(Vec4),
    VectorArray(Vec<Vec4>),
}

/// One material slot on a renderer
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    /// Host-resolvable asset key, stable across sessions
    pub texture: Option<String>,
    /// Named shader properties
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Material {
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

/// Renderer component with one or more material slots
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshRenderer {
    pub materials: Vec<Material>,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self {
            materials: vec![Material::default()],
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn material_mut(&mut self, index: usize) -> Option<&mut Material> {
        self.materials.get_mut(index)
    }

    /// The first material slot, the one color/texture state applies to
    pub fn primary(&self) -> Option<&Material> {
        self.materials.first()
    }

    pub fn primary_mut(&mut self) -> Option<&mut Material> {
        self.materials.first_mut()
    }
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for MeshRenderer {
    fn short_name(&self) -> &'static str {
        "MeshRenderer"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn get_member(&self, name: &str) -> Option<Value> {
        match name {
            "color" => self.primary().map(|m| Value::Color(m.color)),
            _ => None,
        }
    }

    fn set_member(&mut self, name: &str, value: Value) -> bool {
        match (name, value) {
            ("color", Value::Color(c)) => match self.primary_mut() {
                Some(m) => {
                    m.color = c;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    fn member_names(&self) -> &'static [&'static str] {
        &["color"]
    }
}
