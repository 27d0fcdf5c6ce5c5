//! Member values
//!
//! The closed set of values a component member can exchange with the save
//! system. Anything a host type wants persisted must be representable
//! here; arbitrary serializable state travels as an opaque [`Value::Blob`].

use relic_math::{Color, Mat4, Quat, Vec2, Vec3, Vec4};

/// A member value, exhaustively matchable
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Color(Color),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    /// Opaque serialized payload for values outside the closed set
    Blob(Vec<u8>),
}

impl Value {
    /// The kind of this value, for diagnostics and type checks
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Str(_) => ValueKind::Str,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Quat(_) => ValueKind::Quat,
            Value::Color(_) => ValueKind::Color,
            Value::Mat4(_) => ValueKind::Mat4,
            Value::FloatArray(_) => ValueKind::FloatArray,
            Value::Blob(_) => ValueKind::Blob,
        }
    }
}

/// Value discriminant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    I32,
    I64,
    F32,
    F64,
    Str,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Color,
    Mat4,
    FloatArray,
    Blob,
}

macro_rules! impl_value_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )+
    };
}

impl_value_from!(
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Color(Color),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
);

impl From<&str> for Value {
    #[inline]
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(Value::from(1.5f32).kind(), ValueKind::F32);
        assert_eq!(Value::from(Vec3::ONE).kind(), ValueKind::Vec3);
        assert_eq!(Value::Blob(vec![1, 2]).kind(), ValueKind::Blob);
    }
}
