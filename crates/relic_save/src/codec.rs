//! Value codec
//!
//! Fixed binary encoding shared by every part of the save stream. All
//! multi-byte values are little-endian; every numeric component is a
//! 32-bit IEEE-754 float written in field order (x,y,z[,w] / r,g,b,a /
//! row-major 4x4). Strings are UTF-8 with a u32 byte-length prefix,
//! arrays a u32 element count followed by fixed-size elements. Booleans
//! are a single byte; any nonzero byte reads back as true.

use crate::error::SaveError;
use relic_math::{Color, Mat4, Quat, Vec2, Vec3, Vec4};
use relic_scene::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

// Value wire tags, one byte each
const TAG_BOOL: u8 = 0;
const TAG_I32: u8 = 1;
const TAG_I64: u8 = 2;
const TAG_F32: u8 = 3;
const TAG_F64: u8 = 4;
const TAG_STR: u8 = 5;
const TAG_VEC2: u8 = 6;
const TAG_VEC3: u8 = 7;
const TAG_VEC4: u8 = 8;
const TAG_QUAT: u8 = 9;
const TAG_COLOR: u8 = 10;
const TAG_MAT4: u8 = 11;
const TAG_FLOAT_ARRAY: u8 = 12;
const TAG_BLOB: u8 = 13;

/// Growable little-endian byte sink
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    #[inline]
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_str(&mut self, v: &str) {
        self.write_u32(v.len() as u32);
        self.buf.extend_from_slice(v.as_bytes());
    }

    pub fn write_blob(&mut self, v: &[u8]) {
        self.write_u32(v.len() as u32);
        self.buf.extend_from_slice(v);
    }

    pub fn write_vec2(&mut self, v: Vec2) {
        self.write_f32(v.x);
        self.write_f32(v.y);
    }

    pub fn write_vec3(&mut self, v: Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    pub fn write_vec4(&mut self, v: Vec4) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
        self.write_f32(v.w);
    }

    pub fn write_quat(&mut self, v: Quat) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
        self.write_f32(v.w);
    }

    pub fn write_color(&mut self, v: Color) {
        self.write_f32(v.r);
        self.write_f32(v.g);
        self.write_f32(v.b);
        self.write_f32(v.a);
    }

    pub fn write_mat4(&mut self, v: &Mat4) {
        for e in v.to_rows_array() {
            self.write_f32(e);
        }
    }

    pub fn write_f32_array(&mut self, v: &[f32]) {
        self.write_u32(v.len() as u32);
        for e in v {
            self.write_f32(*e);
        }
    }

    pub fn write_vec4_array(&mut self, v: &[Vec4]) {
        self.write_u32(v.len() as u32);
        for e in v {
            self.write_vec4(*e);
        }
    }

    pub fn write_color_array(&mut self, v: &[Color]) {
        self.write_u32(v.len() as u32);
        for e in v {
            self.write_color(*e);
        }
    }

    pub fn write_mat4_array(&mut self, v: &[Mat4]) {
        self.write_u32(v.len() as u32);
        for e in v {
            self.write_mat4(e);
        }
    }

    /// Write a tagged member value
    pub fn write_value(&mut self, v: &Value) {
        match v {
            Value::Bool(b) => {
                self.write_u8(TAG_BOOL);
                self.write_bool(*b);
            }
            Value::I32(i) => {
                self.write_u8(TAG_I32);
                self.write_i32(*i);
            }
            Value::I64(i) => {
                self.write_u8(TAG_I64);
                self.write_i64(*i);
            }
            Value::F32(f) => {
                self.write_u8(TAG_F32);
                self.write_f32(*f);
            }
            Value::F64(f) => {
                self.write_u8(TAG_F64);
                self.write_f64(*f);
            }
            Value::Str(s) => {
                self.write_u8(TAG_STR);
                self.write_str(s);
            }
            Value::Vec2(v) => {
                self.write_u8(TAG_VEC2);
                self.write_vec2(*v);
            }
            Value::Vec3(v) => {
                self.write_u8(TAG_VEC3);
                self.write_vec3(*v);
            }
            Value::Vec4(v) => {
                self.write_u8(TAG_VEC4);
                self.write_vec4(*v);
            }
            Value::Quat(q) => {
                self.write_u8(TAG_QUAT);
                self.write_quat(*q);
            }
            Value::Color(c) => {
                self.write_u8(TAG_COLOR);
                self.write_color(*c);
            }
            Value::Mat4(m) => {
                self.write_u8(TAG_MAT4);
                self.write_mat4(m);
            }
            Value::FloatArray(a) => {
                self.write_u8(TAG_FLOAT_ARRAY);
                self.write_f32_array(a);
            }
            Value::Blob(b) => {
                self.write_u8(TAG_BLOB);
                self.write_blob(b);
            }
        }
    }
}

/// Cursor over an immutable byte stream
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SaveError> {
        if self.remaining() < n {
            return Err(SaveError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_bool(&mut self) -> Result<bool, SaveError> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8, SaveError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, SaveError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_i32(&mut self) -> Result<i32, SaveError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64, SaveError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> Result<i64, SaveError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32, SaveError> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_f64(&mut self) -> Result<f64, SaveError> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_str(&mut self) -> Result<String, SaveError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SaveError::Corrupted(format!("invalid UTF-8 string: {e}")))
    }

    pub fn read_blob(&mut self) -> Result<Vec<u8>, SaveError> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_vec2(&mut self) -> Result<Vec2, SaveError> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, SaveError> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4, SaveError> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_quat(&mut self) -> Result<Quat, SaveError> {
        Ok(Quat::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_color(&mut self) -> Result<Color, SaveError> {
        Ok(Color::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_mat4(&mut self) -> Result<Mat4, SaveError> {
        let mut rows = [0.0f32; 16];
        for e in rows.iter_mut() {
            *e = self.read_f32()?;
        }
        Ok(Mat4::from_rows_array(&rows))
    }

    /// Array count sanity check against the bytes actually left
    fn read_count(&mut self, elem_size: usize) -> Result<usize, SaveError> {
        let count = self.read_u32()? as usize;
        if count * elem_size > self.remaining() {
            return Err(SaveError::UnexpectedEof);
        }
        Ok(count)
    }

    pub fn read_f32_array(&mut self) -> Result<Vec<f32>, SaveError> {
        let count = self.read_count(4)?;
        (0..count).map(|_| self.read_f32()).collect()
    }

    pub fn read_vec4_array(&mut self) -> Result<Vec<Vec4>, SaveError> {
        let count = self.read_count(16)?;
        (0..count).map(|_| self.read_vec4()).collect()
    }

    pub fn read_color_array(&mut self) -> Result<Vec<Color>, SaveError> {
        let count = self.read_count(16)?;
        (0..count).map(|_| self.read_color()).collect()
    }

    pub fn read_mat4_array(&mut self) -> Result<Vec<Mat4>, SaveError> {
        let count = self.read_count(64)?;
        (0..count).map(|_| self.read_mat4()).collect()
    }

    /// Read a tagged member value
    pub fn read_value(&mut self) -> Result<Value, SaveError> {
        let tag = self.read_u8()?;
        Ok(match tag {
            TAG_BOOL => Value::Bool(self.read_bool()?),
            TAG_I32 => Value::I32(self.read_i32()?),
            TAG_I64 => Value::I64(self.read_i64()?),
            TAG_F32 => Value::F32(self.read_f32()?),
            TAG_F64 => Value::F64(self.read_f64()?),
            TAG_STR => Value::Str(self.read_str()?),
            TAG_VEC2 => Value::Vec2(self.read_vec2()?),
            TAG_VEC3 => Value::Vec3(self.read_vec3()?),
            TAG_VEC4 => Value::Vec4(self.read_vec4()?),
            TAG_QUAT => Value::Quat(self.read_quat()?),
            TAG_COLOR => Value::Color(self.read_color()?),
            TAG_MAT4 => Value::Mat4(self.read_mat4()?),
            TAG_FLOAT_ARRAY => Value::FloatArray(self.read_f32_array()?),
            TAG_BLOB => Value::Blob(self.read_blob()?),
            other => {
                return Err(SaveError::Corrupted(format!("unknown value tag {other}")));
            }
        })
    }
}

/// Box an arbitrary serializable value into the closed value set.
///
/// The escape hatch for host types outside the aggregate/scalar variants:
/// the value travels as an opaque blob. Failure to serialize surfaces as
/// [`SaveError::UnsupportedValue`] - a design-time misconfiguration of
/// what was selected for saving, so it is not swallowed.
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, SaveError> {
    bincode::serialize(value)
        .map(Value::Blob)
        .map_err(|e| SaveError::UnsupportedValue(e.to_string()))
}

/// Unbox a value produced by [`to_value`]
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, SaveError> {
    match value {
        Value::Blob(bytes) => bincode::deserialize(bytes)
            .map_err(|e| SaveError::Corrupted(format!("blob decode failed: {e}"))),
        other => Err(SaveError::UnsupportedValue(format!(
            "expected blob, found {:?}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut w = ByteWriter::new();
        w.write_vec3(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            w.as_bytes(),
            &[0, 0, 128, 63, 0, 0, 0, 64, 0, 0, 64, 64]
        );

        let mut w = ByteWriter::new();
        w.write_str("abc");
        assert_eq!(w.as_bytes(), &[3, 0, 0, 0, b'a', b'b', b'c']);

        let mut w = ByteWriter::new();
        w.write_u32(0x0403_0201);
        assert_eq!(w.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_aggregate_round_trips() {
        let mat = Mat4::from_rows_array(&[
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            13.0, 14.0, 15.0, 16.0,
        ]);

        let mut w = ByteWriter::new();
        w.write_vec2(Vec2::new(1.0, -2.0));
        w.write_vec3(Vec3::new(0.5, 0.25, -0.125));
        w.write_vec4(Vec4::new(1.0, 2.0, 3.0, 4.0));
        w.write_quat(Quat::new(0.0, 0.7071, 0.0, 0.7071));
        w.write_color(Color::new(0.1, 0.2, 0.3, 0.4));
        w.write_mat4(&mat);

        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_vec2().unwrap(), Vec2::new(1.0, -2.0));
        assert_eq!(r.read_vec3().unwrap(), Vec3::new(0.5, 0.25, -0.125));
        assert_eq!(r.read_vec4().unwrap(), Vec4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(r.read_quat().unwrap(), Quat::new(0.0, 0.7071, 0.0, 0.7071));
        assert_eq!(r.read_color().unwrap(), Color::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(r.read_mat4().unwrap(), mat);
        assert!(r.is_empty());
    }

    #[test]
    fn test_array_round_trips() {
        let mut w = ByteWriter::new();
        w.write_f32_array(&[1.0, 2.0, 3.0]);
        w.write_vec4_array(&[Vec4::X, Vec4::W]);
        w.write_color_array(&[Color::RED, Color::BLUE]);
        w.write_mat4_array(&[Mat4::IDENTITY]);

        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_f32_array().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(r.read_vec4_array().unwrap(), vec![Vec4::X, Vec4::W]);
        assert_eq!(r.read_color_array().unwrap(), vec![Color::RED, Color::BLUE]);
        assert_eq!(r.read_mat4_array().unwrap(), vec![Mat4::IDENTITY]);
        assert!(r.is_empty());
    }

    #[test]
    fn test_empty_array() {
        let mut w = ByteWriter::new();
        w.write_f32_array(&[]);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_f32_array().unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_value_round_trips() {
        let values = vec![
            Value::Bool(true),
            Value::I32(-42),
            Value::I64(1 << 40),
            Value::F32(3.5),
            Value::F64(-0.125),
            Value::Str("hello".into()),
            Value::Vec2(Vec2::new(1.0, 2.0)),
            Value::Vec3(Vec3::new(1.0, 2.0, 3.0)),
            Value::Vec4(Vec4::ONE),
            Value::Quat(Quat::IDENTITY),
            Value::Color(Color::GREEN),
            Value::Mat4(Mat4::IDENTITY),
            Value::FloatArray(vec![1.0, -1.0]),
            Value::Blob(vec![0xde, 0xad]),
        ];

        let mut w = ByteWriter::new();
        for v in &values {
            w.write_value(v);
        }
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        for v in &values {
            assert_eq!(&r.read_value().unwrap(), v);
        }
        assert!(r.is_empty());
    }

    #[test]
    fn test_truncated_stream() {
        let mut w = ByteWriter::new();
        w.write_vec3(Vec3::ONE);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes[..7]);
        assert!(matches!(r.read_vec3(), Err(SaveError::UnexpectedEof)));
    }

    #[test]
    fn test_oversized_array_count() {
        // claims 1000 floats but carries none
        let mut w = ByteWriter::new();
        w.write_u32(1000);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(r.read_f32_array(), Err(SaveError::UnexpectedEof)));
    }

    #[test]
    fn test_unknown_value_tag() {
        let mut r = ByteReader::new(&[0xff]);
        assert!(matches!(r.read_value(), Err(SaveError::Corrupted(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut w = ByteWriter::new();
        w.write_u32(2);
        w.write_u8(0xff);
        w.write_u8(0xfe);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(r.read_str(), Err(SaveError::Corrupted(_))));
    }

    #[test]
    fn test_boxed_value_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Inventory {
            slots: Vec<u32>,
        }

        let inv = Inventory {
            slots: vec![1, 2, 3],
        };
        let boxed = to_value(&inv).unwrap();
        assert!(matches!(boxed, Value::Blob(_)));
        let back: Inventory = from_value(&boxed).unwrap();
        assert_eq!(back, inv);
    }

    #[test]
    fn test_unbox_wrong_variant() {
        let err = from_value::<u32>(&Value::Bool(true));
        assert!(matches!(err, Err(SaveError::UnsupportedValue(_))));
    }
}
