//! Cell values.

use super::colour::Colour;
use super::duration::TimeDuration;
use super::geometry::Geometry;
use crate::types::ColumnKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared, immutable geometry held by a cell.
pub type GeometryRef = Arc<Geometry>;

/// Encoded image bytes. Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Image(Arc<[u8]>);

impl Image {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Image(Arc::from(bytes.into()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering used for the image's text form.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        if bytes.is_empty() {
            return None;
        }
        Some(Image::new(bytes))
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image({} bytes)", self.0.len())
    }
}

/// A non-null cell value. Null is represented as `Option::None` at every
/// API boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Colour(Colour),
    Image(Image),
    Duration(TimeDuration),
    Geometry(GeometryRef),
}

impl Value {
    /// The kind this value natively belongs to.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Text(_) => ColumnKind::Text,
            Value::Integer(_) => ColumnKind::Integer64,
            Value::Float(_) => ColumnKind::Float64,
            Value::Colour(_) => ColumnKind::Colour,
            Value::Image(_) => ColumnKind::Image,
            Value::Duration(_) => ColumnKind::TimeDuration,
            Value::Geometry(_) => ColumnKind::Geometry,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Booleans are stored as the integers 1 and 0.
    pub fn from_bool(b: bool) -> Self {
        Value::Integer(i64::from(b))
    }

    /// Interpret the value under the boolean convention.
    ///
    /// Only 0/1 numbers and the words `true`/`false` qualify.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Integer(0) => Some(false),
            Value::Integer(1) => Some(true),
            Value::Float(f) if *f == 0.0 => Some(false),
            Value::Float(f) if *f == 1.0 => Some(true),
            Value::Text(s) => parse_bool(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Rough heap + inline footprint, used to bound the undo history.
    pub fn estimated_size(&self) -> usize {
        const INLINE: usize = std::mem::size_of::<Value>();
        INLINE
            + match self {
                Value::Text(s) => s.capacity(),
                Value::Image(img) => img.len(),
                Value::Geometry(g) => g.coord_count() * std::mem::size_of::<f64>() * 2,
                _ => 0,
            }
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::from_bool(b)
    }
}

impl From<Colour> for Value {
    fn from(c: Colour) -> Self {
        Value::Colour(c)
    }
}

impl From<TimeDuration> for Value {
    fn from(d: TimeDuration) -> Self {
        Value::Duration(d)
    }
}

impl From<Image> for Value {
    fn from(img: Image) -> Self {
        Value::Image(img)
    }
}

impl From<Geometry> for Value {
    fn from(g: Geometry) -> Self {
        Value::Geometry(Arc::new(g))
    }
}
