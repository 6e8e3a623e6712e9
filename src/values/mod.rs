//! Typed values.
//!
//! Every cell holds `Option<Value>`. This module defines the seven value
//! domains and the rules for moving between them:
//!
//! - [`Converter::convert`] coerces a value to a kind, yielding `None` for
//!   anything unrepresentable rather than an error
//! - [`Converter::compare`] totally orders values viewed as a kind
//! - [`Converter::equals`] is the equality that ordering induces
//!
//! The free functions [`convert`], [`compare`] and [`equals`] use the
//! default options.

mod colour;
mod compare;
mod convert;
mod duration;
mod geometry;
mod value;

pub use colour::Colour;
pub use compare::{compare, equals};
pub use convert::{convert, ConversionOptions, Converter};
pub use duration::TimeDuration;
pub use geometry::{Coord, Geometry};
pub use value::{GeometryRef, Image, Value};
