//! Conversion between value kinds.

use super::colour::Colour;
use super::duration::TimeDuration;
use super::geometry::Geometry;
use super::value::{parse_bool, Image, Value};
use crate::types::ColumnKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number-parsing conventions used when text becomes a number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Decimal separator of the locale.
    pub decimal_separator: char,

    /// Thousands separator of the locale, stripped before parsing.
    pub grouping_separator: Option<char>,

    /// Reject integer text with a leading zero followed by another digit,
    /// so zero-padded codes (postal codes, ids) stay text.
    pub strict_integers: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: Some(','),
            strict_integers: false,
        }
    }
}

/// Converts values between kinds under a fixed set of options.
///
/// Conversion never fails loudly: input that cannot be represented in the
/// target kind yields `None`, and the caller decides what that means.
#[derive(Clone, Debug, Default)]
pub struct Converter {
    options: ConversionOptions,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    /// Converter with strict integer parsing enabled.
    pub fn strict() -> Self {
        Self::new(ConversionOptions {
            strict_integers: true,
            ..Default::default()
        })
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Convert `value` to `kind`.
    ///
    /// `hint` names the kind the value originally came from. When the value is
    /// text but the hint names another kind, the text is first read as that
    /// kind, so `"#FF0000"` hinted as a colour converts to the integer
    /// `0xFF0000` rather than failing integer parsing.
    pub fn convert(
        &self,
        kind: ColumnKind,
        value: Option<&Value>,
        hint: Option<ColumnKind>,
    ) -> Option<Value> {
        let value = value?;
        match (value, hint) {
            (Value::Text(_), Some(hint)) if hint != ColumnKind::Text && hint != kind => {
                let intermediate = self.convert_value(hint, value)?;
                self.convert_value(kind, &intermediate)
            }
            _ => self.convert_value(kind, value),
        }
    }

    /// Convert a non-null value to `kind`.
    pub fn convert_value(&self, kind: ColumnKind, value: &Value) -> Option<Value> {
        if value.kind() == kind {
            return Some(value.clone());
        }
        match kind {
            ColumnKind::Text => Some(Value::Text(self.to_text(value))),
            ColumnKind::Integer64 => self.to_integer(value).map(Value::Integer),
            ColumnKind::Float64 => self.to_float(value).map(Value::Float),
            ColumnKind::Colour => self.to_colour(value).map(Value::Colour),
            ColumnKind::Image => match value {
                Value::Text(s) => Image::from_hex(s.trim()).map(Value::Image),
                _ => None,
            },
            ColumnKind::TimeDuration => self.to_duration(value).map(Value::Duration),
            ColumnKind::Geometry => match value {
                Value::Text(s) => Geometry::parse_wkt(s).map(|g| Value::Geometry(Arc::new(g))),
                _ => None,
            },
        }
    }

    /// Text form of any value. Every kind has one.
    pub fn to_text(&self, value: &Value) -> String {
        match value {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Colour(c) => c.to_hex(),
            Value::Image(img) => img.to_hex(),
            Value::Duration(d) => d.to_string(),
            Value::Geometry(g) => g.to_wkt(),
        }
    }

    fn to_integer(&self, value: &Value) -> Option<i64> {
        match value {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => float_to_integer(f.round()),
            Value::Colour(c) => Some(i64::from(c.to_rgb())),
            Value::Duration(d) => Some(d.millis),
            Value::Text(s) => self.parse_integer(s),
            Value::Image(_) | Value::Geometry(_) => None,
        }
    }

    fn to_float(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::Colour(c) => Some(f64::from(c.to_rgb())),
            Value::Duration(d) => Some(d.millis as f64),
            Value::Text(s) => self.parse_float(s),
            Value::Image(_) | Value::Geometry(_) => None,
        }
    }

    fn to_colour(&self, value: &Value) -> Option<Colour> {
        match value {
            Value::Colour(c) => Some(*c),
            Value::Integer(i) => Colour::from_rgb(*i),
            Value::Float(f) if f.fract() == 0.0 => Colour::from_rgb(float_to_integer(*f)?),
            Value::Text(s) => Colour::parse(s),
            _ => None,
        }
    }

    fn to_duration(&self, value: &Value) -> Option<TimeDuration> {
        match value {
            Value::Duration(d) => Some(*d),
            Value::Integer(i) => Some(TimeDuration::from_millis(*i)),
            Value::Float(f) => float_to_integer(f.round()).map(TimeDuration::from_millis),
            Value::Text(s) => TimeDuration::parse(s),
            _ => None,
        }
    }

    /// Parse integer text, honouring strict mode.
    ///
    /// Falls back to float parsing and accepts the result only when it is a
    /// whole number.
    pub fn parse_integer(&self, s: &str) -> Option<i64> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Some(b) = parse_bool(s) {
            return Some(i64::from(b));
        }
        if self.options.strict_integers && self.is_padded_code(s) {
            return None;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Some(i);
        }
        let f = self.parse_float(s)?;
        if f.fract() != 0.0 {
            return None;
        }
        float_to_integer(f)
    }

    /// Leading-zero check on the text as written and with grouping removed.
    fn is_padded_code(&self, s: &str) -> bool {
        if has_padding_zero(s) {
            return true;
        }
        match self.options.grouping_separator {
            Some(sep) if s.contains(sep) => {
                let ungrouped: String = s.chars().filter(|&c| c != sep).collect();
                has_padding_zero(&ungrouped)
            }
            _ => false,
        }
    }

    /// Parse float text.
    ///
    /// Text containing a literal `.` is parsed directly; anything else goes
    /// through the locale's separators. `NaN` is not a number here.
    pub fn parse_float(&self, s: &str) -> Option<f64> {
        self.parse_float_raw(s).filter(|f| !f.is_nan())
    }

    fn parse_float_raw(&self, s: &str) -> Option<f64> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Some(b) = parse_bool(s) {
            return Some(if b { 1.0 } else { 0.0 });
        }
        if s.contains('.') {
            if let Ok(f) = s.parse::<f64>() {
                return Some(f);
            }
        }
        self.parse_localised(s)
    }

    fn parse_localised(&self, s: &str) -> Option<f64> {
        let ConversionOptions {
            decimal_separator,
            grouping_separator,
            ..
        } = self.options;
        let normalised: String = s
            .chars()
            .filter(|c| Some(*c) != grouping_separator)
            .map(|c| if c == decimal_separator { '.' } else { c })
            .collect();
        if normalised.is_empty() {
            return None;
        }
        normalised.parse::<f64>().ok()
    }
}

fn float_to_integer(f: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; 2^63 is the first value past it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f >= -LIMIT && f < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}

fn has_padding_zero(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut bytes = digits.bytes();
    matches!(
        (bytes.next(), bytes.next()),
        (Some(b'0'), Some(d)) if d.is_ascii_digit()
    )
}

/// Convert with the default options.
pub fn convert(kind: ColumnKind, value: Option<&Value>, hint: Option<ColumnKind>) -> Option<Value> {
    Converter::default().convert(kind, value, hint)
}
