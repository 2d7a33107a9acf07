use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;
use crate::operation::Operation;

/// Straight RGBA color with components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    #[serde(default = "opaque")]
    pub alpha: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);

    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self::new(red, green, blue, 1.0)
    }

    pub fn to_rgb(self) -> [f32; 3] {
        [self.red, self.green, self.blue]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(r: {}, g: {}, b: {}, a: {})",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

/// A point in normalized texture coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: Option<f32>,
}

impl Position {
    pub const CENTER: Self = Self::new(0.5, 0.5);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "(x: {}, y: {}, z: {z})", self.x, self.y),
            None => write!(f, "(x: {}, y: {})", self.x, self.y),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(w: {}, h: {})", self.width, self.height)
    }
}

/// A typed parameter value as captured in a representation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireValue", into = "WireValue")]
pub enum ParameterValue {
    Float(f32),
    Size(Size),
    Position(Position),
    Color(Color),
}

impl ParameterValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "FLOAT",
            Self::Size(_) => "SIZE",
            Self::Position(_) => "POSITION",
            Self::Color(_) => "COLOR",
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "[FLOAT] {v}"),
            Self::Size(v) => write!(f, "[SIZE] {v}"),
            Self::Position(v) => write!(f, "[POSITION] {v}"),
            Self::Color(v) => write!(f, "[COLOR] {v}"),
        }
    }
}

// Stored representations wrap each associated value as `{"<case>": {"_0": value}}`.
#[derive(Serialize, Deserialize)]
struct Payload<T> {
    #[serde(rename = "_0")]
    value: T,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireValue {
    Float(Payload<f32>),
    Size(Payload<Size>),
    Position(Payload<Position>),
    Color(Payload<Color>),
}

impl From<WireValue> for ParameterValue {
    fn from(wire: WireValue) -> Self {
        match wire {
            WireValue::Float(p) => Self::Float(p.value),
            WireValue::Size(p) => Self::Size(p.value),
            WireValue::Position(p) => Self::Position(p.value),
            WireValue::Color(p) => Self::Color(p.value),
        }
    }
}

impl From<ParameterValue> for WireValue {
    fn from(value: ParameterValue) -> Self {
        match value {
            ParameterValue::Float(value) => Self::Float(Payload { value }),
            ParameterValue::Size(value) => Self::Size(Payload { value }),
            ParameterValue::Position(value) => Self::Position(Payload { value }),
            ParameterValue::Color(value) => Self::Color(Payload { value }),
        }
    }
}

pub type Getter<T> = fn(&Operation) -> Result<T, ParameterError>;
pub type Setter<T> = fn(&mut Operation, T) -> Result<(), ParameterError>;

/// A slider-backed scalar setting.
#[derive(Clone, Debug)]
pub struct ScalarParameter {
    pub name: &'static str,
    pub range: RangeInclusive<f32>,
    pub step_count: Option<u32>,
    pub get: Getter<f32>,
    pub set: Setter<f32>,
}

/// Accessor pair for a non-scalar setting.
#[derive(Clone, Debug)]
pub struct Accessor<T> {
    pub name: &'static str,
    pub get: Getter<T>,
    pub set: Setter<T>,
}

/// One named, typed setting of a filter, bound to the operation variant the
/// filter produces. Accessors never validate ranges; out-of-range values are
/// forwarded as-is.
#[derive(Clone, Debug)]
pub enum ParameterDescriptor {
    Scalar(ScalarParameter),
    Color(Accessor<Color>),
    Position(Accessor<Position>),
    Size(Accessor<Size>),
}

impl ParameterDescriptor {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar(p) => p.name,
            Self::Color(p) => p.name,
            Self::Position(p) => p.name,
            Self::Size(p) => p.name,
        }
    }

    /// Value kind tag, matching [`ParameterValue::kind`].
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "FLOAT",
            Self::Color(_) => "COLOR",
            Self::Position(_) => "POSITION",
            Self::Size(_) => "SIZE",
        }
    }

    pub fn range(&self) -> Option<&RangeInclusive<f32>> {
        match self {
            Self::Scalar(p) => Some(&p.range),
            _ => None,
        }
    }

    pub fn step_count(&self) -> Option<u32> {
        match self {
            Self::Scalar(p) => p.step_count,
            _ => None,
        }
    }

    pub fn read(&self, operation: &Operation) -> Result<ParameterValue, ParameterError> {
        Ok(match self {
            Self::Scalar(p) => ParameterValue::Float((p.get)(operation)?),
            Self::Color(p) => ParameterValue::Color((p.get)(operation)?),
            Self::Position(p) => ParameterValue::Position((p.get)(operation)?),
            Self::Size(p) => ParameterValue::Size((p.get)(operation)?),
        })
    }

    pub fn write(
        &self,
        operation: &mut Operation,
        value: &ParameterValue,
    ) -> Result<(), ParameterError> {
        match (self, value) {
            (Self::Scalar(p), ParameterValue::Float(v)) => (p.set)(operation, *v),
            (Self::Color(p), ParameterValue::Color(v)) => (p.set)(operation, *v),
            (Self::Position(p), ParameterValue::Position(v)) => (p.set)(operation, *v),
            (Self::Size(p), ParameterValue::Size(v)) => (p.set)(operation, *v),
            _ => Err(ParameterError::ValueKind {
                parameter: self.name(),
                expected: self.kind(),
                found: value.kind(),
            }),
        }
    }
}

pub(crate) fn mismatch(parameter: &'static str, operation: &Operation) -> ParameterError {
    ParameterError::OperationMismatch {
        parameter,
        found: operation.name(),
    }
}
