//! Canonical drawing command schema.
//!
//! Every drawing that leaves the normalizer is expressed in these types. The
//! serialized form uses the same field names the interpretation collaborator
//! is asked to produce (`type`, `lineWidth`, ...), so a canonical drawing can
//! be handed back to it or persisted as-is.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Default drawing width in pixels.
pub const DEFAULT_WIDTH: u32 = 500;

/// Default drawing height in pixels.
pub const DEFAULT_HEIGHT: u32 = 400;

/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// A full circle centered at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(rename = "lineWidth", skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

/// A straight segment from `(x1, y1)` to `(x2, y2)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(rename = "lineWidth", skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

/// An axis-aligned rectangle with its origin corner at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(rename = "lineWidth", skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

/// A closed triangle through three vertices, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Triangle {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub x3: f64,
    pub y3: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(rename = "lineWidth", skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

/// A run of text with its baseline origin at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub x: f64,
    pub y: f64,
    pub text: String,
    /// CSS font shorthand, e.g. `"bold 24px Arial"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

/// One drawable primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Circle(Circle),
    Line(Line),
    Rect(Rect),
    Triangle(Triangle),
    Text(Text),
    /// A command that has no canonical form: an unknown `type`, a non-object
    /// entry, or a known type whose geometry is not numeric. Kept verbatim so
    /// it survives history and persistence, but never painted.
    Opaque(Value),
}

impl Command {
    /// The `type` discriminant, if the command carries one.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Command::Circle(_) => Some("circle"),
            Command::Line(_) => Some("line"),
            Command::Rect(_) => Some("rect"),
            Command::Triangle(_) => Some("triangle"),
            Command::Text(_) => Some("text"),
            Command::Opaque(value) => value.get("type").and_then(Value::as_str),
        }
    }

    /// Whether every required numeric field is a finite number.
    ///
    /// Opaque commands are never paintable.
    pub fn is_paintable(&self) -> bool {
        fn finite(values: &[f64]) -> bool {
            values.iter().all(|v| v.is_finite())
        }

        match self {
            Command::Circle(c) => finite(&[c.x, c.y, c.r]) && c.r >= 0.0,
            Command::Line(l) => finite(&[l.x1, l.y1, l.x2, l.y2]),
            Command::Rect(r) => finite(&[r.x, r.y, r.w, r.h]),
            Command::Triangle(t) => finite(&[t.x1, t.y1, t.x2, t.y2, t.x3, t.y3]),
            Command::Text(t) => finite(&[t.x, t.y]),
            Command::Opaque(_) => false,
        }
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(tag = "type", rename_all = "lowercase")]
        enum Tagged<'a> {
            Circle(&'a Circle),
            Line(&'a Line),
            Rect(&'a Rect),
            Triangle(&'a Triangle),
            Text(&'a Text),
        }

        match self {
            Command::Circle(c) => Tagged::Circle(c).serialize(serializer),
            Command::Line(l) => Tagged::Line(l).serialize(serializer),
            Command::Rect(r) => Tagged::Rect(r).serialize(serializer),
            Command::Triangle(t) => Tagged::Triangle(t).serialize(serializer),
            Command::Text(t) => Tagged::Text(t).serialize(serializer),
            Command::Opaque(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(crate::normalize::normalize_command(&value))
    }
}

/// One complete picture: canvas size, background and ordered commands.
///
/// Later commands paint over earlier ones. Deserialization goes through the
/// normalizer, so any JSON document yields a canonical drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct DrawingData {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub commands: Vec<Command>,
}

impl Default for DrawingData {
    fn default() -> Self {
        Self::empty()
    }
}

impl DrawingData {
    /// The fresh drawing every editing session starts from.
    pub fn empty() -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_BACKGROUND)
    }

    /// An empty drawing with the given canvas settings.
    pub fn with_size(width: u32, height: u32, background: impl Into<String>) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            background: background.into(),
            commands: Vec::new(),
        }
    }

    /// Number of commands, paintable or not.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the drawing has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the commands the renderer will actually paint.
    pub fn paintable(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| c.is_paintable())
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a persisted or interpreted JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Value> for DrawingData {
    fn from(value: Value) -> Self {
        crate::normalize::normalize(&value)
    }
}
