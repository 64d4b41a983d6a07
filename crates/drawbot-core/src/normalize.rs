//! Normalization of model-produced drawing documents.
//!
//! The interpretation collaborator is a generative model and does not reliably
//! honor the canonical schema. The quirks it exhibits are few and known, so
//! they are resolved here as explicit precedence rules:
//!
//! - `rect` sizes arrive as `width`/`height` instead of `w`/`h`.
//! - `line` arrives as a start point in `x`/`y` with the end point in `x1`/`y1`.
//! - `triangle` arrives as `x`/`y`, `x1`/`y1`, `x2`/`y2` with no third vertex.
//!
//! Normalization never fails. Anything that still cannot be expressed
//! canonically is kept as [`Command::Opaque`] and skipped at render time.

use crate::command::{
    Circle, Command, DEFAULT_BACKGROUND, DEFAULT_HEIGHT, DEFAULT_WIDTH, DrawingData, Line, Rect,
    Text, Triangle,
};
use serde::Deserialize;
use serde_json::Value;

/// Intake view of one command as it may arrive from the model.
///
/// Every field name the model has been seen to use is accepted, with any JSON
/// type. `null` reads as absent.
#[derive(Debug, Default, Deserialize)]
struct RawCommand<'a> {
    #[serde(rename = "type", borrow)]
    kind: Option<&'a str>,
    x: Option<Value>,
    y: Option<Value>,
    r: Option<Value>,
    x1: Option<Value>,
    y1: Option<Value>,
    x2: Option<Value>,
    y2: Option<Value>,
    x3: Option<Value>,
    y3: Option<Value>,
    w: Option<Value>,
    h: Option<Value>,
    width: Option<Value>,
    height: Option<Value>,
    text: Option<Value>,
    font: Option<Value>,
    fill: Option<Value>,
    stroke: Option<Value>,
    #[serde(rename = "lineWidth")]
    line_width: Option<Value>,
}

/// Coerce a JSON value to a finite number.
///
/// Numbers and numeric strings are accepted; everything else is `None`.
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A non-empty style string. An empty string paints nothing, same as absent.
fn style(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn canvas_size(value: Option<&Value>, default: u32) -> u32 {
    match number(value) {
        Some(n) if n >= 1.0 => n.min(f64::from(u32::MAX)) as u32,
        _ => default,
    }
}

impl RawCommand<'_> {
    fn line_width(&self) -> Option<f64> {
        number(self.line_width.as_ref())
    }

    fn rect(&self) -> Option<Rect> {
        // `w`/`h` win over `width`/`height` whenever present, even if unusable.
        let w = self.w.as_ref().or(self.width.as_ref());
        let h = self.h.as_ref().or(self.height.as_ref());
        Some(Rect {
            x: number(self.x.as_ref())?,
            y: number(self.y.as_ref())?,
            w: number(w)?,
            h: number(h)?,
            fill: style(self.fill.as_ref()),
            stroke: style(self.stroke.as_ref()),
            line_width: self.line_width(),
        })
    }

    fn line(&self) -> Option<Line> {
        let x1 = number(self.x1.as_ref());
        let y1 = number(self.y1.as_ref());
        let x2 = number(self.x2.as_ref());
        let y2 = number(self.y2.as_ref());

        let (x1, y1, x2, y2) = match (x1, y1, x2, y2) {
            (Some(x1), Some(y1), Some(x2), Some(y2)) => (x1, y1, x2, y2),
            (Some(end_x), Some(end_y), _, _) if self.x2.is_none() || self.y2.is_none() => {
                // Start point in x/y, end point in x1/y1.
                (number(self.x.as_ref())?, number(self.y.as_ref())?, end_x, end_y)
            }
            _ => return None,
        };

        Some(Line {
            x1,
            y1,
            x2,
            y2,
            stroke: style(self.stroke.as_ref()),
            line_width: self.line_width(),
        })
    }

    fn triangle(&self) -> Option<Triangle> {
        let missing_third = self.x3.is_none() || self.y3.is_none();
        let named = [
            &self.x, &self.y, &self.x1, &self.y1, &self.x2, &self.y2,
        ]
        .map(|v| number(v.as_ref()));

        let vertices = match named {
            // Three vertices spread over x/y, x1/y1 and x2/y2.
            [Some(x), Some(y), Some(x1), Some(y1), Some(x2), Some(y2)] if missing_third => {
                [x, y, x1, y1, x2, y2]
            }
            [_, _, Some(x1), Some(y1), Some(x2), Some(y2)] => [
                x1,
                y1,
                x2,
                y2,
                number(self.x3.as_ref())?,
                number(self.y3.as_ref())?,
            ],
            _ => return None,
        };
        let [x1, y1, x2, y2, x3, y3] = vertices;

        Some(Triangle {
            x1,
            y1,
            x2,
            y2,
            x3,
            y3,
            fill: style(self.fill.as_ref()),
            stroke: style(self.stroke.as_ref()),
            line_width: self.line_width(),
        })
    }

    fn circle(&self) -> Option<Circle> {
        Some(Circle {
            x: number(self.x.as_ref())?,
            y: number(self.y.as_ref())?,
            r: number(self.r.as_ref())?,
            fill: style(self.fill.as_ref()),
            stroke: style(self.stroke.as_ref()),
            line_width: self.line_width(),
        })
    }

    fn text(&self) -> Option<Text> {
        let text = match self.text.as_ref()? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Text {
            x: number(self.x.as_ref())?,
            y: number(self.y.as_ref())?,
            text,
            font: style(self.font.as_ref()),
            fill: style(self.fill.as_ref()),
        })
    }

    fn canonical(&self) -> Option<Command> {
        match self.kind? {
            "circle" => self.circle().map(Command::Circle),
            "line" => self.line().map(Command::Line),
            "rect" => self.rect().map(Command::Rect),
            "triangle" => self.triangle().map(Command::Triangle),
            "text" => self.text().map(Command::Text),
            _ => None,
        }
    }
}

/// Normalize a single raw command.
///
/// Returns [`Command::Opaque`] holding the original value when the command
/// has no canonical form.
pub fn normalize_command(value: &Value) -> Command {
    // Only objects; serde would otherwise read arrays positionally.
    let canonical = value
        .is_object()
        .then(|| RawCommand::deserialize(value).ok())
        .flatten()
        .and_then(|raw| raw.canonical());

    match canonical {
        Some(command) => command,
        None => {
            log::debug!("keeping non-canonical command as opaque: {value}");
            Command::Opaque(value.clone())
        }
    }
}

/// Normalize a decoded drawing document into a canonical [`DrawingData`].
///
/// Never fails: missing or unusable top-level fields take their defaults and
/// each command is reconciled independently, in order.
pub fn normalize(value: &Value) -> DrawingData {
    let background = match value.get("background") {
        Some(Value::String(s)) => s.clone(),
        _ => DEFAULT_BACKGROUND.to_string(),
    };

    let commands = match value.get("commands") {
        Some(Value::Array(commands)) => commands.iter().map(normalize_command).collect(),
        _ => Vec::new(),
    };

    DrawingData {
        width: canvas_size(value.get("width"), DEFAULT_WIDTH),
        height: canvas_size(value.get("height"), DEFAULT_HEIGHT),
        background,
        commands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(command: Value) -> Command {
        normalize_command(&command)
    }

    #[test]
    fn test_top_level_defaults() {
        let data = normalize(&json!({}));
        assert_eq!(data, DrawingData::empty());

        let data = normalize(&json!(null));
        assert_eq!(data, DrawingData::empty());
    }

    #[test]
    fn test_top_level_coercion() {
        let data = normalize(&json!({
            "width": "640",
            "height": 480.7,
            "background": "#123456",
            "commands": []
        }));
        assert_eq!(data.width, 640);
        assert_eq!(data.height, 480);
        assert_eq!(data.background, "#123456");
    }

    #[test]
    fn test_unusable_size_falls_back() {
        let data = normalize(&json!({"width": "wide", "height": -3, "background": 7}));
        assert_eq!(data.width, 500);
        assert_eq!(data.height, 400);
        assert_eq!(data.background, "#ffffff");
    }

    #[test]
    fn test_rect_width_height_alias() {
        let Command::Rect(rect) = one(json!({"type": "rect", "x": 0, "y": 0, "width": 10, "height": 20})) else {
            panic!("expected rect");
        };
        assert_eq!((rect.w, rect.h), (10.0, 20.0));
    }

    #[test]
    fn test_rect_w_h_take_precedence() {
        let Command::Rect(rect) = one(json!({
            "type": "rect", "x": 0, "y": 0, "w": 5, "width": 10, "h": 6, "height": 20
        })) else {
            panic!("expected rect");
        };
        assert_eq!((rect.w, rect.h), (5.0, 6.0));
    }

    #[test]
    fn test_rect_unusable_w_does_not_fall_back() {
        let raw = json!({"type": "rect", "x": 0, "y": 0, "w": "wide", "width": 10, "h": 6});
        assert_eq!(one(raw.clone()), Command::Opaque(raw));
    }

    #[test]
    fn test_line_passthrough() {
        let Command::Line(line) = one(json!({"type": "line", "x1": 1, "y1": 2, "x2": 3, "y2": 4, "x": 9, "y": 9})) else {
            panic!("expected line");
        };
        assert_eq!((line.x1, line.y1, line.x2, line.y2), (1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_line_start_end_remap() {
        let Command::Line(line) = one(json!({"type": "line", "x": 1, "y": 2, "x1": 3, "y1": 4})) else {
            panic!("expected line");
        };
        assert_eq!((line.x1, line.y1, line.x2, line.y2), (1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_line_without_second_point_is_opaque() {
        let raw = json!({"type": "line", "x1": 3, "y1": 4, "stroke": "#000"});
        assert_eq!(one(raw.clone()), Command::Opaque(raw));
    }

    #[test]
    fn test_triangle_remap() {
        let Command::Triangle(t) = one(json!({
            "type": "triangle", "x": 0, "y": 0, "x1": 10, "y1": 0, "x2": 5, "y2": 10
        })) else {
            panic!("expected triangle");
        };
        assert_eq!(
            [t.x1, t.y1, t.x2, t.y2, t.x3, t.y3],
            [0.0, 0.0, 10.0, 0.0, 5.0, 10.0]
        );
    }

    #[test]
    fn test_triangle_with_third_vertex_passes_through() {
        let Command::Triangle(t) = one(json!({
            "type": "triangle", "x": 99, "y": 99,
            "x1": 0, "y1": 0, "x2": 10, "y2": 0, "x3": 5, "y3": 10,
            "fill": "green"
        })) else {
            panic!("expected triangle");
        };
        assert_eq!(
            [t.x1, t.y1, t.x2, t.y2, t.x3, t.y3],
            [0.0, 0.0, 10.0, 0.0, 5.0, 10.0]
        );
        assert_eq!(t.fill.as_deref(), Some("green"));
    }

    #[test]
    fn test_circle_and_text_pass_through() {
        let Command::Circle(c) = one(json!({
            "type": "circle", "x": 250, "y": 200, "r": 60,
            "fill": "#FFD54F", "stroke": "#000", "lineWidth": 4
        })) else {
            panic!("expected circle");
        };
        assert_eq!((c.x, c.y, c.r), (250.0, 200.0, 60.0));
        assert_eq!(c.line_width, Some(4.0));

        let Command::Text(t) = one(json!({"type": "text", "x": 5, "y": 6, "text": "hi", "font": "20px serif"})) else {
            panic!("expected text");
        };
        assert_eq!(t.text, "hi");
        assert_eq!(t.font.as_deref(), Some("20px serif"));
        assert_eq!(t.fill, None);
    }

    #[test]
    fn test_empty_style_is_absent() {
        let Command::Circle(c) = one(json!({"type": "circle", "x": 1, "y": 1, "r": 1, "fill": "", "stroke": 3})) else {
            panic!("expected circle");
        };
        assert_eq!(c.fill, None);
        assert_eq!(c.stroke, None);
    }

    #[test]
    fn test_unknown_and_malformed_are_opaque() {
        for raw in [json!({"type": "hexagon", "x": 1}), json!(17), json!("circle"), json!({"x": 1})] {
            assert_eq!(one(raw.clone()), Command::Opaque(raw));
        }
    }

    #[test]
    fn test_order_preserved() {
        let data = normalize(&json!({"commands": [
            {"type": "text", "x": 0, "y": 0, "text": "a"},
            {"type": "mystery"},
            {"type": "circle", "x": 0, "y": 0, "r": 1}
        ]}));
        let kinds: Vec<_> = data.commands.iter().map(Command::kind).collect();
        assert_eq!(kinds, vec![Some("text"), Some("mystery"), Some("circle")]);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            json!({"width": 300, "commands": [
                {"type": "rect", "x": 0, "y": 0, "width": 10, "height": 20, "id": "r1"},
                {"type": "line", "x": 1, "y": 2, "x1": 3, "y1": 4},
                {"type": "triangle", "x": 0, "y": 0, "x1": 10, "y1": 0, "x2": 5, "y2": 10},
                {"type": "rect", "x": 0, "y": 0},
                {"type": "star"},
                null
            ]}),
            json!([1, 2, 3]),
            json!({"commands": [{"type": "text", "x": "4", "y": 5, "text": 12}]}),
        ];

        for input in inputs {
            let once = normalize(&input);
            let twice = normalize(&serde_json::to_value(&once).unwrap());
            assert_eq!(once, twice);
        }
    }
}
