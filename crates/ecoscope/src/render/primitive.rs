use std::fmt;

use serde::{Serialize, Serializer};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AltitudeMode {
    Absolute,
    RelativeToGround,
    ClampToGround,
}

/// RGBA colour rendered as a CSS `rgba()` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f64,
}

impl Color {
    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({}, {}, {}, {})",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonPrimitive {
    pub outer_coordinates: Vec<GeoPoint>,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub fill_color: Color,
    pub altitude_mode: AltitudeMode,
    pub extruded: bool,
    pub draws_occluded_segments: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylinePrimitive {
    pub coordinates: Vec<GeoPoint>,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub altitude_mode: AltitudeMode,
    pub geodesic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPrimitive {
    pub position: GeoPoint,
    pub altitude_mode: AltitudeMode,
    pub icon_color: Color,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Polygon(PolygonPrimitive),
    Polyline(PolylinePrimitive),
    Marker(MarkerPrimitive),
}

impl Primitive {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Polygon(_) => "polygon",
            Self::Polyline(_) => "polyline",
            Self::Marker(_) => "marker",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_render_as_css() {
        assert_eq!(
            Color::rgba(0, 150, 0, 0.7).to_string(),
            "rgba(0, 150, 0, 0.7)"
        );
        assert_eq!(Color::opaque(1, 2, 3).with_alpha(4.0).alpha, 1.0);
    }
}
