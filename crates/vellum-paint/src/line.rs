//! Stroke geometry options.
//!
//! [SVG 2 § 13.5 Stroke properties](https://www.w3.org/TR/SVG2/painting.html#StrokeProperties)

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Shape at the ends of open subpaths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Flat end at the endpoint.
    #[default]
    Butt,
    /// Half-circle beyond the endpoint.
    Round,
    /// Half-square beyond the endpoint.
    Square,
}

/// Shape at the corners of a stroked path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Sharp corner, limited by the miter limit.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Cut-off corner.
    Bevel,
}

/// Stroke options of a drawable. Defaults match the SVG initial values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyles {
    /// `stroke-width`
    pub line_width: f64,
    /// `stroke-linecap`
    pub line_cap: LineCap,
    /// `stroke-linejoin`
    pub line_join: LineJoin,
    /// `stroke-miterlimit`
    pub miter_limit: f64,
    /// `stroke-dasharray`; empty means solid.
    pub line_dash: Vec<f64>,
    /// `stroke-dashoffset`
    pub line_dash_offset: f64,
}

impl Default for LineStyles {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            line_dash: Vec::new(),
            line_dash_offset: 0.0,
        }
    }
}

impl LineStyles {
    /// Whether a dash pattern is set.
    #[must_use]
    pub fn has_line_dash(&self) -> bool {
        !self.line_dash.is_empty()
    }
}
