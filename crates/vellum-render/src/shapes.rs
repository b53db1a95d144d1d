//! Geometry of the basic SVG shapes a self drawable can render.
//!
//! [SVG 2 § 10 Basic Shapes](https://www.w3.org/TR/SVG2/shapes.html)

use vellum_dom::{ElementId, SvgDocument};
use vellum_paint::format_fixed;

/// A shape that knows its element name and how to write its geometry.
pub trait SvgShape {
    /// Name of the element the shape renders as.
    fn tag_name(&self) -> &'static str;

    /// Write the geometry attributes onto `element`.
    fn write_geometry(&self, document: &mut SvgDocument, element: ElementId);
}

fn write_numbers(document: &mut SvgDocument, element: ElementId, values: &[(&str, f64)]) {
    for &(name, value) in values {
        document.set_attribute(element, name, &format_fixed(value));
    }
}

/// [§ 10.2 The 'rect' element](https://www.w3.org/TR/SVG2/shapes.html#RectElement)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Horizontal corner radius.
    pub corner_x_radius: f64,
    /// Vertical corner radius.
    pub corner_y_radius: f64,
}

impl Rectangle {
    /// A rectangle with square corners.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            corner_x_radius: 0.0,
            corner_y_radius: 0.0,
        }
    }

    /// Whether the corners are rounded.
    #[must_use]
    pub fn is_rounded(&self) -> bool {
        self.corner_x_radius > 0.0 && self.corner_y_radius > 0.0
    }
}

impl SvgShape for Rectangle {
    fn tag_name(&self) -> &'static str {
        "rect"
    }

    fn write_geometry(&self, document: &mut SvgDocument, element: ElementId) {
        write_numbers(
            document,
            element,
            &[
                ("x", self.x),
                ("y", self.y),
                ("width", self.width),
                ("height", self.height),
            ],
        );
        // [§ 10.2](https://www.w3.org/TR/SVG2/shapes.html#RectElement)
        // rx and ry are clamped to half the width and height.
        if self.is_rounded() {
            let rx = self.corner_x_radius.min(self.width / 2.0);
            let ry = self.corner_y_radius.min(self.height / 2.0);
            write_numbers(document, element, &[("rx", rx), ("ry", ry)]);
        } else {
            write_numbers(document, element, &[("rx", 0.0), ("ry", 0.0)]);
        }
    }
}

/// [§ 10.3 The 'circle' element](https://www.w3.org/TR/SVG2/shapes.html#CircleElement)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Circle {
    /// Center x.
    pub cx: f64,
    /// Center y.
    pub cy: f64,
    /// Radius.
    pub radius: f64,
}

impl SvgShape for Circle {
    fn tag_name(&self) -> &'static str {
        "circle"
    }

    fn write_geometry(&self, document: &mut SvgDocument, element: ElementId) {
        write_numbers(
            document,
            element,
            &[("cx", self.cx), ("cy", self.cy), ("r", self.radius)],
        );
    }
}

/// [§ 10.5 The 'line' element](https://www.w3.org/TR/SVG2/shapes.html#LineElement)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Line {
    /// Start x.
    pub x1: f64,
    /// Start y.
    pub y1: f64,
    /// End x.
    pub x2: f64,
    /// End y.
    pub y2: f64,
}

impl SvgShape for Line {
    fn tag_name(&self) -> &'static str {
        "line"
    }

    fn write_geometry(&self, document: &mut SvgDocument, element: ElementId) {
        write_numbers(
            document,
            element,
            &[
                ("x1", self.x1),
                ("y1", self.y1),
                ("x2", self.x2),
                ("y2", self.y2),
            ],
        );
    }
}

/// [§ 9.2 The 'path' element](https://www.w3.org/TR/SVG2/paths.html#PathElement)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// Path data, already serialized.
    pub data: String,
}

impl Path {
    /// A path from serialized path data.
    #[must_use]
    pub fn new(data: &str) -> Self {
        Self {
            data: data.to_string(),
        }
    }
}

impl SvgShape for Path {
    fn tag_name(&self) -> &'static str {
        "path"
    }

    fn write_geometry(&self, document: &mut SvgDocument, element: ElementId) {
        // Empty path data is written as a lone moveto.
        let data = if self.data.trim().is_empty() {
            "M0 0"
        } else {
            self.data.as_str()
        };
        document.set_attribute(element, "d", data);
    }
}
