//! Paint value resolution: turning a paint into an SVG style value.

use crate::block::BlockId;
use crate::paint::{Paint, PaintId};

/// Placeholder scope name used in references made outside any block.
pub const NO_BLOCK: &str = "noblock";

/// Format a number in fixed-point notation.
///
/// SVG attribute and style parsers reject exponents (`1e-7`), so every
/// number written to the output goes through here. Non-finite values
/// become `0`.
#[must_use]
pub fn format_fixed(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    // f64's Display never uses exponent notation and emits the shortest
    // digits that round-trip.
    let text = format!("{value}");
    if text == "-0" { "0".to_string() } else { text }
}

/// The `id` of the definition a shareable paint gets inside a block.
///
/// The block is part of the id so that the same paint used in two blocks
/// resolves to two distinct definitions.
#[must_use]
pub fn definition_id(paint: PaintId, block: Option<BlockId>) -> String {
    match block {
        Some(block) => format!("{paint}-{block}"),
        None => format!("{paint}-{NO_BLOCK}"),
    }
}

/// Resolve a paint to the value of an SVG `fill`/`stroke` style property.
///
/// - no paint resolves to `none`
/// - colors use their CSS serialization
/// - gradients and patterns resolve to `url(#paintN-B)`, scoped to `block`
/// - raw tokens pass through unchanged
#[must_use]
pub fn paint_to_svg_style(paint: Option<&Paint>, block: Option<BlockId>) -> String {
    match paint {
        None => "none".to_string(),
        Some(Paint::Color(color)) => color.color().to_css(),
        Some(Paint::Gradient(gradient)) => format!("url(#{})", definition_id(gradient.id(), block)),
        Some(Paint::Pattern(pattern)) => format!("url(#{})", definition_id(pattern.id(), block)),
        Some(Paint::Token(token)) => {
            tracing::trace!(token = token.as_str(), "passing paint token through");
            token.clone()
        }
    }
}
