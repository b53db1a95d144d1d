//! Tests for self drawables: dirty tracking, style writes, cached paint
//! references, block migration and disposal.

use quickcheck_macros::quickcheck;
use vellum_common::{PipelineConfig, Property};
use vellum_dom::{SharedDocument, SvgDocument};
use vellum_paint::{
    Color, Gradient, GradientStop, LineCap, LineJoin, LineStyles, MutableColor, Paint,
    SharedBlock, SvgBlock, definition_id,
};
use vellum_render::{Circle, DirtyFlags, Drawable, Path, Rectangle, SvgSelfDrawable};

fn gradient() -> Gradient {
    Gradient::linear(
        0.0,
        0.0,
        1.0,
        0.0,
        vec![
            GradientStop::new(0.0, Color::BLACK),
            GradientStop::new(1.0, Color::WHITE),
        ],
    )
}

fn block(document: &SharedDocument) -> SharedBlock {
    SvgBlock::shared(document.clone(), &PipelineConfig::default())
}

fn rectangle(document: &SharedDocument) -> SvgSelfDrawable<Rectangle> {
    SvgSelfDrawable::new(document.clone(), Rectangle::new(1.0, 2.0, 30.0, 40.0), false)
}

// ========== first update ==========

#[test]
fn test_first_update_writes_geometry_and_style() {
    let document = SvgDocument::shared();
    let mut drawable = rectangle(&document);
    drawable.set_fill(Color::rgb(255, 0, 0));
    assert!(drawable.is_dirty());

    let writes = document.borrow().attribute_writes();
    assert!(drawable.update());
    assert!(!drawable.is_dirty());

    let doc = document.borrow();
    let element = drawable.element();
    assert_eq!(doc.tag_name(element), Some("rect"));
    assert_eq!(doc.attribute(element, "x"), Some("1"));
    assert_eq!(doc.attribute(element, "height"), Some("40"));
    assert_eq!(doc.attribute(element, "rx"), Some("0"));
    assert_eq!(
        doc.attribute(element, "style"),
        Some("fill: rgb(255,0,0); stroke: none;stroke-miterlimit: 10;")
    );
    // six geometry attributes and a single style write
    assert_eq!(doc.attribute_writes() - writes, 7);
}

#[test]
fn test_clean_update_does_nothing() {
    let document = SvgDocument::shared();
    let mut drawable = rectangle(&document);
    assert!(drawable.update());

    let writes = document.borrow().attribute_writes();
    assert!(!drawable.update());
    assert_eq!(document.borrow().attribute_writes(), writes);
}

#[test]
fn test_rounded_corners_are_clamped() {
    let document = SvgDocument::shared();
    let shape = Rectangle {
        corner_x_radius: 50.0,
        corner_y_radius: 5.0,
        ..Rectangle::new(0.0, 0.0, 20.0, 20.0)
    };
    let mut drawable = SvgSelfDrawable::new(document.clone(), shape, false);
    assert!(drawable.update());

    let doc = document.borrow();
    assert_eq!(doc.attribute(drawable.element(), "rx"), Some("10"));
    assert_eq!(doc.attribute(drawable.element(), "ry"), Some("5"));
}

#[test]
fn test_other_shapes_write_their_geometry() {
    let document = SvgDocument::shared();
    let mut circle = SvgSelfDrawable::new(
        document.clone(),
        Circle {
            cx: 5.0,
            cy: 6.0,
            radius: 0.5,
        },
        false,
    );
    let mut path = SvgSelfDrawable::new(document.clone(), Path::new(""), false);
    assert!(circle.update());
    assert!(path.update());

    let doc = document.borrow();
    assert_eq!(doc.tag_name(circle.element()), Some("circle"));
    assert_eq!(doc.attribute(circle.element(), "r"), Some("0.5"));
    assert_eq!(doc.attribute(path.element(), "d"), Some("M0 0"));
}

// ========== dirty tracking ==========

#[test]
fn test_geometry_change_only_flags_geometry() {
    let document = SvgDocument::shared();
    let mut drawable = rectangle(&document);
    assert!(drawable.update());

    drawable.set_shape(Rectangle::new(0.0, 0.0, 5.0, 5.0));
    assert_eq!(drawable.dirty_flags(), DirtyFlags::GEOMETRY);

    let style_before = document
        .borrow()
        .attribute(drawable.element(), "style")
        .map(str::to_string);
    assert!(drawable.update());
    let doc = document.borrow();
    assert_eq!(doc.attribute(drawable.element(), "width"), Some("5"));
    assert_eq!(
        doc.attribute(drawable.element(), "style").map(str::to_string),
        style_before
    );
}

#[test]
fn test_mutable_color_change_marks_fill() {
    let document = SvgDocument::shared();
    let color = MutableColor::new(Color::rgb(0, 0, 255));
    let mut drawable = rectangle(&document);
    drawable.set_fill(color.clone());
    assert!(drawable.update());

    color.set(Color::rgb(0, 255, 0));
    assert_eq!(drawable.dirty_flags(), DirtyFlags::FILL);
    assert!(drawable.update());

    let doc = document.borrow();
    let style = doc.attribute(drawable.element(), "style").unwrap_or_default();
    assert!(style.starts_with("fill: rgb(0,255,0);"), "{style}");
}

#[test]
fn test_dynamic_stroke_marks_stroke() {
    let document = SvgDocument::shared();
    let stroke: Property<Option<Paint>> = Property::new(None);
    let mut drawable = rectangle(&document);
    drawable.set_stroke(stroke.clone());
    assert!(drawable.update());

    stroke.set(Some(Paint::from(Color::BLACK)));
    assert_eq!(drawable.dirty_flags(), DirtyFlags::STROKE);
    assert!(drawable.update());

    let doc = document.borrow();
    let style = doc.attribute(drawable.element(), "style").unwrap_or_default();
    assert!(style.contains("stroke: rgb(0,0,0);"), "{style}");
}

#[test]
fn test_replaced_fill_stops_observing_old_color() {
    let document = SvgDocument::shared();
    let color = MutableColor::new(Color::BLACK);
    let mut drawable = rectangle(&document);
    drawable.set_fill(color.clone());
    drawable.set_fill(Color::WHITE);
    assert!(drawable.update());

    color.set(Color::rgb(1, 2, 3));
    assert!(!drawable.is_dirty());
    assert_eq!(color.listener_count(), 0);
}

#[test]
fn test_stroke_options_flag_individually() {
    let document = SvgDocument::shared();
    let mut drawable = rectangle(&document);
    assert!(drawable.update());

    drawable.set_line_width(2.5);
    assert_eq!(drawable.dirty_flags(), DirtyFlags::LINE_WIDTH);
    drawable.set_line_cap(LineCap::Round);
    drawable.set_line_join(LineJoin::Bevel);
    assert_eq!(
        drawable.dirty_flags(),
        DirtyFlags::LINE_WIDTH | DirtyFlags::LINE_CAP | DirtyFlags::LINE_JOIN
    );
    assert!(drawable.update());

    drawable.set_miter_limit(4.0);
    assert_eq!(drawable.dirty_flags(), DirtyFlags::MITER_LIMIT);
    drawable.set_line_dash(vec![5.0, 2.5], 1.0);
    assert_eq!(
        drawable.dirty_flags(),
        DirtyFlags::MITER_LIMIT | DirtyFlags::LINE_DASH
    );
    assert!(drawable.update());

    let doc = document.borrow();
    assert_eq!(
        doc.attribute(drawable.element(), "style"),
        Some(
            "fill: none; stroke: none;stroke-width: 2.5;stroke-linecap: round;\
             stroke-linejoin: bevel;stroke-miterlimit: 4;stroke-dasharray: 5,2.5;\
             stroke-dashoffset: 1;"
        )
    );
}

#[test]
fn test_unchanged_stroke_options_stay_clean() {
    let document = SvgDocument::shared();
    let mut drawable = rectangle(&document);
    assert!(drawable.update());

    drawable.set_line_styles(LineStyles::default());
    drawable.set_line_width(1.0);
    assert!(!drawable.is_dirty());
}

// ========== cached paints ==========

#[test]
fn test_cached_paint_diff_keeps_shared_references() {
    let document = SvgDocument::shared();
    let block = block(&document);
    let (a, b, c) = (gradient(), gradient(), gradient());
    let mut drawable = rectangle(&document);
    drawable.update_svg_block(Some(block.clone()));

    drawable.set_cached_paints(vec![a.clone().into(), b.clone().into()]);
    assert!(drawable.update());
    assert_eq!(drawable.cached_lease_count(), 2);
    assert_eq!(block.borrow().ref_count(a.id()), 1);
    assert_eq!(block.borrow().ref_count(b.id()), 1);

    let b_element = block.borrow().definition(b.id()).map(|def| def.element());
    drawable.set_cached_paints(vec![b.clone().into(), c.clone().into()]);
    assert!(drawable.update());
    {
        let blk = block.borrow();
        assert_eq!(blk.ref_count(a.id()), 0);
        assert_eq!(blk.ref_count(b.id()), 1);
        assert_eq!(blk.ref_count(c.id()), 1);
        // b never dropped to zero, so its definition survived
        assert_eq!(blk.definition(b.id()).map(|def| def.element()), b_element);
    }

    drawable.dispose();
    let blk = block.borrow();
    assert_eq!(blk.paint_count(), 0);
}

#[test]
fn test_cached_colors_hold_no_reference() {
    let document = SvgDocument::shared();
    let block = block(&document);
    let mut drawable = rectangle(&document);
    drawable.update_svg_block(Some(block.clone()));

    drawable.set_cached_paints(vec![Color::BLACK.into(), Paint::token("currentColor")]);
    assert!(drawable.update());
    assert_eq!(drawable.cached_lease_count(), 0);
    assert_eq!(block.borrow().paint_count(), 0);
}

#[quickcheck]
fn prop_cached_references_match_requested_set(steps: Vec<Vec<u8>>) -> bool {
    let document = SvgDocument::shared();
    let block = block(&document);
    let gradients = [gradient(), gradient(), gradient()];
    let mut drawable = rectangle(&document);
    drawable.update_svg_block(Some(block.clone()));

    for step in steps.iter().take(8) {
        let paints: Vec<Paint> = step
            .iter()
            .take(6)
            .map(|&i| Paint::from(gradients[usize::from(i) % 3].clone()))
            .collect();
        drawable.set_cached_paints(paints);
        let _ = drawable.update();

        for (i, gradient) in gradients.iter().enumerate() {
            let requested = step.iter().take(6).filter(|&&j| usize::from(j) % 3 == i).count();
            if block.borrow().ref_count(gradient.id()) != requested {
                return false;
            }
        }
    }

    drawable.dispose();
    let count = block.borrow().paint_count();
    count == 0
}

// ========== block migration ==========

#[test]
fn test_moving_between_blocks_migrates_references() {
    let document = SvgDocument::shared();
    let (x, y) = (block(&document), block(&document));
    let fill = gradient();
    let mut drawable = rectangle(&document);
    drawable.update_svg_block(Some(x.clone()));
    drawable.set_fill(fill.clone());
    drawable.set_cached_paints(vec![fill.clone().into()]);
    assert!(drawable.update());
    assert_eq!(x.borrow().ref_count(fill.id()), 2);

    drawable.update_svg_block(Some(y.clone()));
    assert_eq!(x.borrow().ref_count(fill.id()), 0);
    assert_eq!(y.borrow().ref_count(fill.id()), 2);
    assert!(drawable.dirty_flags().contains(DirtyFlags::FILL));

    assert!(drawable.update());
    let expected = format!("url(#{})", definition_id(fill.id(), Some(y.borrow().id())));
    let doc = document.borrow();
    let style = doc.attribute(drawable.element(), "style").unwrap_or_default();
    assert!(style.contains(&expected), "{style}");
}

#[test]
fn test_same_block_is_not_a_move() {
    let document = SvgDocument::shared();
    let x = block(&document);
    let mut drawable = rectangle(&document);
    drawable.update_svg_block(Some(x.clone()));
    assert!(drawable.update());

    drawable.update_svg_block(Some(x));
    assert!(!drawable.is_dirty());
}

#[test]
fn test_unbound_gradient_uses_noblock_reference() {
    let document = SvgDocument::shared();
    let fill = gradient();
    let mut drawable = rectangle(&document);
    drawable.set_fill(fill.clone());
    assert!(drawable.update());

    let expected = format!("fill: url(#{});", definition_id(fill.id(), None));
    let doc = document.borrow();
    let style = doc.attribute(drawable.element(), "style").unwrap_or_default();
    assert!(style.starts_with(&expected), "{style}");
}

// ========== disposal ==========

#[test]
fn test_dispose_frees_element_and_references() {
    let document = SvgDocument::shared();
    let x = block(&document);
    let fill = gradient();
    let mut drawable = rectangle(&document);
    drawable.update_svg_block(Some(x.clone()));
    drawable.set_fill(fill.clone());
    assert!(drawable.update());
    let element = drawable.element();

    drawable.dispose();
    assert!(drawable.is_disposed());
    assert!(!document.borrow().contains(element));
    assert_eq!(x.borrow().ref_count(fill.id()), 0);

    // repeated disposal and updates are ignored
    drawable.dispose();
    assert!(!drawable.update());
}

#[test]
fn test_dropping_undisposed_drawable_returns_references() {
    let document = SvgDocument::shared();
    let x = block(&document);
    let (fill, cached) = (gradient(), gradient());
    let mut drawable = rectangle(&document);
    drawable.update_svg_block(Some(x.clone()));
    drawable.set_fill(fill.clone());
    drawable.set_cached_paints(vec![cached.clone().into(), fill.clone().into()]);
    assert!(drawable.update());
    assert_eq!(x.borrow().ref_count(fill.id()), 2);

    drop(drawable);
    let blk = x.borrow();
    assert_eq!(blk.ref_count(fill.id()), 0);
    assert_eq!(blk.ref_count(cached.id()), 0);
    assert_eq!(blk.paint_count(), 0);
}

#[test]
fn test_dispose_keeps_element_when_asked() {
    let document = SvgDocument::shared();
    let config = PipelineConfig {
        keep_elements: true,
        ..PipelineConfig::default()
    };
    let mut drawable =
        SvgSelfDrawable::with_config(document.clone(), Rectangle::new(0.0, 0.0, 1.0, 1.0), &config);
    let element = drawable.element();
    let root = document.borrow().root();
    document.borrow_mut().append_child(root, element);

    drawable.dispose();
    let doc = document.borrow();
    assert!(doc.contains(element));
    assert_eq!(doc.parent(element), None);
}

#[test]
fn test_dispose_stops_observing() {
    let document = SvgDocument::shared();
    let color = MutableColor::new(Color::BLACK);
    let mut drawable = rectangle(&document);
    drawable.set_fill(color.clone());
    assert_eq!(color.listener_count(), 1);

    drawable.dispose();
    assert_eq!(color.listener_count(), 0);
    color.set(Color::WHITE);
    assert!(!drawable.is_dirty());
}

#[test]
#[should_panic(expected = "disposed drawable modified")]
fn test_modifying_disposed_drawable_panics() {
    let document = SvgDocument::shared();
    let mut drawable = rectangle(&document);
    drawable.dispose();
    drawable.set_line_width(3.0);
}
