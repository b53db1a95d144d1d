//! Tests for SVG blocks: reference counting of shared definitions, the dirty
//! gradient queue and the stop pool.

use vellum_common::PipelineConfig;
use vellum_dom::SvgDocument;
use vellum_paint::{
    Color, ColorSpec, Gradient, GradientStop, MutableColor, Paint, Pattern, SharedBlock, SvgBlock,
    SvgPaintDef, definition_id,
};

fn block() -> SharedBlock {
    SvgBlock::shared(SvgDocument::shared(), &PipelineConfig::default())
}

fn two_stop_gradient() -> Gradient {
    Gradient::linear(
        0.0,
        0.0,
        100.0,
        0.0,
        vec![
            GradientStop::new(1.0, Color::WHITE),
            GradientStop::new(0.0, Color::BLACK),
        ],
    )
}

// ========== acquire / release ==========

#[test]
fn test_first_acquire_creates_definition() {
    let block = block();
    let gradient = two_stop_gradient();
    let paint = Paint::from(gradient.clone());

    let lease = block.borrow_mut().acquire(&paint).expect("gradients are shareable");

    let b = block.borrow();
    assert_eq!(b.ref_count(gradient.id()), 1);
    let element = b.definition(gradient.id()).map(SvgPaintDef::element);
    let element = element.expect("definition exists");

    let doc = b.document().borrow();
    assert_eq!(doc.tag_name(element), Some("linearGradient"));
    assert_eq!(doc.parent(element), Some(b.defs()));
    assert_eq!(
        doc.attribute(element, "id"),
        Some(definition_id(gradient.id(), Some(b.id())).as_str())
    );
    assert_eq!(doc.attribute(element, "x2"), Some("100"));
    assert_eq!(doc.children(element).len(), 2);

    // stops are written in ratio order
    let first = doc.children(element)[0];
    assert_eq!(doc.attribute(first, "offset"), Some("0"));
    assert_eq!(doc.attribute(first, "style"), Some("stop-color:rgb(0,0,0)"));
    drop(doc);
    drop(b);

    block.borrow_mut().release(lease);
}

#[test]
fn test_definition_removed_with_last_reference() {
    let block = block();
    let gradient = two_stop_gradient();
    let paint = Paint::from(gradient.clone());

    let first = block.borrow_mut().acquire(&paint).expect("lease");
    let second = block.borrow_mut().acquire(&paint).expect("lease");
    assert_eq!(block.borrow().ref_count(gradient.id()), 2);
    assert_eq!(block.borrow().paint_count(), 1);

    let element = block
        .borrow()
        .definition(gradient.id())
        .map(SvgPaintDef::element)
        .expect("definition");

    block.borrow_mut().release(first);
    assert_eq!(block.borrow().ref_count(gradient.id()), 1);
    assert!(block.borrow().document().borrow().contains(element));

    block.borrow_mut().release(second);
    let b = block.borrow();
    assert_eq!(b.ref_count(gradient.id()), 0);
    assert!(b.definition(gradient.id()).is_none());
    assert!(!b.document().borrow().contains(element));
    assert_eq!(b.pooled_stops(), 2);
}

#[test]
fn test_colors_and_tokens_need_no_lease() {
    let block = block();
    assert!(block.borrow_mut().acquire(&Color::WHITE.into()).is_none());
    assert!(block.borrow_mut().acquire(&Paint::token("currentColor")).is_none());
    assert_eq!(block.borrow().paint_count(), 0);
}

#[test]
fn test_pattern_definition() {
    let block = block();
    let pattern = Pattern::new("tile.png", 8.0, 4.5);
    let lease = block
        .borrow_mut()
        .acquire(&pattern.clone().into())
        .expect("patterns are shareable");

    {
        let b = block.borrow();
        let element = b
            .definition(pattern.id())
            .map(SvgPaintDef::element)
            .expect("definition");
        let doc = b.document().borrow();
        assert_eq!(doc.tag_name(element), Some("pattern"));
        assert_eq!(doc.attribute(element, "height"), Some("4.5"));
        let image = doc.first_child(element).expect("image child");
        assert_eq!(doc.attribute(image, "href"), Some("tile.png"));
    }

    block.borrow_mut().release(lease);
    assert_eq!(block.borrow().paint_count(), 0);
}

#[test]
fn test_same_paint_in_two_blocks_gets_two_definitions() {
    let document = SvgDocument::shared();
    let config = PipelineConfig::default();
    let x = SvgBlock::shared(document.clone(), &config);
    let y = SvgBlock::shared(document, &config);
    let paint = Paint::from(two_stop_gradient());
    let id = paint.shareable_id().expect("shareable");

    let in_x = x.borrow_mut().acquire(&paint).expect("lease");
    let in_y = y.borrow_mut().acquire(&paint).expect("lease");

    assert_ne!(
        definition_id(id, Some(x.borrow().id())),
        definition_id(id, Some(y.borrow().id()))
    );
    assert_eq!(x.borrow().ref_count(id), 1);
    assert_eq!(y.borrow().ref_count(id), 1);

    x.borrow_mut().release(in_x);
    y.borrow_mut().release(in_y);
}

#[test]
#[should_panic(expected = "wrong block")]
fn test_release_into_wrong_block_is_rejected() {
    let document = SvgDocument::shared();
    let config = PipelineConfig::default();
    let x = SvgBlock::shared(document.clone(), &config);
    let y = SvgBlock::shared(document, &config);
    let paint = Paint::from(two_stop_gradient());

    let lease = x.borrow_mut().acquire(&paint).expect("lease");
    y.borrow_mut().release(lease);
}

// ========== dirty gradients ==========

#[test]
fn test_update_rewrites_changed_stops_only() {
    let block = block();
    let color = MutableColor::new(Color::rgb(255, 0, 0));
    let gradient = Gradient::radial(
        50.0,
        50.0,
        25.0,
        vec![
            GradientStop::new(0.0, ColorSpec::from(color.clone())),
            GradientStop::new(1.0, Color::WHITE),
        ],
    );
    let lease = block
        .borrow_mut()
        .acquire(&gradient.clone().into())
        .expect("lease");

    assert_eq!(block.borrow_mut().update(), 0);

    color.set(Color::rgb(0, 255, 0));
    color.set(Color::rgb(0, 0, 255));
    assert_eq!(block.borrow_mut().update(), 1);
    assert_eq!(block.borrow_mut().update(), 0);

    {
        let b = block.borrow();
        let Some(SvgPaintDef::Gradient(def)) = b.definition(gradient.id()) else {
            panic!("expected a gradient definition");
        };
        let doc = b.document().borrow();
        assert_eq!(doc.tag_name(def.element()), Some("radialGradient"));
        assert_eq!(doc.attribute(def.element(), "fr"), Some("0"));
        assert_eq!(
            doc.attribute(def.stops()[0].element(), "style"),
            Some("stop-color:rgb(0,0,255)")
        );
    }

    block.borrow_mut().release(lease);
    assert_eq!(color.listener_count(), 0);
}

#[test]
fn test_update_skips_gradients_removed_since_queued() {
    let block = block();
    let color = MutableColor::new(Color::BLACK);
    let gradient = Gradient::linear(
        0.0,
        0.0,
        1.0,
        1.0,
        vec![GradientStop::new(0.5, ColorSpec::from(color.clone()))],
    );
    let lease = block
        .borrow_mut()
        .acquire(&gradient.into())
        .expect("lease");
    color.set(Color::WHITE);
    block.borrow_mut().release(lease);

    assert_eq!(block.borrow_mut().update(), 0);
}

// ========== stop pool ==========

#[test]
fn test_pooled_stops_are_reused() {
    let block = block();
    let first = Paint::from(two_stop_gradient());
    let lease = block.borrow_mut().acquire(&first).expect("lease");
    block.borrow_mut().release(lease);
    assert_eq!(block.borrow().pooled_stops(), 2);

    let second = Paint::from(two_stop_gradient());
    let lease = block.borrow_mut().acquire(&second).expect("lease");
    assert_eq!(block.borrow().pooled_stops(), 0);
    block.borrow_mut().release(lease);
}

#[test]
fn test_stop_pool_respects_capacity() {
    let config = PipelineConfig {
        stop_pool_capacity: 1,
        ..PipelineConfig::default()
    };
    let block = SvgBlock::shared(SvgDocument::shared(), &config);
    let lease = block
        .borrow_mut()
        .acquire(&two_stop_gradient().into())
        .expect("lease");
    block.borrow_mut().release(lease);

    assert_eq!(block.borrow().pooled_stops(), 1);
}

// ========== dropped leases ==========

#[test]
fn test_dropping_a_lease_releases_it() {
    let block = block();
    let gradient = two_stop_gradient();
    let paint = Paint::from(gradient.clone());

    let first = block.borrow_mut().acquire(&paint).expect("lease");
    let second = block.borrow_mut().acquire(&paint).expect("lease");
    let element = block
        .borrow()
        .definition(gradient.id())
        .map(SvgPaintDef::element)
        .expect("definition");

    drop(first);
    assert_eq!(block.borrow().ref_count(gradient.id()), 1);

    drop(second);
    let b = block.borrow();
    assert_eq!(b.paint_count(), 0);
    assert!(!b.document().borrow().contains(element));
}

#[test]
fn test_overlapping_leases_keep_the_definition() {
    let block = block();
    let gradient = two_stop_gradient();
    let paint = Paint::from(gradient.clone());

    let old = block.borrow_mut().acquire(&paint).expect("lease");
    let element = block
        .borrow()
        .definition(gradient.id())
        .map(SvgPaintDef::element);

    // acquire the replacement first, then let the old lease go
    let new = block.borrow_mut().acquire(&paint).expect("lease");
    drop(old);

    assert_eq!(block.borrow().ref_count(gradient.id()), 1);
    assert_eq!(
        block
            .borrow()
            .definition(gradient.id())
            .map(SvgPaintDef::element),
        element
    );
    drop(new);
    assert_eq!(block.borrow().paint_count(), 0);
}

#[test]
fn test_lease_outliving_its_block_is_harmless() {
    let paint = Paint::from(two_stop_gradient());

    let disposed = block();
    let lease = disposed.borrow_mut().acquire(&paint).expect("lease");
    disposed.borrow_mut().dispose();
    drop(lease);
    assert_eq!(disposed.borrow().paint_count(), 0);

    let dropped = block();
    let orphan = dropped.borrow_mut().acquire(&paint).expect("lease");
    drop(dropped);
    drop(orphan);
}

// ========== dispose ==========

#[test]
fn test_dispose_removes_group() {
    let block = block();
    let group = block.borrow().group();
    let root = block.borrow().document().borrow().root();
    block.borrow().document().borrow_mut().append_child(root, group);

    block.borrow_mut().dispose();
    block.borrow_mut().dispose();

    let b = block.borrow();
    assert!(b.is_disposed());
    assert!(!b.document().borrow().contains(group));
    assert!(b.document().borrow().children(root).is_empty());
}
