//! The demo scene: a row of laid-out cards rendered incrementally.
//!
//! Cards are layout nodes stacked by a [`StackLayout`]; each one is mirrored
//! by a rectangle drawable whose geometry follows the node after every
//! finished layout. A path underlines the row with a dashed pattern stroke
//! and keeps the shared gradient cached in the block.

use std::cell::RefCell;
use std::rc::Rc;

use vellum_common::PipelineConfig;
use vellum_dom::{SharedDocument, SvgDocument};
use vellum_layout::{
    Bounds, LayoutConstraint, LayoutError, LayoutNode, Orientation, SharedNode, StackLayout,
};
use vellum_paint::{Color, Gradient, GradientStop, LineCap, MutableColor, Paint, Pattern};
use vellum_render::{
    DrawableId, Path, Rectangle, RenderSurface, SharedDrawable, SvgSelfDrawable, SyncReport,
};

/// Accent colors the animated gradient stop cycles through.
const PALETTE: [Color; 4] = [
    Color::rgb(230, 57, 70),
    Color::rgb(42, 157, 143),
    Color::rgb(233, 196, 106),
    Color::rgb(69, 123, 157),
];

type Card = (SharedNode, SharedDrawable<SvgSelfDrawable<Rectangle>>);

/// Everything the demo keeps alive between frames.
pub struct Scene {
    document: SharedDocument,
    surface: RenderSurface,
    constraint: LayoutConstraint<StackLayout>,
    cards: Rc<Vec<Card>>,
    card_ids: Vec<DrawableId>,
    accent: MutableColor,
}

impl Scene {
    /// Build the scene and lay it out once.
    pub fn new(
        config: &PipelineConfig,
        orientation: Orientation,
        cards: usize,
    ) -> Result<Self, LayoutError> {
        let document = SvgDocument::shared();
        let mut surface = RenderSurface::new(document.clone(), config.clone());

        let accent = MutableColor::new(PALETTE[0]);
        let gradient = Gradient::linear(
            0.0,
            0.0,
            120.0,
            0.0,
            vec![
                GradientStop::new(0.0, accent.clone()),
                GradientStop::new(1.0, Color::WHITE.with_alpha(0.5)),
            ],
        );

        let mut stack = StackLayout::new(orientation, 12.0);
        stack.origin = (16.0, 16.0);
        let constraint = LayoutConstraint::new(stack, config);

        let mut built = Vec::with_capacity(cards);
        let mut card_ids = Vec::with_capacity(cards);
        for index in 0..cards {
            let name = format!("card-{index}");
            let node = if index % 2 == 0 {
                LayoutNode::new(&name, Bounds::new(0.0, 0.0, 80.0, 48.0))
            } else {
                LayoutNode::resizable(&name, Bounds::new(0.0, 0.0, 40.0, 48.0), 64.0, 48.0)
            }
            .shared();
            constraint.add_node(&node, true)?;

            let mut rectangle = SvgSelfDrawable::with_config(
                document.clone(),
                Rectangle {
                    corner_x_radius: 6.0,
                    corner_y_radius: 6.0,
                    ..Rectangle::default()
                },
                config,
            );
            if index == 0 {
                rectangle.set_fill(gradient.clone());
            } else {
                rectangle.set_fill(PALETTE[index % PALETTE.len()]);
            }
            rectangle.set_stroke(Color::BLACK);
            rectangle.set_line_width(1.5);

            let drawable = Rc::new(RefCell::new(rectangle));
            card_ids.push(surface.push_drawable(Rc::clone(&drawable)));
            built.push((node, drawable));
        }

        let mut underline = SvgSelfDrawable::with_config(
            document.clone(),
            Path::new("M16 80 H 400"),
            config,
        );
        underline.set_stroke(Pattern::new("hatch.png", 8.0, 8.0));
        underline.set_line_cap(LineCap::Round);
        underline.set_line_dash(vec![6.0, 3.0], 0.0);
        underline.set_cached_paints(vec![Paint::from(gradient)]);
        let _ = surface.push_drawable(underline);

        let cards = Rc::new(built);
        let listener_cards = Rc::clone(&cards);
        let _ = constraint
            .finished_layout()
            .add_listener(move |_| follow_layout(&listener_cards));
        constraint.update_layout()?;

        Ok(Self {
            document,
            surface,
            constraint,
            cards,
            card_ids,
            accent,
        })
    }

    /// The output document.
    pub const fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Synchronize the output without changing the scene.
    pub fn render(&mut self) -> SyncReport {
        self.surface.sync()
    }

    /// Advance the animation by one frame and synchronize.
    ///
    /// Each frame recolors the gradient accent, toggles the second card
    /// (which restacks the row), and rotates the last card to the front.
    pub fn advance(&mut self, frame: usize) -> SyncReport {
        self.accent.set(PALETTE[(frame + 1) % PALETTE.len()]);

        if let Some((node, _)) = self.cards.get(1) {
            node.set_visible(!node.is_visible());
        }

        if let Some(&last) = self.card_ids.last() {
            self.surface.move_drawable(last, None);
            self.card_ids.rotate_right(1);
        }

        tracing::info!(frame, state = %self.constraint.state(), "advanced scene");
        self.surface.sync()
    }

    /// Tear the scene down.
    pub fn dispose(&mut self) {
        self.constraint.dispose();
        self.surface.dispose();
    }
}

/// Copy laid-out node bounds into the card geometry. Hidden cards collapse.
fn follow_layout(cards: &[Card]) {
    for (node, drawable) in cards {
        let bounds = node.bounds();
        let visible = node.is_visible();
        let shape = {
            let current = drawable.borrow();
            Rectangle {
                x: bounds.x,
                y: bounds.y,
                width: if visible { bounds.width } else { 0.0 },
                height: if visible { bounds.height } else { 0.0 },
                ..*current.shape()
            }
        };
        if *drawable.borrow().shape() != shape {
            drawable.borrow_mut().set_shape(shape);
        }
    }
}
