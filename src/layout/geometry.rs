//! Adaptive geometry for the stream templates
//!
//! Sizes are found with the same deterministic search the screens have
//! always used: start every cell at the minimum size and grow it one pixel
//! at a time until a container bound is hit. Steps are counted as integers
//! and the first failing step is found by bisection, so the cost does not
//! grow with the container. The result is expressed as
//! pixel sizes plus anchor links in the host's constraint vocabulary, so
//! the host never has to solve anything itself.

use crate::layout::{Orientation, Size, Template, WIDE_ASPECT};
use crate::utils::config::LayoutConfig;
use log::debug;
use serde::Serialize;

/// Share of the usable width the featured stream of template C may take
const FEATURED_SHARE: f32 = 0.78;

/// Portrait inset height as a fraction of the container height
const INSET_HEIGHT_DIVISOR: f32 = 3.0;

/// Position of both guidelines within the holder
const GUIDELINE_CENTER: f32 = 0.5;

/// A side of a laid-out box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    Top,
    End,
    Bottom,
}

/// What an anchor attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorTarget {
    /// The container holding every stream
    Holder,

    /// Another stream container
    Slot(usize),

    /// Guideline splitting the holder left and right
    VerticalGuideline,

    /// Guideline splitting the holder top and bottom
    HorizontalGuideline,
}

/// Links one edge of a slot to an edge of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Anchor {
    pub edge: Edge,
    pub target: AnchorTarget,
    pub target_edge: Edge,
}

impl Anchor {
    pub fn new(edge: Edge, target: AnchorTarget, target_edge: Edge) -> Self {
        Self {
            edge,
            target,
            target_edge,
        }
    }

    /// Same-edge link to the holder, e.g. start to start
    fn holder(edge: Edge) -> Self {
        Self::new(edge, AnchorTarget::Holder, edge)
    }
}

/// Computed placement of one stream container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotGeometry {
    /// Slot this geometry applies to
    pub slot_index: usize,

    /// Container width in pixels
    pub width_px: u32,

    /// Container height in pixels
    pub height_px: u32,

    /// Constraint links positioning the container
    pub anchors: Vec<Anchor>,

    /// Margin on every side, in pixels
    pub margin_px: u32,
}

/// Geometry for every slot of a template at one container size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutGeometry {
    pub template: Template,
    pub orientation: Orientation,
    pub container: Size,
    pub slots: Vec<SlotGeometry>,

    /// Vertical guideline position as a fraction of the holder width
    pub vertical_guideline: Option<f32>,

    /// Horizontal guideline position as a fraction of the holder height
    pub horizontal_guideline: Option<f32>,
}

impl LayoutGeometry {
    /// Geometry of one slot
    pub fn slot(&self, slot_index: usize) -> Option<&SlotGeometry> {
        self.slots.iter().find(|slot| slot.slot_index == slot_index)
    }
}

/// Computes template geometry from container bounds
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

/// Unrounded cell size used during the search
#[derive(Debug, Clone, Copy)]
struct Cell {
    width: f32,
    height: f32,
}

impl LayoutEngine {
    /// Create an engine with the given layout configuration
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute the geometry of `template` inside a container
    ///
    /// Pure: the same inputs always yield the same geometry.
    pub fn compute_geometry(
        &self,
        container_width: u32,
        container_height: u32,
        is_landscape: bool,
        template: Template,
    ) -> LayoutGeometry {
        let width = container_width as f32;
        let height = container_height as f32;

        let geometry = match (template, is_landscape) {
            (Template::A, true) => self.featured_with_stack_landscape(width, height),
            (Template::A, false) => self.featured_with_stack_portrait(width),
            (Template::B, true) => self.side_by_side(width, height, true),
            (Template::B, false) => self.side_by_side(height, width, false),
            (Template::C, true) => self.featured_with_inset_landscape(width, height),
            (Template::C, false) => self.featured_with_inset_portrait(width, height),
        };

        let (slots, vertical_guideline, horizontal_guideline) = geometry;
        let orientation = if is_landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };

        debug!(
            "Computed template {} geometry for {}x{} ({:?}): {:?}",
            template,
            container_width,
            container_height,
            orientation,
            slots
                .iter()
                .map(|slot| (slot.width_px, slot.height_px))
                .collect::<Vec<_>>()
        );

        LayoutGeometry {
            template,
            orientation,
            container: Size::new(container_width, container_height),
            slots,
            vertical_guideline,
            horizontal_guideline,
        }
    }

    fn min_cell(&self) -> Cell {
        Cell {
            width: self.config.min_cell_px,
            height: self.config.min_cell_px,
        }
    }

    /// Extent of a cell grown `step` pixels past the minimum
    fn grown(&self, step: u32) -> f32 {
        self.config.min_cell_px + step as f32
    }

    fn slot(&self, slot_index: usize, cell: Cell, anchors: Vec<Anchor>, margin_px: f32) -> SlotGeometry {
        let floor = self.config.min_cell_px;
        SlotGeometry {
            slot_index,
            width_px: cell.width.max(floor).round() as u32,
            height_px: cell.height.max(floor).round() as u32,
            anchors,
            margin_px: margin_px.max(0.0).round() as u32,
        }
    }

    /// Template A in landscape: featured on the left, two stacked on the right
    fn featured_with_stack_landscape(&self, width: f32, height: f32) -> Placement {
        let gutter = self.config.px(self.config.gutter_dp);
        let main_padding = self.config.px(self.config.main_axis_padding_dp);

        let cells_at = |step: u32| {
            if step == 0 {
                return (self.min_cell(), self.min_cell());
            }

            let featured_width = self.grown(step);
            let featured = Cell {
                width: featured_width,
                height: featured_width * WIDE_ASPECT,
            };
            let secondary_height = (featured.height - gutter) / 2.0;
            let secondary = Cell {
                width: secondary_height / WIDE_ASPECT,
                height: secondary_height,
            };
            (featured, secondary)
        };

        let steps = growth_steps(search_limit(width), |step| {
            let (featured, secondary) = cells_at(step);
            featured.width + secondary.width < width - main_padding && featured.height < height - gutter
        });
        let (featured, secondary) = cells_at(steps);

        let slots = vec![
            self.slot(
                0,
                featured,
                vec![
                    Anchor::holder(Edge::Start),
                    Anchor::holder(Edge::Top),
                    Anchor::new(Edge::End, AnchorTarget::Slot(1), Edge::Start),
                    Anchor::holder(Edge::Bottom),
                ],
                0.0,
            ),
            self.slot(
                1,
                secondary,
                vec![
                    Anchor::new(Edge::Start, AnchorTarget::Slot(0), Edge::End),
                    Anchor::holder(Edge::End),
                    Anchor::new(Edge::Top, AnchorTarget::Slot(0), Edge::Top),
                    Anchor::new(Edge::Bottom, AnchorTarget::Slot(2), Edge::Top),
                ],
                0.0,
            ),
            self.slot(
                2,
                secondary,
                vec![
                    Anchor::new(Edge::Start, AnchorTarget::Slot(1), Edge::Start),
                    Anchor::new(Edge::Top, AnchorTarget::Slot(1), Edge::Bottom),
                    Anchor::new(Edge::End, AnchorTarget::Slot(1), Edge::End),
                    Anchor::new(Edge::Bottom, AnchorTarget::Slot(0), Edge::Bottom),
                ],
                0.0,
            ),
        ];

        (slots, None, None)
    }

    /// Template A in portrait: featured on top, two side by side below it
    fn featured_with_stack_portrait(&self, width: f32) -> Placement {
        let gutter = self.config.px(self.config.gutter_dp);
        let cross_padding = self.config.px(self.config.cross_axis_padding_dp);

        let featured_width = width - cross_padding;
        let featured = Cell {
            width: featured_width,
            height: featured_width * WIDE_ASPECT,
        };

        let secondary_width = (featured.width - gutter) / 2.0;
        let secondary = Cell {
            width: secondary_width,
            height: secondary_width * WIDE_ASPECT,
        };

        let slots = vec![
            self.slot(
                0,
                featured,
                vec![
                    Anchor::holder(Edge::Start),
                    Anchor::holder(Edge::End),
                    Anchor::new(Edge::Bottom, AnchorTarget::HorizontalGuideline, Edge::Top),
                ],
                0.0,
            ),
            self.slot(
                1,
                secondary,
                vec![
                    Anchor::holder(Edge::Start),
                    Anchor::new(Edge::Top, AnchorTarget::HorizontalGuideline, Edge::Bottom),
                    Anchor::new(Edge::End, AnchorTarget::VerticalGuideline, Edge::Start),
                ],
                0.0,
            ),
            self.slot(
                2,
                secondary,
                vec![
                    Anchor::new(Edge::Start, AnchorTarget::VerticalGuideline, Edge::End),
                    Anchor::new(Edge::Top, AnchorTarget::HorizontalGuideline, Edge::Bottom),
                    Anchor::holder(Edge::End),
                ],
                0.0,
            ),
        ];

        (slots, Some(GUIDELINE_CENTER), Some(GUIDELINE_CENTER))
    }

    /// Template B: two equal squares along the main axis
    ///
    /// `main` is the container extent along which the squares line up.
    fn side_by_side(&self, main: f32, cross: f32, is_landscape: bool) -> Placement {
        let main_padding = self.config.px(self.config.main_axis_padding_dp);
        let cross_padding = self.config.px(self.config.cross_axis_padding_dp);

        let steps = growth_steps(search_limit(cross), |step| {
            let side = self.grown(step);
            side < cross - cross_padding && side * 2.0 < main - main_padding
        });
        let side = self.grown(steps);

        let cell = Cell {
            width: side,
            height: side,
        };

        if is_landscape {
            let slots = vec![
                self.slot(
                    0,
                    cell,
                    vec![
                        Anchor::holder(Edge::Top),
                        Anchor::new(Edge::End, AnchorTarget::VerticalGuideline, Edge::Start),
                        Anchor::holder(Edge::Bottom),
                    ],
                    0.0,
                ),
                self.slot(
                    1,
                    cell,
                    vec![
                        Anchor::new(Edge::Start, AnchorTarget::VerticalGuideline, Edge::End),
                        Anchor::holder(Edge::Top),
                        Anchor::holder(Edge::Bottom),
                    ],
                    0.0,
                ),
            ];
            (slots, Some(GUIDELINE_CENTER), None)
        } else {
            let slots = vec![
                self.slot(
                    0,
                    cell,
                    vec![
                        Anchor::holder(Edge::Start),
                        Anchor::holder(Edge::End),
                        Anchor::new(Edge::Bottom, AnchorTarget::HorizontalGuideline, Edge::Top),
                    ],
                    0.0,
                ),
                self.slot(
                    1,
                    cell,
                    vec![
                        Anchor::holder(Edge::Start),
                        Anchor::new(Edge::Top, AnchorTarget::HorizontalGuideline, Edge::Bottom),
                        Anchor::holder(Edge::End),
                    ],
                    0.0,
                ),
            ];
            (slots, None, Some(GUIDELINE_CENTER))
        }
    }

    /// Template C in landscape: wide featured stream with a tall inset beside it
    fn featured_with_inset_landscape(&self, width: f32, height: f32) -> Placement {
        let gutter = self.config.px(self.config.gutter_dp);
        let main_padding = self.config.px(self.config.main_axis_padding_dp);

        let featured_at = |step: u32| {
            if step == 0 {
                return self.min_cell();
            }
            let featured_width = self.grown(step);
            Cell {
                width: featured_width,
                height: featured_width * WIDE_ASPECT,
            }
        };
        let steps = growth_steps(search_limit(width), |step| {
            let featured = featured_at(step);
            featured.width < (width - main_padding) * FEATURED_SHARE && featured.height < height - gutter
        });
        let featured = featured_at(steps);

        let inset_at = |step: u32| {
            if step == 0 {
                return self.min_cell();
            }
            let inset_width = self.grown(step);
            Cell {
                width: inset_width,
                height: inset_width / WIDE_ASPECT,
            }
        };
        let steps = growth_steps(search_limit(width), |step| {
            let inset = inset_at(step);
            inset.width < width - featured.width - main_padding && inset.height < height - gutter
        });
        let inset = inset_at(steps);

        let slots = vec![
            self.slot(
                0,
                featured,
                vec![
                    Anchor::holder(Edge::Start),
                    Anchor::holder(Edge::Top),
                    Anchor::new(Edge::End, AnchorTarget::Slot(1), Edge::Start),
                    Anchor::holder(Edge::Bottom),
                ],
                0.0,
            ),
            self.slot(
                1,
                inset,
                vec![
                    Anchor::new(Edge::Start, AnchorTarget::Slot(0), Edge::End),
                    Anchor::holder(Edge::Top),
                    Anchor::holder(Edge::End),
                    Anchor::holder(Edge::Bottom),
                ],
                self.config.px(self.config.inset_margin_dp),
            ),
        ];

        (slots, None, None)
    }

    /// Template C in portrait: featured across the top half, tall inset below
    fn featured_with_inset_portrait(&self, width: f32, height: f32) -> Placement {
        let cross_padding = self.config.px(self.config.cross_axis_padding_dp);

        let featured_width = width - cross_padding;
        let featured = Cell {
            width: featured_width,
            height: featured_width * WIDE_ASPECT,
        };

        let inset_height = height / INSET_HEIGHT_DIVISOR;
        let inset = Cell {
            width: inset_height * WIDE_ASPECT,
            height: inset_height,
        };

        let slots = vec![
            self.slot(
                0,
                featured,
                vec![
                    Anchor::holder(Edge::Start),
                    Anchor::holder(Edge::End),
                    Anchor::new(Edge::Top, AnchorTarget::HorizontalGuideline, Edge::Top),
                    Anchor::new(Edge::Bottom, AnchorTarget::HorizontalGuideline, Edge::Top),
                ],
                0.0,
            ),
            self.slot(
                1,
                inset,
                vec![
                    Anchor::new(Edge::Top, AnchorTarget::HorizontalGuideline, Edge::Bottom),
                    Anchor::holder(Edge::End),
                ],
                self.config.px(self.config.portrait_inset_margin_dp),
            ),
        ];

        (slots, None, Some(GUIDELINE_CENTER))
    }
}

/// Slots plus vertical and horizontal guideline positions
type Placement = (Vec<SlotGeometry>, Option<f32>, Option<f32>);

/// A step count at which no cell can fit an axis of `extent` pixels
fn search_limit(extent: f32) -> u32 {
    (extent.max(0.0) as u32).saturating_add(1)
}

/// Number of one-pixel steps a growth search takes before it stops
///
/// `grows(step)` holds while the cell grown by `step` pixels may still grow.
/// Step zero is the minimum cell and is checked on its own; from step one
/// on `grows` must be monotone and false at `limit`. Equivalent to stepping
/// one pixel at a time, but bisects over the step count.
fn growth_steps(limit: u32, grows: impl Fn(u32) -> bool) -> u32 {
    if !grows(0) {
        return 0;
    }

    let (mut low, mut high) = (1u32, limit.max(1));
    while low < high {
        let mid = low + (high - low) / 2;
        if grows(mid) {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

/// Compute geometry with the default layout configuration
pub fn compute_geometry(
    container_width: u32,
    container_height: u32,
    is_landscape: bool,
    template: Template,
) -> LayoutGeometry {
    LayoutEngine::default().compute_geometry(container_width, container_height, is_landscape, template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(geometry: &LayoutGeometry, slot_index: usize) -> (u32, u32) {
        let slot = geometry.slot(slot_index).unwrap();
        (slot.width_px, slot.height_px)
    }

    #[test]
    fn test_template_b_landscape_bounds() {
        let geometry = compute_geometry(800, 480, true, Template::B);
        let (side, other) = dims(&geometry, 0);

        assert_eq!(side, other);
        assert_eq!(side, 388);
        assert!(2 * side + 8 <= 800);
        assert!(side <= 480);
        assert_eq!(dims(&geometry, 1), (side, side));
        assert_eq!(geometry.vertical_guideline, Some(0.5));
    }

    #[test]
    fn test_template_b_never_shrinks_when_wider() {
        let mut previous = 0;
        for width in (400..=1600).step_by(50) {
            let (side, _) = dims(&compute_geometry(width, 480, true, Template::B), 0);
            assert!(side >= previous, "side shrank at width {}", width);
            assert!(side <= 480 - 16);
            previous = side;
        }
        assert_eq!(previous, 464);
    }

    #[test]
    fn test_template_b_portrait_swaps_axes() {
        let landscape = compute_geometry(800, 480, true, Template::B);
        let portrait = compute_geometry(480, 800, false, Template::B);
        assert_eq!(dims(&landscape, 0), dims(&portrait, 0));
        assert_eq!(portrait.orientation, Orientation::Portrait);
        assert_eq!(portrait.horizontal_guideline, Some(0.5));
    }

    #[test]
    fn test_template_a_landscape() {
        let geometry = compute_geometry(1280, 720, true, Template::A);
        let (featured_w, featured_h) = dims(&geometry, 0);
        let (secondary_w, secondary_h) = dims(&geometry, 1);

        assert_eq!((featured_w, featured_h), (843, 474));
        assert!(featured_h < 720 - 8);
        assert!((featured_h as f32 - featured_w as f32 * WIDE_ASPECT).abs() <= 1.0);
        assert!((secondary_h as f32 - (featured_h as f32 - 8.0) / 2.0).abs() <= 1.0);
        assert!(featured_w + secondary_w <= 1280 - 24 + 1);
        assert_eq!(dims(&geometry, 2), (secondary_w, secondary_h));
    }

    #[test]
    fn test_template_a_landscape_anchors_stack_secondaries() {
        let geometry = compute_geometry(1280, 720, true, Template::A);
        let lower = geometry.slot(2).unwrap();
        assert!(lower
            .anchors
            .contains(&Anchor::new(Edge::Top, AnchorTarget::Slot(1), Edge::Bottom)));
        assert!(lower
            .anchors
            .contains(&Anchor::new(Edge::Bottom, AnchorTarget::Slot(0), Edge::Bottom)));
    }

    #[test]
    fn test_template_a_portrait() {
        let geometry = compute_geometry(720, 1280, false, Template::A);
        assert_eq!(dims(&geometry, 0), (704, 396));
        assert_eq!(dims(&geometry, 1), (348, 196));
        assert_eq!(dims(&geometry, 2), (348, 196));
        assert_eq!(geometry.vertical_guideline, Some(0.5));
    }

    #[test]
    fn test_template_c_landscape() {
        let geometry = compute_geometry(1280, 720, true, Template::C);
        let (featured_w, featured_h) = dims(&geometry, 0);
        let inset = geometry.slot(1).unwrap();

        assert_eq!((featured_w, featured_h), (980, 551));
        assert!(featured_w as f32 >= (1280.0 - 24.0) * FEATURED_SHARE);
        assert_eq!((inset.width_px, inset.height_px), (276, 491));
        assert!(inset.height_px > inset.width_px);
        assert_eq!(inset.margin_px, 4);
    }

    #[test]
    fn test_template_c_portrait() {
        let geometry = compute_geometry(720, 1280, false, Template::C);
        assert_eq!(dims(&geometry, 0), (704, 396));
        assert_eq!(dims(&geometry, 1), (240, 427));
        assert_eq!(geometry.slot(1).unwrap().margin_px, 36);
    }

    #[test]
    fn test_density_scales_margins() {
        let config = LayoutConfig {
            density: 2.0,
            ..Default::default()
        };
        let engine = LayoutEngine::new(config);

        let geometry = engine.compute_geometry(1600, 960, true, Template::B);
        let (side, _) = dims(&geometry, 0);
        assert_eq!(side, 776);
        assert!(2 * side <= 1600 - 48);
        assert!(side < 960 - 32);

        let inset = engine.compute_geometry(2560, 1440, true, Template::C);
        assert_eq!(inset.slot(1).unwrap().margin_px, 8);
    }

    #[test]
    fn test_tiny_container_keeps_minimum_cell() {
        for template in Template::ALL {
            for landscape in [true, false] {
                let geometry = compute_geometry(0, 0, landscape, template);
                assert_eq!(geometry.slots.len(), template.slot_count());
                for slot in &geometry.slots {
                    assert!(slot.width_px >= 10 && slot.height_px >= 10);
                }
            }
        }
    }

    #[test]
    fn test_huge_containers_finish() {
        let geometry = compute_geometry(40_000_000, 40_000_000, true, Template::B);
        let (side, _) = dims(&geometry, 0);
        assert!(side.abs_diff(20_000_000) <= 16, "side {}", side);

        for template in Template::ALL {
            for (width, height) in [(u32::MAX, u32::MAX), (u32::MAX, 720), (1280, u32::MAX)] {
                let geometry = compute_geometry(width, height, width >= height, template);
                assert_eq!(geometry.slots.len(), template.slot_count());
            }
        }
    }

    #[test]
    fn test_bisection_matches_single_steps() {
        let engine = LayoutEngine::default();
        let cross_padding = engine.config.px(engine.config.cross_axis_padding_dp);
        let main_padding = engine.config.px(engine.config.main_axis_padding_dp);

        for (main, cross) in [(0u32, 0u32), (30, 40), (800, 480), (1279, 719), (5000, 90)] {
            let (main_f, cross_f) = (main as f32, cross as f32);
            let mut side = engine.config.min_cell_px;
            while side < cross_f - cross_padding && side * 2.0 < main_f - main_padding {
                side += 1.0;
            }

            let geometry = engine.compute_geometry(main, cross, true, Template::B);
            assert_eq!(dims(&geometry, 0).0, side.round() as u32, "{}x{}", main, cross);
        }
    }

    #[test]
    fn test_growth_steps_stops_at_first_failure() {
        assert_eq!(growth_steps(100, |_| false), 0);
        assert_eq!(growth_steps(100, |step| step < 37), 37);
        assert_eq!(growth_steps(u32::MAX, |step| step < 3_000_000_000), 3_000_000_000);

        // Only step zero failing still stops the search
        assert_eq!(growth_steps(100, |step| step != 0), 0);
    }

    #[test]
    fn test_geometry_is_deterministic() {
        let first = compute_geometry(1920, 1080, true, Template::A);
        let second = compute_geometry(1920, 1080, true, Template::A);
        assert_eq!(first, second);
    }
}
