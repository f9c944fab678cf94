//! Integration tests for the geometry engine
//!
//! These tests sweep container sizes and check the bounds every template
//! must respect:
//! - Square cells that fit the holder in both directions
//! - A widescreen featured cell with secondaries sharing its height
//! - An inset that keeps the featured cell's margins
//! - Zoom-to-fit that always covers its container

use anyhow::Result;
use multiview::layout::{LayoutEngine, Orientation, Template, WIDE_ASPECT};
use multiview::utils::LayoutConfig;
use multiview::{compute_geometry, fit_video, Size};
use proptest::prelude::*;

fn dims(geometry: &multiview::LayoutGeometry, slot_index: usize) -> (u32, u32) {
    let slot = geometry.slot(slot_index).expect("slot exists");
    (slot.width_px, slot.height_px)
}

proptest! {
    #[test]
    fn template_b_cells_fit_the_holder(width in 100u32..3000, height in 100u32..2000) {
        let geometry = compute_geometry(width, height, true, Template::B);
        let (side, other) = dims(&geometry, 0);

        prop_assert_eq!(side, other);
        prop_assert_eq!(dims(&geometry, 1), (side, side));
        prop_assert!(2 * side + 8 <= width);
        prop_assert!(side <= height - 16);
    }

    #[test]
    fn template_b_never_shrinks_when_wider(width in 100u32..2000, extra in 0u32..1000, height in 100u32..1200) {
        let (narrow, _) = dims(&compute_geometry(width, height, true, Template::B), 0);
        let (wide, _) = dims(&compute_geometry(width + extra, height, true, Template::B), 0);
        prop_assert!(wide >= narrow);
    }

    #[test]
    fn template_b_portrait_mirrors_landscape(main in 100u32..2000, cross in 100u32..2000) {
        let landscape = compute_geometry(main, cross, true, Template::B);
        let portrait = compute_geometry(cross, main, false, Template::B);
        prop_assert_eq!(dims(&landscape, 0), dims(&portrait, 0));
    }

    #[test]
    fn template_a_landscape_keeps_widescreen_featured(width in 640u32..2560, height in 360u32..1440) {
        let geometry = compute_geometry(width, height, true, Template::A);
        let (featured_w, featured_h) = dims(&geometry, 0);
        let (secondary_w, secondary_h) = dims(&geometry, 1);

        // The search may overshoot by at most one step before rounding
        prop_assert!(featured_h <= height - 7);
        prop_assert!((featured_h as f32 - featured_w as f32 * WIDE_ASPECT).abs() <= 1.0);
        prop_assert!((secondary_h as f32 - (featured_h as f32 - 8.0) / 2.0).abs() <= 1.0);
        prop_assert_eq!(dims(&geometry, 2), (secondary_w, secondary_h));
    }

    #[test]
    fn geometry_is_deterministic(width in 1u32..3000, height in 1u32..3000, template_index in 0usize..3) {
        let template = Template::ALL[template_index];
        let is_landscape = width >= height;
        prop_assert_eq!(
            compute_geometry(width, height, is_landscape, template),
            compute_geometry(width, height, is_landscape, template)
        );
    }

    #[test]
    fn any_container_size_lays_out(width in any::<u32>(), height in any::<u32>(), template_index in 0usize..3) {
        let template = Template::ALL[template_index];
        let geometry = compute_geometry(width, height, width >= height, template);
        prop_assert_eq!(geometry.slots.len(), template.slot_count());
        prop_assert!(geometry.slots.iter().all(|slot| slot.width_px >= 10 && slot.height_px >= 10));
    }

    #[test]
    fn fit_video_covers_container(
        width in 1u32..4000,
        height in 1u32..4000,
        video_width in 1u32..4000,
        video_height in 1u32..4000,
    ) {
        let container = Size::new(width, height);
        let fitted = fit_video(container, Size::new(video_width, video_height));

        prop_assert!(fitted.width == width || fitted.height == height);
        prop_assert!(fitted.width + 1 >= width);
        prop_assert!(fitted.height + 1 >= height);
    }
}

#[test]
fn test_every_template_lays_out_every_slot() -> Result<()> {
    let engine = LayoutEngine::new(LayoutConfig::default());

    for template in Template::ALL {
        for (width, height, is_landscape) in [(1280, 720, true), (720, 1280, false), (64, 48, true)] {
            let geometry = engine.compute_geometry(width, height, is_landscape, template);

            assert_eq!(geometry.template, template);
            assert_eq!(geometry.slots.len(), template.slot_count());
            assert_eq!(geometry.container, Size::new(width, height));
            for (index, slot) in geometry.slots.iter().enumerate() {
                assert_eq!(slot.slot_index, index);
                assert!(slot.width_px > 0 && slot.height_px > 0);
            }
        }
    }

    Ok(())
}

#[test]
fn test_template_c_inset_margins() -> Result<()> {
    let landscape = compute_geometry(1280, 720, true, Template::C);
    assert_eq!(landscape.orientation, Orientation::Landscape);
    assert_eq!(dims(&landscape, 0), (980, 551));
    assert_eq!(landscape.slots[1].margin_px, 4);

    let portrait = compute_geometry(720, 1280, false, Template::C);
    assert_eq!(portrait.orientation, Orientation::Portrait);
    assert_eq!(dims(&portrait, 0), (704, 396));
    assert_eq!(portrait.slots[1].margin_px, 36);

    Ok(())
}

#[test]
fn test_density_scales_spacing() -> Result<()> {
    let dense = LayoutEngine::new(LayoutConfig {
        density: 2.0,
        ..Default::default()
    });
    let geometry = dense.compute_geometry(1600, 960, true, Template::B);

    assert_eq!(dims(&geometry, 0), (776, 776));

    Ok(())
}

#[test]
fn test_fit_video_keeps_container_for_unknown_video() -> Result<()> {
    assert_eq!(fit_video(Size::new(400, 300), Size::default()), Size::new(400, 300));
    assert_eq!(fit_video(Size::new(388, 388), Size::new(1920, 1080)), Size::new(689, 388));

    Ok(())
}
