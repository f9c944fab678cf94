//! Zoom-to-fit sizing of a decoded video inside its container

use crate::layout::Size;
use log::debug;

/// Size a video surface so it covers `container` without distortion
///
/// The result keeps the video's aspect ratio and matches the container on
/// one axis while overflowing (or exactly matching) it on the other. A video
/// of unknown size leaves the container size unchanged.
pub fn fit_video(container: Size, video: Size) -> Size {
    if video.is_empty() || container.is_empty() {
        return container;
    }

    let ratio_height = video.height as f64 / video.width as f64;
    let ratio_width = video.width as f64 / video.height as f64;
    let is_portrait = video.width < video.height;

    let cw = container.width as f64;
    let ch = container.height as f64;

    let calculated_height = if is_portrait { cw / ratio_width } else { cw * ratio_height } as u32;
    let calculated_width = if is_portrait { ch / ratio_height } else { ch * ratio_width } as u32;

    debug!(
        "Fit candidates ({}, {}) or ({}, {}) for container {}, video {}",
        container.width, calculated_height, calculated_width, container.height, container, video
    );

    if calculated_width >= container.width {
        Size::new(calculated_width, container.height)
    } else {
        Size::new(container.width, calculated_height)
    }
}
