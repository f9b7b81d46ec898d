//! Composite thumbnail built from a cluster's member images.
//!
//! Photos are scaled to a common tile size and laid out left to right, top to
//! bottom in a two-column grid on a transparent canvas.

use base64::Engine;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tracing::{info, warn};

use common::CollageConfig;

use crate::gateway::{ServiceError, ServiceGateway};
use crate::models::Source;

const COLUMNS: u32 = 2;

/// Largest canvas, in pixels, the compositor will allocate
pub const MAX_CANVAS_PIXELS: u64 = 4096 * 4096;

/// Canvas size and tile offsets for a set of photos
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollageLayout {
    pub tile_width: u32,
    pub tile_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Top-left corner of each tile, in input order
    pub offsets: Vec<(u32, u32)>,
}

impl CollageLayout {
    /// Compute the grid for photos of the given `(width, height)` dimensions.
    /// Returns `None` for an empty set, a photo with a zero dimension, or a
    /// canvas larger than [`MAX_CANVAS_PIXELS`].
    pub fn compute(dimensions: &[(u32, u32)], tile_width: u32) -> Option<Self> {
        if dimensions.is_empty() || tile_width == 0 {
            return None;
        }

        // Shortest proportional height keeps rows free of gaps
        let tile_height = dimensions
            .iter()
            .map(|&(w, h)| scaled_height(w, h, tile_width))
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .min()?;

        let rows = u32::try_from(dimensions.len()).ok()?.div_ceil(COLUMNS);
        let canvas_width = tile_width.checked_mul(COLUMNS)?;
        let canvas_height = tile_height.checked_mul(rows)?;
        if u64::from(canvas_width) * u64::from(canvas_height) > MAX_CANVAS_PIXELS {
            return None;
        }

        let mut offsets = Vec::with_capacity(dimensions.len());
        let (mut x, mut y) = (0, 0);
        for _ in dimensions {
            offsets.push((x, y));
            x += tile_width;
            if x >= canvas_width {
                x = 0;
                y += tile_height;
            }
        }

        Some(Self {
            tile_width,
            tile_height,
            canvas_width,
            canvas_height,
            offsets,
        })
    }
}

fn scaled_height(width: u32, height: u32, tile_width: u32) -> Option<u32> {
    if width == 0 || height == 0 {
        return None;
    }
    let scaled = (u64::from(height) * u64::from(tile_width) + u64::from(width) / 2) / u64::from(width);
    u32::try_from(scaled.max(1)).ok()
}

/// Pick up to `max` usable media links in member order, URL-decoded.
pub fn select_media<'a, I>(sources: I, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a Source>,
{
    sources
        .into_iter()
        .filter_map(Source::media_link)
        .take(max)
        .map(|link| match urlencoding::decode(link) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => link.to_string(),
        })
        .collect()
}

pub fn decode_images(raw: &[Vec<u8>]) -> Result<Vec<DynamicImage>, ServiceError> {
    raw.iter()
        .map(|bytes| image::load_from_memory(bytes).map_err(|e| ServiceError::Image(e.to_string())))
        .collect()
}

/// Lay out and paint the photos onto a transparent canvas.
pub fn compose(images: &[DynamicImage], tile_width: u32) -> Option<RgbaImage> {
    let dimensions: Vec<(u32, u32)> = images.iter().map(|img| (img.width(), img.height())).collect();
    let layout = CollageLayout::compute(&dimensions, tile_width)?;

    let mut canvas = RgbaImage::from_pixel(layout.canvas_width, layout.canvas_height, Rgba([255, 255, 255, 0]));

    for (img, &(x, y)) in images.iter().zip(&layout.offsets) {
        let tile = img
            .resize_exact(layout.tile_width, layout.tile_height, FilterType::Lanczos3)
            .to_rgba8();
        imageops::overlay(&mut canvas, &tile, i64::from(x), i64::from(y));
    }

    Some(canvas)
}

/// Encode the canvas as a PNG data URI.
pub fn encode_data_uri(canvas: &RgbaImage) -> Result<String, ServiceError> {
    let mut buf = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ServiceError::Image(e.to_string()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());
    Ok(format!("data:image/png;base64,{}", encoded))
}

/// Build the collage for a cluster. Any failure yields `None` so the post is
/// stored without media.
pub async fn make_collage<G>(gateway: &G, members: &[&Source], config: &CollageConfig) -> Option<String>
where
    G: ServiceGateway + ?Sized,
{
    let links = select_media(members.iter().copied(), config.max_images);
    if links.is_empty() {
        return None;
    }

    let raw = match gateway.fetch_images(&links).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, images = links.len(), "collage: image fetch failed, post will have no media");
            return None;
        }
    };

    let images = match decode_images(&raw) {
        Ok(images) => images,
        Err(e) => {
            warn!(error = %e, "collage: image decode failed, post will have no media");
            return None;
        }
    };

    let Some(canvas) = compose(&images, config.tile_width) else {
        warn!(images = images.len(), "collage: no usable layout, post will have no media");
        return None;
    };
    match encode_data_uri(&canvas) {
        Ok(uri) => {
            info!(
                images = images.len(),
                width = canvas.width(),
                height = canvas.height(),
                "collage: composed"
            );
            Some(uri)
        }
        Err(e) => {
            warn!(error = %e, "collage: encoding failed");
            None
        }
    }
}
