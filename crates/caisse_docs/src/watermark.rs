//! Watermark placement shared by the PDF and HTML renderers.

use crate::template::{WatermarkConfig, WatermarkPosition};

/// Tiled mode draws a fixed grid of this many columns ...
pub const TILE_COLUMNS: usize = 3;
/// ... by this many rows.
pub const TILE_ROWS: usize = 4;

/// Centre point of one watermark instance, in page units, and its rotation
/// in degrees (counter-clockwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

/// Where to draw the watermark on a `width` × `height` page.
///
/// Centre mode ignores the rotation; diagonal and tiled apply it.
pub fn placements(config: &WatermarkConfig, width: f64, height: f64) -> Vec<Placement> {
    match config.position {
        WatermarkPosition::Center => vec![Placement {
            x: width / 2.0,
            y: height / 2.0,
            rotation: 0.0,
        }],
        WatermarkPosition::Diagonal => vec![Placement {
            x: width / 2.0,
            y: height / 2.0,
            rotation: config.rotation,
        }],
        WatermarkPosition::Tiled => {
            let mut out = Vec::with_capacity(TILE_COLUMNS * TILE_ROWS);
            for row in 0..TILE_ROWS {
                for col in 0..TILE_COLUMNS {
                    out.push(Placement {
                        x: width * (col as f64 + 0.5) / TILE_COLUMNS as f64,
                        y: height * (row as f64 + 0.5) / TILE_ROWS as f64,
                        rotation: config.rotation,
                    });
                }
            }
            out
        }
    }
}
