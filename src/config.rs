use anyhow::{Context, Result};
use libremarkable::framebuffer::cgmath::{Point2, Vector2};
use libremarkable::framebuffer::common::{color, mxcfb_rect};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the logical canvas is mapped onto the display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Largest uniform scale that fits, centered on both axes
    Fit,
    /// Independent scale per axis, filling the whole display
    Stretch,
    /// No scaling, centered
    Native,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub scale_mode: ScaleMode,
    pub background: [u8; 3],
    pub physics: bool,
    pub fps: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            scale_mode: ScaleMode::Fit,
            background: [255, 255, 255],
            physics: false,
            fps: 30,
        }
    }
}

impl Config {
    pub fn canvas_size(&self) -> Vector2<u32> {
        Vector2 {
            x: self.width,
            y: self.height,
        }
    }

    pub fn background_color(&self) -> color {
        color::RGB(self.background[0], self.background[1], self.background[2])
    }

    pub fn viewport(&self, display_width: u32, display_height: u32) -> Viewport {
        Viewport::new(self, display_width, display_height)
    }
}

pub fn read(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!("Config file {:?} doesn't exist (yet), using defaults.", path);
        return Ok(Config::default());
    }
    let file = std::fs::File::open(path).context("Open config file")?;
    serde_yaml::from_reader(file).context("Deserialize config file")
}

/// Mapping between the logical canvas and the display, derived from the
/// configured scale mode. Scenes only ever see logical coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    scale_x: f32,
    scale_y: f32,
    offset_x: i32,
    offset_y: i32,
}

impl Viewport {
    pub fn new(config: &Config, display_width: u32, display_height: u32) -> Self {
        let (scale_x, scale_y) = match config.scale_mode {
            ScaleMode::Fit => {
                let scale = (display_width as f32 / config.width as f32)
                    .min(display_height as f32 / config.height as f32);
                (scale, scale)
            }
            ScaleMode::Stretch => (
                display_width as f32 / config.width as f32,
                display_height as f32 / config.height as f32,
            ),
            ScaleMode::Native => (1.0, 1.0),
        };
        Self {
            scale_x,
            scale_y,
            offset_x: (display_width as f32 - config.width as f32 * scale_x) as i32 / 2,
            offset_y: (display_height as f32 - config.height as f32 * scale_y) as i32 / 2,
        }
    }

    pub fn point(&self, pos: Point2<i32>) -> Point2<i32> {
        Point2 {
            x: (pos.x as f32 * self.scale_x).round() as i32 + self.offset_x,
            y: (pos.y as f32 * self.scale_y).round() as i32 + self.offset_y,
        }
    }

    pub fn size(&self, size: Vector2<u32>) -> Vector2<u32> {
        Vector2 {
            x: (size.x as f32 * self.scale_x).round() as u32,
            y: (size.y as f32 * self.scale_y).round() as u32,
        }
    }

    pub fn rect(&self, rect: &mxcfb_rect) -> mxcfb_rect {
        let pos = self.point(Point2 {
            x: rect.left as i32,
            y: rect.top as i32,
        });
        let size = self.size(Vector2 {
            x: rect.width,
            y: rect.height,
        });
        mxcfb_rect {
            top: pos.y.max(0) as u32,
            left: pos.x.max(0) as u32,
            width: size.x,
            height: size.y,
        }
    }

    pub fn font_size(&self, size: f32) -> f32 {
        size * self.scale_x.min(self.scale_y)
    }

    pub fn to_logical_point(&self, pos: Point2<i32>) -> Point2<i32> {
        Point2 {
            x: ((pos.x - self.offset_x) as f32 / self.scale_x).round() as i32,
            y: ((pos.y - self.offset_y) as f32 / self.scale_y).round() as i32,
        }
    }

    pub fn to_logical_size(&self, size: Vector2<u32>) -> Vector2<u32> {
        Vector2 {
            x: (size.x as f32 / self.scale_x).round() as u32,
            y: (size.y as f32 / self.scale_y).round() as u32,
        }
    }

    pub fn to_logical_rect(&self, rect: &mxcfb_rect) -> mxcfb_rect {
        let pos = self.to_logical_point(Point2 {
            x: rect.left as i32,
            y: rect.top as i32,
        });
        let size = self.to_logical_size(Vector2 {
            x: rect.width,
            y: rect.height,
        });
        mxcfb_rect {
            top: pos.y.max(0) as u32,
            left: pos.x.max(0) as u32,
            width: size.x,
            height: size.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // reMarkable 1/2 display dimensions
    const DISPLAY: (u32, u32) = (1404, 1872);

    #[test]
    fn defaults_match_the_scaffold() {
        let config = Config::default();
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert_eq!(config.scale_mode, ScaleMode::Fit);
        assert!(!config.physics);
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn config_file_fields_override_defaults() {
        let config: Config =
            serde_yaml::from_str("width: 800\nphysics: true\nscale_mode: stretch").unwrap();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 720);
        assert!(config.physics);
        assert_eq!(config.scale_mode, ScaleMode::Stretch);
    }

    #[test]
    fn fit_scales_uniformly_and_centers_vertically() {
        let viewport = Config::default().viewport(DISPLAY.0, DISPLAY.1);
        // 1404/1280 is the limiting axis
        assert_eq!(viewport.point(Point2 { x: 0, y: 0 }), Point2 { x: 0, y: 541 });
        assert_eq!(
            viewport.point(Point2 { x: 1280, y: 720 }),
            Point2 { x: 1404, y: 1331 }
        );
        assert_eq!(
            viewport.size(Vector2 { x: 1280, y: 720 }),
            Vector2 { x: 1404, y: 790 }
        );
    }

    #[test]
    fn stretch_fills_both_axes() {
        let config = Config {
            scale_mode: ScaleMode::Stretch,
            ..Config::default()
        };
        let viewport = config.viewport(DISPLAY.0, DISPLAY.1);
        assert_eq!(viewport.point(Point2 { x: 0, y: 0 }), Point2 { x: 0, y: 0 });
        assert_eq!(
            viewport.point(Point2 { x: 1280, y: 720 }),
            Point2 { x: 1404, y: 1872 }
        );
    }

    #[test]
    fn native_centers_without_scaling() {
        let config = Config {
            scale_mode: ScaleMode::Native,
            ..Config::default()
        };
        let viewport = config.viewport(DISPLAY.0, DISPLAY.1);
        assert_eq!(
            viewport.point(Point2 { x: 0, y: 0 }),
            Point2 { x: 62, y: 576 }
        );
        assert_eq!(viewport.size(Vector2 { x: 100, y: 100 }), Vector2 { x: 100, y: 100 });
    }

    #[test]
    fn touch_positions_round_trip() {
        let viewport = Config::default().viewport(DISPLAY.0, DISPLAY.1);
        for &(x, y) in &[(0, 0), (640, 360), (1280, 720), (20, 700)] {
            let logical = viewport.to_logical_point(viewport.point(Point2 { x, y }));
            assert!((logical.x - x).abs() <= 1, "x: {} -> {}", x, logical.x);
            assert!((logical.y - y).abs() <= 1, "y: {} -> {}", y, logical.y);
        }
    }
}
