pub use libremarkable::framebuffer::{
    cgmath::Point2, cgmath::Vector2, common::color, common::mxcfb_rect, common::DISPLAYHEIGHT,
    common::DISPLAYWIDTH, core::Framebuffer, FramebufferBase, FramebufferDraw, FramebufferRefresh,
};
use crate::config::{Config, Viewport};
use libremarkable::framebuffer::{
    common::display_temp, common::dither_mode, common::waveform_mode, PartialRefreshMode,
};
use libremarkable::image;
use std::ops::DerefMut;

/// Framebuffer wrapper that speaks the logical canvas coordinates of the
/// configuration. Positions, sizes and all returned rects are logical; the
/// viewport transform is applied right before touching the framebuffer.
pub struct Canvas {
    framebuffer: Box<Framebuffer>,
    viewport: Viewport,
    size: Vector2<u32>,
    background: color,
}

impl Canvas {
    pub fn new(config: &Config, viewport: Viewport) -> Self {
        Self {
            framebuffer: Box::new(Framebuffer::from_path("/dev/fb0")),
            viewport,
            size: config.canvas_size(),
            background: config.background_color(),
        }
    }

    pub fn framebuffer_mut(&mut self) -> &'static mut Framebuffer {
        unsafe {
            std::mem::transmute::<_, &'static mut Framebuffer>(
                self.framebuffer.deref_mut(),
            )
        }
    }

    pub fn clear(&mut self) {
        self.framebuffer_mut().fill_rect(
            Point2 { x: 0, y: 0 },
            Vector2 {
                x: DISPLAYWIDTH as u32,
                y: DISPLAYHEIGHT as u32,
            },
            self.background,
        );
    }

    pub fn update_full(&mut self) -> u32 {
        self.framebuffer_mut().full_refresh(
            waveform_mode::WAVEFORM_MODE_GC16,
            display_temp::TEMP_USE_REMARKABLE_DRAW,
            dither_mode::EPDC_FLAG_USE_DITHERING_PASSTHROUGH,
            0,
            true,
        )
    }

    pub fn update_partial(&mut self, region: &mxcfb_rect) -> u32 {
        let device_region = self.viewport.rect(region);
        self.framebuffer_mut().partial_refresh(
            &device_region,
            PartialRefreshMode::Async,
            waveform_mode::WAVEFORM_MODE_GC16_FAST,
            display_temp::TEMP_USE_REMARKABLE_DRAW,
            dither_mode::EPDC_FLAG_USE_REMARKABLE_DITHER,
            0, // See documentation on DRAWING_QUANT_BITS in libremarkable/framebuffer/common.rs
            false,
        )
    }

    fn measure_text(&mut self, text: &str, size: f32) -> Vector2<u32> {
        let device_size = self.viewport.font_size(size);
        let rect = self.framebuffer_mut().draw_text(
            Point2 {
                x: 0.0,
                y: DISPLAYHEIGHT as f32,
            },
            text,
            device_size,
            color::BLACK,
            true,
        );
        self.viewport.to_logical_size(Vector2 {
            x: rect.width,
            y: rect.height,
        })
    }

    pub fn draw_text(&mut self, pos: Point2<Option<i32>>, text: &str, size: f32) -> mxcfb_rect {
        let mut pos = pos;
        if pos.x.is_none() || pos.y.is_none() {
            // Dryrun to get the text size
            let measured = self.measure_text(text, size);
            if pos.x.is_none() {
                // Center horizontally
                pos.x = Some(self.size.x as i32 / 2 - measured.x as i32 / 2);
            }
            if pos.y.is_none() {
                // Center vertically
                pos.y = Some(self.size.y as i32 / 2 - measured.y as i32 / 2);
            }
        }
        let device_pos = self.viewport.point(Point2 {
            x: pos.x.unwrap(),
            y: pos.y.unwrap(),
        });
        let device_size = self.viewport.font_size(size);

        let drawn = self.framebuffer_mut().draw_text(
            Point2 {
                x: device_pos.x as f32,
                y: device_pos.y as f32,
            },
            text,
            device_size,
            color::BLACK,
            false,
        );
        self.viewport.to_logical_rect(&drawn)
    }

    /// Text whose bottom-right corner sits at `anchor`.
    pub fn draw_text_right(&mut self, anchor: Point2<i32>, text: &str, size: f32) -> mxcfb_rect {
        let measured = self.measure_text(text, size);
        self.draw_text(
            Point2 {
                x: Some(anchor.x - measured.x as i32),
                y: Some(anchor.y - measured.y as i32),
            },
            text,
            size,
        )
    }

    pub fn draw_rect(
        &mut self,
        pos: Point2<Option<i32>>,
        size: Vector2<u32>,
        border_px: u32,
    ) -> mxcfb_rect {
        let mut pos = pos;
        if pos.x.is_none() {
            // Center horizontally
            pos.x = Some(self.size.x as i32 / 2 - size.x as i32 / 2);
        }
        if pos.y.is_none() {
            // Center vertically
            pos.y = Some(self.size.y as i32 / 2 - size.y as i32 / 2);
        }
        let device_pos = self.viewport.point(Point2 {
            x: pos.x.unwrap(),
            y: pos.y.unwrap(),
        });
        self.framebuffer_mut()
            .draw_rect(device_pos, self.viewport.size(size), border_px, color::BLACK);
        mxcfb_rect {
            top: pos.y.unwrap().max(0) as u32,
            left: pos.x.unwrap().max(0) as u32,
            width: size.x,
            height: size.y,
        }
    }

    pub fn fill_rect(
        &mut self,
        pos: Point2<Option<i32>>,
        size: Vector2<u32>,
        clr: color,
    ) -> mxcfb_rect {
        let mut pos = pos;
        if pos.x.is_none() {
            // Center horizontally
            pos.x = Some(self.size.x as i32 / 2 - size.x as i32 / 2);
        }
        if pos.y.is_none() {
            // Center vertically
            pos.y = Some(self.size.y as i32 / 2 - size.y as i32 / 2);
        }
        let device_pos = self.viewport.point(Point2 {
            x: pos.x.unwrap(),
            y: pos.y.unwrap(),
        });
        self.framebuffer_mut()
            .fill_rect(device_pos, self.viewport.size(size), clr);
        mxcfb_rect {
            top: pos.y.unwrap().max(0) as u32,
            left: pos.x.unwrap().max(0) as u32,
            width: size.x,
            height: size.y,
        }
    }

    /// Outlined box with its label centered inside. The hitbox is decided
    /// by the caller up front, so layout stays deterministic regardless of
    /// how wide the text renders.
    pub fn draw_button(&mut self, hitbox: &mxcfb_rect, text: &str, font_size: f32) {
        self.draw_rect(
            Point2 {
                x: Some(hitbox.left as i32),
                y: Some(hitbox.top as i32),
            },
            Vector2 {
                x: hitbox.width,
                y: hitbox.height,
            },
            3,
        );
        let label = self.measure_text(text, font_size);
        self.draw_text(
            Point2 {
                x: Some(hitbox.left as i32 + (hitbox.width as i32 - label.x as i32) / 2),
                y: Some(hitbox.top as i32 + (hitbox.height as i32 - label.y as i32) / 2),
            },
            text,
            font_size,
        );
    }

    pub fn draw_image(&mut self, pos: Point2<Option<i32>>, img: &image::DynamicImage) -> mxcfb_rect {
        use libremarkable::image::GenericImageView;

        let (width, height) = img.dimensions();
        let mut pos = pos;
        if pos.x.is_none() {
            // Center horizontally
            pos.x = Some(self.size.x as i32 / 2 - width as i32 / 2);
        }
        if pos.y.is_none() {
            // Center vertically
            pos.y = Some(self.size.y as i32 / 2 - height as i32 / 2);
        }
        let device_pos = self.viewport.point(Point2 {
            x: pos.x.unwrap(),
            y: pos.y.unwrap(),
        });
        let device_size = self.viewport.size(Vector2 {
            x: width,
            y: height,
        });
        let scaled = img.resize_exact(
            device_size.x,
            device_size.y,
            image::imageops::FilterType::Nearest,
        );
        self.framebuffer_mut().draw_image(&scaled.to_rgb8(), device_pos);
        mxcfb_rect {
            top: pos.y.unwrap().max(0) as u32,
            left: pos.x.unwrap().max(0) as u32,
            width,
            height,
        }
    }

    pub fn is_hitting(pos: Point2<i32>, hitbox: mxcfb_rect) -> bool {
        pos.x >= hitbox.left as i32
            && pos.x < (hitbox.left + hitbox.width) as i32
            && pos.y >= hitbox.top as i32
            && pos.y < (hitbox.top + hitbox.height) as i32
    }
}
