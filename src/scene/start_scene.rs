use super::{PointerEvent, Scene, MAIN_SCENE};
use crate::assets::{self, Assets};
use crate::canvas::*;
use crate::config::Config;
use std::rc::Rc;

/// Substituted at build time, shown read-only in the corner.
pub const VERSION_LABEL: &str = concat!("v", env!("CARGO_PKG_VERSION"));

const TITLE_FONT_SIZE: f32 = 64.0;
const BUTTON_FONT_SIZE: f32 = 32.0;
const LOADING_FONT_SIZE: f32 = 20.0;
const VERSION_FONT_SIZE: f32 = 16.0;

const START_BUTTON_SIZE: Vector2<u32> = Vector2 { x: 320, y: 70 };

const PROGRESS_BOX_SIZE: Vector2<u32> = Vector2 { x: 320, y: 50 };
const PROGRESS_INSET: u32 = 10;
const PROGRESS_BAR_WIDTH: u32 = 300;
const PROGRESS_BAR_HEIGHT: u32 = 30;

/// Loading box and bar. Dropped wholesale once loading completes.
struct ProgressIndicator {
    box_rect: mxcfb_rect,
    progress: f32,
    drawn: bool,
    dirty: bool,
}

impl ProgressIndicator {
    fn new(canvas_size: Vector2<u32>) -> Self {
        Self {
            box_rect: mxcfb_rect {
                top: canvas_size.y / 2,
                left: (canvas_size.x - PROGRESS_BOX_SIZE.x) / 2,
                width: PROGRESS_BOX_SIZE.x,
                height: PROGRESS_BOX_SIZE.y,
            },
            progress: 0.0,
            drawn: false,
            dirty: false,
        }
    }

    /// Strip inside the box that the fill is drawn into.
    fn bar_area(&self) -> mxcfb_rect {
        mxcfb_rect {
            top: self.box_rect.top + PROGRESS_INSET,
            left: self.box_rect.left + PROGRESS_INSET,
            width: PROGRESS_BAR_WIDTH,
            height: PROGRESS_BAR_HEIGHT,
        }
    }

    /// Filled part of the bar. Only the width tracks the reported
    /// fraction; the height is fixed.
    fn fill_rect(&self, progress: f32) -> mxcfb_rect {
        let area = self.bar_area();
        let width = (progress.max(0.0).min(1.0) * area.width as f32).round() as u32;
        mxcfb_rect { width, ..area }
    }
}

pub struct StartScene {
    canvas_size: Vector2<u32>,
    drawn: bool,
    loading: Option<ProgressIndicator>,
    assets: Option<Rc<Assets>>,
    start_button_hitbox: Option<mxcfb_rect>,
    pending_transition: Option<&'static str>,
}

impl StartScene {
    pub fn new(config: &Config) -> Self {
        Self {
            canvas_size: config.canvas_size(),
            drawn: false,
            loading: Some(ProgressIndicator::new(config.canvas_size())),
            assets: None,
            start_button_hitbox: None,
            pending_transition: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    fn layout_start_button(&self) -> mxcfb_rect {
        mxcfb_rect {
            top: self.canvas_size.y / 2 + 60,
            left: (self.canvas_size.x - START_BUTTON_SIZE.x) / 2,
            width: START_BUTTON_SIZE.x,
            height: START_BUTTON_SIZE.y,
        }
    }
}

impl Scene for StartScene {
    fn on_enter(&mut self) {
        self.drawn = false;
        self.pending_transition = None;
        self.start_button_hitbox = Some(self.layout_start_button());
    }

    fn on_load_progress(&mut self, progress: f32) {
        if let Some(indicator) = &mut self.loading {
            indicator.progress = progress;
            indicator.dirty = true;
        }
    }

    fn on_load_complete(&mut self, assets: &Rc<Assets>) {
        self.assets = Some(Rc::clone(assets));
        // One-shot: indicator and label are gone for good, the next draw
        // starts from a clean screen.
        self.loading = None;
        self.drawn = false;
    }

    fn on_input(&mut self, event: PointerEvent) {
        if self.is_loading() {
            // Controls only exist once loading finished
            return;
        }
        if let PointerEvent::Down(pos) = event {
            if self.start_button_hitbox.is_some()
                && Canvas::is_hitting(pos, self.start_button_hitbox.unwrap())
            {
                self.pending_transition = Some(MAIN_SCENE);
            }
        }
    }

    fn draw(&mut self, canvas: &mut Canvas) {
        if let Some(indicator) = &mut self.loading {
            if !indicator.drawn {
                indicator.drawn = true;
                canvas.clear();
                canvas.draw_text(
                    Point2 {
                        x: None,
                        y: Some(indicator.box_rect.top as i32 - 50),
                    },
                    "Loading...",
                    LOADING_FONT_SIZE,
                );
                canvas.draw_rect(
                    Point2 {
                        x: Some(indicator.box_rect.left as i32),
                        y: Some(indicator.box_rect.top as i32),
                    },
                    Vector2 {
                        x: indicator.box_rect.width,
                        y: indicator.box_rect.height,
                    },
                    2,
                );
                canvas.update_full();
            }
            if indicator.dirty {
                indicator.dirty = false;
                let fill = indicator.fill_rect(indicator.progress);
                canvas.fill_rect(
                    Point2 {
                        x: Some(fill.left as i32),
                        y: Some(fill.top as i32),
                    },
                    Vector2 {
                        x: fill.width,
                        y: fill.height,
                    },
                    color::BLACK,
                );
                canvas.update_partial(&indicator.bar_area());
            }
            return;
        }

        if self.drawn {
            return;
        }
        self.drawn = true;

        canvas.clear();
        if let Some(store) = &self.assets {
            if let Some(logo) = store.image(assets::LOGO) {
                canvas.draw_image(Point2 { x: None, y: Some(140) }, logo);
            }
        }
        canvas.draw_text(Point2 { x: None, y: Some(300) }, "STG GAME", TITLE_FONT_SIZE);
        canvas.draw_button(
            &self.start_button_hitbox.unwrap(),
            "START GAME",
            BUTTON_FONT_SIZE,
        );
        canvas.draw_text_right(
            Point2 {
                x: self.canvas_size.x as i32 - 10,
                y: self.canvas_size.y as i32 - 10,
            },
            VERSION_LABEL,
            VERSION_FONT_SIZE,
        );
        canvas.update_full();
    }

    fn take_transition(&mut self) -> Option<&'static str> {
        self.pending_transition.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entered_scene() -> StartScene {
        let mut scene = StartScene::new(&Config::default());
        scene.on_enter();
        scene
    }

    fn press_start(scene: &mut StartScene) {
        scene.on_input(PointerEvent::Down(Point2 { x: 640, y: 450 }));
    }

    #[test]
    fn fill_width_is_proportional_to_progress() {
        let indicator = ProgressIndicator::new(Vector2 { x: 1280, y: 720 });
        assert_eq!(indicator.fill_rect(0.0).width, 0);
        assert_eq!(indicator.fill_rect(0.5).width, 150);
        assert_eq!(indicator.fill_rect(1.0).width, 300);
    }

    #[test]
    fn fill_stays_inside_the_box() {
        let indicator = ProgressIndicator::new(Vector2 { x: 1280, y: 720 });
        let boxed = indicator.box_rect;
        let fill = indicator.fill_rect(1.0);
        assert!(fill.left >= boxed.left);
        assert!(fill.left + fill.width <= boxed.left + boxed.width);
        assert!(fill.top >= boxed.top);
        assert!(fill.top + fill.height <= boxed.top + boxed.height);
        // Out-of-range reports are clamped
        assert_eq!(indicator.fill_rect(2.0).width, 300);
        assert_eq!(indicator.fill_rect(-1.0).width, 0);
    }

    #[test]
    fn completion_removes_the_indicator() {
        let mut scene = entered_scene();
        scene.on_load_progress(0.5);
        assert!(scene.is_loading());
        scene.on_load_complete(&Rc::new(Assets::default()));
        assert!(!scene.is_loading());
        // Late reports have nothing left to update
        scene.on_load_progress(0.7);
        assert!(!scene.is_loading());
    }

    #[test]
    fn start_control_is_inactive_while_loading() {
        let mut scene = entered_scene();
        press_start(&mut scene);
        assert_eq!(scene.take_transition(), None);
    }

    #[test]
    fn start_control_requests_the_main_scene() {
        let mut scene = entered_scene();
        scene.on_load_complete(&Rc::new(Assets::default()));
        press_start(&mut scene);
        assert_eq!(scene.take_transition(), Some(MAIN_SCENE));
        // The request is consumed
        assert_eq!(scene.take_transition(), None);
    }

    #[test]
    fn press_outside_the_control_does_nothing() {
        let mut scene = entered_scene();
        scene.on_load_complete(&Rc::new(Assets::default()));
        scene.on_input(PointerEvent::Down(Point2 { x: 10, y: 10 }));
        scene.on_input(PointerEvent::Up(Point2 { x: 640, y: 450 }));
        assert_eq!(scene.take_transition(), None);
    }

    #[test]
    fn reentry_recreates_the_controls() {
        let mut scene = entered_scene();
        scene.on_load_complete(&Rc::new(Assets::default()));
        press_start(&mut scene);
        scene.on_enter();
        // The press from the previous activation is gone...
        assert_eq!(scene.take_transition(), None);
        // ...and the fresh control works
        press_start(&mut scene);
        assert_eq!(scene.take_transition(), Some(MAIN_SCENE));
    }

    #[test]
    fn version_label_comes_from_the_build() {
        assert_eq!(VERSION_LABEL, concat!("v", env!("CARGO_PKG_VERSION")));
        assert!(VERSION_LABEL.starts_with('v'));
    }
}
