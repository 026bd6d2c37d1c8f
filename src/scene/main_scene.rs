use super::{PointerEvent, Scene, START_SCENE};
use crate::assets::{self, Assets};
use crate::canvas::*;
use crate::config::Config;
use std::rc::Rc;

const LABEL_FONT_SIZE: f32 = 32.0;
const BACK_FONT_SIZE: f32 = 20.0;

const BACK_BUTTON_RECT: mxcfb_rect = mxcfb_rect {
    top: 20,
    left: 20,
    width: 140,
    height: 60,
};

pub struct MainScene {
    canvas_size: Vector2<u32>,
    drawn: bool,
    assets: Option<Rc<Assets>>,
    back_button_hitbox: Option<mxcfb_rect>,
    pending_transition: Option<&'static str>,
}

impl MainScene {
    pub fn new(config: &Config) -> Self {
        Self {
            canvas_size: config.canvas_size(),
            drawn: false,
            assets: None,
            back_button_hitbox: None,
            pending_transition: None,
        }
    }
}

impl Scene for MainScene {
    fn on_enter(&mut self) {
        self.drawn = false;
        self.pending_transition = None;
        self.back_button_hitbox = Some(BACK_BUTTON_RECT);
    }

    fn on_load_complete(&mut self, assets: &Rc<Assets>) {
        self.assets = Some(Rc::clone(assets));
    }

    fn on_input(&mut self, event: PointerEvent) {
        if let PointerEvent::Down(pos) = event {
            if self.back_button_hitbox.is_some()
                && Canvas::is_hitting(pos, self.back_button_hitbox.unwrap())
            {
                self.pending_transition = Some(START_SCENE);
            }
        }
    }

    fn on_tick(&mut self) {
        // Per-frame game logic will live here.
    }

    fn draw(&mut self, canvas: &mut Canvas) {
        if self.drawn {
            return;
        }
        self.drawn = true;

        canvas.clear();
        canvas.draw_text(
            Point2 {
                x: None,
                y: Some(self.canvas_size.y as i32 / 2),
            },
            "MAIN GAME SCENE",
            LABEL_FONT_SIZE,
        );
        canvas.draw_button(&self.back_button_hitbox.unwrap(), "BACK", BACK_FONT_SIZE);
        if let Some(store) = &self.assets {
            if let Some(ship) = store.image(assets::SHIP) {
                canvas.draw_image(
                    Point2 {
                        x: None,
                        y: Some(self.canvas_size.y as i32 / 2 + 90),
                    },
                    ship,
                );
            }
        }
        canvas.update_full();
    }

    fn take_transition(&mut self) -> Option<&'static str> {
        self.pending_transition.take()
    }
}
