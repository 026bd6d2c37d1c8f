mod main_scene;
mod start_scene;

pub use main_scene::MainScene;
pub use start_scene::StartScene;

use crate::assets::Assets;
use crate::canvas::Canvas;
use libremarkable::framebuffer::cgmath::Point2;
use std::rc::Rc;

pub const START_SCENE: &str = "start";
pub const MAIN_SCENE: &str = "main";

/// Touch input, already translated into logical canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point2<i32>),
    Up(Point2<i32>),
}

/// One screen of the game. Registered once under a unique name; `on_enter`
/// runs again on every activation and has to rebuild all per-activation
/// state (hitboxes, pending requests).
pub trait Scene {
    fn on_enter(&mut self);
    fn on_load_progress(&mut self, _progress: f32) {}
    fn on_load_complete(&mut self, _assets: &Rc<Assets>) {}
    fn on_input(&mut self, _event: PointerEvent) {}
    fn on_tick(&mut self) {}
    fn draw(&mut self, canvas: &mut Canvas);

    /// Name of the scene to jump to, if a control requested one.
    fn take_transition(&mut self) -> Option<&'static str> {
        None
    }
}
