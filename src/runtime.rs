use crate::assets::{AssetLoader, Assets, LoadEvent};
use crate::canvas::Canvas;
use crate::config::{Config, Viewport};
use crate::scene::{PointerEvent, Scene};
use libremarkable::framebuffer::cgmath::Point2;
use libremarkable::input::{MultitouchEvent, InputEvent};
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::thread::sleep;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unknown scene \"{0}\"")]
    Unknown(String),
    #[error("scene \"{0}\" is already registered")]
    Duplicate(&'static str),
    #[error("no scenes registered")]
    Empty,
}

/// Name-keyed scene table. Exactly one scene is active at a time; a
/// transition is an unconditional jump to a registered name.
pub struct Director {
    scenes: Vec<(&'static str, Box<dyn Scene>)>,
    active: usize,
}

impl Director {
    pub fn new() -> Self {
        Self {
            scenes: Vec::new(),
            active: 0,
        }
    }

    pub fn register(
        &mut self,
        name: &'static str,
        scene: Box<dyn Scene>,
    ) -> Result<(), SceneError> {
        if self.scenes.iter().any(|(existing, _)| *existing == name) {
            return Err(SceneError::Duplicate(name));
        }
        self.scenes.push((name, scene));
        Ok(())
    }

    /// Enters the first registered scene.
    pub fn start(&mut self) -> Result<(), SceneError> {
        if self.scenes.is_empty() {
            return Err(SceneError::Empty);
        }
        self.active = 0;
        debug!("Entering scene \"{}\"", self.scenes[0].0);
        self.scenes[0].1.on_enter();
        Ok(())
    }

    pub fn active_name(&self) -> Option<&'static str> {
        self.scenes.get(self.active).map(|(name, _)| *name)
    }

    pub fn activate(&mut self, name: &str) -> Result<(), SceneError> {
        let index = self
            .scenes
            .iter()
            .position(|(existing, _)| *existing == name)
            .ok_or_else(|| SceneError::Unknown(name.to_owned()))?;
        self.active = index;
        debug!("Entering scene \"{}\"", name);
        self.scenes[index].1.on_enter();
        Ok(())
    }

    fn active_scene(&mut self) -> Option<&mut Box<dyn Scene>> {
        self.scenes.get_mut(self.active).map(|(_, scene)| scene)
    }

    pub fn dispatch_input(&mut self, event: PointerEvent) {
        if let Some(scene) = self.active_scene() {
            scene.on_input(event);
        }
    }

    pub fn dispatch_load_progress(&mut self, progress: f32) {
        if let Some(scene) = self.active_scene() {
            scene.on_load_progress(progress);
        }
    }

    /// Completion is broadcast: every scene keeps its own handle on the
    /// decoded assets.
    pub fn dispatch_load_complete(&mut self, assets: &Rc<Assets>) {
        for (_, scene) in &mut self.scenes {
            scene.on_load_complete(assets);
        }
    }

    pub fn tick(&mut self) {
        if let Some(scene) = self.active_scene() {
            scene.on_tick();
        }
    }

    pub fn draw(&mut self, canvas: &mut Canvas) {
        if let Some(scene) = self.active_scene() {
            scene.draw(canvas);
        }
    }

    /// Applies the transition the active scene requested, if any.
    pub fn settle(&mut self) -> Result<bool, SceneError> {
        let target = match self.active_scene().and_then(|scene| scene.take_transition()) {
            Some(target) => target,
            None => return Ok(false),
        };
        self.activate(target)?;
        Ok(true)
    }
}

/// Couples the director to the display, the input stream and the asset
/// loader, and owns the frame loop.
pub struct Runtime {
    director: Director,
    canvas: Canvas,
    viewport: Viewport,
    input_rx: Receiver<InputEvent>,
    loader: Option<AssetLoader>,
    load_complete: bool,
    frame_duration: Duration,
}

impl Runtime {
    pub fn new(
        config: &Config,
        canvas: Canvas,
        viewport: Viewport,
        input_rx: Receiver<InputEvent>,
        loader: AssetLoader,
    ) -> Self {
        Self {
            director: Director::new(),
            canvas,
            viewport,
            input_rx,
            loader: Some(loader),
            load_complete: false,
            frame_duration: Duration::from_millis(1000 / config.fps.max(1) as u64),
        }
    }

    pub fn register(
        &mut self,
        name: &'static str,
        scene: Box<dyn Scene>,
    ) -> Result<(), SceneError> {
        self.director.register(name, scene)
    }

    pub fn run(&mut self) -> Result<(), SceneError> {
        self.director.start()?;
        if let Some(name) = self.director.active_name() {
            info!("Started on scene \"{}\"", name);
        }

        loop {
            let before_input = SystemTime::now();
            self.pump_input();
            self.pump_loader();
            self.director.tick();
            self.director.draw(&mut self.canvas);
            self.director.settle()?;

            // Wait remaining frame time
            if let Ok(elapsed) = before_input.elapsed() {
                if elapsed < self.frame_duration {
                    sleep(self.frame_duration - elapsed);
                }
            }
        }
    }

    fn pump_input(&mut self) {
        for event in self.input_rx.try_iter() {
            if let InputEvent::MultitouchEvent { event } = event {
                match event {
                    MultitouchEvent::Press { finger, .. } => {
                        let pos = self.viewport.to_logical_point(Point2 {
                            x: finger.pos.x as i32,
                            y: finger.pos.y as i32,
                        });
                        self.director.dispatch_input(PointerEvent::Down(pos));
                    }
                    MultitouchEvent::Release { finger, .. } => {
                        let pos = self.viewport.to_logical_point(Point2 {
                            x: finger.pos.x as i32,
                            y: finger.pos.y as i32,
                        });
                        self.director.dispatch_input(PointerEvent::Up(pos));
                    }
                    _ => {}
                }
            }
        }
    }

    fn pump_loader(&mut self) {
        loop {
            let event = match &mut self.loader {
                Some(loader) => loader.try_recv(),
                None => return,
            };
            match event {
                Ok(LoadEvent::Progress(value)) => self.director.dispatch_load_progress(value),
                Ok(LoadEvent::Complete(assets)) => {
                    info!("Asset loading complete ({} images)", assets.len());
                    self.load_complete = true;
                    let assets = Rc::new(assets);
                    self.director.dispatch_load_complete(&assets);
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    if !self.load_complete {
                        error!("Asset loader stopped before reporting completion");
                    }
                    self.loader = None;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MainScene, StartScene, MAIN_SCENE, START_SCENE};

    fn press(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Down(Point2 { x, y })
    }

    /// Both scenes registered, start scene entered, assets loaded.
    fn scaffold() -> Director {
        let config = Config::default();
        let mut director = Director::new();
        director
            .register(START_SCENE, Box::new(StartScene::new(&config)))
            .unwrap();
        director
            .register(MAIN_SCENE, Box::new(MainScene::new(&config)))
            .unwrap();
        director.start().unwrap();
        director.dispatch_load_complete(&Rc::new(Assets::default()));
        director
    }

    #[test]
    fn fresh_scaffold_starts_on_the_start_scene() {
        let director = scaffold();
        assert_eq!(director.active_name(), Some(START_SCENE));
    }

    #[test]
    fn start_and_back_alternate_between_the_two_scenes() {
        let mut director = scaffold();
        for _ in 0..5 {
            director.dispatch_input(press(640, 450));
            assert!(director.settle().unwrap());
            assert_eq!(director.active_name(), Some(MAIN_SCENE));

            director.dispatch_input(press(40, 40));
            assert!(director.settle().unwrap());
            assert_eq!(director.active_name(), Some(START_SCENE));
        }
    }

    #[test]
    fn inactive_scene_never_sees_input() {
        let mut director = scaffold();
        // BACK's position does nothing while the start scene is active
        director.dispatch_input(press(40, 40));
        assert!(!director.settle().unwrap());
        assert_eq!(director.active_name(), Some(START_SCENE));
    }

    #[test]
    fn press_outside_any_control_is_ignored() {
        let mut director = scaffold();
        director.dispatch_input(press(5, 700));
        assert!(!director.settle().unwrap());
        assert_eq!(director.active_name(), Some(START_SCENE));
    }

    #[test]
    fn reentered_scene_has_fresh_controls() {
        let mut director = scaffold();
        director.dispatch_input(press(640, 450));
        director.settle().unwrap();
        director.dispatch_input(press(40, 40));
        director.settle().unwrap();
        // Back on start: the old press is not replayed...
        assert!(!director.settle().unwrap());
        // ...and the recreated control works
        director.dispatch_input(press(640, 450));
        assert!(director.settle().unwrap());
        assert_eq!(director.active_name(), Some(MAIN_SCENE));
    }

    #[test]
    fn unknown_transition_target_fails_fast() {
        let mut director = scaffold();
        let err = director.activate("bonus").unwrap_err();
        assert!(matches!(err, SceneError::Unknown(ref name) if name == "bonus"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let config = Config::default();
        let mut director = Director::new();
        director
            .register(START_SCENE, Box::new(StartScene::new(&config)))
            .unwrap();
        let err = director
            .register(START_SCENE, Box::new(StartScene::new(&config)))
            .unwrap_err();
        assert!(matches!(err, SceneError::Duplicate(name) if name == START_SCENE));
    }

    #[test]
    fn starting_with_no_scenes_fails() {
        let mut director = Director::new();
        assert!(matches!(director.start(), Err(SceneError::Empty)));
    }
}
