use fxhash::FxHashMap;
use libremarkable::image;
use tokio::runtime;
use tokio::sync::mpsc::{channel, error::TryRecvError, Receiver};

pub const LOGO: &str = "logo";
pub const SHIP: &str = "ship";
pub const BULLET: &str = "bullet";
pub const ENEMY: &str = "enemy";

// Placeholder art, baked in until the real sprite set exists.
const MANIFEST: &[(&str, &[u8])] = &[
    (LOGO, include_bytes!("../res/logo.png")),
    (SHIP, include_bytes!("../res/ship.png")),
    (BULLET, include_bytes!("../res/bullet.png")),
    (ENEMY, include_bytes!("../res/enemy.png")),
];

/// Everything the loader decoded, keyed by asset name.
#[derive(Default)]
pub struct Assets {
    images: FxHashMap<&'static str, image::DynamicImage>,
}

impl Assets {
    pub fn image(&self, name: &str) -> Option<&image::DynamicImage> {
        self.images.get(name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }
}

pub enum LoadEvent {
    /// Fraction of the manifest decoded so far, in [0, 1]
    Progress(f32),
    Complete(Assets),
}

/// Decodes the embedded manifest on a background worker and reports
/// progress over a channel the frame loop polls.
pub struct AssetLoader {
    _runtime: runtime::Runtime,
    receiver: Receiver<LoadEvent>,
}

impl AssetLoader {
    pub fn spawn() -> Self {
        let runtime = runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("asset_loader")
            .build()
            .expect("Failed to create tokio runtime");

        let (event_tx, event_rx) = channel::<LoadEvent>(MANIFEST.len() + 1);
        runtime.spawn(async move {
            let mut images = FxHashMap::default();
            for (i, (name, bytes)) in MANIFEST.iter().enumerate() {
                let img = match image::load_from_memory(bytes) {
                    Ok(img) => img,
                    Err(err) => {
                        error!("Failed to decode embedded asset \"{}\": {}", name, err);
                        return;
                    }
                };
                images.insert(*name, img);
                let progress = (i + 1) as f32 / MANIFEST.len() as f32;
                if event_tx.send(LoadEvent::Progress(progress)).await.is_err() {
                    return;
                }
            }
            event_tx.send(LoadEvent::Complete(Assets { images })).await.ok();
        });

        Self {
            _runtime: runtime,
            receiver: event_rx,
        }
    }

    pub fn try_recv(&mut self) -> Result<LoadEvent, TryRecvError> {
        self.receiver.try_recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_reports_fractional_progress_then_completes() {
        let mut loader = AssetLoader::spawn();
        let mut progress = Vec::new();
        let assets = loop {
            match loader.receiver.blocking_recv() {
                Some(LoadEvent::Progress(value)) => progress.push(value),
                Some(LoadEvent::Complete(assets)) => break assets,
                None => panic!("Loader stopped without completing"),
            }
        };

        assert_eq!(progress.len(), MANIFEST.len());
        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(progress.iter().all(|value| (0.0..=1.0).contains(value)));
        assert_eq!(*progress.last().unwrap(), 1.0);

        assert_eq!(assets.len(), MANIFEST.len());
        for &name in &[LOGO, SHIP, BULLET, ENEMY] {
            assert!(assets.image(name).is_some(), "missing asset \"{}\"", name);
        }
    }
}
