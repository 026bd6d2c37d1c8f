#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod assets;
mod canvas;
mod config;
mod runtime;
mod scene;

use crate::assets::AssetLoader;
use crate::canvas::Canvas;
use crate::runtime::Runtime;
use crate::scene::{MainScene, StartScene, MAIN_SCENE, START_SCENE};
use anyhow::Context;
use clap::{crate_version, Parser};
use libremarkable::device::{Model, CURRENT_DEVICE};
use libremarkable::framebuffer::common::{DISPLAYHEIGHT, DISPLAYWIDTH};
use libremarkable::input::{ev::EvDevContext, InputDevice, InputEvent};
use std::env;

#[derive(Parser)]
#[clap(version = crate_version!())]
pub struct Opts {
    #[clap(
        long,
        short = 'c',
        help = "Path to the optional config file",
        default_value = "/home/root/.config/stgmarkable/config.yml"
    )]
    config_file: std::path::PathBuf,

    #[clap(long, short = 'f', help = "Override the configured frame rate")]
    fps: Option<u16>,
}

lazy_static! {
    pub static ref CLI_OPTS: Opts = Opts::parse();
}

fn main() -> anyhow::Result<()> {
    let show_log_info = if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "DEBUG");
        true
    } else {
        false
    };
    env_logger::init();
    if show_log_info {
        debug!(concat!(
            "Debug Mode is enabled by default.\n",
            "To change this, set the env \"RUST_LOG\" something else ",
            "(e.g. info, warn, error or comma separated list of \"[module=]<level>\")."
        ));
    }

    if CURRENT_DEVICE.model == Model::Gen2 && std::env::var_os("LD_PRELOAD").is_none() {
        warn!(concat!(
            "\n",
            "You executed stgmarkable on a reMarkable 2 without having LD_PRELOAD set.\n",
            "This suggests that you didn't use/enable rm2fb. Without rm2fb you\n",
            "won't see anything on the display!\n",
            "\n",
            "See https://github.com/ddvk/remarkable2-framebuffer/ on how to solve\n",
            "this. Launchers (installed through toltec) should automatically do this."
        ));
    }

    let mut config = config::read(&CLI_OPTS.config_file)
        .with_context(|| format!("Failed to read config file {:?}", CLI_OPTS.config_file))?;
    if let Some(fps) = CLI_OPTS.fps {
        config.fps = fps;
    }
    if config.physics {
        warn!("The config enables physics, but no physics backend is compiled in. Ignored.");
    }
    debug!(
        "Logical canvas {}x{}, scale mode {:?}, {} fps",
        config.width, config.height, config.scale_mode, config.fps
    );

    let viewport = config.viewport(DISPLAYWIDTH as u32, DISPLAYHEIGHT as u32);
    let canvas = Canvas::new(&config, viewport);

    let (input_tx, input_rx) = std::sync::mpsc::channel::<InputEvent>();
    EvDevContext::new(InputDevice::Multitouch, input_tx).start();

    let loader = AssetLoader::spawn();

    let mut runtime = Runtime::new(&config, canvas, viewport, input_rx, loader);
    runtime.register(START_SCENE, Box::new(StartScene::new(&config)))?;
    runtime.register(MAIN_SCENE, Box::new(MainScene::new(&config)))?;
    runtime.run().context("Scene runtime failed")
}
