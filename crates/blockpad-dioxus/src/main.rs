use anyhow::Context;
use blockpad_config::Config;
use dioxus::prelude::*;
use std::env;
use std::path::PathBuf;
use std::process;

mod ui;

use ui::App;

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("blockpad starting up");

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        usage(&args);
        process::exit(1);
    }

    let config = match resolve_config(args.get(1).map(PathBuf::from)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to resolve configuration: {e:#}");
            eprintln!("Error: {e:#}");
            usage(&args);
            process::exit(1);
        }
    };
    log::info!("using data directory {}", config.data_path.display());

    dioxus::LaunchBuilder::desktop()
        .with_cfg(make_window_config())
        .with_context(config)
        .launch(app_root);
}

/// Data directory from the command line, else the config file, else a
/// freshly written default config
fn resolve_config(data_dir_arg: Option<PathBuf>) -> anyhow::Result<Config> {
    let config_path = Config::config_path();
    log::info!("config path: {}", config_path.display());

    let loaded = Config::load()
        .with_context(|| format!("could not load {}", config_path.display()))?;

    let config = match (loaded, data_dir_arg) {
        (Some(mut config), Some(data_dir)) => {
            log::info!("data directory from command line overrides config file");
            config.data_path = data_dir;
            config
        }
        (Some(config), None) => config,
        (None, Some(data_dir)) => Config::new(data_dir),
        (None, None) => {
            let config = Config::new(Config::default_data_path());
            match config.save() {
                Ok(()) => log::info!("wrote default config to {}", config_path.display()),
                Err(e) => log::warn!("could not write default config: {e}"),
            }
            config
        }
    };

    std::fs::create_dir_all(&config.data_path).with_context(|| {
        format!(
            "could not create data directory {}",
            config.data_path.display()
        )
    })?;
    Ok(config)
}

fn usage(args: &[String]) {
    let program_name = args.first().map(String::as_str).unwrap_or("blockpad");
    eprintln!("Usage: {program_name} [data-directory]");
    eprintln!("Or set data_path in {}", Config::config_path().display());
}

fn app_root() -> Element {
    let config = use_context::<Config>();
    rsx! {
        App { config }
    }
}

fn make_window_config() -> dioxus::desktop::Config {
    use dioxus::desktop::{Config, WindowBuilder};

    let window = WindowBuilder::new()
        .with_title("blockpad")
        .with_always_on_top(false);

    Config::default().with_window(window)
}
