#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod app;

use chatpane_client::{
    config::{ClientArgs, config_path, load_config_from_path, resolve_config, save_config_with_retry},
    logging::init_logging,
    ui_state::{DEFAULT_WINDOW_H, DEFAULT_WINDOW_W, MIN_WINDOW_H, MIN_WINDOW_W, load_ui_state},
};
use clap::Parser;
use eframe::egui;
use tracing::{error, info, warn};

use crate::app::{ChatApp, WINDOW_TITLE};

fn main() {
    init_logging();

    let args = match ClientArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            error!("arg parse failed: {}", err);
            err.exit();
        }
    };

    let saved = match load_config_from_path(&config_path()) {
        Ok(saved) => saved,
        Err(err) => {
            warn!("ignoring saved config: {}", err);
            None
        }
    };

    let cfg = match resolve_config(&args, saved) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("config resolution failed: {}", err);
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if !args.no_save {
        if let Err(err) = save_config_with_retry(&config_path(), &cfg.to_saved()) {
            warn!("failed to save config: {}", err);
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to start tokio runtime: {}", err);
            std::process::exit(1);
        }
    };

    let placement = load_ui_state().window;
    let mut viewport = egui::ViewportBuilder::default()
        .with_title(WINDOW_TITLE)
        .with_min_inner_size([MIN_WINDOW_W, MIN_WINDOW_H]);
    viewport = match placement {
        Some(p) if p.w.is_finite() && p.h.is_finite() => viewport
            .with_inner_size([p.w.max(MIN_WINDOW_W), p.h.max(MIN_WINDOW_H)])
            .with_position([p.x, p.y]),
        _ => viewport.with_inner_size([DEFAULT_WINDOW_W, DEFAULT_WINDOW_H]),
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    info!(server_url = %cfg.server_url, "starting chat window");
    let persist = !args.no_save;
    if let Err(err) = eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, cfg, runtime, placement, persist)))),
    ) {
        error!("chat window failed: {}", err);
        std::process::exit(1);
    }
}
