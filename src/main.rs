use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};
use eframe::egui;

use anyplan::gui::frontend::AnyplanApp;
use anyplan::persistence::persist;
use anyplan::persistence::settings::AppSettings;
use anyplan::persistence::snapshot::{self, SnapshotFile};
use anyplan::store::error::AppError;

fn cli() -> Command {
    Command::new("anyplan")
        .about("AI-assisted mind-map canvas")
        .arg(
            Arg::new("open")
                .long("open")
                .value_name("SNAPSHOT")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Open an exported .json snapshot instead of the last autosave"),
        )
        .arg(
            Arg::new("no-autosave")
                .long("no-autosave")
                .action(ArgAction::SetTrue)
                .help("Do not write autosave files this session"),
        )
}

fn initial_state(settings: &AppSettings, open: Option<&PathBuf>) -> Option<SnapshotFile> {
    if let Some(path) = open {
        match snapshot::read_snapshot(path) {
            Ok((snap, warnings)) => {
                for w in warnings {
                    log::warn!("{}", w);
                }
                return Some(snap);
            }
            Err(e) => {
                let err = AppError::from(&e);
                log::error!("could not open {} ({} error): {}", path.display(), err.category.as_str(), err.message);
            }
        }
    }
    match persist::load_active(&settings.autosave_dir()) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("ignoring unreadable autosave: {:#}", e);
            None
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init();
    let matches = cli().get_matches();

    let settings = AppSettings::load().unwrap_or_else(|e| {
        log::warn!("settings unreadable, using defaults: {:#}", e);
        AppSettings::default()
    });
    let loaded_state = initial_state(&settings, matches.get_one::<PathBuf>("open"));
    let autosave = !matches.get_flag("no-autosave");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("anyplan-ai")
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 760.0])
            // Keep the level bar and chat panel usable on small screens
            .with_min_inner_size([760.0, 460.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Anyplan",
        options,
        Box::new(move |_cc| Ok(Box::new(AnyplanApp::new(runtime, settings, loaded_state, autosave)) as Box<dyn eframe::App>)),
    )
}
