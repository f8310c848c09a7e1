#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod config;
mod error;
mod io;
mod model;
mod ui;

/// Presence timeline viewer.
#[derive(Debug, Parser)]
#[command(name = "presence-gantt", version, about)]
struct Cli {
    /// Base URL of the presence server (the log is read from <URL>/db)
    #[arg(short, long, value_name = "URL")]
    server: Option<String>,

    /// Read this database file instead of querying a server
    #[arg(short, long, value_name = "DB_FILE")]
    db: Option<PathBuf>,

    /// Auto-refresh period in seconds
    #[arg(short, long, value_name = "SECS")]
    refresh: Option<u64>,

    /// Seconds subtracted from every interval before display
    #[arg(
        long,
        value_name = "SECS",
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(i64)
            .range(-model::label::MAX_TIME_SHIFT_SECS..=model::label::MAX_TIME_SHIFT_SECS)
    )]
    time_shift: Option<i64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, settings: &mut config::Settings) {
        if let Some(server) = self.server {
            settings.server = server;
            settings.db_path = None;
        }
        if let Some(db) = self.db {
            settings.db_path = Some(db);
        }
        if let Some(refresh) = self.refresh {
            settings.refresh_secs = refresh;
        }
        if let Some(shift) = self.time_shift {
            settings.time_shift_secs = shift;
        }
    }
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut settings = config::Settings::load().unwrap_or_else(|e| {
        tracing::warn!("using default settings: {}", e);
        config::Settings::default()
    });
    cli.apply(&mut settings);
    tracing::info!(
        source = %io::DataSource::from_settings(&settings).describe(),
        refresh_secs = settings.refresh_secs,
        "starting viewer"
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Presence Gantt"),
        ..Default::default()
    };

    eframe::run_native(
        "Presence Gantt",
        options,
        Box::new(|cc| Ok(Box::new(app::PresenceApp::new(cc, settings)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_settings() {
        let cli = Cli::parse_from([
            "presence-gantt",
            "--db",
            "/var/lib/presence/database.json",
            "--refresh",
            "30",
            "--time-shift",
            "-7200",
        ]);
        let mut settings = config::Settings::default();
        cli.apply(&mut settings);
        assert_eq!(
            settings.db_path,
            Some(PathBuf::from("/var/lib/presence/database.json"))
        );
        assert_eq!(settings.refresh_secs, 30);
        assert_eq!(settings.time_shift_secs, -7200);
    }

    #[test]
    fn rejects_out_of_range_time_shift() {
        let err = Cli::try_parse_from([
            "presence-gantt",
            "--time-shift",
            "10000000000000000",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(Cli::try_parse_from(["presence-gantt", "--time-shift", "-86400"]).is_ok());
    }

    #[test]
    fn server_flag_clears_configured_file() {
        let cli = Cli::parse_from(["presence-gantt", "-s", "http://10.0.0.2:5000"]);
        let mut settings = config::Settings {
            db_path: Some(PathBuf::from("old.json")),
            ..Default::default()
        };
        cli.apply(&mut settings);
        assert_eq!(settings.db_path, None);
        assert_eq!(settings.endpoint(), "http://10.0.0.2:5000/db");
    }
}
