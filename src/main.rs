use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};

use crate::settings::Settings;

mod assets;
mod attendance;
mod certificate;
mod db;
mod error;
mod event;
mod feedback;
mod jobs;
mod participant;
mod report;
mod settings;
mod web;

#[derive(Parser, Debug)]
#[command(name = "EventDesk")]
#[command(version = "0.1")]
#[command(
    about = "Registration, attendance and certificate service for multi-day events.",
    long_about = None
)]
struct Args {
    /// Location of the settings file.
    #[arg(short, long, default_value = "settings.json")]
    settings_file: PathBuf,

    #[command(subcommand)]
    command: RunType,
}

#[derive(Subcommand, Debug)]
enum RunType {
    /// Write a default settings file to the settings path.
    Init,

    /// Run the HTTP service.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        RunType::Init => {
            Settings::default().save(&args.settings_file)?;
            println!(
                "Settings written to {}, edit them before serving.",
                args.settings_file.display()
            );
            Ok(())
        }
        RunType::Serve => {
            let settings = Settings::load(&args.settings_file)?;
            let db = Arc::new(db::EventDb::open(&settings.db_file).await?);
            let assets = assets::AssetStore::new(settings.asset_dir.clone());
            let jobs = jobs::start(db.clone(), assets.clone());

            log::info!(
                "eventdesk initialized, serving on port {}",
                settings.web_port.unwrap_or(28010)
            );
            web::run_http_server(db, assets, jobs, &settings).await
        }
    }
}
