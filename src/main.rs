mod app;
mod cli;
mod logging;
mod render;
mod state;

use crate::app::App;
use crate::cli::Args;
use crate::state::app_settings::AppSettings;
use crate::state::identity::Identity;
use anyhow::Context;
use clap::Parser;
use log::{LevelFilter, debug};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    better_panic::install();

    let args = Args::parse();

    let settings = AppSettings::load(args.config.as_deref()).context("could not load settings")?;
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        settings.level_filter()?.unwrap_or(LevelFilter::Warn)
    };
    logging::init_logger(level);

    let identity = Identity::resolve(args.user.as_deref(), |key| std::env::var(key).ok());
    debug!("acting as {identity:?} on {}", settings.tournament_name);

    let target = args.target();
    let app = App::new(settings, identity);
    let output = app.execute(&target, args.command).await?;
    print!("{output}");
    Ok(())
}
