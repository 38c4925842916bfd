use anyhow::{Context, Result};
use briar::gridfn::Centering;
use briar::prelude::GenerateConfig;

mod config;
mod z4c;

fn main() -> Result<()> {
    // Load configuration
    let config = config::configure()?;

    // Load header data and defaults
    let log_level = config.logging_level.unwrap_or(1);

    // Compute log filter level.
    let level = match log_level {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Build enviornment logger.
    env_logger::builder().filter_level(level).init();

    log::info!("Thorn name: {}", &config.thorn);
    log::info!("Arrangement: {}", &config.arrangement);
    log::info!("Finite differencing order: {}", config.fd_order);
    log::info!("Theta initial value: {:.5e}", config.theta);

    anyhow::ensure!(
        (2..=8).contains(&config.fd_order) && config.fd_order % 2 == 0,
        "fd_order must be an even order between 2 and 8"
    );

    let centering: Centering = config
        .centering
        .parse()
        .context("Failed to parse centering tag")?;

    // Assemble the thorn from the symbolic recipe.
    let thorn = z4c::build_thorn(&config, centering)?;

    // Resolve the generation target. A missing installation root is a
    // fatal precondition, reported before any output is written.
    let target = GenerateConfig::from_env()
        .context("Generation target must be configured in the environment")?;

    let dir = briar::generate::generate(&thorn, &target)?;

    log::info!("Emitted thorn description to {}", dir.display());

    Ok(())
}
