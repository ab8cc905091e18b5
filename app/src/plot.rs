use std::path::Path;

use common::{
    config::{Config, Settings},
    plot::{OutputLayout, PlotTarget},
    record::summarize,
};
use eyre::{Context, Result};
use regex::Regex;
use rw_bar::plot_target;
use tracing::{debug, info, warn};

pub fn run_plot(target: &PlotTarget, settings: &Settings, layout: &OutputLayout) -> Result<()> {
    let path = plot_target(target, settings, layout)?;
    println!("{}", path.display());
    Ok(())
}

pub fn list_targets(csv: &Path, filter: Option<&str>, json: bool) -> Result<()> {
    let filter = filter
        .map(Regex::new)
        .transpose()
        .context("Parsing filesystem filter")?;
    let targets = summarize(csv, filter.as_ref())?;
    debug!("Found {} targets in {csv:?}", targets.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }
    for target in targets {
        println!("{} {} -> {} rows", target.filesystem, target.file, target.rows);
    }
    Ok(())
}

/// Plots every entry of `config_file` in order, stopping at the first failure
pub fn run_batch(config_file: &Path) -> Result<()> {
    let config = Config::from_file(config_file)?;
    if config.plots.is_empty() {
        warn!("No plots in {}", config.name);
        return Ok(());
    }

    info!("Plotting {} charts for {}", config.plots.len(), config.name);
    let layout = OutputLayout::Directory(config.settings.out_dir.clone());
    for target in &config.plots {
        let path = plot_target(target, &config.settings, &layout)
            .wrap_err_with(|| format!("Batch {}", config.name))?;
        println!("{}", path.display());
    }
    Ok(())
}
