use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use mopdesc::{driver, Config, Tools};

#[derive(Parser)]
struct Cli {
    /// Path to the input CSV file: a SMILES column followed by one
    /// target-value column.
    input_file: PathBuf,

    /// Path to the output directory. If it already exists, optimization
    /// is skipped and aggregation runs over its current contents.
    output_directory: PathBuf,

    /// Name of the aggregated CSV, written next to the output directory.
    #[arg(long, default_value = "output_descr.csv")]
    output_file_name: String,

    /// TOML file with tool locations and MOPAC keywords.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    info!(
        "input {:?}, output root {:?}, output file {}",
        cli.input_file, cli.output_directory, cli.output_file_name
    );

    let tools = Tools::new(config);
    driver::run(
        &tools,
        &cli.input_file,
        &cli.output_directory,
        &cli.output_file_name,
    )?;

    Ok(())
}
