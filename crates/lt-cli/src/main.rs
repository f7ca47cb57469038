use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use lt_cli::generate;
use lt_core::RunConfig;

#[derive(Parser, Debug)]
#[command(name = "lighttable", about = "Light table production driver")]
struct Cli {
    /// JSON run configuration.
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = RunConfig::load(&cli.config)?;
    let summary = generate(&config)?;
    info!("done");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
