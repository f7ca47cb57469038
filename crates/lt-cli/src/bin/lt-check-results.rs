use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use lt_cli::check_results;

#[derive(Parser, Debug)]
#[command(
    name = "lt-check-results",
    about = "Report result artifacts with duplicated sensors or no photon metadata"
)]
struct Cli {
    /// Directory holding the result artifacts.
    dir: PathBuf,
    /// Delete the artifacts lacking photon metadata.
    #[arg(long)]
    remove: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let report = check_results(&cli.dir, cli.remove)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_clean() {
        return Err(format!("problems found among {} result files", report.scanned).into());
    }
    Ok(())
}
