//! Per-point simulator macros.
//!
//! Only the point-specific part is produced here. The geometry block and
//! the init macro body are supplied by the caller as templates.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use lt_core::{ErrorInfo, LtError, SamplePoint};

use crate::paths::PointFiles;

/// Settings shared by every point of a production.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroSettings<'a> {
    pub detector: &'a str,
    /// Init macro body. `{det_name}`, `{init_fname}` and `{config_fname}`
    /// are substituted; an empty template executes the config macro only.
    pub init_template: &'a str,
    pub geometry_preamble: &'a str,
    pub photons_per_event: u64,
    pub seed: u64,
}

/// Writes the init and config macros of one point.
pub fn write_point_macros(
    files: &PointFiles,
    point: &SamplePoint,
    settings: &MacroSettings<'_>,
) -> Result<(), LtError> {
    let tag = geometry_tag(settings.detector)?;
    write_file(&files.init, &init_macro(files, settings))?;
    write_file(&files.config, &config_macro(files, point, tag, settings))
}

/// Simulator geometry namespace of `detector`, as used in vertex commands.
pub fn geometry_tag(detector: &str) -> Result<&'static str, LtError> {
    match detector {
        "NEXT_NEW" => Ok("NextNew"),
        "NEXT100" => Ok("Next100"),
        "TEST" => Ok("NextFlex"),
        name if name.contains("DEMOpp") => Ok("NextDemo"),
        name if name.contains("FLEX") => Ok("NextFlex"),
        name => Err(LtError::Config(
            ErrorInfo::new("unknown-geometry", "detector has no simulator geometry")
                .with_context("detector", name),
        )),
    }
}

/// Detector name the simulator's init macros know `detector` by.
pub fn init_detector_name(detector: &str) -> String {
    match detector {
        "NEXT100" => "NEXT100_OPT".to_string(),
        "TEST" => "NEXT_FLEX".to_string(),
        name if name.contains("DEMOpp") => "NEXT_DEMO".to_string(),
        name if name.contains("FLEX") => "NEXT_FLEX".to_string(),
        name => name.to_string(),
    }
}

fn init_macro(files: &PointFiles, settings: &MacroSettings<'_>) -> String {
    let config = files.config.display().to_string();
    if settings.init_template.trim().is_empty() {
        return format!("/control/execute {config}\n");
    }
    settings
        .init_template
        .replace("{det_name}", &init_detector_name(settings.detector))
        .replace("{init_fname}", &files.init.display().to_string())
        .replace("{config_fname}", &config)
}

fn config_macro(
    files: &PointFiles,
    point: &SamplePoint,
    tag: &str,
    settings: &MacroSettings<'_>,
) -> String {
    let mut out = String::new();
    if !settings.geometry_preamble.is_empty() {
        out.push_str(settings.geometry_preamble.trim_end());
        out.push('\n');
    }
    let _ = writeln!(out, "### GENERATOR");
    let _ = writeln!(out, "/Generator/ScintGenerator/region      AD_HOC");
    let _ = writeln!(out, "/Geometry/{tag}/specific_vertex_X  {} mm", point.x);
    let _ = writeln!(out, "/Geometry/{tag}/specific_vertex_Y  {} mm", point.y);
    let _ = writeln!(out, "/Geometry/{tag}/specific_vertex_Z  {} mm", point.z);
    let _ = writeln!(
        out,
        "/Generator/ScintGenerator/nphotons    {}",
        settings.photons_per_event
    );
    out.push_str(PHYSICS);
    out.push_str(VERBOSITIES);
    let _ = writeln!(out, "### CONTROL");
    let _ = writeln!(out, "/nexus/random_seed            {}", settings.seed);
    let _ = writeln!(out, "/nexus/persistency/start_id   0");
    let _ = writeln!(out, "/nexus/persistency/outputFile {}", files.result.display());
    out
}

const PHYSICS: &str = "### PHYSICS
/process/optical/scintillation/setTrackSecondariesFirst true
/process/optical/processActivation Cerenkov             false
/PhysicsList/Nexus/clustering           true
/PhysicsList/Nexus/drift                true
/PhysicsList/Nexus/electroluminescence  true
/PhysicsList/Nexus/photoelectric        false
";

const VERBOSITIES: &str = "### VERBOSITIES
/control/verbose   0
/run/verbose       0
/event/verbose     0
/tracking/verbose  0
";

fn write_file(path: &Path, contents: &str) -> Result<(), LtError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| LtError::io("create-dir", parent, err))?;
    }
    fs::write(path, contents).map_err(|err| LtError::io("macro-write", path, err))
}
