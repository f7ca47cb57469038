//! File locations derived from detectors and point keys.
//!
//! Everything here is a pure function of its inputs except
//! [`WorkingDirs::ensure`].

use std::fs;
use std::path::{Path, PathBuf};

use lt_core::{LtError, PointKey, SignalKind, TableKind};
use serde::{Deserialize, Serialize};

/// Extension of simulation result artifacts.
pub const RESULT_EXTENSION: &str = "next.sqlite";

/// Per-detector working directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDirs {
    pub config: PathBuf,
    pub log: PathBuf,
    pub dst: PathBuf,
    pub table: PathBuf,
}

/// Files belonging to one simulated point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointFiles {
    pub init: PathBuf,
    pub config: PathBuf,
    pub log: PathBuf,
    pub result: PathBuf,
}

impl WorkingDirs {
    /// Layout rooted at `<base>/<detector>/`.
    pub fn under(base: &Path, detector: &str) -> Self {
        let root = base.join(detector);
        Self {
            config: root.join("config"),
            log: root.join("log"),
            dst: root.join("dst"),
            table: root.join("table"),
        }
    }

    /// Creates every directory of the layout.
    pub fn ensure(&self) -> Result<(), LtError> {
        for dir in [&self.config, &self.log, &self.dst, &self.table] {
            fs::create_dir_all(dir).map_err(|err| LtError::io("create-dir", dir, err))?;
        }
        Ok(())
    }

    pub fn point_files(&self, detector: &str, key: &PointKey) -> PointFiles {
        let stem = format!("{detector}.{key}");
        PointFiles {
            init: self.config.join(format!("{stem}.init")),
            config: self.config.join(format!("{stem}.config")),
            log: self.log.join(format!("{stem}.log")),
            result: self.dst.join(format!("{stem}.{RESULT_EXTENSION}")),
        }
    }

    pub fn table_path(
        &self,
        detector: &str,
        table: TableKind,
        signal: SignalKind,
        sensor: &str,
    ) -> PathBuf {
        self.table.join(table_file_name(detector, table, signal, sensor))
    }
}

/// `<detector>.<table>.<signal>.<sensor>.LightTable.sqlite`
pub fn table_file_name(detector: &str, table: TableKind, signal: SignalKind, sensor: &str) -> String {
    format!("{detector}.{table}.{signal}.{sensor}.LightTable.sqlite")
}

#[cfg(test)]
mod tests {
    use lt_core::SamplePoint;

    use super::*;

    #[test]
    fn point_files_follow_the_key() {
        let dirs = WorkingDirs::under(Path::new("/data"), "NEXT100");
        let key = SamplePoint::new(10.0, -20.0, -5.0).key();
        let files = dirs.point_files("NEXT100", &key);
        assert_eq!(
            files.result,
            PathBuf::from("/data/NEXT100/dst/NEXT100.x_10.y_-20.z_-5.next.sqlite")
        );
        assert_eq!(
            files.init,
            PathBuf::from("/data/NEXT100/config/NEXT100.x_10.y_-20.z_-5.init")
        );
        assert_eq!(files.log.parent(), Some(Path::new("/data/NEXT100/log")));
    }

    #[test]
    fn table_names_are_stable() {
        let name = table_file_name("NEXT_NEW", TableKind::Energy, SignalKind::S1, "PmtR11410");
        assert_eq!(name, "NEXT_NEW.energy.S1.PmtR11410.LightTable.sqlite");
    }
}
