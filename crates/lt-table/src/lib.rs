//! Aggregation of simulation results into light tables and their SQLite
//! store.

pub mod aggregate;
pub mod builder;
pub mod config_table;
pub mod pipeline;
pub mod store;
mod table;

pub use aggregate::{aggregate, Aggregation, MissingReason, PointResult, SensorSchema};
pub use builder::{
    BuildOutcome, BuildReport, MissingPoint, TableBuilder, TableRequest, TOTAL_COLUMN,
    TRACKING_INDEX,
};
pub use config_table::{ConfigSource, ConfigTable};
pub use pipeline::{generate_table, GeneratedTable};
pub use store::{append_config, load_config, load_light_table, write_light_table, STORE_VERSION};
pub use table::{LightTable, TableRow};
