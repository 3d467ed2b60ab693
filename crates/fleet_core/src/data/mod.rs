//! Data structures for level configuration.
//!
//! This module contains pure data structures that define unit templates and
//! levels. All structs are designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `fleet_headless`.

mod level_data;
mod unit_data;

pub use level_data::{AiAssignment, LevelData, TerrainPlacement, TerrainSetup, UnitSpawn};
pub use unit_data::UnitTemplate;
