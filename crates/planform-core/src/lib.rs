//! Planform Core - Floor plan result contract and geometry
//!
//! This crate provides the foundational, graphics-free pieces of Planform:
//! - The floor plan result contract returned by the inference service
//! - The geometry builder that turns detections into positioned solids
//! - The no-doors advisory derived from a result
//! - Upload and inference boundary contracts shared by both front-ends
//! - TOML configuration

pub mod advisory;
pub mod config;
pub mod geometry;
pub mod inference;
pub mod result;
pub mod upload;

pub use advisory::{advisory_for, Advisory};
pub use config::{load_config, Config, ConfigError, InferenceConfig, ViewerConfig};
pub use geometry::{build_solids, Appearance, GeometryConfig, Rgb, Solid};
pub use inference::{decode_response, InferenceEndpoint, InferenceError};
pub use result::{ClassLabel, DetectionBox, FloorPlanResult, RegionClass, RegionCounts, ResultError};
pub use upload::{UploadFile, UploadFilter, UploadSelection};
