//! Tool registry: typed tool definitions, the OPERA Cloud endpoint catalogue,
//! argument validation and per-tool health tracking.

pub mod args;
pub mod catalog;
pub mod health;
pub mod opera;
pub mod registry;

pub use args::PreparedArgs;
pub use catalog::{
    HttpMethod, ParamDef, ParamLocation, ParamType, ResponseShape, ToolDefinition, ToolSpec,
    HOTEL_ID_PARAM,
};
pub use health::{HealthConfig, HealthStatus, SystemHealthReport, ToolHealthReport, ToolHealthTracker};
pub use registry::ToolRegistry;
