pub mod config;
pub mod engine;
pub mod geometry;

pub use config::{CacheConfig, EngineConfig, LabelConfig, RoutingConfig, load_config, parse_config};
pub use engine::{
    EdgeRef, FrameInput, FrameOutput, LabelCache, LabelPlacement, NodeRect, PortAssignment,
    RoutePath, RoutingMode, place_label, reset_label_cache, route_frame,
};
pub use geometry::{Point, Rect};
