//! Hydrological analysis algorithms
//!
//! - Breach depressions: least-cost channel carving with fill fallback
//! - Flow direction: D8 single flow direction
//! - Elevation above stream: HAND along D8 flow paths
//! - Downslope distance to stream: D8 flow-path length

mod breach;
mod flow_direction;
mod hand;
mod stream_distance;
mod stream_trace;

pub use breach::{breach_depressions, BreachParams};
pub use flow_direction::flow_direction;
pub use hand::elevation_above_stream;
pub use stream_distance::downslope_distance_to_stream;
