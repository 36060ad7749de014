//! Geteilte Typen für modulübergreifende Verträge.
//!
//! Enthält die Konfiguration, die Kern, Traversierung und Teilgraph
//! gemeinsam lesen.

pub mod options;

pub use options::{AttributeNames, CoordinateSystem, GraphOptions, TrafficSide};
pub use options::{DEFAULT_FUSION_DISTANCE, DEFAULT_LANE_COUNT, DEFAULT_LANE_WIDTH};
