//! Core-Domänentypen: Segmente, Verbindungspunkte, Graph, Spatial-Index.

pub mod adjacency;
pub mod attributes;
pub mod connection;
pub mod connection_point;
pub mod error;
pub mod events;
pub mod geometry;
pub mod ids;
pub mod point_view;
/// Der Graph selbst
///
/// - Einfügen mit Fusionsabstand und Rücknahme
/// - Entfernen, Verschmelzen, Umhängen von Segment-Enden
/// - Räumliche und topologische Abfragen
pub mod road_graph;
pub mod road_path;
pub mod segment;
pub mod spatial;

pub use adjacency::{
    AdjacencyBounds, AdjacencyCursor, AdjacencyIter, BoundType, Rotation, SegmentBound,
};
pub use attributes::{AttributeValue, Attributes, RoadType, TrafficDirection};
pub use connection::{Connection, SegmentEnd};
pub use connection_point::ConnectionPoint;
pub use error::{GraphError, Result};
pub use events::{GraphEvent, ListenerId, SegmentEvent};
pub use geometry::Rect;
pub use ids::{GraphId, PointId, SegmentId};
pub use point_view::{PointHandle, PointRef};
pub use road_graph::Graph;
pub use road_path::RoadPath;
pub use segment::{LaneDirection, Segment};
pub use spatial::{FusionNeighbors, SpatialIndex, SpatialMatch};
