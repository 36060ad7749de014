//! Planares Straßennetz im Speicher.
//!
//! Segmente (Polylinien) treffen sich an Verbindungspunkten, deren Anschlüsse
//! nach Winkel sortiert sind. Darauf aufbauend: Umlauf-Cursor, Breiten- und
//! Tiefensuche sowie beschnittene Teilgraph-Sichten.

pub mod core;
pub mod shared;
pub mod subgraph;
pub mod traversal;

pub use core::{
    AdjacencyBounds, AdjacencyCursor, AdjacencyIter, AttributeValue, BoundType, Connection,
    ConnectionPoint, Graph, GraphError, GraphEvent, GraphId, LaneDirection, PointHandle, PointId,
    PointRef, Rect, Result, RoadPath, RoadType, Rotation, Segment, SegmentEnd, SegmentEvent,
    SegmentId, TrafficDirection,
};
pub use shared::{CoordinateSystem, GraphOptions, TrafficSide};
pub use subgraph::{SubGraph, SubGraphView, TerminalConnection, WrapConnection, WrapSegment};
pub use traversal::{
    BreadthFirstIterator, DepthFirstIterator, DepthUpdater, GraphIterationElement, VisitPolicy,
};
