//! Graph-weite Traversierung: Breitensuche nach Distanz und
//! distanzbegrenzte Tiefensuche.
//!
//! Beide Iteratoren borgen ihre [`Topology`] unveränderlich; Mutationen
//! während der Traversierung schließt damit der Compiler aus.

mod breadth_first;
mod comparator;
mod depth_first;

pub use breadth_first::BreadthFirstIterator;
pub use comparator::{VisitKey, VisitPolicy};
pub use depth_first::{DepthFirstIterator, DepthUpdater};

use crate::core::{
    AdjacencyBounds, BoundType, Connection, Graph, GraphError, PointId, Result, Rotation,
    SegmentEnd, SegmentId,
};

/// Ein Schritt einer Traversierung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphIterationElement {
    /// Besuchtes Segment
    pub segment: SegmentId,
    /// Verbindungspunkt, über den das Segment betreten wurde
    pub point: PointId,
    /// Ende des Segments an `point`
    pub entry_end: SegmentEnd,
    /// Distanz vom Startpunkt bis `point` (beim ersten Element negativ)
    pub distance_to_reach: f64,
    /// Die Traversierung setzt hinter diesem Element nicht fort
    pub terminal: bool,
}

impl GraphIterationElement {
    /// Ende, über das das Segment verlassen wird.
    pub fn exit_end(&self) -> SegmentEnd {
        self.entry_end.opposite()
    }

    /// Anschluss, mit dem die Traversierung am Ausgangspunkt ankommt.
    pub fn exit_connection(&self) -> Connection {
        Connection::new(self.segment, self.exit_end())
    }
}

/// Sicht auf einen Graphen, über die traversiert wird.
///
/// Der Graph selbst durchläuft alle Segmente; ein Teilgraph schränkt auf
/// seine Segmente ein.
pub trait Topology {
    fn graph(&self) -> &Graph;

    fn contains_segment(&self, segment: SegmentId) -> bool;

    /// Anschlüsse am Punkt im Uhrzeigersinn nach `arrival`, ohne `arrival`.
    fn successors(&self, point: PointId, arrival: Connection) -> Vec<Connection> {
        let graph = self.graph();
        let bounds = AdjacencyBounds::all()
            .starting_at(arrival.segment, Some(arrival.end))
            .with_bound_type(BoundType::ExcludeStart);
        match graph
            .cursor(point, Rotation::Clockwise, &bounds)
            .and_then(|cursor| cursor.iter(graph))
        {
            // Ein voller Umlauf schließt am Ankunfts-Eintrag selbst ab
            Ok(iter) => iter
                .filter(|c| *c != arrival && self.contains_segment(c.segment))
                .collect(),
            Err(e) => {
                log::warn!("Nachfolger an {point} nicht bestimmbar: {e}");
                Vec::new()
            }
        }
    }
}

impl Topology for Graph {
    fn graph(&self) -> &Graph {
        self
    }

    fn contains_segment(&self, segment: SegmentId) -> bool {
        self.contains(segment)
    }
}

impl<T: Topology + ?Sized> Topology for &T {
    fn graph(&self) -> &Graph {
        (**self).graph()
    }

    fn contains_segment(&self, segment: SegmentId) -> bool {
        (**self).contains_segment(segment)
    }

    fn successors(&self, point: PointId, arrival: Connection) -> Vec<Connection> {
        (**self).successors(point, arrival)
    }
}

/// Startelement einer Traversierung.
///
/// Liegt `point` nicht an einem Ende des Segments, beginnt die Traversierung
/// an dessen Startpunkt. `position` ist die Distanz vom Eintrittspunkt.
pub(crate) fn first_element<T: Topology>(
    topology: &T,
    segment: SegmentId,
    point: PointId,
    position: f64,
) -> Result<GraphIterationElement> {
    if !topology.contains_segment(segment) {
        return Err(GraphError::UnknownSegment(segment));
    }
    let seg = topology
        .graph()
        .segment(segment)
        .ok_or(GraphError::UnknownSegment(segment))?;
    let entry_end = seg.end_at(point).unwrap_or(SegmentEnd::Start);
    let entry = seg
        .slot(entry_end)
        .ok_or(GraphError::NotConnectedAt {
            segment,
            end: entry_end,
            point,
        })?;
    Ok(GraphIterationElement {
        segment,
        point: entry,
        entry_end,
        distance_to_reach: -position,
        terminal: false,
    })
}

/// Nachfolger eines Elements am Ausgangspunkt.
pub(crate) fn children<T: Topology>(
    topology: &T,
    element: &GraphIterationElement,
    length: f64,
) -> Vec<GraphIterationElement> {
    let graph = topology.graph();
    let Some(exit) = graph
        .segment(element.segment)
        .and_then(|s| s.slot(element.exit_end()))
    else {
        return Vec::new();
    };
    let distance = element.distance_to_reach + length;
    topology
        .successors(exit, element.exit_connection())
        .into_iter()
        .map(|c| GraphIterationElement {
            segment: c.segment,
            point: exit,
            entry_end: c.end,
            distance_to_reach: distance,
            terminal: false,
        })
        .collect()
}

pub(crate) fn segment_length<T: Topology>(topology: &T, segment: SegmentId) -> f64 {
    topology
        .graph()
        .segment(segment)
        .map_or(0.0, |s| s.length())
}
