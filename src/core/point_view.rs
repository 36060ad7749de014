//! Lesende Sichten auf Verbindungspunkte.
//!
//! [`PointRef`] ist die rohe bzw. ankunftsbewusste Sicht innerhalb eines
//! Graphen. [`PointHandle`] fasst alle Punkt-Varianten zusammen, die an
//! mutierende Graph-Operationen übergeben werden dürfen.

use glam::DVec2;

use super::adjacency::{is_ascending, AdjacencyBounds, AdjacencyCursor, AdjacencyIter, Rotation};
use super::{Connection, ConnectionPoint, Graph, PointId, SegmentId};
use crate::subgraph::{TerminalConnection, WrapConnection};

/// Sicht auf einen Verbindungspunkt eines Graphen.
///
/// Mit `arrival` merkt sich die Sicht, über welches Segment-Ende der Punkt
/// erreicht wurde. Für Schleifen löst sie damit auf, welcher der beiden
/// Einträge eines Segments als Start- bzw. Endgrenze gemeint ist.
#[derive(Debug, Clone, Copy)]
pub struct PointRef<'g> {
    graph: &'g Graph,
    point: &'g ConnectionPoint,
    arrival: Option<Connection>,
}

impl<'g> PointRef<'g> {
    pub(crate) fn new(graph: &'g Graph, point: &'g ConnectionPoint, arrival: Option<Connection>) -> Self {
        Self {
            graph,
            point,
            arrival,
        }
    }

    pub fn id(&self) -> PointId {
        self.point.id()
    }

    pub fn location(&self) -> DVec2 {
        self.point.location()
    }

    /// Anschluss, über den dieser Punkt erreicht wurde.
    pub fn arrival(&self) -> Option<Connection> {
        self.arrival
    }

    /// Zugrunde liegender Verbindungspunkt.
    pub fn raw(&self) -> &'g ConnectionPoint {
        self.point
    }

    pub fn connections(&self) -> &'g [Connection] {
        self.point.connections()
    }

    pub fn connection_count(&self) -> usize {
        self.point.connection_count()
    }

    pub fn connected_segment(&self, index: usize) -> Option<SegmentId> {
        self.point.connected_segment(index)
    }

    pub fn is_connected_segment(&self, segment: SegmentId) -> bool {
        self.point.is_connected_segment(segment)
    }

    pub fn is_cul_de_sac(&self) -> bool {
        self.point.is_cul_de_sac()
    }

    pub fn other_side_segment(&self, segment: SegmentId) -> Option<SegmentId> {
        self.point.other_side_segment(segment)
    }

    /// Ergänzt fehlende Enden von Grenzen, die auf das Ankunfts-Segment
    /// einer Schleife zeigen.
    fn resolve_bounds(&self, bounds: &AdjacencyBounds) -> AdjacencyBounds {
        let mut resolved = *bounds;
        let Some(arrival) = self.arrival else {
            return resolved;
        };
        let is_loop = self
            .graph
            .segment(arrival.segment)
            .is_some_and(|s| s.is_loop());
        if !is_loop {
            return resolved;
        }

        if let Some(start) = resolved.start.as_mut() {
            if start.segment == arrival.segment && start.end.is_none() {
                start.end = Some(arrival.end);
            }
        }
        if let Some(end) = resolved.end.as_mut() {
            if end.segment == arrival.segment && end.end.is_none() {
                end.end = Some(arrival.end.opposite());
            }
        }
        resolved
    }

    /// Cursor in physikalischem Drehsinn.
    pub fn cursor(&self, rotation: Rotation, bounds: &AdjacencyBounds) -> AdjacencyCursor {
        let ascending = is_ascending(rotation, self.graph.options().coordinate_system);
        AdjacencyCursor::new(self.point, ascending, &self.resolve_bounds(bounds))
    }

    /// Der Cursor entsteht hier frisch und kann nicht veraltet sein.
    pub fn clockwise(&self, bounds: &AdjacencyBounds) -> AdjacencyIter<'g> {
        AdjacencyIter::new(self.graph, self.cursor(Rotation::Clockwise, bounds))
    }

    pub fn counterclockwise(&self, bounds: &AdjacencyBounds) -> AdjacencyIter<'g> {
        AdjacencyIter::new(self.graph, self.cursor(Rotation::Counterclockwise, bounds))
    }
}

impl PartialEq for PointRef<'_> {
    /// Gleich, wenn die Positionen innerhalb des Punkt-Epsilons liegen.
    fn eq(&self, other: &Self) -> bool {
        self.point
            .same_location(other.point, self.graph.options().point_epsilon)
    }
}

/// Alle Punkt-Varianten, die an Graph-Operationen übergeben werden können.
#[derive(Debug, Clone, PartialEq)]
pub enum PointHandle {
    /// Verbindungspunkt direkt über seine ID
    Raw(PointId),
    /// Punkt mit bekanntem Ankunfts-Anschluss
    ArrivalAware { point: PointId, via: Connection },
    /// Künstlicher Randpunkt eines Teilgraphen
    Terminal(TerminalConnection),
    /// Punkt eines Teilgraphen, der auf das Original verweist
    Wrapped(WrapConnection),
}

impl PointHandle {
    /// Kennung für Fehlermeldungen.
    pub fn kind(&self) -> &'static str {
        match self {
            PointHandle::Raw(_) => "Raw",
            PointHandle::ArrivalAware { .. } => "ArrivalAware",
            PointHandle::Terminal(_) => "TerminalConnection",
            PointHandle::Wrapped(_) => "WrapConnection",
        }
    }
}

impl From<PointId> for PointHandle {
    fn from(id: PointId) -> Self {
        PointHandle::Raw(id)
    }
}

impl From<PointRef<'_>> for PointHandle {
    fn from(p: PointRef<'_>) -> Self {
        match p.arrival {
            Some(via) => PointHandle::ArrivalAware { point: p.id(), via },
            None => PointHandle::Raw(p.id()),
        }
    }
}

impl From<TerminalConnection> for PointHandle {
    fn from(t: TerminalConnection) -> Self {
        PointHandle::Terminal(t)
    }
}

impl From<WrapConnection> for PointHandle {
    fn from(w: WrapConnection) -> Self {
        PointHandle::Wrapped(w)
    }
}
