//! Hüllen für Segmente und Verbindungspunkte eines Teilgraphen.
//!
//! Jede Hülle kennt ihren Elterngraphen. Alle Werte, die die Grenze des
//! Teilgraphen überqueren, sind wieder gehüllt.

use glam::DVec2;

use super::SubGraphView;
use crate::core::{
    AdjacencyBounds, Connection, Graph, GraphId, PointId, Result, Rotation, SegmentEnd, SegmentId,
};

/// Segment eines Teilgraphen mit optionalen Randpunkten.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapSegment {
    pub(crate) parent: GraphId,
    pub(crate) segment: SegmentId,
    pub(crate) start: Option<TerminalConnection>,
    pub(crate) end: Option<TerminalConnection>,
}

impl WrapSegment {
    pub fn parent(&self) -> GraphId {
        self.parent
    }

    /// Das Original-Segment im Elterngraphen.
    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    /// Randpunkt am gegebenen Ende, falls der Teilgraph dort abgeschnitten ist.
    pub fn terminal(&self, end: SegmentEnd) -> Option<&TerminalConnection> {
        match end {
            SegmentEnd::Start => self.start.as_ref(),
            SegmentEnd::End => self.end.as_ref(),
        }
    }

    pub fn is_terminal_at(&self, end: SegmentEnd) -> bool {
        self.terminal(end).is_some()
    }
}

/// Künstlicher Randpunkt: zeigt nur das eine Segment, über das er erreicht
/// wird, und verbirgt alle übrigen Anschlüsse des Originalpunkts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalConnection {
    pub(crate) parent: GraphId,
    pub(crate) point: PointId,
    pub(crate) segment: SegmentId,
    pub(crate) end: SegmentEnd,
}

impl TerminalConnection {
    pub fn parent(&self) -> GraphId {
        self.parent
    }

    /// Der Originalpunkt im Elterngraphen.
    pub fn point(&self) -> PointId {
        self.point
    }

    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    pub fn end(&self) -> SegmentEnd {
        self.end
    }

    pub fn location(&self, graph: &Graph) -> Option<DVec2> {
        graph.connection_point(self.point).map(|cp| cp.location())
    }

    pub fn connection_count(&self) -> usize {
        1
    }

    pub fn connection(&self) -> Connection {
        Connection::new(self.segment, self.end)
    }

    pub fn connected_segment(&self, index: usize) -> Option<SegmentId> {
        (index == 0).then_some(self.segment)
    }

    pub fn is_connected_segment(&self, segment: SegmentId) -> bool {
        self.segment == segment
    }

    /// Randpunkte haben kein gegenüberliegendes Segment.
    pub fn other_side_segment(&self, _segment: SegmentId) -> Option<SegmentId> {
        None
    }

    pub fn is_cul_de_sac(&self) -> bool {
        true
    }

    /// Trifft eine Umlauf-Abfrage den einzigen Anschluss?
    ///
    /// Eine fehlende Grenze gilt als Treffer, ebenso eine Grenze ohne Ende.
    pub fn matches(&self, bounds: &AdjacencyBounds) -> bool {
        let hits = |bound: Option<crate::core::SegmentBound>| {
            bound.is_none_or(|b| b.segment == self.segment && b.end.is_none_or(|e| e == self.end))
        };
        let start_hit = hits(bounds.start);
        let end_hit = hits(bounds.end);
        match (bounds.start.is_some(), bounds.end.is_some()) {
            (false, false) => true,
            (true, false) => start_hit && bounds.bound_type.includes_start(),
            (false, true) => end_hit && bounds.bound_type.includes_end(),
            (true, true) => {
                (start_hit && bounds.bound_type.includes_start())
                    || (end_hit && bounds.bound_type.includes_end())
            }
        }
    }

    /// Höchstens ein Element, unabhängig vom Drehsinn.
    pub fn iterate(
        &self,
        view: &SubGraphView<'_>,
        _rotation: Rotation,
        bounds: &AdjacencyBounds,
    ) -> Result<Vec<WrapSegment>> {
        view.check_parent(self.parent)?;
        if !self.matches(bounds) {
            return Ok(Vec::new());
        }
        Ok(vec![view.wrap_segment(self.segment)?])
    }
}

/// Verbindungspunkt im Inneren eines Teilgraphen.
///
/// Leitet an den Originalpunkt weiter, sieht aber nur Segmente des
/// Teilgraphen und liefert sie gehüllt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapConnection {
    pub(crate) parent: GraphId,
    pub(crate) point: PointId,
}

impl WrapConnection {
    pub fn parent(&self) -> GraphId {
        self.parent
    }

    /// Der Originalpunkt im Elterngraphen.
    pub fn point(&self) -> PointId {
        self.point
    }

    pub fn location(&self, graph: &Graph) -> Option<DVec2> {
        graph.connection_point(self.point).map(|cp| cp.location())
    }

    /// Anschlüsse an Segmente des Teilgraphen, in Winkelreihenfolge.
    pub fn connections(&self, view: &SubGraphView<'_>) -> Result<Vec<Connection>> {
        let cp = view.raw_point(self.parent, self.point)?;
        Ok(cp
            .connections()
            .iter()
            .filter(|c| view.contains(c.segment))
            .copied()
            .collect())
    }

    pub fn connection_count(&self, view: &SubGraphView<'_>) -> Result<usize> {
        Ok(self.connections(view)?.len())
    }

    pub fn connected_segment(&self, view: &SubGraphView<'_>, index: usize) -> Result<Option<WrapSegment>> {
        match self.connections(view)?.get(index) {
            Some(c) => view.wrap_segment(c.segment).map(Some),
            None => Ok(None),
        }
    }

    pub fn other_side_segment(&self, view: &SubGraphView<'_>, segment: SegmentId) -> Result<Option<WrapSegment>> {
        let other = match self.connections(view)?.as_slice() {
            [a, b] if a.segment == segment => Some(b.segment),
            [a, b] if b.segment == segment => Some(a.segment),
            _ => None,
        };
        other.map(|s| view.wrap_segment(s)).transpose()
    }

    pub fn is_cul_de_sac(&self, view: &SubGraphView<'_>) -> Result<bool> {
        Ok(self.connection_count(view)? <= 1)
    }

    /// Umlauf über den Originalpunkt, gefiltert und gehüllt.
    pub fn iterate(
        &self,
        view: &SubGraphView<'_>,
        rotation: Rotation,
        bounds: &AdjacencyBounds,
    ) -> Result<Vec<WrapSegment>> {
        view.check_parent(self.parent)?;
        let graph = view.graph();
        graph
            .cursor(self.point, rotation, bounds)?
            .iter(graph)?
            .filter(|c| view.contains(c.segment))
            .map(|c| view.wrap_segment(c.segment))
            .collect()
    }
}
