//! Teilgraph: eine beschnittene, lesende Sicht auf einen Elterngraphen.
//!
//! Der Teilgraph besitzt keine Segmente, er merkt sich nur deren IDs. An den
//! Schnittstellen ersetzt er Originalpunkte durch [`TerminalConnection`]s.
//! Mutationen laufen über den Elterngraphen, nachdem geprüft wurde, dass alle
//! Hüllen aus genau diesem Graphen stammen.

mod wrappers;


pub use wrappers::{TerminalConnection, WrapConnection, WrapSegment};

use glam::DVec2;
use indexmap::IndexSet;

use crate::core::{
    ConnectionPoint, Graph, GraphError, GraphId, PointHandle, PointId, Rect, Result, SegmentEnd,
    SegmentId,
};
use crate::traversal::{DepthFirstIterator, GraphIterationElement, Topology};

/// Segment-Argument für Teilgraph-Operationen: roh oder bereits gehüllt.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentLike {
    Raw(SegmentId),
    Wrapped(WrapSegment),
}

impl From<SegmentId> for SegmentLike {
    fn from(id: SegmentId) -> Self {
        SegmentLike::Raw(id)
    }
}

impl From<WrapSegment> for SegmentLike {
    fn from(w: WrapSegment) -> Self {
        SegmentLike::Wrapped(w)
    }
}

impl From<&WrapSegment> for SegmentLike {
    fn from(w: &WrapSegment) -> Self {
        SegmentLike::Wrapped(w.clone())
    }
}

/// Menge von Segmenten eines Elterngraphen.
#[derive(Debug, Clone, PartialEq)]
pub struct SubGraph {
    parent: GraphId,
    segments: IndexSet<SegmentId>,
}

impl SubGraph {
    /// Leerer Teilgraph über `graph`.
    pub fn new(graph: &Graph) -> Self {
        Self {
            parent: graph.id(),
            segments: IndexSet::new(),
        }
    }

    /// Teilgraph aus einer expliziten Segmentliste.
    pub fn from_segments(graph: &Graph, ids: impl IntoIterator<Item = SegmentId>) -> Result<Self> {
        let mut sub = Self::new(graph);
        for id in ids {
            sub.add_segment(graph, id)?;
        }
        Ok(sub)
    }

    /// Teilgraph aus den Elementen einer Traversierung.
    pub fn from_traversal(
        graph: &Graph,
        elements: impl IntoIterator<Item = GraphIterationElement>,
    ) -> Result<Self> {
        Self::from_segments(graph, elements.into_iter().map(|e| e.segment))
    }

    /// Alle Segmente, die eine Tiefensuche bis `depth` erreicht.
    pub fn within_depth(
        graph: &Graph,
        depth: f64,
        segment: SegmentId,
        point: PointId,
        position: f64,
    ) -> Result<Self> {
        let iter = DepthFirstIterator::new(graph, depth, segment, point, position)?;
        let sub = Self::from_traversal(graph, iter)?;
        log::debug!(
            "Teilgraph ab {segment} bis Tiefe {depth}: {} Segmente",
            sub.len()
        );
        Ok(sub)
    }

    pub fn parent(&self) -> GraphId {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, segment: SegmentId) -> bool {
        self.segments.contains(&segment)
    }

    pub fn segment_ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments.iter().copied()
    }

    /// Nimmt ein Segment des Elterngraphen auf.
    pub fn add_segment(&mut self, graph: &Graph, segment: SegmentId) -> Result<bool> {
        self.check_graph(graph)?;
        if !graph.contains(segment) {
            return Err(GraphError::UnknownSegment(segment));
        }
        Ok(self.segments.insert(segment))
    }

    /// Schneidet ein Segment aus der Sicht heraus, ohne den Elterngraphen zu ändern.
    pub fn remove_segment(&mut self, segment: SegmentId) -> bool {
        self.segments.shift_remove(&segment)
    }

    fn check_graph(&self, graph: &Graph) -> Result<()> {
        if graph.id() != self.parent {
            return Err(GraphError::unexpected_graph(self.parent, graph.id()));
        }
        Ok(())
    }

    /// Lesende Sicht zusammen mit dem Elterngraphen.
    pub fn view<'g>(&'g self, graph: &'g Graph) -> Result<SubGraphView<'g>> {
        self.check_graph(graph)?;
        Ok(SubGraphView { sub: self, graph })
    }

    fn unwrap_point(&self, handle: &PointHandle) -> Result<PointHandle> {
        match handle {
            PointHandle::Terminal(t) if t.parent != self.parent => {
                Err(GraphError::unexpected_graph(self.parent, t.parent))
            }
            PointHandle::Wrapped(w) if w.parent != self.parent => {
                Err(GraphError::unexpected_graph(self.parent, w.parent))
            }
            PointHandle::Terminal(t) => Ok(PointHandle::Raw(t.point)),
            PointHandle::Wrapped(w) => Ok(PointHandle::Raw(w.point)),
            other => Ok(other.clone()),
        }
    }

    fn unwrap_segment(&self, segment: SegmentLike) -> Result<SegmentId> {
        match segment {
            SegmentLike::Raw(id) => Ok(id),
            SegmentLike::Wrapped(w) if w.parent != self.parent => {
                Err(GraphError::unexpected_graph(self.parent, w.parent))
            }
            SegmentLike::Wrapped(w) => Ok(w.segment),
        }
    }

    // ── Mutationen über den Elterngraphen ──────────────────────

    /// Verschmilzt Punkte (auch Hüllen) im Elterngraphen.
    pub fn merge_connections(&self, graph: &mut Graph, points: &[PointHandle]) -> Result<Option<PointId>> {
        self.check_graph(graph)?;
        let unwrapped = points
            .iter()
            .map(|p| self.unwrap_point(p))
            .collect::<Result<Vec<_>>>()?;
        graph.merge_connections(&unwrapped)
    }

    pub fn connect_segment_start_point(
        &self,
        graph: &mut Graph,
        point: Option<PointHandle>,
        segment: impl Into<SegmentLike>,
        position: Option<DVec2>,
    ) -> Result<PointId> {
        self.check_graph(graph)?;
        let point = point.map(|p| self.unwrap_point(&p)).transpose()?;
        let segment = self.unwrap_segment(segment.into())?;
        graph.connect_segment_start_point(point, segment, position)
    }

    pub fn connect_segment_end_point(
        &self,
        graph: &mut Graph,
        point: Option<PointHandle>,
        segment: impl Into<SegmentLike>,
        position: Option<DVec2>,
    ) -> Result<PointId> {
        self.check_graph(graph)?;
        let point = point.map(|p| self.unwrap_point(&p)).transpose()?;
        let segment = self.unwrap_segment(segment.into())?;
        graph.connect_segment_end_point(point, segment, position)
    }
}

/// Teilgraph plus Elterngraph für Abfragen.
#[derive(Debug, Clone, Copy)]
pub struct SubGraphView<'g> {
    sub: &'g SubGraph,
    graph: &'g Graph,
}

impl<'g> SubGraphView<'g> {
    pub fn subgraph(&self) -> &'g SubGraph {
        self.sub
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn contains(&self, segment: SegmentId) -> bool {
        self.sub.contains(segment)
    }

    pub(crate) fn check_parent(&self, parent: GraphId) -> Result<()> {
        if parent != self.sub.parent {
            return Err(GraphError::unexpected_graph(self.sub.parent, parent));
        }
        Ok(())
    }

    pub(crate) fn raw_point(&self, parent: GraphId, point: PointId) -> Result<&'g ConnectionPoint> {
        self.check_parent(parent)?;
        self.graph
            .connection_point(point)
            .ok_or(GraphError::UnknownPoint(point))
    }

    /// Ist `point` für das Ende `end` von `segment` ein Randpunkt?
    ///
    /// Das ist der Fall, wenn am Punkt ausgeschlossene Segmente hängen und
    /// dieses Ende der einzige Anschluss aus dem Teilgraphen ist.
    pub fn is_terminal_point(&self, point: PointId, segment: SegmentId, end: SegmentEnd) -> bool {
        let Some(cp) = self.graph.connection_point(point) else {
            return false;
        };
        let mut retained = cp.connections().iter().filter(|c| self.contains(c.segment));
        let has_excluded = cp.connections().iter().any(|c| !self.contains(c.segment));
        let only_this = matches!(
            (retained.next(), retained.next()),
            (Some(c), None) if c.matches(segment, Some(end))
        );
        has_excluded && only_this
    }

    fn terminal_for(&self, segment: SegmentId, end: SegmentEnd) -> Option<TerminalConnection> {
        let point = self.graph.segment(segment)?.slot(end)?;
        self.is_terminal_point(point, segment, end)
            .then_some(TerminalConnection {
                parent: self.sub.parent,
                point,
                segment,
                end,
            })
    }

    /// Hüllt ein Segment. Bereits gehüllte Segmente kommen unverändert zurück.
    pub fn wrap_segment(&self, segment: impl Into<SegmentLike>) -> Result<WrapSegment> {
        match segment.into() {
            SegmentLike::Wrapped(w) => {
                self.check_parent(w.parent)?;
                Ok(w)
            }
            SegmentLike::Raw(id) => {
                if !self.contains(id) || !self.graph.contains(id) {
                    return Err(GraphError::UnknownSegment(id));
                }
                Ok(WrapSegment {
                    parent: self.sub.parent,
                    segment: id,
                    start: self.terminal_for(id, SegmentEnd::Start),
                    end: self.terminal_for(id, SegmentEnd::End),
                })
            }
        }
    }

    /// Hüllt einen Punkt.
    ///
    /// Ein ankunftsbewusster Punkt wird zum Randpunkt, wenn er für sein
    /// Ankunftsende terminal ist. Hüllen kommen unverändert zurück.
    pub fn wrap_point(&self, point: &PointHandle) -> Result<PointHandle> {
        match point {
            PointHandle::Terminal(t) => {
                self.check_parent(t.parent)?;
                Ok(point.clone())
            }
            PointHandle::Wrapped(w) => {
                self.check_parent(w.parent)?;
                Ok(point.clone())
            }
            PointHandle::Raw(id) => {
                self.raw_point(self.sub.parent, *id)?;
                Ok(PointHandle::Wrapped(WrapConnection {
                    parent: self.sub.parent,
                    point: *id,
                }))
            }
            PointHandle::ArrivalAware { point, via } => {
                self.raw_point(self.sub.parent, *point)?;
                if self.is_terminal_point(*point, via.segment, via.end) {
                    Ok(PointHandle::Terminal(TerminalConnection {
                        parent: self.sub.parent,
                        point: *point,
                        segment: via.segment,
                        end: via.end,
                    }))
                } else {
                    Ok(PointHandle::Wrapped(WrapConnection {
                        parent: self.sub.parent,
                        point: *point,
                    }))
                }
            }
        }
    }

    /// Ursprung einer Hülle, `None` für rohe Handles.
    pub fn unwrap_point(&self, point: &PointHandle) -> Option<PointId> {
        match point {
            PointHandle::Terminal(t) => Some(t.point),
            PointHandle::Wrapped(w) => Some(w.point),
            _ => None,
        }
    }

    pub fn segment(&self, id: SegmentId) -> Option<WrapSegment> {
        self.wrap_segment(id).ok()
    }

    pub fn segments(&self) -> impl Iterator<Item = WrapSegment> + '_ {
        self.sub.segment_ids().filter_map(|id| self.wrap_segment(id).ok())
    }

    /// Punkt am Anfang des Segments, gehüllt.
    pub fn begin_point(&self, segment: impl Into<SegmentLike>) -> Result<PointHandle> {
        self.end_point_of(segment.into(), SegmentEnd::Start)
    }

    /// Punkt am Ende des Segments, gehüllt.
    pub fn end_point(&self, segment: impl Into<SegmentLike>) -> Result<PointHandle> {
        self.end_point_of(segment.into(), SegmentEnd::End)
    }

    fn end_point_of(&self, segment: SegmentLike, end: SegmentEnd) -> Result<PointHandle> {
        let wrapped = self.wrap_segment(segment)?;
        if let Some(t) = wrapped.terminal(end) {
            return Ok(PointHandle::Terminal(*t));
        }
        let point = self
            .graph
            .segment(wrapped.segment)
            .and_then(|s| s.slot(end))
            .ok_or(GraphError::UnknownSegment(wrapped.segment))?;
        Ok(PointHandle::Wrapped(WrapConnection {
            parent: self.sub.parent,
            point,
        }))
    }

    /// Nächstes Segment des Teilgraphen.
    pub fn nearest_segment(&self, position: DVec2) -> Option<WrapSegment> {
        self.sub
            .segment_ids()
            .filter_map(|id| Some((id, self.graph.segment(id)?.distance(position))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .and_then(|(id, _)| self.wrap_segment(id).ok())
    }

    /// Segmente des Teilgraphen, deren Hüllrechteck das Rechteck schneidet.
    pub fn segments_in(&self, rect: &Rect) -> Vec<WrapSegment> {
        self.graph
            .segments_in(rect)
            .into_iter()
            .filter(|id| self.contains(*id))
            .filter_map(|id| self.wrap_segment(id).ok())
            .collect()
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        self.sub
            .segment_ids()
            .filter_map(|id| self.graph.segment(id)?.bounding_box())
            .reduce(|a, b| a.union(&b))
    }

    // ── Traversierung ──────────────────────────────────────────

    /// Hüllt die Elemente einer Traversierung über diese Sicht.
    pub fn wrap_traversal<I>(&self, inner: I) -> WrappedTraversal<'g, I>
    where
        I: Iterator<Item = GraphIterationElement>,
    {
        WrappedTraversal { view: *self, inner }
    }

    /// Tiefensuche innerhalb des Teilgraphen.
    pub fn depth_first(
        &self,
        depth: f64,
        segment: impl Into<SegmentLike>,
        point: PointId,
        position: f64,
    ) -> Result<WrappedTraversal<'g, DepthFirstIterator<'g, SubGraphView<'g>>>> {
        let segment = self.sub.unwrap_segment(segment.into())?;
        let inner = DepthFirstIterator::new(*self, depth, segment, point, position)?;
        Ok(self.wrap_traversal(inner))
    }

    /// Breitensuche innerhalb des Teilgraphen.
    pub fn breadth_first(
        &self,
        segment: impl Into<SegmentLike>,
        point: PointId,
        position: f64,
    ) -> Result<WrappedTraversal<'g, crate::traversal::BreadthFirstIterator<SubGraphView<'g>>>> {
        let segment = self.sub.unwrap_segment(segment.into())?;
        let inner = crate::traversal::BreadthFirstIterator::new(*self, segment, point, position)?;
        Ok(self.wrap_traversal(inner))
    }
}

impl Topology for SubGraphView<'_> {
    fn graph(&self) -> &Graph {
        self.graph
    }

    fn contains_segment(&self, segment: SegmentId) -> bool {
        self.contains(segment)
    }
}

/// Traversierungs-Element mit gehülltem Segment.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedElement {
    pub element: GraphIterationElement,
    pub segment: WrapSegment,
}

/// Iterator, der Elemente einer Traversierung hüllt.
#[derive(Debug)]
pub struct WrappedTraversal<'g, I> {
    view: SubGraphView<'g>,
    inner: I,
}

impl<I> Iterator for WrappedTraversal<'_, I>
where
    I: Iterator<Item = GraphIterationElement>,
{
    type Item = WrappedElement;

    fn next(&mut self) -> Option<WrappedElement> {
        loop {
            let element = self.inner.next()?;
            if let Ok(segment) = self.view.wrap_segment(element.segment) {
                return Some(WrappedElement { element, segment });
            }
        }
    }
}
