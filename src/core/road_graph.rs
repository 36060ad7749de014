//! Der Straßennetz-Graph: Segmente, Verbindungspunkte und Spatial-Index.

mod topology;

#[cfg(test)]
mod tests;

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::DVec2;
use indexmap::IndexMap;

use super::adjacency::{is_ascending, AdjacencyBounds, AdjacencyCursor, Rotation};
use super::events::{GraphEvent, ListenerId, Listeners};
use super::geometry::Rect;
use super::spatial::{FusionNeighbors, SpatialIndex, SpatialMatch};
use super::{
    Connection, ConnectionPoint, GraphError, GraphId, PointHandle, PointId, PointRef, Result,
    RoadPath, Segment, SegmentEnd, SegmentId,
};
use crate::shared::{GraphOptions, TrafficSide};

/// Planares Straßennetz im Speicher.
///
/// Der Graph besitzt alle Segmente und Verbindungspunkte. Segmente verweisen
/// über ihre Slots auf Punkte, Punkte nur schwach über [`Connection`]s auf
/// Segmente.
#[derive(Debug)]
pub struct Graph {
    id: GraphId,
    options: Rc<GraphOptions>,
    segments: IndexMap<SegmentId, Segment>,
    points: HashMap<PointId, ConnectionPoint>,
    spatial_index: SpatialIndex,
    /// Zwischengespeichertes Hüllrechteck, `None` = leer
    bounds: Cell<Option<Rect>>,
    bounds_valid: Cell<bool>,
    listeners: Listeners<GraphEvent>,
}

impl Graph {
    /// Erstellt einen leeren Graphen mit Standard-Optionen.
    pub fn new() -> Self {
        Self::with_options(GraphOptions::default())
    }

    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            id: GraphId::next(),
            options: Rc::new(options),
            segments: IndexMap::new(),
            points: HashMap::new(),
            spatial_index: SpatialIndex::empty(),
            bounds: Cell::new(None),
            bounds_valid: Cell::new(true),
            listeners: Listeners::new(),
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn legal_traffic_side(&self) -> TrafficSide {
        self.options.legal_traffic_side
    }

    pub fn is_right_sided_traffic(&self) -> bool {
        self.options.is_right_sided_traffic()
    }

    // ── Einfügen / Entfernen ───────────────────────────────────

    /// Fügt ein freistehendes Segment ein.
    ///
    /// Endpunkte innerhalb des Fusionsabstands eines vorhandenen Endpunkts
    /// teilen dessen Verbindungspunkt und werden auf seine Position gezogen.
    /// Schlägt das Anschließen fehl, ist der Graph danach unverändert.
    pub fn insert(&mut self, mut segment: Segment) -> Result<SegmentId> {
        if let Some(owner) = segment.graph() {
            log::warn!("Einfügen abgelehnt: Segment gehört bereits zu {owner}");
            return Err(GraphError::AlreadyOwned(owner));
        }
        if segment.point_count() < 2 {
            log::warn!(
                "Einfügen abgelehnt: {} Punkt(e) statt mindestens 2",
                segment.point_count()
            );
            return Err(GraphError::NotEnoughPoints(segment.point_count()));
        }

        let id = SegmentId::next();
        segment.attach_to(id, self.id, Rc::clone(&self.options));
        let neighbors =
            self.spatial_index
                .insert(id, segment.points(), self.options.fusion_distance);
        self.segments.insert(id, segment);

        let mut created = Vec::new();
        if let Err(e) = self.attach_inserted(id, neighbors, &mut created) {
            log::warn!("Einfügen von {id} fehlgeschlagen, Rücknahme: {e}");
            self.rollback_insert(id, &created);
            return Err(e);
        }

        self.refresh_segment(id);
        self.extend_bounds(id);
        self.listeners.emit(&GraphEvent::SegmentAdded(id));
        log::debug!(
            "{id} eingefügt ({} Segmente, {} Punkte)",
            self.segments.len(),
            self.points.len()
        );
        Ok(id)
    }

    /// Bestimmt die Verbindungspunkte eines neuen Segments und schließt
    /// beide Enden an.
    ///
    /// Neu erzeugte Punkte landen in `created`, auch wenn das Anschließen
    /// danach scheitert.
    fn attach_inserted(
        &mut self,
        id: SegmentId,
        neighbors: FusionNeighbors,
        created: &mut Vec<PointId>,
    ) -> Result<()> {
        let segment = self.segments.get(&id).ok_or(GraphError::UnknownSegment(id))?;
        let (Some(first), Some(last)) = (segment.first_point(), segment.last_point()) else {
            return Err(GraphError::NotEnoughPoints(segment.point_count()));
        };

        let resolve = |m: Option<SpatialMatch>| m.and_then(|m| self.segments.get(&m.segment)?.slot(m.end));
        let near_start = resolve(neighbors.near_first);
        let near_end = resolve(neighbors.near_last);
        let shared = near_start.is_none()
            && near_end.is_none()
            && first.distance_squared(last) <= self.options.fusion_distance_sq();

        let start = match near_start {
            Some(p) => p,
            None => self.create_tracked_point(first, created),
        };
        let end = match near_end {
            Some(p) => p,
            None if shared => start,
            None => self.create_tracked_point(last, created),
        };

        self.set_segment_point(id, SegmentEnd::Start, start)?;
        self.set_segment_point(id, SegmentEnd::End, end)?;
        Ok(())
    }

    /// Nimmt ein teilweise angeschlossenes Segment vollständig zurück.
    fn rollback_insert(&mut self, id: SegmentId, created: &[PointId]) {
        let slots = self
            .segments
            .get(&id)
            .map(|s| [s.start_point(), s.end_point()])
            .unwrap_or_default();
        for (end, slot) in [SegmentEnd::Start, SegmentEnd::End].into_iter().zip(slots) {
            if let Some(p) = slot {
                if let Some(cp) = self.points.get_mut(&p) {
                    cp.detach(id, end);
                }
                self.purge_point(p);
            }
        }
        for p in created {
            self.purge_point(*p);
        }
        self.segments.shift_remove(&id);
        self.spatial_index.remove(id);
    }

    /// Entfernt ein Segment und gibt es freistehend zurück.
    ///
    /// Punkte, die dabei ihren letzten Anschluss verlieren, verschwinden.
    pub fn remove(&mut self, id: SegmentId) -> Option<Segment> {
        let segment = self.segments.get(&id)?;
        let slots = [
            (SegmentEnd::Start, segment.start_point()),
            (SegmentEnd::End, segment.end_point()),
        ];
        for (end, slot) in slots {
            let Some(p) = slot else { continue };
            if let Some(cp) = self.points.get_mut(&p) {
                cp.detach(id, end);
            }
        }
        for (_, slot) in slots {
            if let Some(p) = slot {
                self.purge_point(p);
            }
        }

        let mut segment = self.segments.shift_remove(&id)?;
        self.spatial_index.remove(id);
        segment.detach();
        self.bounds_valid.set(false);
        self.listeners.emit(&GraphEvent::SegmentRemoved(id));
        log::debug!(
            "{id} entfernt ({} Segmente, {} Punkte)",
            self.segments.len(),
            self.points.len()
        );
        Some(segment)
    }

    /// Entfernt alle Segmente.
    pub fn clear(&mut self) {
        let ids: Vec<SegmentId> = self.segments.keys().copied().collect();
        for id in ids {
            self.remove(id);
        }
    }

    // ── Interne Punkt-Verwaltung ────────────────────────────────

    fn create_point(&mut self, location: DVec2) -> PointId {
        let id = PointId::next();
        self.points
            .insert(id, ConnectionPoint::new(id, self.id, location));
        id
    }

    fn create_tracked_point(&mut self, location: DVec2, created: &mut Vec<PointId>) -> PointId {
        let id = self.create_point(location);
        created.push(id);
        id
    }

    /// Entfernt einen Punkt, wenn er keine Anschlüsse mehr hat.
    fn purge_point(&mut self, id: PointId) -> bool {
        if self
            .points
            .get(&id)
            .is_some_and(|cp| cp.connection_count() == 0)
        {
            self.points.remove(&id);
            return true;
        }
        false
    }

    /// Hängt ein Segment-Ende an einen anderen Punkt um.
    ///
    /// Löst es vom alten Punkt, zieht den Extrempunkt auf die neue Position
    /// und sortiert es dort nach Winkel ein. Leere alte Punkte bleiben stehen,
    /// damit Aufrufer sie bei einer Rücknahme wiederverwenden können.
    fn set_segment_point(&mut self, segment: SegmentId, end: SegmentEnd, point: PointId) -> Result<()> {
        let old = self
            .segments
            .get(&segment)
            .ok_or(GraphError::UnknownSegment(segment))?
            .slot(end);
        let location = self
            .points
            .get(&point)
            .ok_or(GraphError::UnknownPoint(point))?
            .location();
        if old == Some(point) {
            return Ok(());
        }

        if let Some(old) = old {
            if let Some(cp) = self.points.get_mut(&old) {
                cp.detach(segment, end);
            }
        }
        let seg = self
            .segments
            .get_mut(&segment)
            .ok_or(GraphError::UnknownSegment(segment))?;
        seg.set_slot(end, Some(point));
        seg.force_end_position(end, location);

        let cp = self
            .points
            .get_mut(&point)
            .ok_or(GraphError::UnknownPoint(point))?;
        cp.attach(segment, end, &self.segments)?;
        Ok(())
    }

    fn refresh_segment(&mut self, id: SegmentId) {
        if let Some(segment) = self.segments.get(&id) {
            self.spatial_index.refresh(id, segment.points());
        }
    }

    fn extend_bounds(&self, id: SegmentId) {
        if !self.bounds_valid.get() {
            return;
        }
        let Some(rect) = self.segments.get(&id).and_then(Segment::bounding_box) else {
            return;
        };
        let merged = match self.bounds.get() {
            Some(b) => b.union(&rect),
            None => rect,
        };
        self.bounds.set(Some(merged));
    }

    /// Löst ein Punkt-Handle in eine Punkt-ID dieses Graphen auf.
    pub(crate) fn resolve_handle(&self, handle: &PointHandle) -> Result<PointId> {
        let id = match handle {
            PointHandle::Raw(id) => *id,
            PointHandle::ArrivalAware { point, .. } => *point,
            PointHandle::Terminal(_) => return Err(GraphError::UnsupportedType(handle.kind())),
            PointHandle::Wrapped(w) => {
                if w.parent() != self.id {
                    return Err(GraphError::unexpected_graph(self.id, w.parent()));
                }
                w.point()
            }
        };
        if !self.points.contains_key(&id) {
            return Err(GraphError::UnknownPoint(id));
        }
        Ok(id)
    }

    // ── Abfragen ───────────────────────────────────────────────

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Anzahl lebender Verbindungspunkte.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.segments.contains_key(&id)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    /// Alle Segmente in Einfügereihenfolge.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.values()
    }

    pub fn segment_ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments.keys().copied()
    }

    pub fn connection_point(&self, id: PointId) -> Option<&ConnectionPoint> {
        self.points.get(&id)
    }

    pub fn connection_points(&self) -> impl Iterator<Item = &ConnectionPoint> + '_ {
        self.points.values()
    }

    /// Rohe Sicht auf einen Verbindungspunkt.
    pub fn point(&self, id: PointId) -> Option<PointRef<'_>> {
        self.points.get(&id).map(|cp| PointRef::new(self, cp, None))
    }

    /// Sicht auf einen Punkt, erreicht über `via`.
    pub fn point_via(&self, id: PointId, via: Connection) -> Option<PointRef<'_>> {
        self.points.get(&id).map(|cp| PointRef::new(self, cp, Some(via)))
    }

    /// Verbindungspunkt am Anfang des Segments, mit Ankunft über dessen Start.
    pub fn begin_point(&self, segment: SegmentId) -> Option<PointRef<'_>> {
        let p = self.segments.get(&segment)?.start_point()?;
        self.point_via(p, Connection::new(segment, SegmentEnd::Start))
    }

    /// Verbindungspunkt am Ende des Segments, mit Ankunft über dessen Ende.
    pub fn end_point(&self, segment: SegmentId) -> Option<PointRef<'_>> {
        let p = self.segments.get(&segment)?.end_point()?;
        self.point_via(p, Connection::new(segment, SegmentEnd::End))
    }

    /// Segment mit dem kleinsten Abstand zur Position.
    pub fn nearest_segment(&self, position: DVec2) -> Option<SegmentId> {
        self.spatial_index
            .nearest_segment(position, |id| {
                self.segments.get(&id).map(|s| s.distance(position))
            })
            .map(|(id, _)| id)
    }

    /// Verbindungspunkt mit dem kleinsten Abstand zur Position.
    pub fn nearest_connection(&self, position: DVec2) -> Option<PointId> {
        let m = self.spatial_index.nearest_endpoint_unbounded(position)?;
        self.segments.get(&m.segment)?.slot(m.end)
    }

    /// Segmente, deren Hüllrechteck das Rechteck schneidet.
    pub fn segments_in(&self, rect: &Rect) -> Vec<SegmentId> {
        self.spatial_index.within_rect(rect)
    }

    /// Verbindungspunkte innerhalb des Rechtecks, aufsteigend nach ID.
    pub fn connections_in(&self, rect: &Rect) -> Vec<PointId> {
        let mut ids: Vec<PointId> = self
            .spatial_index
            .endpoints_in_rect(rect)
            .into_iter()
            .filter_map(|(s, end)| self.segments.get(&s)?.slot(end))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Hüllrechteck aller Segmente, `None` bei leerem Graphen.
    pub fn bounding_box(&self) -> Option<Rect> {
        if !self.bounds_valid.get() {
            let rect = self
                .segments
                .values()
                .filter_map(Segment::bounding_box)
                .reduce(|a, b| a.union(&b));
            self.bounds.set(rect);
            self.bounds_valid.set(true);
        }
        self.bounds.get()
    }

    // ── Segment-Beziehungen ────────────────────────────────────

    /// Gemeinsamer Verbindungspunkt zweier Segmente.
    pub fn shared_connection_with(&self, a: SegmentId, b: SegmentId) -> Option<PointId> {
        let sa = self.segments.get(&a)?;
        let sb = self.segments.get(&b)?;
        [sa.start_point(), sa.end_point()]
            .into_iter()
            .flatten()
            .find(|p| sb.start_point() == Some(*p) || sb.end_point() == Some(*p))
    }

    pub fn is_connected_to(&self, a: SegmentId, b: SegmentId) -> bool {
        self.shared_connection_with(a, b).is_some()
    }

    /// Der Startpunkt von `a` ist ein Endpunkt von `b`.
    pub fn is_first_point_connected_to(&self, a: SegmentId, b: SegmentId) -> bool {
        self.end_connected_to(a, SegmentEnd::Start, b)
    }

    /// Der Endpunkt von `a` ist ein Endpunkt von `b`.
    pub fn is_last_point_connected_to(&self, a: SegmentId, b: SegmentId) -> bool {
        self.end_connected_to(a, SegmentEnd::End, b)
    }

    fn end_connected_to(&self, a: SegmentId, end: SegmentEnd, b: SegmentId) -> bool {
        let (Some(sa), Some(sb)) = (self.segments.get(&a), self.segments.get(&b)) else {
            return false;
        };
        sa.slot(end)
            .is_some_and(|p| sb.start_point() == Some(p) || sb.end_point() == Some(p))
    }

    /// Darf das Segment vom Punkt aus befahren werden?
    pub fn is_traversable_from(&self, segment: SegmentId, point: PointId) -> bool {
        let Some(s) = self.segments.get(&segment) else {
            return false;
        };
        let direction = s.traffic_direction();
        (s.start_point() == Some(point) && direction.allows_forward())
            || (s.end_point() == Some(point) && direction.allows_backward())
    }

    pub fn other_side_point(&self, segment: SegmentId, point: PointId) -> Option<PointId> {
        self.segments.get(&segment)?.other_side_point(point)
    }

    /// Kette über alle Punkte mit genau zwei Anschlüssen.
    ///
    /// `forward` läuft ab dem Endpunkt, `backward` ab dem Startpunkt des
    /// Segments. Die Kette enthält jedes Segment höchstens einmal.
    pub fn segment_chain(&self, segment: SegmentId, forward: bool, backward: bool) -> Result<RoadPath> {
        let first = self
            .segments
            .get(&segment)
            .ok_or(GraphError::UnknownSegment(segment))?;
        let mut path = RoadPath::new();
        path.push_back(first);

        if forward {
            self.walk_chain(&mut path, segment, first.end_point(), true);
        }
        if backward {
            self.walk_chain(&mut path, segment, first.start_point(), false);
        }
        Ok(path)
    }

    fn walk_chain(&self, path: &mut RoadPath, from: SegmentId, at: Option<PointId>, append: bool) {
        let mut current = from;
        let mut at = at;
        while let Some(p) = at {
            let Some(next) = self
                .points
                .get(&p)
                .and_then(|cp| cp.other_side_segment(current))
            else {
                break;
            };
            let Some(next_segment) = self.segments.get(&next) else {
                break;
            };
            let added = if append {
                path.push_back(next_segment)
            } else {
                path.push_front(next_segment)
            };
            if !added {
                break;
            }
            current = next;
            at = next_segment.other_side_point(p);
        }
    }

    // ── Cursor ─────────────────────────────────────────────────

    /// Abgekoppelter Cursor über die Anschlüsse eines Punkts.
    pub fn cursor(&self, point: PointId, rotation: Rotation, bounds: &AdjacencyBounds) -> Result<AdjacencyCursor> {
        let cp = self
            .points
            .get(&point)
            .ok_or(GraphError::UnknownPoint(point))?;
        let ascending = is_ascending(rotation, self.options.coordinate_system);
        Ok(AdjacencyCursor::new(cp, ascending, bounds))
    }

    // ── Listener ───────────────────────────────────────────────

    pub fn subscribe(&mut self, callback: impl FnMut(&GraphEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
