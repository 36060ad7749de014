//! Manuelle Topologie-Änderungen: Punkte verschmelzen, Enden umhängen,
//! Anschlüsse abspalten und Segmente bearbeiten.

use glam::DVec2;

use super::Graph;
use crate::core::events::GraphEvent;
use crate::core::{Connection, GraphError, PointHandle, PointId, Result, Segment, SegmentEnd, SegmentId};

impl Graph {
    /// Verschmilzt mehrere Verbindungspunkte zu einem neuen Punkt im Schwerpunkt.
    ///
    /// Keine Punkte ergeben `None`, ein einzelner Punkt wird unverändert
    /// zurückgegeben. Scheitert das Umhängen eines Anschlusses, werden alle
    /// bereits umgehängten Anschlüsse zurückgesetzt.
    pub fn merge_connections(&mut self, handles: &[PointHandle]) -> Result<Option<PointId>> {
        let mut ids: Vec<PointId> = Vec::with_capacity(handles.len());
        for handle in handles {
            let id = self.resolve_handle(handle)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        match ids.as_slice() {
            [] => return Ok(None),
            [single] => return Ok(Some(*single)),
            _ => {}
        }

        let mut sum = DVec2::ZERO;
        let mut snapshot: Vec<(Connection, PointId)> = Vec::new();
        for id in &ids {
            let cp = self.points.get(id).ok_or(GraphError::UnknownPoint(*id))?;
            sum += cp.location();
            snapshot.extend(cp.connections().iter().map(|c| (*c, *id)));
        }
        let barycenter = sum / ids.len() as f64;
        let merged = self.create_point(barycenter);

        for (index, (connection, _)) in snapshot.iter().enumerate() {
            if let Err(e) = self.set_segment_point(connection.segment, connection.end, merged) {
                log::warn!("Verschmelzen fehlgeschlagen, Rücknahme: {e}");
                let mut failed = 0;
                for (moved, origin) in snapshot[..=index].iter().rev() {
                    let undo = self.set_segment_point(moved.segment, moved.end, *origin);
                    failed += log_failed_undo(undo, *moved);
                }
                // Winkel erst mit vollständig zurückgesetzter Geometrie neu sortieren
                for (moved, _) in &snapshot[..=index] {
                    failed += log_failed_undo(self.reattach_ends(moved.segment), *moved);
                }
                self.purge_point(merged);
                return Err(GraphError::after_rollback(e, failed));
            }
        }

        for id in &ids {
            self.purge_point(*id);
        }
        let mut touched: Vec<SegmentId> = snapshot.iter().map(|(c, _)| c.segment).collect();
        touched.sort_unstable();
        touched.dedup();
        self.segments_changed(&touched);
        log::debug!(
            "{} Punkte zu {merged} verschmolzen ({} Anschlüsse)",
            ids.len(),
            snapshot.len()
        );
        Ok(Some(merged))
    }

    /// Hängt den Start eines Segments an einen Punkt.
    ///
    /// Ohne Punkt wird ein neuer an `position` (sonst am bisherigen
    /// Startpunkt) erzeugt.
    pub fn connect_segment_start_point(
        &mut self,
        point: Option<PointHandle>,
        segment: SegmentId,
        position: Option<DVec2>,
    ) -> Result<PointId> {
        self.connect_segment_end(SegmentEnd::Start, point, segment, position)
    }

    /// Hängt das Ende eines Segments an einen Punkt.
    pub fn connect_segment_end_point(
        &mut self,
        point: Option<PointHandle>,
        segment: SegmentId,
        position: Option<DVec2>,
    ) -> Result<PointId> {
        self.connect_segment_end(SegmentEnd::End, point, segment, position)
    }

    fn connect_segment_end(
        &mut self,
        end: SegmentEnd,
        point: Option<PointHandle>,
        segment: SegmentId,
        position: Option<DVec2>,
    ) -> Result<PointId> {
        let seg = self
            .segments
            .get(&segment)
            .ok_or(GraphError::UnknownSegment(segment))?;
        let old = seg.slot(end);
        let fallback = seg.end_point_position(end);

        let (target, created) = match point {
            Some(handle) => (self.resolve_handle(&handle)?, false),
            None => {
                let location = position
                    .or(fallback)
                    .ok_or(GraphError::NotEnoughPoints(0))?;
                (self.create_point(location), true)
            }
        };

        if let Err(e) = self.set_segment_point(segment, end, target) {
            log::warn!("Umhängen von {segment} ({end:?}) abgelehnt: {e}");
            let mut failed = 0;
            if let Some(old) = old {
                let undo = self.set_segment_point(segment, end, old);
                failed += log_failed_undo(undo, Connection::new(segment, end));
            }
            if created {
                self.purge_point(target);
            }
            return Err(GraphError::after_rollback(e, failed));
        }

        if let Some(old) = old {
            self.purge_point(old);
        }
        self.segments_changed(&[segment]);
        log::debug!("{segment} ({end:?}) an {target} angeschlossen");
        Ok(target)
    }

    /// Löst einen Anschluss von seinem Punkt und gibt ihm einen eigenen Punkt
    /// an derselben Position.
    ///
    /// Ist es der einzige Anschluss, bleibt alles unverändert.
    pub fn split_connection(&mut self, point: PointId, connection: Connection) -> Result<PointId> {
        let cp = self
            .points
            .get(&point)
            .ok_or(GraphError::UnknownPoint(point))?;
        if cp.index_of(connection.segment, Some(connection.end)).is_none() {
            return Err(GraphError::NotConnectedAt {
                segment: connection.segment,
                end: connection.end,
                point,
            });
        }
        if cp.connection_count() == 1 {
            return Ok(point);
        }

        let location = cp.location();
        let split = self.create_point(location);
        if let Err(e) = self.set_segment_point(connection.segment, connection.end, split) {
            let undo = self.set_segment_point(connection.segment, connection.end, point);
            let failed = log_failed_undo(undo, connection);
            self.purge_point(split);
            return Err(GraphError::after_rollback(e, failed));
        }
        self.segments_changed(&[connection.segment]);
        log::debug!("{} von {point} abgespalten zu {split}", connection.segment);
        Ok(split)
    }

    /// Bearbeitet ein angeschlossenes Segment.
    ///
    /// Endpunkte bleiben an ihren Verbindungspunkten. Ändern sich die
    /// Zwischenpunkte, werden beide Enden neu nach Winkel einsortiert; ist
    /// ein Winkel danach nicht definiert, wird die Geometrie zurückgesetzt.
    pub fn update_segment<R>(&mut self, id: SegmentId, edit: impl FnOnce(&mut Segment) -> R) -> Result<R> {
        let seg = self
            .segments
            .get_mut(&id)
            .ok_or(GraphError::UnknownSegment(id))?;
        let before = seg.points().to_vec();
        let result = edit(seg);

        if seg.points() != before.as_slice() {
            if let Err(e) = self.reattach_ends(id) {
                log::warn!("Geometrie von {id} zurückgesetzt: {e}");
                if let Some(seg) = self.segments.get_mut(&id) {
                    seg.replace_points(before);
                }
                let undo = self.reattach_ends(id);
                let failed = log_failed_undo(undo, Connection::new(id, SegmentEnd::Start));
                return Err(GraphError::after_rollback(e, failed));
            }
        }

        self.segments_changed(&[id]);
        Ok(result)
    }

    /// Sortiert beide Enden eines Segments an ihren Punkten neu ein.
    fn reattach_ends(&mut self, id: SegmentId) -> Result<()> {
        let seg = self.segments.get(&id).ok_or(GraphError::UnknownSegment(id))?;
        let slots = [
            (SegmentEnd::Start, seg.start_point()),
            (SegmentEnd::End, seg.end_point()),
        ];
        for (end, slot) in slots {
            if let Some(cp) = slot.and_then(|p| self.points.get_mut(&p)) {
                cp.detach(id, end);
            }
        }
        for (end, slot) in slots {
            let Some(p) = slot else { continue };
            let cp = self.points.get_mut(&p).ok_or(GraphError::UnknownPoint(p))?;
            cp.attach(id, end, &self.segments)?;
        }
        Ok(())
    }

    /// Spatial-Index und Hüllrechteck nachziehen, Änderung melden.
    fn segments_changed(&mut self, ids: &[SegmentId]) {
        for id in ids {
            self.refresh_segment(*id);
        }
        self.bounds_valid.set(false);
        for id in ids {
            self.listeners.emit(&GraphEvent::SegmentChanged(*id));
        }
    }
}

/// Protokolliert einen gescheiterten Rücknahme-Schritt; liefert 1 bei Fehler.
fn log_failed_undo(undo: Result<()>, connection: Connection) -> usize {
    match undo {
        Ok(()) => 0,
        Err(e) => {
            log::error!(
                "Rücknahme für {} ({:?}) gescheitert: {e}",
                connection.segment,
                connection.end
            );
            1
        }
    }
}
