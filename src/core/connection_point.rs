//! Verbindungspunkt mit winkelsortierter Adjazenzliste.
//!
//! Jeder Eintrag ist ein [`Connection`]: ein angeschlossenes Segment plus das
//! Ende, mit dem es hier anliegt. Die Einträge sind aufsteigend nach dem
//! Anschlusswinkel (siehe [`attachment_angle`]) sortiert. Ein Segment, das mit
//! beiden Enden am selben Punkt hängt (Schleife), belegt zwei Einträge; weitere
//! Anschlüsse, deren Winkel zwischen den beiden Schleifenwinkeln liegt, werden
//! innerhalb der Schleife einsortiert.
//!
//! Jede Änderung der Adjazenz erhöht den Generationszähler. Cursor merken sich
//! die Generation bei ihrer Erzeugung und erkennen so fremde Änderungen.

use std::cmp::Ordering;

use glam::DVec2;
use indexmap::IndexMap;

use super::geometry::attachment_angle;
use super::{Connection, GraphError, GraphId, PointId, Result, Segment, SegmentEnd, SegmentId};

/// Ein gemeinsamer Endpunkt mehrerer Segmente.
#[derive(Debug, Clone)]
pub struct ConnectionPoint {
    id: PointId,
    graph: GraphId,
    location: DVec2,
    connections: Vec<Connection>,
    generation: u64,
}

impl ConnectionPoint {
    pub(crate) fn new(id: PointId, graph: GraphId, location: DVec2) -> Self {
        Self {
            id,
            graph,
            location,
            connections: Vec::new(),
            generation: 0,
        }
    }

    pub fn id(&self) -> PointId {
        self.id
    }

    /// Graph, in dem dieser Punkt lebt.
    pub fn graph(&self) -> GraphId {
        self.graph
    }

    pub fn location(&self) -> DVec2 {
        self.location
    }

    /// Zähler, der bei jeder Adjazenz-Änderung steigt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Alle Einträge in Speicherreihenfolge (aufsteigender Winkel).
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connection(&self, index: usize) -> Option<Connection> {
        self.connections.get(index).copied()
    }

    pub fn connected_segment(&self, index: usize) -> Option<SegmentId> {
        self.connections.get(index).map(|c| c.segment)
    }

    pub fn is_connected_segment(&self, segment: SegmentId) -> bool {
        self.connections.iter().any(|c| c.segment == segment)
    }

    /// Sackgasse: höchstens ein Anschluss.
    pub fn is_cul_de_sac(&self) -> bool {
        self.connections.len() <= 1
    }

    /// Das andere Segment an einem Punkt mit genau zwei Anschlüssen.
    pub fn other_side_segment(&self, segment: SegmentId) -> Option<SegmentId> {
        match self.connections.as_slice() {
            [a, b] if a.segment == segment => Some(b.segment),
            [a, b] if b.segment == segment => Some(a.segment),
            _ => None,
        }
    }

    /// Index des Eintrags für Segment und (optional) Ende.
    pub fn index_of(&self, segment: SegmentId, end: Option<SegmentEnd>) -> Option<usize> {
        self.connections.iter().position(|c| c.matches(segment, end))
    }

    /// Positionsgleichheit innerhalb der quadrierten Toleranz.
    pub fn same_location(&self, other: &ConnectionPoint, epsilon_sq: f64) -> bool {
        self.location.distance_squared(other.location) <= epsilon_sq
    }

    /// Ordnung nach Position: gleich innerhalb der Toleranz, sonst x, dann y.
    pub fn cmp_location(&self, other: &ConnectionPoint, epsilon_sq: f64) -> Ordering {
        if self.same_location(other, epsilon_sq) {
            return Ordering::Equal;
        }
        self.location
            .x
            .total_cmp(&other.location.x)
            .then(self.location.y.total_cmp(&other.location.y))
    }

    pub(crate) fn set_location(&mut self, location: DVec2) {
        self.location = location;
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    // ── Einfügen / Entfernen ───────────────────────────────────

    /// Hängt einen Anschluss an seiner Winkelposition ein.
    ///
    /// Der Slot `end` des Segments muss bereits auf diesen Punkt zeigen.
    pub(crate) fn attach(
        &mut self,
        segment: SegmentId,
        end: SegmentEnd,
        segments: &IndexMap<SegmentId, Segment>,
    ) -> Result<usize> {
        let index = if self.connections.is_empty() {
            // Winkel trotzdem prüfen, damit entartete Segmente nie angeschlossen werden
            self.angle_of(segment, end, segments)?;
            0
        } else {
            let angle = self.angle_of(segment, end, segments)?;
            self.search_insertion_index(angle, 0, self.connections.len() - 1, segments)?
        };
        self.connections.insert(index, Connection::new(segment, end));
        self.touch();
        Ok(index)
    }

    /// Entfernt den Eintrag und liefert seinen bisherigen Index.
    pub(crate) fn detach(&mut self, segment: SegmentId, end: SegmentEnd) -> Option<usize> {
        let index = self.index_of(segment, Some(end))?;
        self.connections.remove(index);
        self.touch();
        Some(index)
    }

    /// Anschlusswinkel eines Segment-Endes an diesem Punkt.
    pub(crate) fn angle_of(
        &self,
        segment: SegmentId,
        end: SegmentEnd,
        segments: &IndexMap<SegmentId, Segment>,
    ) -> Result<f64> {
        let seg = segments
            .get(&segment)
            .ok_or(GraphError::UnknownSegment(segment))?;
        if seg.slot(end) != Some(self.id) {
            return Err(GraphError::NotConnectedAt {
                segment,
                end,
                point: self.id,
            });
        }
        let toward = seg
            .second_point_from(end)
            .ok_or(GraphError::NotEnoughPoints(seg.point_count()))?;
        attachment_angle(self.location, toward).ok_or(GraphError::DegenerateAngle {
            segment,
            point: self.id,
        })
    }

    /// Sucht die Einfügeposition für `base` im Bereich `start..=end`.
    ///
    /// Schleifen belegen zwei Einträge. Liegt `base` zwischen ihren Winkeln,
    /// wird rekursiv nur zwischen den beiden Einträgen gesucht; liegt es
    /// darüber, geht die Suche hinter dem zweiten Eintrag weiter.
    fn search_insertion_index(
        &self,
        base: f64,
        start: usize,
        end: usize,
        segments: &IndexMap<SegmentId, Segment>,
    ) -> Result<usize> {
        let Some(last) = self.connections.len().checked_sub(1) else {
            return Ok(0);
        };
        let e_idx = end.min(last);

        let mut idx = start;
        while idx <= e_idx {
            let entry = self.connections[idx];
            // Entfernte Segmente gelten als leerer Slot
            let Some(existing) = segments.get(&entry.segment) else {
                idx += 1;
                continue;
            };

            let at_start = existing.start_point() == Some(self.id);
            let at_end = existing.end_point() == Some(self.id);

            let angle = match (at_start, at_end) {
                (true, true) => {
                    let a = self.angle_of(entry.segment, SegmentEnd::Start, segments)?;
                    let b = self.angle_of(entry.segment, SegmentEnd::End, segments)?;
                    let (low, high) = if a <= b { (a, b) } else { (b, a) };

                    if base <= low {
                        return Ok(idx);
                    }

                    let other = self.connections[idx + 1..=e_idx]
                        .iter()
                        .position(|c| c.segment == entry.segment)
                        .map(|offset| idx + 1 + offset);

                    if base >= high {
                        idx = other.map_or(idx + 1, |o| o + 1);
                        continue;
                    }

                    let inner_end = other.unwrap_or(e_idx + 1);
                    if inner_end <= idx + 1 {
                        return Ok(idx + 1);
                    }
                    return self.search_insertion_index(base, idx + 1, inner_end - 1, segments);
                }
                (true, false) => self.angle_of(entry.segment, SegmentEnd::Start, segments)?,
                (false, true) => self.angle_of(entry.segment, SegmentEnd::End, segments)?,
                (false, false) => {
                    idx += 1;
                    continue;
                }
            };

            if base <= angle {
                return Ok(idx);
            }
            idx += 1;
        }

        Ok(e_idx + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    /// Baut einen Punkt bei `center` und hängt Segmente mit den gegebenen
    /// zweiten Punkten an (jeweils mit dem Start-Ende).
    fn star(center: DVec2, targets: &[DVec2]) -> (ConnectionPoint, IndexMap<SegmentId, Segment>) {
        let graph = GraphId(99);
        let pid = PointId(1);
        let mut point = ConnectionPoint::new(pid, graph, center);
        let mut segments = IndexMap::new();
        for (i, t) in targets.iter().enumerate() {
            let sid = SegmentId(i as u64 + 1);
            let mut seg = Segment::new([center, *t]);
            seg.set_slot(SegmentEnd::Start, Some(pid));
            segments.insert(sid, seg);
            point
                .attach(sid, SegmentEnd::Start, &segments)
                .expect("Anschluss muss gelingen");
        }
        (point, segments)
    }

    fn angles(point: &ConnectionPoint, segments: &IndexMap<SegmentId, Segment>) -> Vec<f64> {
        point
            .connections()
            .iter()
            .map(|c| point.angle_of(c.segment, c.end, segments).unwrap())
            .collect()
    }

    #[test]
    fn test_fuenf_segmente_werden_nach_winkel_sortiert() {
        let (point, segments) = star(
            DVec2::ZERO,
            &[
                DVec2::new(100.0, 0.0),
                DVec2::new(50.0, -100.0),
                DVec2::new(0.0, -5.0),
                DVec2::new(-20.0, 4.0),
                DVec2::new(50.0, 100.0),
            ],
        );

        let a = angles(&point, &segments);
        assert_eq!(a.len(), 5);
        assert!(a.windows(2).all(|w| w[0] <= w[1]), "Winkel unsortiert: {a:?}");
        assert_eq!(point.generation(), 5);
        assert!(!point.is_cul_de_sac());
    }

    #[test]
    fn test_entfernen_liefert_index_und_erhoeht_generation() {
        let (mut point, _segments) = star(
            DVec2::ZERO,
            &[DVec2::new(1.0, 0.0), DVec2::new(-1.0, 0.0)],
        );
        let g = point.generation();
        let idx = point.detach(SegmentId(2), SegmentEnd::Start);
        assert_eq!(idx, Some(1));
        assert_eq!(point.generation(), g + 1);
        assert_eq!(point.detach(SegmentId(2), SegmentEnd::Start), None);
        assert!(point.is_cul_de_sac());
    }

    #[test]
    fn test_anderes_segment_nur_bei_zwei_anschluessen() {
        let (point, _) = star(DVec2::ZERO, &[DVec2::X, DVec2::Y]);
        assert_eq!(point.other_side_segment(SegmentId(1)), Some(SegmentId(2)));
        assert_eq!(point.other_side_segment(SegmentId(2)), Some(SegmentId(1)));
        assert_eq!(point.other_side_segment(SegmentId(3)), None);

        let (point, _) = star(DVec2::ZERO, &[DVec2::X, DVec2::Y, DVec2::NEG_X]);
        assert_eq!(point.other_side_segment(SegmentId(1)), None);
    }

    #[test]
    fn test_entarteter_winkel_wird_abgelehnt() {
        let pid = PointId(1);
        let mut point = ConnectionPoint::new(pid, GraphId(1), DVec2::ZERO);
        let mut segments = IndexMap::new();
        let mut seg = Segment::new([DVec2::ZERO, DVec2::ZERO]);
        seg.set_slot(SegmentEnd::Start, Some(pid));
        segments.insert(SegmentId(1), seg);

        let err = point
            .attach(SegmentId(1), SegmentEnd::Start, &segments)
            .unwrap_err();
        assert!(matches!(err, GraphError::DegenerateAngle { .. }));
        assert_eq!(point.connection_count(), 0);
    }

    #[test]
    fn test_falsches_ende_wird_abgelehnt() {
        let pid = PointId(1);
        let mut point = ConnectionPoint::new(pid, GraphId(1), DVec2::ZERO);
        let mut segments = IndexMap::new();
        let mut seg = Segment::new([DVec2::ZERO, DVec2::X]);
        seg.set_slot(SegmentEnd::Start, Some(pid));
        segments.insert(SegmentId(1), seg);

        let err = point
            .attach(SegmentId(1), SegmentEnd::End, &segments)
            .unwrap_err();
        assert!(matches!(err, GraphError::NotConnectedAt { .. }));
    }

    #[test]
    fn test_schleife_umschliesst_dazwischenliegende_anschluesse() {
        let pid = PointId(1);
        let mut point = ConnectionPoint::new(pid, GraphId(1), DVec2::ZERO);
        let mut segments = IndexMap::new();

        // Schleife: verlässt den Punkt bei ~0 rad und kehrt bei ~π/2 (Bildschirm) zurück
        let mut lp = Segment::new([
            DVec2::ZERO,
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, -10.0),
            DVec2::new(0.0, -10.0),
            DVec2::ZERO,
        ]);
        lp.set_slot(SegmentEnd::Start, Some(pid));
        lp.set_slot(SegmentEnd::End, Some(pid));
        segments.insert(SegmentId(1), lp);
        point.attach(SegmentId(1), SegmentEnd::Start, &segments).unwrap();
        point.attach(SegmentId(1), SegmentEnd::End, &segments).unwrap();

        // Anschluss mit Winkel π/4 liegt innerhalb der Schleife
        let mut inner = Segment::new([DVec2::ZERO, DVec2::new(5.0, -5.0)]);
        inner.set_slot(SegmentEnd::Start, Some(pid));
        segments.insert(SegmentId(2), inner);
        let idx = point.attach(SegmentId(2), SegmentEnd::Start, &segments).unwrap();
        assert_eq!(idx, 1);

        // Anschluss mit Winkel π liegt hinter der Schleife
        let mut outer = Segment::new([DVec2::ZERO, DVec2::new(-5.0, 0.0)]);
        outer.set_slot(SegmentEnd::Start, Some(pid));
        segments.insert(SegmentId(3), outer);
        let idx = point.attach(SegmentId(3), SegmentEnd::Start, &segments).unwrap();
        assert_eq!(idx, 3);

        let a = angles(&point, &segments);
        assert!(a.windows(2).all(|w| w[0] <= w[1]), "Winkel unsortiert: {a:?}");
        assert!(a.iter().all(|x| (0.0..TAU).contains(x)));
        assert_relative_eq!(a[1], std::f64::consts::FRAC_PI_4);
    }

    #[test]
    fn test_ueberlappende_schleifen_bleiben_verschachtelt() {
        let pid = PointId(1);
        let mut point = ConnectionPoint::new(pid, GraphId(1), DVec2::ZERO);
        let mut segments = IndexMap::new();
        let polyline = |pts: Vec<(f64, f64)>| Segment::new(pts.into_iter().map(|(x, y)| DVec2::new(x, y)));

        // Schleife 1 von 0 nach π, Schleife 2 von π/2 nach 3π/2, dazu ein Arm bei ~4,25 rad
        let mut loop1 = polyline(vec![(0.0, 0.0), (10.0, 0.0), (10.0, -10.0), (-10.0, -10.0), (-10.0, 0.0), (0.0, 0.0)]);
        let mut loop2 = polyline(vec![(0.0, 0.0), (0.0, -10.0), (20.0, -20.0), (20.0, 20.0), (0.0, 10.0), (0.0, 0.0)]);
        let mut arm = polyline(vec![(0.0, 0.0), (-10.0, 20.0)]);
        for s in [&mut loop1, &mut loop2] {
            s.set_slot(SegmentEnd::Start, Some(pid));
            s.set_slot(SegmentEnd::End, Some(pid));
        }
        arm.set_slot(SegmentEnd::Start, Some(pid));
        segments.insert(SegmentId(1), loop1);
        segments.insert(SegmentId(2), loop2);
        segments.insert(SegmentId(3), arm);

        for (sid, end) in [
            (1, SegmentEnd::Start),
            (1, SegmentEnd::End),
            (2, SegmentEnd::Start),
            (2, SegmentEnd::End),
            (3, SegmentEnd::Start),
        ] {
            point.attach(SegmentId(sid), end, &segments).unwrap();
        }

        let order: Vec<(u64, SegmentEnd)> = point
            .connections()
            .iter()
            .map(|c| (c.segment.0, c.end))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, SegmentEnd::Start),
                (2, SegmentEnd::Start),
                (1, SegmentEnd::End),
                (2, SegmentEnd::End),
                (3, SegmentEnd::Start),
            ]
        );
        // Der Arm liegt innerhalb der zweiten Schleife und landet hinter ihrem Rückweg
        let a = angles(&point, &segments);
        assert!(a[4] < a[3], "Winkel: {a:?}");
    }

    #[test]
    fn test_positionsvergleich_mit_toleranz() {
        let a = ConnectionPoint::new(PointId(1), GraphId(1), DVec2::new(1.0, 2.0));
        let b = ConnectionPoint::new(PointId(2), GraphId(1), DVec2::new(1.0, 2.0 + 1e-7));
        let c = ConnectionPoint::new(PointId(3), GraphId(1), DVec2::new(0.0, 5.0));
        assert!(a.same_location(&b, 1e-10));
        assert_eq!(a.cmp_location(&b, 1e-10), Ordering::Equal);
        assert_eq!(a.cmp_location(&c, 1e-10), Ordering::Greater);
        assert_eq!(c.cmp_location(&a, 1e-10), Ordering::Less);
    }
}
