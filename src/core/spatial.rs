//! Spatial-Index (R-Tree) für Segment-Endpunkte und Segment-Hüllrechtecke.
//!
//! Endpunkte dienen der Fusion beim Einfügen und der Suche nach dem nächsten
//! Verbindungspunkt; Hüllrechtecke der Bereichs- und Nächstes-Segment-Suche.

use std::collections::HashMap;

use glam::DVec2;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use super::geometry::Rect;
use super::{SegmentEnd, SegmentId};

type EndpointEntry = GeomWithData<[f64; 2], (SegmentId, SegmentEnd)>;
type EnvelopeEntry = GeomWithData<Rectangle<[f64; 2]>, SegmentId>;

/// Ergebnis einer Endpunkt-Abfrage gegen den Spatial-Index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialMatch {
    /// Segment, dessen Endpunkt gefunden wurde
    pub segment: SegmentId,
    /// Welches Ende des Segments
    pub end: SegmentEnd,
    /// Euklidische Distanz zum Suchpunkt
    pub distance: f64,
}

/// Nachbarn eines neu eingefügten Segments innerhalb des Fusionsabstands.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FusionNeighbors {
    /// Nächster fremder Endpunkt am ersten Punkt
    pub near_first: Option<SpatialMatch>,
    /// Nächster fremder Endpunkt am letzten Punkt
    pub near_last: Option<SpatialMatch>,
}

#[derive(Debug, Clone)]
struct IndexedSegment {
    envelope: EnvelopeEntry,
    first: EndpointEntry,
    last: EndpointEntry,
}

/// Inkrementeller Spatial-Index über allen Segmenten eines Graphen.
#[derive(Clone)]
pub struct SpatialIndex {
    endpoints: RTree<EndpointEntry>,
    envelopes: RTree<EnvelopeEntry>,
    entries: HashMap<SegmentId, IndexedSegment>,
}

fn to_array(p: DVec2) -> [f64; 2] {
    [p.x, p.y]
}

impl SpatialIndex {
    /// Erstellt einen leeren Spatial-Index.
    pub fn empty() -> Self {
        Self {
            endpoints: RTree::new(),
            envelopes: RTree::new(),
            entries: HashMap::new(),
        }
    }

    /// Gibt die Anzahl indexierter Segmente zurück.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Gibt `true` zurück, wenn keine Segmente im Index liegen.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Fügt ein Segment ein und liefert die nächsten fremden Endpunkte
    /// innerhalb von `fusion_distance` um seinen ersten und letzten Punkt.
    ///
    /// Ein bereits indexiertes Segment wird nur neu eingetragen.
    pub fn insert(&mut self, id: SegmentId, points: &[DVec2], fusion_distance: f64) -> FusionNeighbors {
        self.remove(id);
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return FusionNeighbors::default();
        };

        let neighbors = FusionNeighbors {
            near_first: self.nearest_endpoint(*first, fusion_distance),
            near_last: self.nearest_endpoint(*last, fusion_distance),
        };
        self.add_entry(id, points);
        neighbors
    }

    /// Trägt die aktuelle Geometrie eines Segments ohne Nachbarsuche neu ein.
    pub fn refresh(&mut self, id: SegmentId, points: &[DVec2]) {
        self.remove(id);
        self.add_entry(id, points);
    }

    fn add_entry(&mut self, id: SegmentId, points: &[DVec2]) {
        let (Some(first), Some(last), Some(rect)) =
            (points.first(), points.last(), Rect::from_points(points))
        else {
            return;
        };

        let entry = IndexedSegment {
            envelope: GeomWithData::new(
                Rectangle::from_corners(to_array(rect.min), to_array(rect.max)),
                id,
            ),
            first: GeomWithData::new(to_array(*first), (id, SegmentEnd::Start)),
            last: GeomWithData::new(to_array(*last), (id, SegmentEnd::End)),
        };
        self.envelopes.insert(entry.envelope);
        self.endpoints.insert(entry.first);
        self.endpoints.insert(entry.last);
        self.entries.insert(id, entry);
    }

    /// Entfernt ein Segment. `false`, wenn es nicht indexiert war.
    pub fn remove(&mut self, id: SegmentId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        self.envelopes.remove(&entry.envelope);
        self.endpoints.remove(&entry.first);
        self.endpoints.remove(&entry.last);
        true
    }

    /// Nächster Endpunkt innerhalb von `max_distance`.
    pub fn nearest_endpoint(&self, query: DVec2, max_distance: f64) -> Option<SpatialMatch> {
        self.endpoints_within_radius(query, max_distance)
            .into_iter()
            .next()
    }

    /// Alle Endpunkte innerhalb eines Radius, aufsteigend nach Distanz.
    pub fn endpoints_within_radius(&self, query: DVec2, radius: f64) -> Vec<SpatialMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }

        let q = to_array(query);
        let mut results = self
            .endpoints
            .locate_within_distance(q, radius * radius)
            .map(|entry| {
                let (segment, end) = entry.data;
                SpatialMatch {
                    segment,
                    end,
                    distance: query.distance(DVec2::from_array(*entry.geom())),
                }
            })
            .collect::<Vec<_>>();

        // Gleichstand deterministisch über die Segment-ID auflösen
        results.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.segment.cmp(&b.segment))
                .then(a.end.cmp(&b.end))
        });
        results
    }

    /// Nächster Endpunkt ohne Radiusgrenze.
    pub fn nearest_endpoint_unbounded(&self, query: DVec2) -> Option<SpatialMatch> {
        let entry = self.endpoints.nearest_neighbor(&to_array(query))?;
        let (segment, end) = entry.data;
        Some(SpatialMatch {
            segment,
            end,
            distance: query.distance(DVec2::from_array(*entry.geom())),
        })
    }

    /// Nächstes Segment nach exaktem Abstand.
    ///
    /// Die Hüllrechtecke liefern Kandidaten in aufsteigender Mindestdistanz;
    /// `exact` berechnet den echten Abstand zur Polylinie.
    pub fn nearest_segment(
        &self,
        query: DVec2,
        exact: impl Fn(SegmentId) -> Option<f64>,
    ) -> Option<(SegmentId, f64)> {
        let mut best: Option<(SegmentId, f64)> = None;
        for (entry, lower_bound_sq) in self
            .envelopes
            .nearest_neighbor_iter_with_distance_2(&to_array(query))
        {
            if let Some((_, best_distance)) = best {
                if lower_bound_sq > best_distance * best_distance {
                    break;
                }
            }
            let Some(distance) = exact(entry.data) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((id, d)) => distance < d || (distance == d && entry.data < id),
            };
            if better {
                best = Some((entry.data, distance));
            }
        }
        best
    }

    /// Alle Segmente, deren Hüllrechteck das Rechteck schneidet.
    pub fn within_rect(&self, rect: &Rect) -> Vec<SegmentId> {
        if self.is_empty() {
            return Vec::new();
        }
        let envelope = AABB::from_corners(to_array(rect.min), to_array(rect.max));
        let mut ids: Vec<SegmentId> = self
            .envelopes
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Endpunkte innerhalb eines Rechtecks.
    pub fn endpoints_in_rect(&self, rect: &Rect) -> Vec<(SegmentId, SegmentEnd)> {
        if self.is_empty() {
            return Vec::new();
        }
        let envelope = AABB::from_corners(to_array(rect.min), to_array(rect.max));
        self.endpoints
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .collect()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("segments", &self.entries.len())
            .field("endpoints", &self.endpoints.size())
            .finish()
    }
}
