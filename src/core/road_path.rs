//! Zusammenhängende, duplikatfreie Folge von Segmenten.

use super::{PointId, Segment, SegmentId};

/// Geordneter Straßenpfad zwischen zwei Verbindungspunkten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadPath {
    segments: Vec<SegmentId>,
    starting_point: Option<PointId>,
    ending_point: Option<PointId>,
    length: f64,
}

impl RoadPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Gesamtlänge aller enthaltenen Segmente.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn starting_point(&self) -> Option<PointId> {
        self.starting_point
    }

    pub fn ending_point(&self) -> Option<PointId> {
        self.ending_point
    }

    pub fn first_segment(&self) -> Option<SegmentId> {
        self.segments.first().copied()
    }

    pub fn last_segment(&self) -> Option<SegmentId> {
        self.segments.last().copied()
    }

    pub fn contains(&self, segment: SegmentId) -> bool {
        self.segments.contains(&segment)
    }

    /// Hängt ein Segment am Pfadende an.
    ///
    /// Scheitert bei freistehenden oder bereits enthaltenen Segmenten und
    /// wenn das Segment nicht am Endpunkt des Pfads anliegt.
    pub fn push_back(&mut self, segment: &Segment) -> bool {
        let Some(id) = segment.id() else {
            return false;
        };
        if self.contains(id) {
            return false;
        }
        if self.segments.is_empty() {
            self.starting_point = segment.start_point();
            self.ending_point = segment.end_point();
        } else {
            let Some(ending) = self.ending_point else {
                return false;
            };
            let Some(next) = segment.other_side_point(ending) else {
                return false;
            };
            self.ending_point = Some(next);
        }
        self.segments.push(id);
        self.length += segment.length();
        true
    }

    /// Stellt ein Segment an den Pfadanfang.
    pub fn push_front(&mut self, segment: &Segment) -> bool {
        let Some(id) = segment.id() else {
            return false;
        };
        if self.contains(id) {
            return false;
        }
        if self.segments.is_empty() {
            self.starting_point = segment.start_point();
            self.ending_point = segment.end_point();
        } else {
            let Some(starting) = self.starting_point else {
                return false;
            };
            let Some(previous) = segment.other_side_point(starting) else {
                return false;
            };
            self.starting_point = Some(previous);
        }
        self.segments.insert(0, id);
        self.length += segment.length();
        true
    }

    /// Kehrt die Laufrichtung um.
    pub fn invert(&mut self) {
        self.segments.reverse();
        std::mem::swap(&mut self.starting_point, &mut self.ending_point);
    }

    pub fn iter(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments.iter().copied()
    }
}
