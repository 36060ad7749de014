//! Besuchsschlüssel: entscheidet, wann zwei Besuche desselben Segments
//! als Duplikat gelten.

use super::GraphIterationElement;
use crate::core::{PointId, SegmentId};

/// Schlüssel eines Besuchs.
///
/// Bei orientierten Segmenten zählt der Eintrittspunkt mit, sodass beide
/// Richtungen eines Segments getrennt besucht werden können.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisitKey {
    pub segment: SegmentId,
    pub entry: Option<PointId>,
}

/// Duplikat-Regeln einer Traversierung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitPolicy {
    /// Ein Schlüssel darf mehrfach geliefert, aber nur einmal expandiert werden
    pub allow_many_replies: bool,
    /// Beide Enden eines Segments gelten als eigene Besuchsobjekte
    pub assume_oriented_segments: bool,
}

impl VisitPolicy {
    pub fn key(&self, element: &GraphIterationElement) -> VisitKey {
        VisitKey {
            segment: element.segment,
            entry: self.assume_oriented_segments.then_some(element.point),
        }
    }
}

impl Default for VisitPolicy {
    fn default() -> Self {
        Self {
            allow_many_replies: crate::shared::options::DEFAULT_ALLOW_ITERATION_CYCLES,
            assume_oriented_segments: crate::shared::options::DEFAULT_ORIENTED_SEGMENTS,
        }
    }
}
