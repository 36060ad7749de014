//! Stabile Identitäten für Graphen, Segmente und Verbindungspunkte.
//!
//! IDs werden prozessweit fortlaufend vergeben und nie wiederverwendet.
//! Eine ID aus einem fremden Graphen löst daher in keinem anderen Graphen auf,
//! und eine veraltete ID liefert schlicht "nicht vorhanden".

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SEGMENT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_POINT_ID: AtomicU64 = AtomicU64::new(1);

/// Identität eines Graphen (Straßennetzes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(pub u64);

/// Identität eines Segments (Straßen-Polylinie).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u64);

/// Identität eines Verbindungspunkts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub u64);

impl GraphId {
    pub(crate) fn next() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl SegmentId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl PointId {
    pub(crate) fn next() -> Self {
        Self(NEXT_POINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_werden_nie_wiederverwendet() {
        let a = SegmentId::next();
        let b = SegmentId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_display_zeigt_praefix() {
        assert_eq!(PointId(7).to_string(), "P7");
        assert_eq!(SegmentId(3).to_string(), "S3");
        assert_eq!(GraphId(1).to_string(), "G1");
    }
}
