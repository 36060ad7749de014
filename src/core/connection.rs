//! Adjazenz-Eintrag an einem Verbindungspunkt.

use super::SegmentId;

/// Welches Ende eines Segments an einem Verbindungspunkt anliegt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentEnd {
    /// Erster Punkt der Polylinie
    Start,
    /// Letzter Punkt der Polylinie
    End,
}

impl SegmentEnd {
    /// Liefert das gegenüberliegende Ende.
    pub fn opposite(self) -> Self {
        match self {
            SegmentEnd::Start => SegmentEnd::End,
            SegmentEnd::End => SegmentEnd::Start,
        }
    }

    /// `true` für [`SegmentEnd::Start`].
    pub fn is_start(self) -> bool {
        self == SegmentEnd::Start
    }
}

/// Ein angeschlossenes Segment an einem Verbindungspunkt.
///
/// Nicht besitzende Rückreferenz: das Segment kann inzwischen entfernt sein,
/// Abfragen behandeln diesen Eintrag dann als leer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Angeschlossenes Segment
    pub segment: SegmentId,
    /// Ende des Segments, das hier anliegt
    pub end: SegmentEnd,
}

impl Connection {
    /// Erstellt einen neuen Adjazenz-Eintrag.
    pub fn new(segment: SegmentId, end: SegmentEnd) -> Self {
        Self { segment, end }
    }

    /// Prüft Segment und (optional) Ende.
    pub fn matches(&self, segment: SegmentId, end: Option<SegmentEnd>) -> bool {
        self.segment == segment && end.is_none_or(|e| e == self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_tauscht_enden() {
        assert_eq!(SegmentEnd::Start.opposite(), SegmentEnd::End);
        assert_eq!(SegmentEnd::End.opposite(), SegmentEnd::Start);
    }

    #[test]
    fn test_matches_ohne_ende_prueft_nur_segment() {
        let c = Connection::new(SegmentId(4), SegmentEnd::End);
        assert!(c.matches(SegmentId(4), None));
        assert!(c.matches(SegmentId(4), Some(SegmentEnd::End)));
        assert!(!c.matches(SegmentId(4), Some(SegmentEnd::Start)));
        assert!(!c.matches(SegmentId(5), None));
    }
}
