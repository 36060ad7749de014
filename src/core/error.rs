//! Fehlertypen des Straßennetzes.

use thiserror::Error;

use super::{GraphId, PointId, SegmentEnd, SegmentId};

/// Result-Alias für Graph-Operationen.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Alle Fehler, die Graph-, Cursor- und Teilgraph-Operationen melden.
///
/// Fehler werden nie intern wiederholt. Schlägt eine Einfügung fehl, ist der
/// Graph danach exakt im Zustand vor dem Aufruf.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Segment gehört bereits zu einem Graphen
    #[error("Segment gehört bereits zu Graph {0}")]
    AlreadyOwned(GraphId),

    /// Segment hat weniger als zwei Punkte
    #[error("Segment braucht mindestens 2 Punkte, hat {0}")]
    NotEnoughPoints(usize),

    /// Segment ist in diesem Graphen nicht (mehr) vorhanden
    #[error("Unbekanntes Segment {0}")]
    UnknownSegment(SegmentId),

    /// Verbindungspunkt ist in diesem Graphen nicht (mehr) vorhanden
    #[error("Unbekannter Verbindungspunkt {0}")]
    UnknownPoint(PointId),

    /// Punkt- oder Segment-Variante wird an dieser Stelle nicht unterstützt
    #[error("Nicht unterstützter Typ: {0}")]
    UnsupportedType(&'static str),

    /// Objekt stammt aus einem anderen Graphen
    #[error("Unerwarteter Graph: erwartet {expected}, erhalten {actual}")]
    UnexpectedGraph {
        /// Graph, zu dem die Operation gehört
        expected: GraphId,
        /// Graph, aus dem das übergebene Objekt stammt
        actual: GraphId,
    },

    /// Adjazenz wurde unter einem laufenden Cursor verändert
    #[error("Cursor über {0} ist ungültig geworden")]
    InvalidatedIterator(PointId),

    /// Kein weiteres bzw. kein entfernbares Element
    #[error("Kein Element vorhanden")]
    NoSuchElement,

    /// Anschlusswinkel ist nicht definiert (zusammenfallende Punkte)
    #[error("Winkel von {segment} an {point} ist nicht definiert")]
    DegenerateAngle {
        /// Betroffenes Segment
        segment: SegmentId,
        /// Verbindungspunkt, an dem angeschlossen werden sollte
        point: PointId,
    },

    /// Segment ist am erwarteten Ende nicht an diesem Punkt angeschlossen
    #[error("{segment} ist mit {end:?} nicht an {point} angeschlossen")]
    NotConnectedAt {
        /// Betroffenes Segment
        segment: SegmentId,
        /// Erwartetes Segment-Ende
        end: SegmentEnd,
        /// Verbindungspunkt
        point: PointId,
    },

    /// Eine Operation ist gescheitert und ließ sich nicht vollständig zurücknehmen
    #[error("{cause} (Rücknahme unvollständig, {failed_steps} Schritt(e) gescheitert)")]
    IncompleteRollback {
        /// Ursprünglicher Fehler der Operation
        cause: Box<GraphError>,
        /// Anzahl gescheiterter Rücknahme-Schritte
        failed_steps: usize,
    },

    /// Spurindex liegt außerhalb der Spuranzahl
    #[error("Spur {index} existiert nicht (Spuranzahl {count})")]
    LaneIndexOutOfRange {
        /// Angefragter Index
        index: usize,
        /// Spuranzahl des Segments
        count: usize,
    },
}

impl GraphError {
    /// Kurzform für einen Graph-Mismatch.
    pub fn unexpected_graph(expected: GraphId, actual: GraphId) -> Self {
        GraphError::UnexpectedGraph { expected, actual }
    }

    /// Ursprünglicher Fehler, markiert als unvollständig zurückgenommen,
    /// sobald ein Rücknahme-Schritt gescheitert ist.
    pub fn after_rollback(cause: GraphError, failed_steps: usize) -> Self {
        if failed_steps == 0 {
            return cause;
        }
        GraphError::IncompleteRollback {
            cause: Box::new(cause),
            failed_steps,
        }
    }
}
