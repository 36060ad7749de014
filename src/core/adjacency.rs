//! Begrenzte Umlauf-Iteration über die Anschlüsse eines Verbindungspunkts.
//!
//! Der [`AdjacencyCursor`] hält keinen Borrow auf den Graphen. Er merkt sich
//! die Generation des Punkts und scheitert mit
//! [`GraphError::InvalidatedIterator`], sobald sich die Adjazenz ohne ihn
//! geändert hat. Nur [`AdjacencyCursor::remove`] darf selbst mutieren.

use super::{Connection, ConnectionPoint, GraphError, PointId, Result, SegmentEnd, SegmentId};
use crate::core::Graph;
use crate::shared::CoordinateSystem;

/// Einschluss der Grenzen einer begrenzten Iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundType {
    ExcludeStart,
    ExcludeEnd,
    ExcludeBoth,
    #[default]
    IncludeBoth,
}

impl BoundType {
    pub fn includes_start(self) -> bool {
        matches!(self, BoundType::IncludeBoth | BoundType::ExcludeEnd)
    }

    pub fn includes_end(self) -> bool {
        matches!(self, BoundType::IncludeBoth | BoundType::ExcludeStart)
    }
}

/// Physikalischer Drehsinn einer Umlauf-Abfrage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    Counterclockwise,
}

impl Rotation {
    pub fn reversed(self) -> Self {
        match self {
            Rotation::Clockwise => Rotation::Counterclockwise,
            Rotation::Counterclockwise => Rotation::Clockwise,
        }
    }
}

/// Eine Grenze: Segment plus optional das anliegende Ende.
///
/// Ohne Ende gilt der erste passende Eintrag. Bei Schleifen entscheidet das
/// Ende, welcher der beiden Einträge gemeint ist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentBound {
    pub segment: SegmentId,
    pub end: Option<SegmentEnd>,
}

impl From<Connection> for SegmentBound {
    fn from(c: Connection) -> Self {
        Self {
            segment: c.segment,
            end: Some(c.end),
        }
    }
}

/// Start- und Endgrenze einer Umlauf-Abfrage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdjacencyBounds {
    pub start: Option<SegmentBound>,
    pub end: Option<SegmentBound>,
    pub bound_type: BoundType,
}

impl AdjacencyBounds {
    /// Ein voller Umlauf ohne Grenzen.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn starting_at(mut self, segment: SegmentId, end: Option<SegmentEnd>) -> Self {
        self.start = Some(SegmentBound { segment, end });
        self
    }

    pub fn ending_at(mut self, segment: SegmentId, end: Option<SegmentEnd>) -> Self {
        self.end = Some(SegmentBound { segment, end });
        self
    }

    pub fn with_bound_type(mut self, bound_type: BoundType) -> Self {
        self.bound_type = bound_type;
        self
    }
}

/// Speicherreihenfolge für den angefragten Drehsinn.
///
/// Gespeicherte Winkel sind Bildschirmwinkel (y nach unten), aufsteigend ist
/// also im rechtshändigen System im Uhrzeigersinn.
pub(crate) fn is_ascending(rotation: Rotation, coordinate_system: CoordinateSystem) -> bool {
    (rotation == Rotation::Clockwise) != coordinate_system.is_left_handed()
}

/// Abgekoppelter Cursor über die Anschlüsse eines Punkts.
#[derive(Debug, Clone)]
pub struct AdjacencyCursor {
    point: PointId,
    generation: u64,
    ascending: bool,
    next: usize,
    remaining: usize,
    /// Index des zuletzt gelieferten Eintrags, für `remove`
    last: Option<usize>,
}

impl AdjacencyCursor {
    /// Erstellt einen Cursor über `point`.
    ///
    /// Ohne Startgrenze beginnt der Umlauf am ersten Eintrag der
    /// Laufrichtung, ohne Endgrenze endet er direkt davor. Eine Grenze, die
    /// nicht gefunden wird, ergibt einen leeren Cursor.
    pub fn new(point: &ConnectionPoint, ascending: bool, bounds: &AdjacencyBounds) -> Self {
        let mut cursor = Self {
            point: point.id(),
            generation: point.generation(),
            ascending,
            next: 0,
            remaining: 0,
            last: None,
        };

        let n = point.connection_count();
        if n == 0 {
            return cursor;
        }

        let s = match bounds.start {
            Some(b) => match point.index_of(b.segment, b.end) {
                Some(i) => i,
                None => return cursor,
            },
            None if ascending => 0,
            None => n - 1,
        };
        let e = match bounds.end {
            Some(b) => match point.index_of(b.segment, b.end) {
                Some(i) => i,
                None => return cursor,
            },
            None => cursor.step_back(s, n),
        };

        let include_start = bounds.start.is_none() || bounds.bound_type.includes_start();
        let include_end = bounds.end.is_none() || bounds.bound_type.includes_end();

        let distance = if ascending {
            (e + n - s) % n
        } else {
            (s + n - e) % n
        };

        if distance == 0 {
            // Start und Ende fallen zusammen: der Eintrag zählt, wenn eine Seite ihn einschließt
            cursor.remaining = usize::from(include_start || include_end);
            cursor.next = s;
        } else {
            cursor.remaining =
                distance + 1 - usize::from(!include_start) - usize::from(!include_end);
            cursor.next = if include_start { s } else { cursor.step(s, n) };
        }
        cursor
    }

    /// Verbindungspunkt, über den dieser Cursor läuft.
    pub fn point(&self) -> PointId {
        self.point
    }

    fn step(&self, index: usize, n: usize) -> usize {
        if self.ascending {
            (index + 1) % n
        } else {
            (index + n - 1) % n
        }
    }

    fn step_back(&self, index: usize, n: usize) -> usize {
        if self.ascending {
            (index + n - 1) % n
        } else {
            (index + 1) % n
        }
    }

    fn check<'g>(&self, graph: &'g Graph) -> Result<&'g ConnectionPoint> {
        match graph.connection_point(self.point) {
            Some(cp) if cp.generation() == self.generation => Ok(cp),
            _ => Err(GraphError::InvalidatedIterator(self.point)),
        }
    }

    pub fn has_next(&self, graph: &Graph) -> Result<bool> {
        self.check(graph)?;
        Ok(self.remaining > 0)
    }

    /// Nächster Anschluss, `None` am Ende des Bereichs.
    pub fn next(&mut self, graph: &Graph) -> Result<Option<Connection>> {
        let cp = self.check(graph)?;
        if self.remaining == 0 {
            return Ok(None);
        }
        let Some(connection) = cp.connection(self.next) else {
            return Err(GraphError::InvalidatedIterator(self.point));
        };
        self.last = Some(self.next);
        self.next = self.step(self.next, cp.connection_count());
        self.remaining -= 1;
        Ok(Some(connection))
    }

    /// Löst den zuletzt gelieferten Anschluss vom Punkt.
    ///
    /// Das Segment-Ende erhält einen eigenen Verbindungspunkt an derselben
    /// Position. Der Cursor bleibt danach gültig.
    pub fn remove(&mut self, graph: &mut Graph) -> Result<Connection> {
        let cp = self.check(graph)?;
        let last = self.last.ok_or(GraphError::NoSuchElement)?;
        let connection = cp.connection(last).ok_or(GraphError::NoSuchElement)?;

        graph.split_connection(self.point, connection)?;
        self.last = None;

        let cp = graph
            .connection_point(self.point)
            .ok_or(GraphError::UnknownPoint(self.point))?;
        if cp.connection_count() > 0 && self.next > last {
            self.next -= 1;
        }
        self.generation = cp.generation();
        Ok(connection)
    }

    /// Borrowender Iterator für reine Lesezugriffe.
    ///
    /// Scheitert sofort, wenn der Punkt seit der Erzeugung verändert wurde.
    pub fn iter(self, graph: &Graph) -> Result<AdjacencyIter<'_>> {
        self.check(graph)?;
        Ok(AdjacencyIter::new(graph, self))
    }
}

/// Iterator-Adapter über einen [`AdjacencyCursor`].
///
/// Der Borrow auf den Graphen schließt Mutationen während der Iteration aus.
#[derive(Debug, Clone)]
pub struct AdjacencyIter<'g> {
    graph: &'g Graph,
    cursor: AdjacencyCursor,
}

impl<'g> AdjacencyIter<'g> {
    /// Der Cursor muss zur aktuellen Generation des Punkts passen.
    pub(crate) fn new(graph: &'g Graph, cursor: AdjacencyCursor) -> Self {
        Self { graph, cursor }
    }
}

impl Iterator for AdjacencyIter<'_> {
    type Item = Connection;

    fn next(&mut self) -> Option<Connection> {
        // Der Borrow auf den Graphen hält die Generation fest, die Prüfung in `iter` genügt
        match self.cursor.next(self.graph) {
            Ok(next) => next,
            Err(e) => {
                log::error!("Umlauf über {} abgebrochen: {e}", self.cursor.point);
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}
