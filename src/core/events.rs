//! Änderungs-Benachrichtigungen für Graph und Segmente.

use std::fmt;

use super::SegmentId;

/// Strukturelle Änderung am Graphen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    SegmentAdded(SegmentId),
    SegmentChanged(SegmentId),
    SegmentRemoved(SegmentId),
}

/// Änderung an einem einzelnen Segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentEvent {
    /// Punkte der Polylinie wurden verändert
    GeometryChanged,
    /// Ein Attribut wurde gesetzt oder entfernt
    AttributeChanged(String),
}

/// Handle einer Registrierung, für `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Synchron aufgerufene Callback-Liste.
///
/// Beim Klonen des Besitzers werden keine Listener übernommen.
pub struct Listeners<E> {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn FnMut(&E)>)>,
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Entfernt einen Listener. `false`, wenn die ID unbekannt ist.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(lid, _)| *lid != id);
        self.entries.len() < before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listener_empfaengt_bis_zur_abmeldung() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::<GraphEvent>::new();
        let sink = Rc::clone(&seen);
        let id = listeners.subscribe(move |e| sink.borrow_mut().push(*e));

        listeners.emit(&GraphEvent::SegmentAdded(SegmentId(1)));
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(&GraphEvent::SegmentRemoved(SegmentId(1)));

        assert_eq!(*seen.borrow(), vec![GraphEvent::SegmentAdded(SegmentId(1))]);
    }

    #[test]
    fn test_klon_uebernimmt_keine_listener() {
        let mut listeners = Listeners::<SegmentEvent>::new();
        listeners.subscribe(|_| {});
        assert_eq!(listeners.len(), 1);
        assert!(listeners.clone().is_empty());
    }
}
