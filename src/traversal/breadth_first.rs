//! Breitensuche in nicht fallender Distanz vom Startpunkt.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};

use super::{children, first_element, segment_length, GraphIterationElement, Topology, VisitKey, VisitPolicy};
use crate::core::{PointId, Result, SegmentId};

/// Eintrag der Warteschlange; gleiche Distanzen in Einfügereihenfolge.
#[derive(Debug)]
struct Pending {
    element: GraphIterationElement,
    seq: u64,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.element
            .distance_to_reach
            .total_cmp(&other.element.distance_to_reach)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Breitensuche über Segmente, sortiert nach der Distanz bis zum Eintritt.
#[derive(Debug)]
pub struct BreadthFirstIterator<T: Topology> {
    topology: T,
    policy: VisitPolicy,
    queue: BinaryHeap<Reverse<Pending>>,
    queued: BTreeSet<VisitKey>,
    expanded: BTreeSet<VisitKey>,
    seq: u64,
}

impl<T: Topology> BreadthFirstIterator<T> {
    /// Startet auf `segment`, betreten über `point`, `position` nach dem
    /// Eintrittspunkt.
    pub fn new(topology: T, segment: SegmentId, point: PointId, position: f64) -> Result<Self> {
        let options = topology.graph().options();
        let policy = VisitPolicy {
            allow_many_replies: options.allow_iteration_cycles,
            assume_oriented_segments: options.oriented_segments,
        };
        Self::with_policy(topology, segment, point, position, policy)
    }

    pub fn with_policy(
        topology: T,
        segment: SegmentId,
        point: PointId,
        position: f64,
        policy: VisitPolicy,
    ) -> Result<Self> {
        let first = first_element(&topology, segment, point, position)?;
        let mut iter = Self {
            topology,
            policy,
            queue: BinaryHeap::new(),
            queued: BTreeSet::new(),
            expanded: BTreeSet::new(),
            seq: 0,
        };
        iter.enqueue(first);
        Ok(iter)
    }

    fn enqueue(&mut self, element: GraphIterationElement) {
        let key = self.policy.key(&element);
        if self.policy.allow_many_replies {
            if self.expanded.contains(&key) {
                return;
            }
        } else if !self.queued.insert(key) {
            return;
        }
        self.queue.push(Reverse(Pending {
            element,
            seq: self.seq,
        }));
        self.seq += 1;
    }
}

impl<T: Topology> Iterator for BreadthFirstIterator<T> {
    type Item = GraphIterationElement;

    fn next(&mut self) -> Option<GraphIterationElement> {
        let Reverse(Pending { mut element, .. }) = self.queue.pop()?;
        let key = self.policy.key(&element);

        let next = children(
            &self.topology,
            &element,
            segment_length(&self.topology, element.segment),
        );
        element.terminal = next.is_empty();

        if !self.policy.allow_many_replies || self.expanded.insert(key) {
            for child in next {
                self.enqueue(child);
            }
        }
        Some(element)
    }
}
