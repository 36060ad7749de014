//! Distanzbegrenzte Tiefensuche.

use std::collections::BTreeSet;

use super::{children, first_element, segment_length, GraphIterationElement, Topology, VisitKey, VisitPolicy};
use crate::core::{PointId, Result, SegmentId};

/// Passt die Tiefe nach jedem gelieferten Element an.
pub trait DepthUpdater {
    /// Liefert die neue Tiefe.
    fn update(&mut self, element: &GraphIterationElement, depth: f64) -> f64;
}

impl<F> DepthUpdater for F
where
    F: FnMut(&GraphIterationElement, f64) -> f64,
{
    fn update(&mut self, element: &GraphIterationElement, depth: f64) -> f64 {
        self(element, depth)
    }
}

/// Tiefensuche, die Zweige jenseits von `depth` abschneidet.
///
/// Ein Element wird geliefert, wenn seine Eintrittsdistanz unter der
/// aktuellen Tiefe liegt. Es ist `terminal`, wenn es nicht vollständig
/// innerhalb der Tiefe liegt oder keine Nachfolger hat.
pub struct DepthFirstIterator<'a, T: Topology> {
    topology: T,
    policy: VisitPolicy,
    depth: f64,
    updater: Option<Box<dyn DepthUpdater + 'a>>,
    stack: Vec<GraphIterationElement>,
    queued: BTreeSet<VisitKey>,
    expanded: BTreeSet<VisitKey>,
}

impl<'a, T: Topology> DepthFirstIterator<'a, T> {
    pub fn new(topology: T, depth: f64, segment: SegmentId, point: PointId, position: f64) -> Result<Self> {
        let options = topology.graph().options();
        let policy = VisitPolicy {
            allow_many_replies: options.allow_iteration_cycles,
            assume_oriented_segments: options.oriented_segments,
        };
        Self::with_policy(topology, depth, segment, point, position, policy)
    }

    pub fn with_policy(
        topology: T,
        depth: f64,
        segment: SegmentId,
        point: PointId,
        position: f64,
        policy: VisitPolicy,
    ) -> Result<Self> {
        let first = first_element(&topology, segment, point, position)?;
        let mut iter = Self {
            topology,
            policy,
            depth,
            updater: None,
            stack: Vec::new(),
            queued: BTreeSet::new(),
            expanded: BTreeSet::new(),
        };
        iter.push(first);
        Ok(iter)
    }

    /// Setzt die Tiefen-Anpassung.
    pub fn with_depth_updater(mut self, updater: impl DepthUpdater + 'a) -> Self {
        self.updater = Some(Box::new(updater));
        self
    }

    /// Aktuelle Tiefe.
    pub fn depth(&self) -> f64 {
        self.depth
    }

    fn push(&mut self, element: GraphIterationElement) {
        let key = self.policy.key(&element);
        if self.policy.allow_many_replies {
            if self.expanded.contains(&key) {
                return;
            }
        } else if !self.queued.insert(key) {
            return;
        }
        self.stack.push(element);
    }
}

impl<T: Topology> Iterator for DepthFirstIterator<'_, T> {
    type Item = GraphIterationElement;

    fn next(&mut self) -> Option<GraphIterationElement> {
        loop {
            let mut element = self.stack.pop()?;
            if element.distance_to_reach >= self.depth {
                continue;
            }

            if let Some(updater) = self.updater.as_mut() {
                self.depth = updater.update(&element, self.depth);
            }

            let length = segment_length(&self.topology, element.segment);
            let consumed = element.distance_to_reach + length < self.depth;
            let next = children(&self.topology, &element, length);
            element.terminal = !consumed || next.is_empty();

            let key = self.policy.key(&element);
            if consumed && (!self.policy.allow_many_replies || self.expanded.insert(key)) {
                // Rückwärts stapeln, damit der erste Nachfolger im Uhrzeigersinn zuerst kommt
                for child in next.into_iter().rev() {
                    self.push(child);
                }
            }
            return Some(element);
        }
    }
}

impl<T: Topology + std::fmt::Debug> std::fmt::Debug for DepthFirstIterator<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthFirstIterator")
            .field("topology", &self.topology)
            .field("depth", &self.depth)
            .field("pending", &self.stack.len())
            .finish()
    }
}
