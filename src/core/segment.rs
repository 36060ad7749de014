//! Straßensegment: Polylinie mit zwei Anschluss-Slots und abgeleiteter Geometrie.

use std::cell::Cell;
use std::rc::Rc;

use glam::DVec2;

use super::attributes::{AttributeValue, Attributes, RoadType, TrafficDirection};
use super::events::{ListenerId, Listeners, SegmentEvent};
use super::geometry::{self, Rect};
use super::{GraphError, GraphId, PointId, Result, SegmentEnd, SegmentId};
use crate::shared::GraphOptions;

/// Fahrtrichtung einer Spur relativ zur Segmentrichtung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneDirection {
    /// Wie die Polylinie (Start → Ende)
    SegmentDirection,
    /// Entgegen der Polylinie
    Reverted,
}

/// Eine Straßen-Polylinie.
///
/// Eigenständig erzeugt hat ein Segment weder Graph noch Verbindungspunkte.
/// Erst [`Graph::insert`](crate::Graph::insert) vergibt ID und Anschlüsse;
/// beim Entfernen werden beide wieder gelöscht.
#[derive(Debug, Clone)]
pub struct Segment {
    id: Option<SegmentId>,
    graph: Option<GraphId>,
    points: Vec<DVec2>,
    start: Option<PointId>,
    end: Option<PointId>,
    attributes: Attributes,
    options: Rc<GraphOptions>,
    /// Zwischengespeicherte Breite, `None` = neu berechnen
    width: Cell<Option<f64>>,
    listeners: Listeners<SegmentEvent>,
}

impl Segment {
    /// Erstellt ein freistehendes Segment mit Standard-Optionen.
    pub fn new(points: impl IntoIterator<Item = DVec2>) -> Self {
        Self::with_options(points, Rc::new(GraphOptions::default()))
    }

    /// Erstellt ein freistehendes Segment mit expliziten Optionen.
    pub fn with_options(points: impl IntoIterator<Item = DVec2>, options: Rc<GraphOptions>) -> Self {
        Self {
            id: None,
            graph: None,
            points: points.into_iter().collect(),
            start: None,
            end: None,
            attributes: Attributes::new(),
            options,
            width: Cell::new(None),
            listeners: Listeners::new(),
        }
    }

    /// ID innerhalb des besitzenden Graphen.
    pub fn id(&self) -> Option<SegmentId> {
        self.id
    }

    /// Besitzender Graph, `None` solange freistehend.
    pub fn graph(&self) -> Option<GraphId> {
        self.graph
    }

    pub fn is_attached(&self) -> bool {
        self.graph.is_some()
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    // ── Punkte ──────────────────────────────────────────────────

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn first_point(&self) -> Option<DVec2> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<DVec2> {
        self.points.last().copied()
    }

    /// Extrempunkt am gegebenen Ende.
    pub fn end_point_position(&self, end: SegmentEnd) -> Option<DVec2> {
        match end {
            SegmentEnd::Start => self.first_point(),
            SegmentEnd::End => self.last_point(),
        }
    }

    /// Zweiter Punkt, vom gegebenen Ende aus gelaufen.
    pub fn second_point_from(&self, end: SegmentEnd) -> Option<DVec2> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        match end {
            SegmentEnd::Start => Some(self.points[1]),
            SegmentEnd::End => Some(self.points[n - 2]),
        }
    }

    /// Verschiebt einen Punkt. Endpunkte eines angeschlossenen Segments sind
    /// gesperrt, sie folgen ihrem Verbindungspunkt.
    pub fn set_point(&mut self, index: usize, position: DVec2) -> bool {
        let last = self.points.len().saturating_sub(1);
        if index >= self.points.len() || (self.is_attached() && (index == 0 || index == last)) {
            return false;
        }
        self.points[index] = position;
        self.listeners.emit(&SegmentEvent::GeometryChanged);
        true
    }

    /// Fügt einen Zwischenpunkt vor `index` ein (nur innere Positionen bei
    /// angeschlossenen Segmenten).
    pub fn insert_point(&mut self, index: usize, position: DVec2) -> bool {
        let interior = index > 0 && index < self.points.len();
        if index > self.points.len() || (self.is_attached() && !interior) {
            return false;
        }
        self.points.insert(index, position);
        self.listeners.emit(&SegmentEvent::GeometryChanged);
        true
    }

    /// Erzwingt die Koordinate eines Extrempunkts.
    pub(crate) fn force_end_position(&mut self, end: SegmentEnd, position: DVec2) {
        let slot = match end {
            SegmentEnd::Start => self.points.first_mut(),
            SegmentEnd::End => self.points.last_mut(),
        };
        if let Some(p) = slot {
            if *p != position {
                *p = position;
                self.listeners.emit(&SegmentEvent::GeometryChanged);
            }
        }
    }

    /// Setzt die komplette Polylinie zurück (Rücknahme fehlgeschlagener Änderungen).
    pub(crate) fn replace_points(&mut self, points: Vec<DVec2>) {
        if self.points != points {
            self.points = points;
            self.listeners.emit(&SegmentEvent::GeometryChanged);
        }
    }

    // ── Anschlüsse ──────────────────────────────────────────────

    /// Verbindungspunkt am Anfang der Polylinie.
    pub fn start_point(&self) -> Option<PointId> {
        self.start
    }

    /// Verbindungspunkt am Ende der Polylinie.
    pub fn end_point(&self) -> Option<PointId> {
        self.end
    }

    pub fn slot(&self, end: SegmentEnd) -> Option<PointId> {
        match end {
            SegmentEnd::Start => self.start,
            SegmentEnd::End => self.end,
        }
    }

    pub(crate) fn set_slot(&mut self, end: SegmentEnd, point: Option<PointId>) {
        match end {
            SegmentEnd::Start => self.start = point,
            SegmentEnd::End => self.end = point,
        }
    }

    /// Ende, mit dem das Segment an `point` anliegt. Bei Schleifen `Start`.
    pub fn end_at(&self, point: PointId) -> Option<SegmentEnd> {
        if self.start == Some(point) {
            Some(SegmentEnd::Start)
        } else if self.end == Some(point) {
            Some(SegmentEnd::End)
        } else {
            None
        }
    }

    /// Gegenüberliegender Verbindungspunkt.
    pub fn other_side_point(&self, point: PointId) -> Option<PointId> {
        if self.start == Some(point) {
            self.end
        } else if self.end == Some(point) {
            self.start
        } else {
            None
        }
    }

    /// Erster und letzter Punkt teilen sich einen Verbindungspunkt.
    pub fn is_loop(&self) -> bool {
        self.start.is_some() && self.start == self.end
    }

    pub(crate) fn attach_to(&mut self, id: SegmentId, graph: GraphId, options: Rc<GraphOptions>) {
        self.id = Some(id);
        self.graph = Some(graph);
        self.options = options;
        self.width.set(None);
    }

    pub(crate) fn detach(&mut self) {
        self.id = None;
        self.graph = None;
        self.start = None;
        self.end = None;
    }

    // ── Geometrie ───────────────────────────────────────────────

    pub fn length(&self) -> f64 {
        geometry::polyline_length(&self.points)
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        Rect::from_points(&self.points)
    }

    /// Kleinster Abstand eines Punkts zur Polylinie.
    pub fn distance(&self, point: DVec2) -> f64 {
        geometry::distance_to_polyline(&self.points, point)
    }

    /// Position in `distance` vom Anfang, seitlich um `shift` versetzt.
    pub fn point_at_distance(&self, distance: f64, shift: f64) -> Option<DVec2> {
        geometry::location_at_distance(
            &self.points,
            distance,
            shift,
            self.options.coordinate_system,
        )
        .map(|(p, _)| p)
    }

    /// Position beim Längenverhältnis `ratio` (0 = Anfang, 1 = Ende).
    pub fn point_at_ratio(&self, ratio: f64, shift: f64) -> Option<DVec2> {
        self.point_at_distance(ratio.clamp(0.0, 1.0) * self.length(), shift)
    }

    /// Tangente (nicht normiert) in `distance` vom Anfang.
    pub fn tangent_at(&self, distance: f64) -> Option<DVec2> {
        geometry::location_at_distance(&self.points, distance, 0.0, self.options.coordinate_system)
            .map(|(_, t)| t)
    }

    pub fn distance_from_start(&self, ratio: f64) -> f64 {
        ratio.clamp(0.0, 1.0) * self.length()
    }

    pub fn distance_to_end(&self, ratio: f64) -> f64 {
        let length = self.length();
        length - ratio.clamp(0.0, 1.0) * length
    }

    // ── Attribute ───────────────────────────────────────────────

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.set(name, value);
        self.attribute_changed(name);
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        let removed = self.attributes.remove(name);
        if removed.is_some() {
            self.attribute_changed(name);
        }
        removed
    }

    fn attribute_changed(&mut self, name: &str) {
        self.width.set(None);
        self.listeners
            .emit(&SegmentEvent::AttributeChanged(name.to_owned()));
    }

    pub fn traffic_direction(&self) -> TrafficDirection {
        self.attribute(&self.options.attribute_names.traffic_direction)
            .and_then(AttributeValue::as_text)
            .and_then(TrafficDirection::from_code)
            .unwrap_or_default()
    }

    pub fn set_traffic_direction(&mut self, direction: TrafficDirection) {
        let key = self.options.attribute_names.traffic_direction.clone();
        self.set_attribute(&key, direction.code());
    }

    pub fn road_type(&self) -> RoadType {
        self.attribute(&self.options.attribute_names.road_type)
            .and_then(AttributeValue::as_text)
            .and_then(RoadType::from_code)
            .unwrap_or_default()
    }

    pub fn set_road_type(&mut self, road_type: RoadType) {
        let key = self.options.attribute_names.road_type.clone();
        self.set_attribute(&key, road_type.code());
    }

    pub fn road_name(&self) -> Option<&str> {
        self.attribute(&self.options.attribute_names.road_name)
            .and_then(AttributeValue::as_text)
    }

    pub fn set_road_name(&mut self, name: &str) {
        let key = self.options.attribute_names.road_name.clone();
        self.set_attribute(&key, name);
    }

    pub fn road_number(&self) -> Option<&str> {
        self.attribute(&self.options.attribute_names.road_number)
            .and_then(AttributeValue::as_text)
    }

    pub fn set_road_number(&mut self, number: &str) {
        let key = self.options.attribute_names.road_number.clone();
        self.set_attribute(&key, number);
    }

    // ── Spuren ──────────────────────────────────────────────────

    pub fn lane_count(&self) -> usize {
        self.attribute(&self.options.attribute_names.lane_count)
            .and_then(AttributeValue::as_integer)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(self.options.default_lane_count)
    }

    /// Straßenbreite aus dem Attribut, sonst Spuranzahl × Spurbreite.
    pub fn width(&self) -> f64 {
        if let Some(w) = self.width.get() {
            return w;
        }
        let w = self
            .attribute(&self.options.attribute_names.road_width)
            .and_then(AttributeValue::as_real)
            .filter(|w| *w > 0.0)
            .unwrap_or_else(|| self.lane_count() as f64 * self.options.default_lane_width);
        self.width.set(Some(w));
        w
    }

    /// Setzt die Breite. Werte ≤ 0 oder NaN entfernen das Attribut.
    pub fn set_width(&mut self, width: f64) {
        let key = self.options.attribute_names.road_width.clone();
        if width.is_nan() || width <= 0.0 {
            self.remove_attribute(&key);
        } else {
            self.set_attribute(&key, width);
        }
    }

    fn check_lane(&self, index: usize) -> Result<usize> {
        let count = self.lane_count();
        if index >= count {
            return Err(GraphError::LaneIndexOutOfRange { index, count });
        }
        Ok(count)
    }

    pub fn lane_size(&self, index: usize) -> Result<f64> {
        let count = self.check_lane(index)?;
        Ok(self.width() / count as f64)
    }

    /// Seitlicher Abstand der Spurmitte zur Polylinie.
    pub fn lane_center(&self, index: usize) -> Result<f64> {
        let size = self.lane_size(index)?;
        let dist = self.width() / 2.0 - size * index as f64 - size / 2.0;
        Ok(self.side_sign() * dist)
    }

    /// Seitlicher Abstand zum Straßenrand auf der Fahrseite.
    pub fn road_border_distance(&self) -> f64 {
        self.side_sign() * self.width() / 2.0
    }

    pub fn lane_direction(&self, index: usize) -> Result<LaneDirection> {
        let count = self.check_lane(index)?;
        let first_half = index < count / 2;
        let forward = first_half == self.options.is_right_sided_traffic();
        Ok(if forward {
            LaneDirection::SegmentDirection
        } else {
            LaneDirection::Reverted
        })
    }

    fn side_sign(&self) -> f64 {
        if self.options.is_right_sided_traffic() == self.options.coordinate_system.is_left_handed() {
            1.0
        } else {
            -1.0
        }
    }

    // ── Listener ────────────────────────────────────────────────

    pub fn subscribe(&mut self, callback: impl FnMut(&SegmentEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
