//! Geometrie-Hilfen: Hüllrechteck, Anschlusswinkel und Polylinien-Abfragen.

use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::shared::CoordinateSystem;

/// Achsenparalleles Hüllrechteck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Untere linke Ecke
    pub min: DVec2,
    /// Obere rechte Ecke
    pub max: DVec2,
}

impl Rect {
    /// Erstellt ein Rechteck aus zwei beliebigen Ecken.
    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Kleinstes Rechteck um alle Punkte, `None` für eine leere Menge.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::from_corners(first, first), |rect, p| {
            rect.including(*p)
        }))
    }

    /// Vereinigung zweier Rechtecke.
    pub fn union(&self, other: &Rect) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Erweitert das Rechteck um einen Punkt.
    pub fn including(&self, p: DVec2) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Normalisiert einen Winkel zyklisch in `[0, 2π)`.
pub fn clamp_cyclic(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid kann bei sehr kleinen negativen Werten genau TAU liefern
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Anschlusswinkel eines Segments an einem Punkt.
///
/// Gemessen von `(1, 0)` zum Vektor `from → toward`, im Bildschirm-Rahmen
/// (Y-Achse nach unten). Liefert `None`, wenn der Winkel nicht definiert ist.
pub fn attachment_angle(from: DVec2, toward: DVec2) -> Option<f64> {
    let dx = toward.x - from.x;
    let dy = from.y - toward.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    let angle = dy.atan2(dx);
    angle.is_finite().then(|| clamp_cyclic(angle))
}

/// Gesamtlänge einer Polylinie.
pub fn polyline_length(points: &[DVec2]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Quadrierter Abstand eines Punkts zu einer Strecke `a–b`.
pub fn distance_sq_to_line_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Kleinster Abstand eines Punkts zur Polylinie.
pub fn distance_to_polyline(points: &[DVec2], p: DVec2) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => single.distance(p),
        _ => points
            .windows(2)
            .map(|w| distance_sq_to_line_segment(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
            .sqrt(),
    }
}

/// Position und Tangente auf einer Polylinie in `distance` vom Anfang.
///
/// `shift` verschiebt die Position senkrecht zur Fahrtrichtung nach links
/// (bezogen auf das Koordinatensystem). Distanzen außerhalb der Polylinie
/// werden auf Anfang bzw. Ende geklemmt.
pub fn location_at_distance(
    points: &[DVec2],
    distance: f64,
    shift: f64,
    system: CoordinateSystem,
) -> Option<(DVec2, DVec2)> {
    let (first, second) = match points {
        [a, b, ..] => (*a, *b),
        _ => return None,
    };

    if distance <= 0.0 {
        let tangent = second - first;
        return Some((first + system.left_normal(tangent) * shift, tangent));
    }

    let mut remaining = distance;
    for w in points.windows(2) {
        let step = w[0].distance(w[1]);
        if remaining <= step && step > 0.0 {
            let tangent = w[1] - w[0];
            let p = w[0] + tangent * (remaining / step);
            return Some((p + system.left_normal(tangent) * shift, tangent));
        }
        remaining -= step;
    }

    let n = points.len();
    let tangent = points[n - 1] - points[n - 2];
    Some((points[n - 1] + system.left_normal(tangent) * shift, tangent))
}
