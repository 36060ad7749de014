//! Attribut-Speicher und typisierte Straßen-Eigenschaften.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ein einzelner Attributwert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_real(&self) -> Option<f64> {
        match self {
            AttributeValue::Real(v) => Some(*v),
            AttributeValue::Integer(v) => Some(*v as f64),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            AttributeValue::Bool(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            AttributeValue::Real(v) if v.fract() == 0.0 => Some(*v as i64),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Real(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

/// Benannte Attribute in Einfügereihenfolge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    values: IndexMap<String, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Setzt ein Attribut und liefert den vorherigen Wert.
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.values.insert(name.to_owned(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.values.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Erlaubte Fahrtrichtung auf einem Segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrafficDirection {
    /// Befahrbar in beide Richtungen
    #[default]
    DoubleWay,
    /// Nur vom Start- zum Endpunkt
    OneWay,
    /// Nur vom End- zum Startpunkt
    NoEntry,
    /// Nicht befahrbar
    NoWay,
}

impl TrafficDirection {
    /// Kodierung im Attribut-Speicher.
    pub fn code(self) -> &'static str {
        match self {
            TrafficDirection::DoubleWay => "double",
            TrafficDirection::OneWay => "direct",
            TrafficDirection::NoEntry => "inverse",
            TrafficDirection::NoWay => "none",
        }
    }

    /// Liest die Kodierung, unbekannte Werte liefern `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "double" | "00" => Some(TrafficDirection::DoubleWay),
            "direct" | "09" => Some(TrafficDirection::OneWay),
            "inverse" | "16" => Some(TrafficDirection::NoEntry),
            "none" | "14" => Some(TrafficDirection::NoWay),
            _ => None,
        }
    }

    /// Befahrbar in Segmentrichtung (Start → Ende).
    pub fn allows_forward(self) -> bool {
        matches!(self, TrafficDirection::DoubleWay | TrafficDirection::OneWay)
    }

    /// Befahrbar gegen die Segmentrichtung (Ende → Start).
    pub fn allows_backward(self) -> bool {
        matches!(self, TrafficDirection::DoubleWay | TrafficDirection::NoEntry)
    }
}

/// Straßenkategorie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoadType {
    #[default]
    Other,
    PrivacyRoad,
    Track,
    Bikeway,
    LocalRoad,
    InterchangeRamp,
    MajorUrbanAxis,
    SecondaryRoad,
    MajorRoad,
    Freeway,
}

impl RoadType {
    const ALL: [RoadType; 10] = [
        RoadType::Other,
        RoadType::PrivacyRoad,
        RoadType::Track,
        RoadType::Bikeway,
        RoadType::LocalRoad,
        RoadType::InterchangeRamp,
        RoadType::MajorUrbanAxis,
        RoadType::SecondaryRoad,
        RoadType::MajorRoad,
        RoadType::Freeway,
    ];

    /// Zweistellige Kodierung im Attribut-Speicher.
    pub fn code(self) -> &'static str {
        match self {
            RoadType::Other => "99",
            RoadType::PrivacyRoad => "95",
            RoadType::Track => "98",
            RoadType::Bikeway => "10",
            RoadType::LocalRoad => "07",
            RoadType::InterchangeRamp => "08",
            RoadType::MajorUrbanAxis => "97",
            RoadType::SecondaryRoad => "06",
            RoadType::MajorRoad => "02",
            RoadType::Freeway => "01",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}
