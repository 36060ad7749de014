//! Zentrale Konfiguration für das Straßennetz.
//!
//! `GraphOptions` enthält alle zur Laufzeit änderbaren Werte und wird explizit
//! an den Graphen übergeben. Die `const`-Werte bleiben als Fallback/Default erhalten.

use glam::DVec2;
use serde::{Deserialize, Serialize};

// ── Topologie ───────────────────────────────────────────────────────

/// Fusionsabstand: Endpunkte innerhalb dieses Radius teilen sich einen Verbindungspunkt.
pub const DEFAULT_FUSION_DISTANCE: f64 = 0.5;
/// Quadrierte Toleranz, unter der zwei Verbindungspunkte als gleich gelten.
pub const DEFAULT_POINT_EPSILON: f64 = 1e-10;

// ── Spuren ──────────────────────────────────────────────────────────

/// Standard-Spuranzahl eines Segments ohne Attribut.
pub const DEFAULT_LANE_COUNT: usize = 2;
/// Standard-Spurbreite in Welteinheiten.
pub const DEFAULT_LANE_WIDTH: f64 = 3.3;

// ── Traversierung ───────────────────────────────────────────────────

/// Ob Iteratoren standardmäßig Segmente mehrfach liefern dürfen.
pub const DEFAULT_ALLOW_ITERATION_CYCLES: bool = false;
/// Ob beide Enden eines Segments standardmäßig getrennt besucht werden.
pub const DEFAULT_ORIENTED_SEGMENTS: bool = true;

/// Datei-Name für persistierte Optionen.
pub const OPTIONS_FILE_NAME: &str = "road_network.toml";

/// Händigkeit des 2D-Koordinatensystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Y-Achse nach oben (GIS-Standard)
    #[default]
    RightHanded,
    /// Y-Achse nach unten (Bildschirm)
    LeftHanded,
}

impl CoordinateSystem {
    pub fn is_left_handed(self) -> bool {
        self == CoordinateSystem::LeftHanded
    }

    /// Normalenvektor links zur Richtung `tangent` (normiert).
    pub fn left_normal(self, tangent: DVec2) -> DVec2 {
        let n = tangent.normalize_or_zero();
        match self {
            CoordinateSystem::RightHanded => DVec2::new(-n.y, n.x),
            CoordinateSystem::LeftHanded => DVec2::new(n.y, -n.x),
        }
    }
}

/// Seite, auf der der Verkehr rechtlich fährt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficSide {
    #[default]
    Right,
    Left,
}

/// Attribut-Schlüssel, unter denen Segment-Eigenschaften abgelegt werden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeNames {
    /// Straßenbreite
    pub road_width: String,
    /// Spuranzahl
    pub lane_count: String,
    /// Verkehrsrichtung
    pub traffic_direction: String,
    /// Straßentyp
    pub road_type: String,
    /// Straßenname
    pub road_name: String,
    /// Straßennummer
    pub road_number: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            road_width: "road_width".into(),
            lane_count: "lane_count".into(),
            traffic_direction: "traffic_direction".into(),
            road_type: "road_type".into(),
            road_name: "road_name".into(),
            road_number: "road_number".into(),
        }
    }
}

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Optionen eines Straßennetzes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphOptions {
    // ── Topologie ───────────────────────────────────────────────
    /// Fusionsabstand für Endpunkte
    #[serde(default = "default_fusion_distance")]
    pub fusion_distance: f64,
    /// Quadrierte Gleichheits-Toleranz für Verbindungspunkte
    #[serde(default = "default_point_epsilon")]
    pub point_epsilon: f64,
    /// Händigkeit des Koordinatensystems
    #[serde(default)]
    pub coordinate_system: CoordinateSystem,
    /// Rechts- oder Linksverkehr
    #[serde(default)]
    pub legal_traffic_side: TrafficSide,

    // ── Spuren ──────────────────────────────────────────────────
    #[serde(default = "default_lane_count")]
    pub default_lane_count: usize,
    #[serde(default = "default_lane_width")]
    pub default_lane_width: f64,

    // ── Traversierung ───────────────────────────────────────────
    /// Segmente dürfen mehrfach geliefert werden
    #[serde(default = "default_allow_iteration_cycles")]
    pub allow_iteration_cycles: bool,
    /// Beide Enden eines Segments werden getrennt besucht
    #[serde(default = "default_oriented_segments")]
    pub oriented_segments: bool,

    // ── Attribute ───────────────────────────────────────────────
    #[serde(default)]
    pub attribute_names: AttributeNames,
}

fn default_fusion_distance() -> f64 {
    DEFAULT_FUSION_DISTANCE
}

fn default_point_epsilon() -> f64 {
    DEFAULT_POINT_EPSILON
}

fn default_lane_count() -> usize {
    DEFAULT_LANE_COUNT
}

fn default_lane_width() -> f64 {
    DEFAULT_LANE_WIDTH
}

fn default_allow_iteration_cycles() -> bool {
    DEFAULT_ALLOW_ITERATION_CYCLES
}

fn default_oriented_segments() -> bool {
    DEFAULT_ORIENTED_SEGMENTS
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            fusion_distance: DEFAULT_FUSION_DISTANCE,
            point_epsilon: DEFAULT_POINT_EPSILON,
            coordinate_system: CoordinateSystem::default(),
            legal_traffic_side: TrafficSide::default(),
            default_lane_count: DEFAULT_LANE_COUNT,
            default_lane_width: DEFAULT_LANE_WIDTH,
            allow_iteration_cycles: DEFAULT_ALLOW_ITERATION_CYCLES,
            oriented_segments: DEFAULT_ORIENTED_SEGMENTS,
            attribute_names: AttributeNames::default(),
        }
    }
}

impl GraphOptions {
    /// Lädt Optionen aus einer TOML-Datei. Fallback auf Defaults bei Fehler.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Netz-Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Netz-Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// `true` bei Rechtsverkehr.
    pub fn is_right_sided_traffic(&self) -> bool {
        self.legal_traffic_side == TrafficSide::Right
    }

    /// Quadrierter Fusionsabstand für R-Tree-Abfragen.
    pub fn fusion_distance_sq(&self) -> f64 {
        self.fusion_distance * self.fusion_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teilweise_toml_fuellt_defaults_auf() {
        let opts: GraphOptions = toml::from_str(
            r#"
            fusion_distance = 2.0
            coordinate_system = "left_handed"
            "#,
        )
        .expect("TOML muss parsebar sein");

        assert_eq!(opts.fusion_distance, 2.0);
        assert_eq!(opts.coordinate_system, CoordinateSystem::LeftHanded);
        assert_eq!(opts.default_lane_count, DEFAULT_LANE_COUNT);
        assert_eq!(opts.legal_traffic_side, TrafficSide::Right);
        assert_eq!(opts.attribute_names, AttributeNames::default());
    }

    #[test]
    fn test_speichern_und_laden_ueber_datei() {
        let dir = std::env::temp_dir().join(format!("road_network_opts_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("Temp-Verzeichnis");
        let path = dir.join(OPTIONS_FILE_NAME);

        let opts = GraphOptions {
            fusion_distance: 1.25,
            legal_traffic_side: TrafficSide::Left,
            ..GraphOptions::default()
        };
        opts.save_to_file(&path).expect("Speichern muss klappen");

        let loaded = GraphOptions::load_from_file(&path);
        assert_eq!(loaded, opts);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_fehlende_datei_liefert_defaults() {
        let loaded = GraphOptions::load_from_file(std::path::Path::new("/nonexistent/x.toml"));
        assert_eq!(loaded, GraphOptions::default());
    }

    #[test]
    fn test_linke_normale_haengt_von_haendigkeit_ab() {
        let t = DVec2::new(2.0, 0.0);
        assert_eq!(CoordinateSystem::RightHanded.left_normal(t), DVec2::new(0.0, 1.0));
        assert_eq!(CoordinateSystem::LeftHanded.left_normal(t), DVec2::new(0.0, -1.0));
    }
}
