///! Map theme: which OSM tags feed each layer and how each layer is drawn

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Thematic layers, in drawing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Green,
    Forest,
    Water,
    Parking,
    Streets,
    Building,
}

impl Layer {
    pub const DRAW_ORDER: [Layer; 6] = [
        Layer::Green,
        Layer::Forest,
        Layer::Water,
        Layer::Parking,
        Layer::Streets,
        Layer::Building,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Green => "green",
            Layer::Forest => "forest",
            Layer::Water => "water",
            Layer::Parking => "parking",
            Layer::Streets => "streets",
            Layer::Building => "building",
        }
    }
}

/// OSM tag filter for one area layer.
///
/// `tags` maps a key to the accepted values; an empty list accepts any value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRule {
    pub layer: Layer,
    pub tags: BTreeMap<String, Vec<String>>,
}

impl LayerRule {
    fn new(layer: Layer, tags: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            layer,
            tags: tags
                .into_iter()
                .map(|(k, vs)| (k.to_string(), vs.into_iter().map(str::to_string).collect()))
                .collect(),
        }
    }

    pub fn matches(&self, tags: &HashMap<String, String>) -> bool {
        self.tags.iter().any(|(key, accepted)| match tags.get(key) {
            Some(value) => accepted.is_empty() || accepted.iter().any(|a| a == value),
            None => false,
        })
    }
}

/// Fill / stroke parameters of a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub fill: String,
    pub stroke: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    /// Pattern of `o` (ring) and `.` (dot) marks laid over the fill
    #[serde(default)]
    pub hatch: Option<String>,
    #[serde(default)]
    pub hatch_color: Option<String>,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

fn default_stroke_width() -> f32 {
    1.0
}

fn default_alpha() -> f32 {
    1.0
}

impl LayerStyle {
    fn new(fill: &str, stroke: &str, stroke_width: f32) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            stroke_width,
            hatch: None,
            hatch_color: None,
            alpha: 1.0,
        }
    }

    fn with_hatch(mut self, hatch: &str, color: Option<&str>) -> Self {
        self.hatch = Some(hatch.to_string());
        self.hatch_color = color.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerStyles {
    pub background: LayerStyle,
    pub perimeter: LayerStyle,
    pub green: LayerStyle,
    pub forest: LayerStyle,
    pub water: LayerStyle,
    pub parking: LayerStyle,
    pub streets: LayerStyle,
    pub building: LayerStyle,
}

impl Default for LayerStyles {
    fn default() -> Self {
        Self {
            background: LayerStyle::new("#F2F4CB", "#dadbc1", 0.0).with_hatch("o.o.o.", None),
            perimeter: LayerStyle::new("#F2F4CB", "#dadbc1", 0.8).with_hatch("o..o..", None),
            green: LayerStyle::new("#D0F1BF", "#2F3737", 1.6),
            forest: LayerStyle::new("#64B96A", "#2F3737", 1.6),
            water: LayerStyle::new("#a1e3ff", "#2F3737", 1.6).with_hatch("ooo...", Some("#85c9e6")),
            parking: LayerStyle::new("#F2F4CB", "#2F3737", 1.6),
            streets: LayerStyle::new("#2F3737", "#475657", 0.8),
            building: LayerStyle::new("#FFC857", "#2F3737", 1.2),
        }
    }
}

/// Immutable map theme handed to the map source and the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    /// Area layers, first match wins
    pub layers: Vec<LayerRule>,
    /// Highway class to stroke width, in points
    pub street_widths: BTreeMap<String, f32>,
    pub styles: LayerStyles,
    pub building_palette: Vec<String>,
}

impl Default for MapStyle {
    fn default() -> Self {
        let layers = vec![
            LayerRule::new(
                Layer::Green,
                vec![
                    ("landuse", vec!["grass"]),
                    ("natural", vec!["island", "wood"]),
                    ("leisure", vec!["park"]),
                ],
            ),
            LayerRule::new(Layer::Forest, vec![("landuse", vec!["forest"])]),
            LayerRule::new(Layer::Water, vec![("natural", vec!["water", "bay"])]),
            LayerRule::new(
                Layer::Parking,
                vec![
                    ("amenity", vec!["parking"]),
                    ("highway", vec!["pedestrian"]),
                    ("man_made", vec!["pier"]),
                ],
            ),
        ];

        let street_widths: BTreeMap<String, f32> = [
            ("motorway", 5.0),
            ("trunk", 4.0),
            ("primary", 3.7),
            ("secondary", 3.5),
            ("tertiary", 3.2),
            ("residential", 3.0),
            ("service", 1.5),
            ("pedestrian", 1.2),
            ("footway", 1.2),
        ]
        .into_iter()
        .map(|(k, w)| (k.to_string(), w))
        .collect();

        Self {
            layers,
            street_widths,
            styles: LayerStyles::default(),
            building_palette: vec![
                "#FFC857".to_string(),
                "#E9724C".to_string(),
                "#C5283D".to_string(),
            ],
        }
    }
}

impl MapStyle {
    pub fn style_for(&self, layer: Layer) -> &LayerStyle {
        match layer {
            Layer::Green => &self.styles.green,
            Layer::Forest => &self.styles.forest,
            Layer::Water => &self.styles.water,
            Layer::Parking => &self.styles.parking,
            Layer::Streets => &self.styles.streets,
            Layer::Building => &self.styles.building,
        }
    }

    /// Pick the layer an OSM element belongs to, if any
    pub fn layer_for(&self, tags: &HashMap<String, String>) -> Option<Layer> {
        if let Some(rule) = self.layers.iter().find(|rule| rule.matches(tags)) {
            return Some(rule.layer);
        }
        if tags
            .get("highway")
            .is_some_and(|class| self.street_widths.contains_key(class))
        {
            return Some(Layer::Streets);
        }
        if tags.contains_key("building") {
            return Some(Layer::Building);
        }
        None
    }

    pub fn street_width(&self, tags: &HashMap<String, String>) -> f32 {
        tags.get("highway")
            .and_then(|class| self.street_widths.get(class))
            .copied()
            .unwrap_or(self.styles.streets.stroke_width)
    }

    /// Deterministic palette pick so reruns colour the same building alike
    pub fn building_fill(&self, osm_id: u64) -> &str {
        if self.building_palette.is_empty() {
            return &self.styles.building.fill;
        }
        let index = (osm_id % self.building_palette.len() as u64) as usize;
        &self.building_palette[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_layer_assignment() {
        let style = MapStyle::default();
        assert_eq!(style.layer_for(&tags(&[("leisure", "park")])), Some(Layer::Green));
        assert_eq!(style.layer_for(&tags(&[("landuse", "forest")])), Some(Layer::Forest));
        assert_eq!(style.layer_for(&tags(&[("natural", "bay")])), Some(Layer::Water));
        assert_eq!(style.layer_for(&tags(&[("man_made", "pier")])), Some(Layer::Parking));
        assert_eq!(style.layer_for(&tags(&[("highway", "primary")])), Some(Layer::Streets));
        assert_eq!(style.layer_for(&tags(&[("building", "yes")])), Some(Layer::Building));
        assert_eq!(style.layer_for(&tags(&[("highway", "bus_stop")])), None);
        assert_eq!(style.layer_for(&tags(&[("natural", "scrub")])), None);
    }

    #[test]
    fn test_pedestrian_highway_is_parking_first() {
        let style = MapStyle::default();
        assert_eq!(style.layer_for(&tags(&[("highway", "pedestrian")])), Some(Layer::Parking));
    }

    #[test]
    fn test_street_width() {
        let style = MapStyle::default();
        assert_eq!(style.street_width(&tags(&[("highway", "motorway")])), 5.0);
        assert_eq!(style.street_width(&tags(&[("highway", "unknown")])), 0.8);
    }

    #[test]
    fn test_any_value_rule() {
        let rule = LayerRule::new(Layer::Water, vec![("waterway", vec![])]);
        assert!(rule.matches(&tags(&[("waterway", "river")])));
        assert!(!rule.matches(&tags(&[("natural", "water")])));
    }

    #[test]
    fn test_building_palette_is_stable() {
        let style = MapStyle::default();
        assert_eq!(style.building_fill(0), "#FFC857");
        assert_eq!(style.building_fill(4), "#E9724C");
        assert_eq!(style.building_fill(4), style.building_fill(4));
    }
}
