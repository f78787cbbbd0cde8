///! Scene renderer
///!
///! Builds an SVG document for the current scene (a themed map when the ISS
///! is over land, a flat panel when it is over water), rasterises it with
///! resvg and writes the PNG to the configured output path.

use resvg::tiny_skia;
use resvg::usvg::{fontdb, Options, Tree};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::map::{Layer, LayerStyle, LocalProjection, MapFeature, MapSource, MapStyle};
use crate::config::RenderConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::model::{CrewRoster, LocationClassification, RenderedScene, Scene};

const LAND_SVG_TEMPLATE: &str = include_str!("../../resources/land_template.svg");
const OCEAN_SVG_TEMPLATE: &str = include_str!("../../resources/ocean_template.svg");

const TITLE: &str = "Current location of ISS";
const MAX_TITLE_CHARS: usize = 60;

/// Position relative to the canvas, origin bottom-left, both axes 0..1
#[derive(Debug, Clone, Copy)]
struct Rel(f32, f32);

impl Rel {
    fn to_canvas(self, canvas: (f32, f32)) -> (f32, f32) {
        (self.0 * canvas.0, (1.0 - self.1) * canvas.1)
    }
}

pub struct SceneRenderer {
    config: RenderConfig,
    style: MapStyle,
    output_path: PathBuf,
    map_source: Arc<dyn MapSource>,
}

impl SceneRenderer {
    // Land layout
    const MAP_CENTER: Rel = Rel(0.5, 0.62);
    /// Map circle radius as a share of the canvas width
    const MAP_RADIUS_SHARE: f32 = 0.45;
    const LAND_TITLE: Rel = Rel(0.5, 0.975);
    const LAND_DATE: Rel = Rel(0.03, 0.30);
    const LAND_ROSTER: Rel = Rel(0.03, 0.26);

    // Ocean layout
    const OCEAN_TITLE: Rel = Rel(0.03, 0.95);
    const OCEAN_DATE: Rel = Rel(0.83, 0.95);
    const OCEAN_SEA_LABEL: Rel = Rel(0.83, 0.90);
    const OCEAN_COORDS: Rel = Rel(0.83, 0.87);
    const OCEAN_ROSTER: Rel = Rel(0.63, 0.37);

    const LINE_STEP: f32 = 0.025;
    const CRAFT_GAP: f32 = 0.015;
    /// Lowest baseline the roster may use
    const ROSTER_BOTTOM: f32 = 0.02;
    const MEMBER_INDENT: f32 = 0.03;
    const MARKER_RADIUS: f32 = 4.0;
    const HATCH_STEP: f32 = 3.0;

    pub fn new(
        config: RenderConfig,
        style: MapStyle,
        output_path: impl AsRef<Path>,
        map_source: Arc<dyn MapSource>,
    ) -> Self {
        Self {
            config,
            style,
            output_path: output_path.as_ref().to_path_buf(),
            map_source,
        }
    }

    /// Render `scene` and overwrite the output file
    pub async fn render(&self, scene: &Scene) -> TrackerResult<RenderedScene> {
        let (svg, canvas) = match scene.classification {
            LocationClassification::Land => {
                tracing::info!("{} is not in the ocean, drawing map", scene.coordinate);
                let features = self
                    .map_source
                    .features(scene.coordinate, self.config.radius_m, &self.style)
                    .await?;
                (self.build_land_svg(scene, &features), self.config.land)
            }
            LocationClassification::Ocean => {
                tracing::info!("{} is in the ocean, drawing sea panel", scene.coordinate);
                (self.build_ocean_svg(scene), self.config.ocean)
            }
        };

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let (width, height) = render_svg_to_png(
            &svg,
            &self.output_path,
            canvas.scale(),
            &self.config.font_family,
            self.config.fonts_dir.as_deref(),
        )?;
        let bytes = tokio::fs::metadata(&self.output_path).await?.len();

        tracing::info!(
            "Saved {}x{} image ({} bytes) to {:?}",
            width,
            height,
            bytes,
            self.output_path
        );

        Ok(RenderedScene {
            path: self.output_path.clone(),
            classification: scene.classification,
            width,
            height,
            bytes,
        })
    }

    fn build_land_svg(&self, scene: &Scene, features: &[MapFeature]) -> String {
        let canvas = self.config.land.size_pt();
        let center = Self::MAP_CENTER.to_canvas(canvas);
        let radius = canvas.0 * Self::MAP_RADIUS_SHARE;
        let projection = LocalProjection::new(scene.coordinate, self.config.radius_m, center, radius);
        let styles = &self.style.styles;

        let mut defs = String::new();
        let _ = writeln!(
            defs,
            r#"<clipPath id="map-clip"><circle cx="{:.1}" cy="{:.1}" r="{:.1}"/></clipPath>"#,
            center.0, center.1, radius
        );
        defs.push_str(&Self::hatch_pattern("background", &styles.background));
        defs.push_str(&Self::hatch_pattern("perimeter", &styles.perimeter));
        for layer in Layer::DRAW_ORDER {
            defs.push_str(&Self::hatch_pattern(layer.name(), self.style.style_for(layer)));
        }

        let mut map = String::new();
        if styles.background.hatch.is_some() {
            let _ = writeln!(
                map,
                r#"<rect x="0" y="0" width="{:.0}" height="{:.0}" fill="url(#hatch-background)"/>"#,
                canvas.0, canvas.1
            );
        }
        let _ = writeln!(
            map,
            r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            center.0,
            center.1,
            radius,
            escape_xml(&styles.perimeter.fill),
            escape_xml(&styles.perimeter.stroke),
            styles.perimeter.stroke_width
        );
        if styles.perimeter.hatch.is_some() {
            let _ = writeln!(
                map,
                r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="url(#hatch-perimeter)"/>"#,
                center.0, center.1, radius
            );
        }

        map.push_str("<g clip-path=\"url(#map-clip)\">\n");
        for layer in Layer::DRAW_ORDER {
            for feature in features
                .iter()
                .filter(|f| f.layer == layer && projection.reaches(&f.points))
            {
                map.push_str(&self.feature_svg(feature, &projection));
            }
        }
        map.push_str("</g>\n");

        // ISS ground point
        let _ = writeln!(
            map,
            r##"<circle cx="{:.1}" cy="{:.1}" r="{}" fill="#C5283D" stroke="#ffffff" stroke-width="1.5"/>"##,
            center.0,
            center.1,
            Self::MARKER_RADIUS
        );

        let title = self.title_svg(scene, Self::LAND_TITLE, canvas, "middle");

        let mut roster = String::new();
        roster.push_str(&text_svg(
            Self::LAND_DATE.to_canvas(canvas),
            "date",
            "start",
            &format!("{}  {}", scene.captured_on.format("%Y-%m-%d"), scene.coordinate),
        ));
        roster.push_str(&Self::roster_svg(&scene.roster, Self::LAND_ROSTER, canvas));

        LAND_SVG_TEMPLATE
            .replace("{{WIDTH}}", &format!("{:.0}", canvas.0))
            .replace("{{HEIGHT}}", &format!("{:.0}", canvas.1))
            .replace("{{FONT}}", &css_font_family(&self.config.font_family))
            .replace("{{BACKGROUND}}", &escape_xml(&styles.background.fill))
            .replace("{{DEFS}}", &defs)
            .replace("{{MAP}}", &map)
            .replace("{{TITLE}}", &title)
            .replace("{{ROSTER}}", &roster)
    }

    fn build_ocean_svg(&self, scene: &Scene) -> String {
        let canvas = self.config.ocean.size_pt();

        let title = self.title_svg(scene, Self::OCEAN_TITLE, canvas, "start");

        let mut labels = String::new();
        labels.push_str(&text_svg(
            Self::OCEAN_DATE.to_canvas(canvas),
            "date",
            "start",
            &scene.captured_on.format("%Y-%m-%d").to_string(),
        ));
        labels.push_str(&text_svg(
            Self::OCEAN_SEA_LABEL.to_canvas(canvas),
            "label",
            "start",
            "In the sea",
        ));
        labels.push_str(&text_svg(
            Self::OCEAN_COORDS.to_canvas(canvas),
            "label",
            "start",
            &scene.coordinate.to_string(),
        ));

        let roster = Self::roster_svg(&scene.roster, Self::OCEAN_ROSTER, canvas);

        OCEAN_SVG_TEMPLATE
            .replace("{{WIDTH}}", &format!("{:.0}", canvas.0))
            .replace("{{HEIGHT}}", &format!("{:.0}", canvas.1))
            .replace("{{FONT}}", &css_font_family(&self.config.font_family))
            .replace("{{BACKGROUND}}", &escape_xml(&self.config.ocean_background))
            .replace("{{TITLE}}", &title)
            .replace("{{LABELS}}", &labels)
            .replace("{{ROSTER}}", &roster)
    }

    /// Title line followed by the address, wrapped on comma boundaries
    fn title_svg(&self, scene: &Scene, at: Rel, canvas: (f32, f32), anchor: &str) -> String {
        let mut lines = vec![TITLE.to_string()];
        if let Some(address) = &scene.address {
            lines.extend(wrap_address(address, MAX_TITLE_CHARS));
        }

        let mut out = String::new();
        for (i, line) in lines.iter().enumerate() {
            let pos = Rel(at.0, at.1 - i as f32 * Self::LINE_STEP * 0.6).to_canvas(canvas);
            out.push_str(&text_svg(pos, "title", anchor, line));
        }
        out
    }

    /// Crew count, then every craft followed by its crew.
    ///
    /// Line spacing shrinks when the full roster would run past `ROSTER_BOTTOM`.
    fn roster_svg(roster: &CrewRoster, at: Rel, canvas: (f32, f32)) -> String {
        let mut out = String::new();
        out.push_str(&text_svg(
            at.to_canvas(canvas),
            "count",
            "start",
            &format!("{} people in the ISS", roster.total()),
        ));

        let (step, gap) = Self::roster_spacing(roster, at.1);
        let mut y = at.1 - step * 1.5;
        for (craft, names) in roster.crafts() {
            out.push_str(&text_svg(
                Rel(at.0 + 0.02, y).to_canvas(canvas),
                "craft",
                "start",
                craft,
            ));
            for name in names {
                y -= step;
                out.push_str(&text_svg(
                    Rel(at.0 + 0.02 + Self::MEMBER_INDENT, y).to_canvas(canvas),
                    "member",
                    "start",
                    name,
                ));
            }
            y -= step + gap;
        }
        out
    }

    /// Line step and craft gap that keep the last roster line above `ROSTER_BOTTOM`
    fn roster_spacing(roster: &CrewRoster, top: f32) -> (f32, f32) {
        let crafts = roster.len().saturating_sub(1) as f32;
        let extent = Self::LINE_STEP * (1.5 + roster.total() as f32)
            + (Self::LINE_STEP + Self::CRAFT_GAP) * crafts;
        let available = (top - Self::ROSTER_BOTTOM).max(0.0);
        let fit = if extent > available { available / extent } else { 1.0 };
        (Self::LINE_STEP * fit, Self::CRAFT_GAP * fit)
    }

    fn feature_svg(&self, feature: &MapFeature, projection: &LocalProjection) -> String {
        let path = path_data(&feature.points, projection, feature.is_closed());
        let style = self.style.style_for(feature.layer);

        if feature.layer == Layer::Streets {
            return format!(
                r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round" opacity="{}"/>
"#,
                path,
                escape_xml(&style.fill),
                self.style.street_width(&feature.tags),
                style.alpha
            );
        }

        let fill = if feature.layer == Layer::Building {
            self.style.building_fill(feature.id)
        } else {
            style.fill.as_str()
        };

        let mut out = format!(
            r#"<path d="{}" fill="{}" stroke="{}" stroke-width="{}" opacity="{}"/>
"#,
            path,
            escape_xml(fill),
            escape_xml(&style.stroke),
            style.stroke_width,
            style.alpha
        );
        if style.hatch.is_some() {
            let _ = writeln!(
                out,
                r#"<path d="{}" fill="url(#hatch-{})" stroke="none"/>"#,
                path,
                feature.layer.name()
            );
        }
        out
    }

    /// Repeating tile of `o` rings and `.` dots along the diagonal
    fn hatch_pattern(name: &str, style: &LayerStyle) -> String {
        let Some(hatch) = style.hatch.as_deref().filter(|h| !h.is_empty()) else {
            return String::new();
        };
        let color = escape_xml(style.hatch_color.as_deref().unwrap_or(&style.stroke));
        let step = Self::HATCH_STEP;
        let size = step * hatch.chars().count() as f32;

        let mut marks = String::new();
        for (i, mark) in hatch.chars().enumerate() {
            let c = step * i as f32 + step / 2.0;
            match mark {
                'o' => {
                    let _ = write!(
                        marks,
                        r#"<circle cx="{c:.2}" cy="{c:.2}" r="{r:.2}" fill="none" stroke="{color}" stroke-width="0.4"/>"#,
                        r = step * 0.35,
                    );
                }
                '.' => {
                    let _ = write!(
                        marks,
                        r#"<circle cx="{c:.2}" cy="{c:.2}" r="0.4" fill="{color}"/>"#,
                    );
                }
                _ => {}
            }
        }

        format!(
            r#"<pattern id="hatch-{name}" patternUnits="userSpaceOnUse" width="{size:.2}" height="{size:.2}">{marks}</pattern>
"#
        )
    }
}

fn path_data(points: &[(f64, f64)], projection: &LocalProjection, closed: bool) -> String {
    let mut d = String::new();
    for (i, (lat, lon)) in points.iter().enumerate() {
        let (x, y) = projection.project(*lat, *lon);
        let _ = write!(d, "{}{:.1},{:.1} ", if i == 0 { "M" } else { "L" }, x, y);
    }
    if closed {
        d.push('Z');
    }
    d.trim_end().to_string()
}

fn text_svg(pos: (f32, f32), class: &str, anchor: &str, text: &str) -> String {
    format!(
        r#"<text x="{:.1}" y="{:.1}" class="{}" text-anchor="{}">{}</text>
"#,
        pos.0,
        pos.1,
        class,
        anchor,
        escape_xml(text)
    )
}

/// Split an address into lines of at most `max_chars`, breaking after commas
fn wrap_address(address: &str, max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for part in address.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let needed = if current.is_empty() { part.len() } else { current.len() + 2 + part.len() };
        if !current.is_empty() && needed > max_chars {
            current.push(',');
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str(", ");
        }
        current.push_str(part);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn css_font_family(family: &str) -> String {
    if family.contains(char::is_whitespace) {
        format!("'{}', monospace", family.replace('\'', ""))
    } else {
        family.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Rasterise an SVG document at `scale` and save it as PNG. Returns the pixel size.
fn render_svg_to_png(
    svg_content: &str,
    output_path: &Path,
    scale: f32,
    font_family: &str,
    fonts_dir: Option<&Path>,
) -> TrackerResult<(u32, u32)> {
    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();
    if let Some(dir) = fonts_dir.filter(|d| d.is_dir()) {
        fontdb.load_fonts_dir(dir);
    }
    tracing::debug!("Loaded {} font faces", fontdb.len());

    let mut options = Options::default();
    options.font_family = font_family.to_string();
    options.fontdb = Arc::new(fontdb);

    let tree = Tree::from_str(svg_content, &options)
        .map_err(|e| TrackerError::Render(format!("failed to parse SVG: {}", e)))?;

    let size = tree.size();
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| TrackerError::Render(format!("cannot allocate {}x{} pixmap", width, height)))?;

    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap
        .save_png(output_path)
        .map_err(|e| TrackerError::Render(format!("failed to save PNG: {}", e)))?;

    Ok((width, height))
}
