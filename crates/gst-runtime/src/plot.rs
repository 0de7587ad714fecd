//! SVG rendering of exported aggregates.
//!
//! Every aggregate becomes one file, `<dir>/<config>_<generator>_c_<name>.svg`.
//! 1-D storage is drawn as a filled step outline, 2-D storage as a colour
//! map. All styling comes from the [`PlotStyle`] handed to [`PlotSink::new`].

use std::path::{Path, PathBuf};

use gst_core::error::Result;
use gst_core::event::PROTON_MASS;
use gst_core::run_tag::RunTag;
use gst_core::settings::DEFAULT_LABEL;
use gst_data::aggregate::{Aggregate, Titles};
use gst_data::histogram::{Axis, Binned, Hist1D, Hist2D};
use gst_data::sink::OutputSink;
use tracing::debug;

/// Constant-Q² contours drawn on the momentum-transfer plane (GeV²).
pub const Q2_CONTOURS: [f64; 5] = [0.2, 0.4, 0.6, 0.8, 1.0];

/// Constant-W contours drawn on the momentum-transfer plane (GeV): the
/// nucleon, Δ(1232) and second resonance region.
pub const W_CONTOURS: [f64; 3] = [0.938, 1.232, 1.535];

const CURVE_SAMPLES: usize = 200;

// ── Colour ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Linear interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - t) + f64::from(y) * t).round() as u8;
        Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }
}

// ── PlotStyle ─────────────────────────────────────────────────────────────────

/// Everything that controls how a plot looks.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub font_family: String,
    pub font_size: f64,
    pub background: Rgb,
    pub line_color: Rgb,
    pub fill_color: Rgb,
    /// Colour-map end points for 2-D storage.
    pub map_low: Rgb,
    pub map_high: Rgb,
    pub q2_curve_color: Rgb,
    pub w_curve_color: Rgb,
    /// First line of the label box.
    pub label: String,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin_left: 80.0,
            margin_right: 30.0,
            margin_top: 40.0,
            margin_bottom: 70.0,
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            font_size: 14.0,
            background: Rgb(255, 255, 255),
            line_color: Rgb(0, 0, 0),
            fill_color: Rgb(166, 189, 219),
            map_low: Rgb(255, 255, 204),
            map_high: Rgb(128, 0, 38),
            q2_curve_color: Rgb(33, 102, 172),
            w_curve_color: Rgb(178, 24, 43),
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl PlotStyle {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

// ── PlotSink ──────────────────────────────────────────────────────────────────

pub struct PlotSink {
    output_dir: PathBuf,
    tag: RunTag,
    style: PlotStyle,
    written: Vec<PathBuf>,
}

impl PlotSink {
    pub fn new(output_dir: &Path, tag: &RunTag, style: PlotStyle) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            tag: tag.clone(),
            style,
            written: Vec::new(),
        }
    }

    pub fn path_for(&self, aggregate: &Aggregate) -> PathBuf {
        self.output_dir
            .join(format!("{}_c_{}.svg", self.tag.stem(), aggregate.name()))
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for PlotSink {
    fn write(&mut self, _selection: &str, aggregate: &Aggregate) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(aggregate);
        std::fs::write(&path, render(aggregate, &self.tag, &self.style))?;
        debug!("Plot {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Energy transfer on a constant-Q² line.
pub fn q0_at_q2(q3: f64, q2: f64) -> f64 {
    (q3 * q3 - q2).max(0.0).sqrt()
}

/// Energy transfer on a constant-W line for a nucleon at rest.
pub fn q0_at_w(q3: f64, w: f64) -> f64 {
    (w * w + q3 * q3).sqrt() - PROTON_MASS
}

/// Render one aggregate as a complete SVG document.
pub fn render(aggregate: &Aggregate, tag: &RunTag, style: &PlotStyle) -> String {
    let kind = aggregate.kind();
    let hints = kind.plot_hints();
    let mut svg = Svg::new(style);

    svg.text(
        style.width / 2.0,
        style.margin_top / 2.0 + style.font_size / 2.0,
        aggregate.name(),
        Anchor::Middle,
        style.font_size,
    );

    match aggregate.binned() {
        Binned::One(h) => draw_1d(&mut svg, h, style),
        Binned::Two(h) => {
            let frame = match hints.zoom {
                Some((x_max, y_max)) => Frame::new(style, h.x_axis.min, x_max, h.y_axis.min, y_max),
                None => Frame::new(style, h.x_axis.min, h.x_axis.max, h.y_axis.min, h.y_axis.max),
            };
            draw_2d(&mut svg, h, &frame, style);
            if hints.reference_curves {
                draw_reference_curves(&mut svg, &frame, style);
            }
            draw_frame(&mut svg, &frame, &h.x_axis, style);
        }
    }

    draw_titles(&mut svg, &kind.titles(), style);

    if hints.label_box {
        draw_label_box(&mut svg, tag, style);
    }

    svg.finish()
}

fn draw_1d(svg: &mut Svg, h: &Hist1D, style: &PlotStyle) {
    let y_max = (h.max_count() as f64 * 1.1).max(1.0);
    let frame = Frame::new(style, h.axis.min, h.axis.max, 0.0, y_max);
    let base = frame.py(0.0);

    let mut points = Vec::with_capacity(2 * h.axis.bins + 2);
    points.push((frame.px(h.axis.min), base));
    for (i, &count) in h.counts.iter().enumerate() {
        let y = frame.py(count as f64);
        points.push((frame.px(h.axis.low_edge(i)), y));
        points.push((frame.px(h.axis.low_edge(i + 1)), y));
    }
    points.push((frame.px(h.axis.max), base));

    svg.polygon(&points, style.fill_color, style.line_color);
    draw_frame(svg, &frame, &h.axis, style);
}

fn draw_2d(svg: &mut Svg, h: &Hist2D, frame: &Frame, style: &PlotStyle) {
    let max = h.max_count();
    if max == 0 {
        return;
    }
    for iy in 0..h.y_axis.bins {
        let (y0, y1) = (h.y_axis.low_edge(iy), h.y_axis.low_edge(iy + 1));
        if y0 >= frame.y_max {
            break;
        }
        for ix in 0..h.x_axis.bins {
            let (x0, x1) = (h.x_axis.low_edge(ix), h.x_axis.low_edge(ix + 1));
            if x0 >= frame.x_max {
                break;
            }
            let count = h.get(ix, iy);
            if count == 0 {
                continue;
            }
            let colour = Rgb::lerp(style.map_low, style.map_high, count as f64 / max as f64);
            let (left, right) = (frame.px(x0), frame.px(x1.min(frame.x_max)));
            let (top, bottom) = (frame.py(y1.min(frame.y_max)), frame.py(y0));
            svg.rect(left, top, right - left, bottom - top, Some(colour), None);
        }
    }
}

fn draw_reference_curves(svg: &mut Svg, frame: &Frame, style: &PlotStyle) {
    let step = (frame.x_max - frame.x_min) / CURVE_SAMPLES as f64;
    let q3s: Vec<f64> = (0..=CURVE_SAMPLES)
        .map(|i| frame.x_min + i as f64 * step)
        .collect();

    for q2 in Q2_CONTOURS {
        let label = format!("Q² = {q2:.1}");
        draw_curve(svg, frame, &q3s, |q3| q0_at_q2(q3, q2), style.q2_curve_color, &label, style);
    }
    for w in W_CONTOURS {
        let label = format!("W = {w:.3}");
        draw_curve(svg, frame, &q3s, |q3| q0_at_w(q3, w), style.w_curve_color, &label, style);
    }
}

fn draw_curve(
    svg: &mut Svg,
    frame: &Frame,
    q3s: &[f64],
    q0: impl Fn(f64) -> f64,
    colour: Rgb,
    label: &str,
    style: &PlotStyle,
) {
    let points: Vec<(f64, f64)> = q3s
        .iter()
        .map(|&q3| (q3, q0(q3)))
        .filter(|&(_, y)| y.is_finite() && y >= frame.y_min && y <= frame.y_max)
        .map(|(x, y)| (frame.px(x), frame.py(y)))
        .collect();

    if let Some(&(x, y)) = points.last() {
        svg.polyline(&points, colour);
        svg.text(x - 4.0, y - 4.0, label, Anchor::End, style.font_size * 0.7);
    }
}

fn draw_frame(svg: &mut Svg, frame: &Frame, x_axis: &Axis, style: &PlotStyle) {
    svg.rect(
        frame.left,
        frame.top,
        frame.width,
        frame.height,
        None,
        Some(style.line_color),
    );

    let tick = style.font_size * 0.4;
    let small = style.font_size * 0.8;

    if x_axis.labels.is_empty() {
        for value in ticks(frame.x_min, frame.x_max) {
            let x = frame.px(value);
            svg.line(x, frame.bottom(), x, frame.bottom() - tick, style.line_color);
            svg.text(x, frame.bottom() + small + 4.0, &format_tick(value), Anchor::Middle, small);
        }
    } else {
        for (i, label) in x_axis.labels.iter().enumerate() {
            let x = frame.px(x_axis.centre(i));
            svg.line(x, frame.bottom(), x, frame.bottom() - tick, style.line_color);
            svg.text(x, frame.bottom() + small + 4.0, label, Anchor::Middle, small);
        }
    }

    for value in ticks(frame.y_min, frame.y_max) {
        let y = frame.py(value);
        svg.line(frame.left, y, frame.left + tick, y, style.line_color);
        svg.text(frame.left - 6.0, y + small / 3.0, &format_tick(value), Anchor::End, small);
    }
}

fn draw_titles(svg: &mut Svg, titles: &Titles, style: &PlotStyle) {
    let centre_x = style.margin_left + (style.width - style.margin_left - style.margin_right) / 2.0;
    let centre_y = style.margin_top + (style.height - style.margin_top - style.margin_bottom) / 2.0;
    svg.text(
        centre_x,
        style.height - style.margin_bottom / 3.0,
        &titles.x,
        Anchor::Middle,
        style.font_size,
    );
    svg.text_rotated(style.font_size * 1.2, centre_y, &titles.y, style.font_size);
}

fn draw_label_box(svg: &mut Svg, tag: &RunTag, style: &PlotStyle) {
    let lines = [
        style.label.clone(),
        tag.config.clone(),
        format!("Generators: {}", tag.generator),
    ];
    let line_height = style.font_size * 1.3;
    let width = 260.0;
    let height = line_height * lines.len() as f64 + 10.0;
    let left = style.margin_left + 12.0;
    let top = style.margin_top + 12.0;

    svg.rect(left, top, width, height, Some(style.background), Some(style.line_color));
    for (i, line) in lines.iter().enumerate() {
        svg.text(
            left + 8.0,
            top + 5.0 + line_height * (i as f64 + 0.8),
            line,
            Anchor::Start,
            style.font_size,
        );
    }
}

/// Five evenly spaced tick values covering `[min, max]`.
fn ticks(min: f64, max: f64) -> Vec<f64> {
    (0..=4_i32).map(|i| min + (max - min) * f64::from(i) / 4.0).collect()
}

fn format_tick(value: f64) -> String {
    if value.abs() >= 100.0 || value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Data-to-pixel mapping of the plot area.
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn new(style: &PlotStyle, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            left: style.margin_left,
            top: style.margin_top,
            width: style.width - style.margin_left - style.margin_right,
            height: style.height - style.margin_top - style.margin_bottom,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn px(&self, x: f64) -> f64 {
        self.left + (x - self.x_min) / (self.x_max - self.x_min) * self.width
    }

    fn py(&self, y: f64) -> f64 {
        self.bottom() - (y - self.y_min) / (self.y_max - self.y_min) * self.height
    }
}

// ── SVG writer ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

struct Svg {
    body: String,
    font_family: String,
    text_color: Rgb,
}

impl Svg {
    fn new(style: &PlotStyle) -> Self {
        let mut body = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = style.width,
            h = style.height,
        );
        body.push('\n');
        body.push_str(&format!(
            r#"<rect x="0" y="0" width="{}" height="{}" fill="{}" />"#,
            style.width,
            style.height,
            style.background.to_hex()
        ));
        body.push('\n');
        Self {
            body,
            font_family: style.font_family.clone(),
            text_color: style.line_color,
        }
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Option<Rgb>, stroke: Option<Rgb>) {
        let fill = fill.map(Rgb::to_hex).unwrap_or_else(|| "none".to_string());
        let stroke = stroke.map(Rgb::to_hex).unwrap_or_else(|| "none".to_string());
        self.body.push_str(&format!(
            r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}" stroke="{stroke}" />"#
        ));
        self.body.push('\n');
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, colour: Rgb) {
        self.body.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{}" />"#,
            colour.to_hex()
        ));
        self.body.push('\n');
    }

    fn polyline(&mut self, points: &[(f64, f64)], colour: Rgb) {
        self.body.push_str(&format!(
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5" />"#,
            join_points(points),
            colour.to_hex()
        ));
        self.body.push('\n');
    }

    fn polygon(&mut self, points: &[(f64, f64)], fill: Rgb, stroke: Rgb) {
        self.body.push_str(&format!(
            r#"<polygon points="{}" fill="{}" stroke="{}" />"#,
            join_points(points),
            fill.to_hex(),
            stroke.to_hex()
        ));
        self.body.push('\n');
    }

    fn text(&mut self, x: f64, y: f64, content: &str, anchor: Anchor, size: f64) {
        self.body.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" font-family="{}" font-size="{size:.1}" fill="{}" text-anchor="{}">{}</text>"#,
            self.font_family,
            self.text_color.to_hex(),
            anchor.as_str(),
            escape(content)
        ));
        self.body.push('\n');
    }

    fn text_rotated(&mut self, x: f64, y: f64, content: &str, size: f64) {
        self.body.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" font-family="{}" font-size="{size:.1}" fill="{}" text-anchor="middle" transform="rotate(-90 {x:.2} {y:.2})">{}</text>"#,
            self.font_family,
            self.text_color.to_hex(),
            escape(content)
        ));
        self.body.push('\n');
    }

    fn finish(mut self) -> String {
        self.body.push_str("</svg>\n");
        self.body
    }
}

fn join_points(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gst_core::event::{EventRecord, ThreeVector};
    use gst_data::aggregate::AggregateKind;
    use tempfile::TempDir;

    fn tag() -> RunTag {
        RunTag::new("DefaultPlusMEC", "Default")
    }

    fn q0q3() -> Aggregate {
        let mut agg = Aggregate::new("h_all_q0q3", AggregateKind::MomentumTransfer);
        agg.fill(&EventRecord {
            enu: 1.0,
            elep: 0.4,
            nu_momentum: ThreeVector::new(0.0, 0.0, 1.0),
            lepton_momentum: ThreeVector::new(0.0, 0.0, 0.8),
            ..Default::default()
        });
        agg
    }

    // ── curves ────────────────────────────────────────────────────────────────

    #[test]
    fn test_q2_contour() {
        assert!((q0_at_q2(1.0, 0.2) - 0.8_f64.sqrt()).abs() < 1e-12);
        assert_eq!(q0_at_q2(0.3, 0.2), 0.0);
    }

    #[test]
    fn test_w_contour() {
        assert!((q0_at_w(0.0, PROTON_MASS)).abs() < 1e-12);
        assert!((q0_at_w(1.0, 1.232) - ((1.232_f64.powi(2) + 1.0).sqrt() - PROTON_MASS)).abs() < 1e-12);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgb(0, 0, 0);
        let b = Rgb(255, 255, 255);
        assert_eq!(Rgb::lerp(a, b, 0.0), a);
        assert_eq!(Rgb::lerp(a, b, 1.0), b);
        assert_eq!(Rgb::lerp(a, b, 7.0), b);
        assert_eq!(Rgb(255, 0, 16).to_hex(), "#ff0010");
    }

    // ── render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_q0q3_has_curves_and_label_box() {
        let svg = render(&q0q3(), &tag(), &PlotStyle::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Q² = 0.2"));
        assert!(svg.contains("Q² = 1.0"));
        assert!(svg.contains("W = 1.232"));
        assert!(svg.contains("Generators: Default"));
        assert!(svg.contains("DefaultPlusMEC"));
        assert!(svg.contains(DEFAULT_LABEL));
        assert_eq!(svg.matches("<polyline").count(), 8);
    }

    #[test]
    fn test_render_categorical_labels() {
        let mut agg = Aggregate::new("h_all_intmode", AggregateKind::InteractionMode);
        agg.fill(&EventRecord::default());
        let svg = render(&agg, &tag(), &PlotStyle::default());
        assert!(svg.contains(">CCQE</text>"));
        assert!(svg.contains(">Other</text>"));
        assert!(svg.contains("<polygon"));
        assert!(!svg.contains("Generators:"));
    }

    #[test]
    fn test_render_escapes_label() {
        let style = PlotStyle::default().with_label("A & <B>");
        let svg = render(&q0q3(), &tag(), &style);
        assert!(svg.contains("A &amp; &lt;B&gt;"));
    }

    #[test]
    fn test_render_empty_2d() {
        let agg = Aggregate::new("h_ccmec_pke", AggregateKind::DiProtonKe);
        let svg = render(&agg, &tag(), &PlotStyle::default());
        assert!(svg.contains("Generators: Default"));
        assert!(!svg.contains("<polyline"));
    }

    // ── PlotSink ──────────────────────────────────────────────────────────────

    #[test]
    fn test_plot_sink_writes_named_files() {
        let tmp = TempDir::new().unwrap();
        let mut sink = PlotSink::new(tmp.path(), &tag(), PlotStyle::default());
        sink.write("all", &q0q3()).unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.written().len(), 1);
        let path = &sink.written()[0];
        assert!(path.ends_with("DefaultPlusMEC_Default_c_h_all_q0q3.svg"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("h_all_q0q3"));
    }
}
