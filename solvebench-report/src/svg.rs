//! SVG Box-Plot Rendering
//!
//! Self-contained SVG output, one file per figure, no plotting
//! dependency. A figure is one or more labeled boxes sharing a value
//! axis: one box for the per-level figures, one per level for the
//! combined figures. Geometry comes straight from `BoxStats`; nothing
//! statistical happens here.

use solvebench_stats::BoxStats;

const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 64.0;
const TICK_COUNT: u32 = 5;
const MAX_BOX_WIDTH: f64 = 90.0;

const BOX_FILL: &str = "#9ec5e8";
const BOX_STROKE: &str = "#2c5d8f";
const MEDIAN_STROKE: &str = "#16324a";
const AXIS_STROKE: &str = "#444444";
const GRID_STROKE: &str = "#dddddd";

/// Figure-level options
#[derive(Debug, Clone)]
pub struct PlotOptions {
    /// Pixel width of the figure
    pub width: u32,
    /// Pixel height of the figure
    pub height: u32,
    /// Title drawn above the plot area
    pub title: String,
    /// Value-axis label
    pub value_label: String,
}

/// Render one figure with a box per labeled group
///
/// Callers guarantee at least one group; an empty slice still produces a
/// valid (if bare) SVG document rather than panicking.
pub fn render_box_plot(groups: &[(String, BoxStats)], options: &PlotOptions) -> String {
    let width = options.width as f64;
    let height = options.height as f64;
    let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;

    let (lo, hi) = value_domain(groups);
    let scale = |value: f64| -> f64 {
        let t = (value - lo) / (hi - lo);
        MARGIN_TOP + plot_h * (1.0 - t)
    };

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">\n",
        w = options.width,
        h = options.height,
    ));
    svg.push_str(&format!(
        "  <rect width=\"{w}\" height=\"{h}\" fill=\"white\"/>\n",
        w = options.width,
        h = options.height,
    ));

    // Title
    svg.push_str(&format!(
        "  <text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"middle\" font-size=\"15\">{title}</text>\n",
        x = width / 2.0,
        y = MARGIN_TOP / 2.0 + 5.0,
        title = xml_escape(&options.title),
    ));

    // Value-axis label, rotated along the left edge
    svg.push_str(&format!(
        "  <text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"middle\" font-size=\"12\" \
         transform=\"rotate(-90 {x:.1} {y:.1})\">{label}</text>\n",
        x = 16.0,
        y = MARGIN_TOP + plot_h / 2.0,
        label = xml_escape(&options.value_label),
    ));

    // Gridlines, ticks, and tick labels
    for i in 0..=TICK_COUNT {
        let value = lo + (hi - lo) * i as f64 / TICK_COUNT as f64;
        let y = scale(value);
        svg.push_str(&format!(
            "  <line x1=\"{x1:.1}\" y1=\"{y:.1}\" x2=\"{x2:.1}\" y2=\"{y:.1}\" stroke=\"{grid}\"/>\n",
            x1 = MARGIN_LEFT,
            x2 = width - MARGIN_RIGHT,
            y = y,
            grid = GRID_STROKE,
        ));
        svg.push_str(&format!(
            "  <text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"end\" font-size=\"11\">{label}</text>\n",
            x = MARGIN_LEFT - 6.0,
            y = y + 4.0,
            label = format_tick(value),
        ));
    }

    // Axes
    svg.push_str(&format!(
        "  <line x1=\"{x:.1}\" y1=\"{y1:.1}\" x2=\"{x:.1}\" y2=\"{y2:.1}\" stroke=\"{axis}\"/>\n",
        x = MARGIN_LEFT,
        y1 = MARGIN_TOP,
        y2 = MARGIN_TOP + plot_h,
        axis = AXIS_STROKE,
    ));
    svg.push_str(&format!(
        "  <line x1=\"{x1:.1}\" y1=\"{y:.1}\" x2=\"{x2:.1}\" y2=\"{y:.1}\" stroke=\"{axis}\"/>\n",
        x1 = MARGIN_LEFT,
        x2 = width - MARGIN_RIGHT,
        y = MARGIN_TOP + plot_h,
        axis = AXIS_STROKE,
    ));

    // One box per group
    let slot = if groups.is_empty() {
        plot_w
    } else {
        plot_w / groups.len() as f64
    };
    let box_w = (slot * 0.5).min(MAX_BOX_WIDTH);

    for (i, (label, stats)) in groups.iter().enumerate() {
        let cx = MARGIN_LEFT + slot * (i as f64 + 0.5);
        draw_box(&mut svg, cx, box_w, stats, &scale);

        svg.push_str(&format!(
            "  <text x=\"{cx:.1}\" y=\"{y:.1}\" text-anchor=\"middle\" font-size=\"12\">{label}</text>\n",
            cx = cx,
            y = MARGIN_TOP + plot_h + 20.0,
            label = xml_escape(label),
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn draw_box(svg: &mut String, cx: f64, box_w: f64, stats: &BoxStats, scale: &dyn Fn(f64) -> f64) {
    let half = box_w / 2.0;
    let cap = box_w * 0.3;

    let y_q1 = scale(stats.q1);
    let y_q3 = scale(stats.q3);
    let y_median = scale(stats.median);
    let y_lo = scale(stats.whisker_low);
    let y_hi = scale(stats.whisker_high);

    // Whisker stems (box edge to whisker) and caps
    for (from, to) in [(y_q1, y_lo), (y_q3, y_hi)] {
        svg.push_str(&format!(
            "  <line x1=\"{cx:.1}\" y1=\"{from:.1}\" x2=\"{cx:.1}\" y2=\"{to:.1}\" stroke=\"{s}\"/>\n",
            cx = cx,
            from = from,
            to = to,
            s = BOX_STROKE,
        ));
        svg.push_str(&format!(
            "  <line x1=\"{x1:.1}\" y1=\"{to:.1}\" x2=\"{x2:.1}\" y2=\"{to:.1}\" stroke=\"{s}\"/>\n",
            x1 = cx - cap,
            x2 = cx + cap,
            to = to,
            s = BOX_STROKE,
        ));
    }

    // IQR box; a degenerate box (all samples equal) still gets 1px
    let box_h = (y_q1 - y_q3).max(1.0);
    svg.push_str(&format!(
        "  <rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" \
         fill=\"{fill}\" stroke=\"{stroke}\"/>\n",
        x = cx - half,
        y = y_q3,
        w = box_w,
        h = box_h,
        fill = BOX_FILL,
        stroke = BOX_STROKE,
    ));

    // Median line
    svg.push_str(&format!(
        "  <line x1=\"{x1:.1}\" y1=\"{y:.1}\" x2=\"{x2:.1}\" y2=\"{y:.1}\" \
         stroke=\"{s}\" stroke-width=\"2\"/>\n",
        x1 = cx - half,
        x2 = cx + half,
        y = y_median,
        s = MEDIAN_STROKE,
    ));

    // Outlier points
    for &outlier in &stats.outliers {
        svg.push_str(&format!(
            "  <circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"2.5\" fill=\"none\" stroke=\"{s}\"/>\n",
            cx = cx,
            cy = scale(outlier),
            s = BOX_STROKE,
        ));
    }
}

/// Plot domain: span of every whisker and outlier, padded 5% each side.
/// A flat distribution gets a symmetric pad so the box stays visible.
fn value_domain(groups: &[(String, BoxStats)]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (_, stats) in groups {
        lo = lo.min(stats.plot_min());
        hi = hi.max(stats.plot_max());
    }

    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }

    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }

    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn format_tick(value: f64) -> String {
    let abs = value.abs();
    if value == 0.0 {
        "0".to_string()
    } else if abs >= 1000.0 {
        format!("{value:.0}")
    } else if abs >= 10.0 {
        format!("{value:.1}")
    } else if abs >= 0.01 {
        format!("{value:.3}")
    } else {
        format!("{value:.5}")
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use solvebench_stats::compute_box_stats;

    fn options(title: &str) -> PlotOptions {
        PlotOptions {
            width: 600,
            height: 400,
            title: title.to_string(),
            value_label: "Wall time (seconds)".to_string(),
        }
    }

    fn group(label: &str, samples: &[f64]) -> (String, BoxStats) {
        (label.to_string(), compute_box_stats(samples).unwrap())
    }

    #[test]
    fn test_single_box_structure() {
        let groups = vec![group("easy", &[1.0, 2.0, 3.0, 4.0, 5.0])];
        let svg = render_box_plot(&groups, &options("Wall time for easy"));

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Wall time for easy"));
        assert!(svg.contains(">easy</text>"));
        // Background plus exactly one IQR box
        assert_eq!(svg.matches("<rect").count(), 2);
    }

    #[test]
    fn test_outliers_drawn_as_circles() {
        let groups = vec![group("spiky", &[1.0, 1.1, 1.2, 1.3, 1.4, 50.0])];
        let svg = render_box_plot(&groups, &options("spiky"));

        assert_eq!(svg.matches("<circle").count(), 1);
    }

    #[test]
    fn test_combined_plot_has_box_per_level() {
        let groups = vec![
            group("easy", &[1.0, 2.0, 3.0]),
            group("hard", &[10.0, 12.0, 14.0]),
        ];
        let svg = render_box_plot(&groups, &options("All levels"));

        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains(">easy</text>"));
        assert!(svg.contains(">hard</text>"));
    }

    #[test]
    fn test_flat_distribution_renders() {
        let groups = vec![group("flat", &[2.0; 8])];
        let svg = render_box_plot(&groups, &options("flat"));

        // Degenerate box still drawn, no NaN coordinates
        assert!(!svg.contains("NaN"));
        assert_eq!(svg.matches("<rect").count(), 2);
    }

    #[test]
    fn test_labels_are_escaped() {
        let groups = vec![group("a<b&c", &[1.0, 2.0])];
        let svg = render_box_plot(&groups, &options("tricky <title>"));

        assert!(svg.contains("a&lt;b&amp;c"));
        assert!(svg.contains("tricky &lt;title&gt;"));
        assert!(!svg.contains("<title>"));
    }
}
