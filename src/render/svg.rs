//! Low-level SVG assembly.
//!
//! Charts are plain SVG strings built by hand; no rasterization.

use std::f64::consts::PI;

/// Fixed chart palette, in series order.
pub const PALETTE: [&str; 12] = [
    "#B20000", // darkened red
    "#0073A5", // darkened deepskyblue
    "#B2B200", // darkened yellow
    "#B200B2", // darkened magenta
    "#483D8B", // darkened slateblue
    "#CC8400", // darkened orange
    "#00008B", // darkened mediumblue
    "#3B4B27", // darkened darkolivegreen
    "#54586B", // darkened lightslategrey
    "#701C1C", // darkened brown
    "#249324", // darkened limegreen
    "#167E7E", // darkened lightseagreen
];

/// Series color for index `i`, wrapping around the palette.
pub fn series_color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Incrementally assembled SVG document with a solid background.
pub struct SvgCanvas {
    width: u32,
    height: u32,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: u32, height: u32, background: &str) -> Self {
        let mut canvas = Self {
            width,
            height,
            body: String::new(),
        };
        canvas.rect(0.0, 0.0, width as f64, height as f64, background);
        canvas
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.body.push_str(&format!(
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" fill=\"{fill}\"/>\n"
        ));
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) {
        self.body.push_str(&format!(
            "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"{stroke}\" stroke-width=\"1\"/>\n"
        ));
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str) {
        if points.is_empty() {
            return;
        }
        let coords: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect();
        self.body.push_str(&format!(
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"2\"/>\n",
            coords.join(" ")
        ));
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        self.body.push_str(&format!(
            "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r:.1}\" fill=\"{fill}\"/>\n"
        ));
    }

    pub fn path(&mut self, d: &str, fill: &str) {
        self.body.push_str(&format!(
            "<path d=\"{d}\" fill=\"{fill}\" stroke=\"#ffffff\" stroke-width=\"1\"/>\n"
        ));
    }

    /// Text anchored at `(x, y)`; `anchor` is `start`, `middle`, or `end`.
    pub fn text(&mut self, x: f64, y: f64, size: u32, anchor: &str, fill: &str, content: &str) {
        self.body.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{y:.1}\" font-family=\"monospace\" font-size=\"{size}\" \
             text-anchor=\"{anchor}\" fill=\"{fill}\">{}</text>\n",
            escape_xml(content)
        ));
    }

    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
             viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

/// Path data for a pie slice from `start` to `end` (radians, clockwise,
/// 0 at 3 o'clock). The caller handles the full-circle case.
pub fn pie_slice_path(cx: f64, cy: f64, r: f64, start: f64, end: f64) -> String {
    let (x1, y1) = (cx + r * start.cos(), cy + r * start.sin());
    let (x2, y2) = (cx + r * end.cos(), cy + r * end.sin());
    let large_arc = if end - start > PI { 1 } else { 0 };
    format!(
        "M {cx:.1} {cy:.1} L {x1:.1} {y1:.1} A {r:.1} {r:.1} 0 {large_arc} 1 {x2:.1} {y2:.1} Z"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("C&C++ <3"), "C&amp;C++ &lt;3");
    }

    #[test]
    fn test_canvas_produces_well_formed_document() {
        let mut canvas = SvgCanvas::new(600, 400, "#ffffff");
        canvas.text(10.0, 20.0, 14, "start", "#000000", "hello");
        let svg = canvas.finish();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("width=\"600\""));
        assert!(svg.contains(">hello</text>"));
    }

    #[test]
    fn test_series_color_wraps() {
        assert_eq!(series_color(0), PALETTE[0]);
        assert_eq!(series_color(12), PALETTE[0]);
        assert_eq!(series_color(13), PALETTE[1]);
    }

    #[test]
    fn test_pie_slice_large_arc_flag() {
        let minor = pie_slice_path(0.0, 0.0, 100.0, 0.0, PI / 2.0);
        assert!(minor.contains(" 0 0 1 "));

        let major = pie_slice_path(0.0, 0.0, 100.0, 0.0, 1.5 * PI);
        assert!(major.contains(" 0 1 1 "));
    }
}
