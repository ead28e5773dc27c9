//! Hand-built SVG charts for the run directory.

use std::path::Path;

use crate::error::{MelError, Result};
use crate::math::matrix::Matrix;

const W: f64 = 760.0;
const H: f64 = 260.0;
const PAD_L: f64 = 60.0;
const PAD_R: f64 = 16.0;
const PAD_T: f64 = 24.0;
const PAD_B: f64 = 30.0;

const GREY_GRID: &str = "#f0f2f5";
const GREY_TEXT: &str = "#999";
const DARK_TEXT: &str = "#333";
const RED_DARK: &str = "#dc2626";
const BLUE_DARK: &str = "#1e40af";

/// One polyline of a [`line_chart`].
pub struct Series<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
    pub color: &'a str,
    pub dashed: bool,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Renders series sharing one x axis (sample index, 1-based labels).
pub fn line_chart(title: &str, series: &[Series<'_>]) -> String {
    let n = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let all = series.iter().flat_map(|s| s.values.iter().cloned());
    let max_y = all.clone().fold(f64::NEG_INFINITY, f64::max);
    let min_y = all.fold(f64::INFINITY, f64::min).min(0.0);
    let max_y = if max_y.is_finite() && max_y > min_y { max_y * 1.05 } else { min_y + 1.0 };

    let px = |i: usize, v: f64| -> (f64, f64) {
        let span = (n.max(2) - 1) as f64;
        let x = PAD_L + (i as f64 / span) * (W - PAD_L - PAD_R);
        let y = PAD_T + (max_y - v) / (max_y - min_y + 1e-12) * (H - PAD_T - PAD_B);
        (x, y)
    };

    let y_labels: String = (0..=4).map(|g| {
        let frac = g as f64 / 4.0;
        let val = min_y + (max_y - min_y) * frac;
        let y = PAD_T + (1.0 - frac) * (H - PAD_T - PAD_B);
        format!(
            "<text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" fill=\"{}\" font-size=\"10\">{:.3}</text>\n\
             <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>",
            PAD_L - 4.0, y + 4.0, GREY_TEXT, val,
            PAD_L, y, W - PAD_R, y, GREY_GRID
        )
    }).collect::<Vec<_>>().join("\n");

    let mut ticks = vec![0, n / 2, n.saturating_sub(1)];
    ticks.dedup();
    let x_labels: String = if n == 0 {
        String::new()
    } else {
        ticks.iter().map(|&i| {
            let (x, _) = px(i, 0.0);
            format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"10\">{}</text>",
                x, H - 4.0, GREY_TEXT, i + 1
            )
        }).collect::<Vec<_>>().join("\n")
    };

    let mut paths = String::new();
    let mut legend = String::new();
    for (k, s) in series.iter().enumerate() {
        if s.values.is_empty() {
            continue;
        }
        let d: String = s.values.iter().enumerate().map(|(i, &v)| {
            let (x, y) = px(i, v);
            if i == 0 { format!("M{:.1},{:.1}", x, y) } else { format!(" L{:.1},{:.1}", x, y) }
        }).collect();
        let dash = if s.dashed { " stroke-dasharray=\"5,4\"" } else { "" };
        paths.push_str(&format!(
            "<path d=\"{}\" stroke=\"{}\" stroke-width=\"2\" fill=\"none\"{}/>\n",
            d, s.color, dash
        ));

        let lx = PAD_L + 140.0 * k as f64;
        legend.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"9\" x2=\"{:.1}\" y2=\"9\" stroke=\"{}\" stroke-width=\"2\"{}/>\n\
             <text x=\"{:.1}\" y=\"13\" fill=\"{}\" font-size=\"10\">{}</text>\n",
            lx, lx + 18.0, s.color, dash, lx + 22.0, DARK_TEXT, escape(s.label)
        ));
    }

    format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
         <text x=\"{:.1}\" y=\"13\" text-anchor=\"end\" fill=\"{}\" font-size=\"11\">{}</text>\n\
         {}\n{}\n{}{}</svg>\n",
        W, H,
        W - PAD_R, DARK_TEXT, escape(title),
        y_labels, x_labels,
        paths, legend
    )
}

/// Heatmap of a (normalized) confusion matrix; rows are true classes.
pub fn confusion_chart(cm: &Matrix, classes: &[String]) -> String {
    let n = cm.rows.max(1);
    let cell = (360.0 / n as f64).clamp(24.0, 64.0);
    let left = 110.0;
    let top = 40.0;
    let size = cell * n as f64;
    let max_v = cm.data.iter().cloned().fold(0.0f64, f64::max).max(1e-12);

    let mut body = String::new();
    for r in 0..cm.rows {
        for c in 0..cm.cols {
            let v = cm.get(r, c);
            let alpha = (v / max_v).clamp(0.0, 1.0);
            let (x, y) = (left + c as f64 * cell, top + r as f64 * cell);
            let text_color = if alpha > 0.5 { "white" } else { DARK_TEXT };
            body.push_str(&format!(
                "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" fill-opacity=\"{:.3}\" stroke=\"{}\"/>\n\
                 <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"10\">{:.3}</text>\n",
                x, y, cell, cell, BLUE_DARK, alpha, GREY_GRID,
                x + cell / 2.0, y + cell / 2.0 + 4.0, text_color, v
            ));
        }
    }

    for (i, name) in classes.iter().enumerate() {
        let mid = i as f64 * cell + cell / 2.0;
        body.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" fill=\"{}\" font-size=\"10\">{}</text>\n\
             <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"10\">{}</text>\n",
            left - 6.0, top + mid + 4.0, DARK_TEXT, escape(name),
            left + mid, top + size + 16.0, DARK_TEXT, escape(name)
        ));
    }

    format!(
        "<svg width=\"{:.0}\" height=\"{:.0}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
         <text x=\"{:.1}\" y=\"20\" fill=\"{}\" font-size=\"11\">Confusion matrix (rows = true, columns = predicted)</text>\n\
         {}</svg>\n",
        left + size + 20.0, top + size + 30.0,
        left, DARK_TEXT,
        body
    )
}

fn write_svg(path: &Path, svg: &str) -> Result<()> {
    std::fs::write(path, svg).map_err(|e| MelError::io(path, e))
}

/// `acc.svg`: training and validation accuracy per epoch.
pub fn save_acc(path: &Path, tra_acc: &[f64], val_acc: &[f64]) -> Result<()> {
    let svg = line_chart("accuracy (%) per epoch", &[
        Series { label: "train acc", values: tra_acc, color: RED_DARK, dashed: false },
        Series { label: "val acc", values: val_acc, color: BLUE_DARK, dashed: true },
    ]);
    write_svg(path, &svg)
}

/// `loss.svg`: recorded running-loss samples.
pub fn save_loss(path: &Path, loss: &[f64]) -> Result<()> {
    let svg = line_chart("running loss", &[
        Series { label: "loss", values: loss, color: RED_DARK, dashed: false },
    ]);
    write_svg(path, &svg)
}

/// `mat.svg`: confusion matrix heatmap.
pub fn save_confusion_matrix(path: &Path, cm: &Matrix, classes: &[String]) -> Result<()> {
    write_svg(path, &confusion_chart(cm, classes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_chart_draws_one_path_per_series() {
        let svg = line_chart("acc", &[
            Series { label: "a", values: &[1.0, 2.0, 3.0], color: RED_DARK, dashed: false },
            Series { label: "b", values: &[0.5, 0.5, 0.5], color: BLUE_DARK, dashed: true },
        ]);
        assert_eq!(svg.matches("<path ").count(), 2);
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn empty_and_single_point_series_do_not_panic() {
        let svg = line_chart("loss", &[Series { label: "loss", values: &[], color: RED_DARK, dashed: false }]);
        assert_eq!(svg.matches("<path ").count(), 0);
        let svg = line_chart("loss", &[Series { label: "loss", values: &[0.7], color: RED_DARK, dashed: false }]);
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn heatmap_has_a_cell_per_entry_and_escapes_labels() {
        let cm = Matrix::from_vec(2, 2, vec![0.5, 0.0, 0.25, 0.25]);
        let svg = confusion_chart(&cm, &["a<b".into(), "c".into()]);
        assert_eq!(svg.matches("fill-opacity").count(), 4);
        assert!(svg.contains("a&lt;b"));
    }
}
