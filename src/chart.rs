//! Static HTML charts. Each chart is one self-contained page with its data
//! embedded as JSON and Chart.js pulled from a CDN.

use crate::error::{ReportError, Result};
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js";
pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
}

/// A named sequence of (x, y) points. Missing y values render as gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub x: Vec<Value>,
    pub y: Vec<Option<f64>>,
}

impl Series {
    pub fn new<I, X, Y>(name: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = (X, Y)>,
        X: Into<Value>,
        Y: Into<Option<f64>>,
    {
        let (x, y): (Vec<Value>, Vec<Option<f64>>) = points
            .into_iter()
            .map(|(x, y)| (x.into(), y.into()))
            .unzip();
        Self {
            name: name.into(),
            x,
            y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub file_name: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_title: String,
    pub y_title: String,
    pub series: Vec<Series>,
}

impl ChartSpec {
    pub fn new(file_name: impl Into<String>, title: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            file_name: file_name.into(),
            title: title.into(),
            kind,
            x_title: String::new(),
            y_title: String::new(),
            series: Vec::new(),
        }
    }

    pub fn axes(mut self, x_title: impl Into<String>, y_title: impl Into<String>) -> Self {
        self.x_title = x_title.into();
        self.y_title = y_title.into();
        self
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(Series::is_empty)
    }

    /// The Chart.js configuration object for this chart.
    pub fn to_chart_js(&self) -> Value {
        let data = match self.kind {
            ChartKind::Scatter => json!({
                "datasets": self.series.iter().map(scatter_dataset).collect::<Vec<_>>(),
            }),
            ChartKind::Line | ChartKind::Bar => {
                let labels = category_labels(&self.series);
                json!({
                    "labels": labels,
                    "datasets": self
                        .series
                        .iter()
                        .map(|s| category_dataset(s, &labels, self.kind))
                        .collect::<Vec<_>>(),
                })
            }
        };
        json!({
            "type": self.kind,
            "data": data,
            "options": {
                "responsive": true,
                "maintainAspectRatio": false,
                "plugins": {
                    "title": { "display": true, "text": self.title },
                    "legend": { "display": self.series.len() > 1 },
                },
                "scales": {
                    "x": { "title": { "display": !self.x_title.is_empty(), "text": self.x_title } },
                    "y": { "title": { "display": !self.y_title.is_empty(), "text": self.y_title } },
                },
            },
        })
    }
}

/// The shared category axis. Numeric x values are laid out in ascending
/// order so interleaved series keep their positions; anything else keeps
/// first-seen order.
fn category_labels(series: &[Series]) -> Vec<String> {
    let xs: Vec<&Value> = series.iter().flat_map(|s| s.x.iter()).collect();
    let numeric: Option<Vec<f64>> = xs.iter().map(|x| x.as_f64()).collect();
    match numeric {
        Some(values) => values
            .into_iter()
            .sorted_by(f64::total_cmp)
            .map(format_label)
            .unique()
            .collect(),
        None => xs.into_iter().map(label_of).unique().collect(),
    }
}

fn category_dataset(series: &Series, labels: &[String], kind: ChartKind) -> Value {
    let by_label: HashMap<String, Option<f64>> = series
        .x
        .iter()
        .map(label_of)
        .zip(series.y.iter().copied())
        .rev()
        .collect();
    let data: Vec<Option<f64>> = labels
        .iter()
        .map(|label| by_label.get(label).copied().flatten())
        .collect();
    let (point_radius, border_width) = if kind == ChartKind::Line && data.len() > 200 {
        (0, 1)
    } else {
        (3, 2)
    };
    json!({
        "label": series.name,
        "data": data,
        "spanGaps": false,
        "pointRadius": point_radius,
        "borderWidth": border_width,
    })
}

fn scatter_dataset(series: &Series) -> Value {
    let data: Vec<Value> = series
        .x
        .iter()
        .zip(&series.y)
        .filter_map(|(x, y)| y.map(|y| json!({ "x": x, "y": y })))
        .collect();
    json!({ "label": series.name, "data": data })
}

/// Axis label for a point's x value.
pub fn label_of(x: &Value) -> String {
    match x {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_label).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_html(spec: &ChartSpec) -> Result<String> {
    let config = serde_json::to_string(&spec.to_chart_js())
        .map_err(|e| ReportError::json(&spec.file_name, e))?
        // keep embedded text from closing the script element
        .replace("</", "<\\/");
    Ok(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{CHART_JS_CDN}"></script>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }}
        .chart-container {{ position: relative; height: 85vh; background: white; border-radius: 8px; padding: 16px; }}
    </style>
</head>
<body>
    <div class="chart-container">
        <canvas id="chart"></canvas>
    </div>
    <script>
        new Chart(document.getElementById('chart'), {config});
    </script>
</body>
</html>
"##,
        title = escape_html(&spec.title),
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenChart {
    pub title: String,
    pub path: PathBuf,
}

/// Writes charts into one output directory and remembers what it wrote
/// so an index page can link them.
#[derive(Debug)]
pub struct ChartWriter {
    dir: PathBuf,
    written: Vec<WrittenChart>,
}

impl ChartWriter {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| ReportError::io(&dir, e))?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[WrittenChart] {
        &self.written
    }

    pub fn write(&mut self, spec: &ChartSpec) -> Result<PathBuf> {
        let path = self.dir.join(&spec.file_name);
        let html = render_html(spec)?;
        fs::write(&path, html).map_err(|e| ReportError::io(&path, e))?;
        debug!("wrote {}", path.display());
        self.written.push(WrittenChart {
            title: spec.title.clone(),
            path: path.clone(),
        });
        Ok(path)
    }

    /// Write every chart in order, skipping those with no data points.
    pub fn write_all(&mut self, specs: &[ChartSpec]) -> Result<usize> {
        let mut count = 0;
        for spec in specs {
            if spec.is_empty() {
                debug!("skipping {}: no data", spec.file_name);
                continue;
            }
            self.write(spec)?;
            count += 1;
        }
        Ok(count)
    }

    /// Link page for every chart written so far.
    pub fn write_index(&self, heading: &str) -> Result<PathBuf> {
        let path = self.dir.join(INDEX_FILE);
        let items = self
            .written
            .iter()
            .filter_map(|chart| {
                let name = chart.path.file_name()?.to_string_lossy().into_owned();
                Some(format!(
                    "        <li><a href=\"{}\">{}</a></li>",
                    escape_html(&name),
                    escape_html(&chart.title)
                ))
            })
            .join("\n");
        let html = format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{heading}</title>
</head>
<body>
    <h1>{heading}</h1>
    <ul>
{items}
    </ul>
</body>
</html>
"##,
            heading = escape_html(heading),
        );
        fs::write(&path, html).map_err(|e| ReportError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }

    #[test]
    fn missing_values_become_null() {
        let spec = ChartSpec::new("wpm.html", "WPM", ChartKind::Line)
            .series(Series::new("WPM", [(1, Some(40.0)), (2, None), (3, Some(50.0))]));
        let cfg = spec.to_chart_js();
        assert_eq!(cfg["type"], "line");
        assert_eq!(cfg["data"]["labels"], json!(["1", "2", "3"]));
        assert_eq!(cfg["data"]["datasets"][0]["data"], json!([40.0, null, 50.0]));
    }

    #[test]
    fn series_align_on_shared_labels() {
        let spec = ChartSpec::new("by_player.html", "By player", ChartKind::Line)
            .series(Series::new("Ada", [(1, 40.0), (2, 45.0)]))
            .series(Series::new("Bo", [(2, 60.0), (3, 62.0)]));
        let cfg = spec.to_chart_js();
        assert_eq!(cfg["data"]["labels"], json!(["1", "2", "3"]));
        assert_eq!(cfg["data"]["datasets"][0]["data"], json!([40.0, 45.0, null]));
        assert_eq!(cfg["data"]["datasets"][1]["data"], json!([null, 60.0, 62.0]));
    }

    #[test]
    fn interleaved_numeric_series_share_an_ascending_axis() {
        let spec = ChartSpec::new("bins.html", "Bins", ChartKind::Line)
            .series(Series::new("odd", [(1, 10.0), (3, 30.0), (5, 50.0)]))
            .series(Series::new("even", [(2, 20.0), (4, 40.0)]));
        let cfg = spec.to_chart_js();
        assert_eq!(cfg["data"]["labels"], json!(["1", "2", "3", "4", "5"]));
        assert_eq!(
            cfg["data"]["datasets"][0]["data"],
            json!([10.0, null, 30.0, null, 50.0])
        );
        assert_eq!(
            cfg["data"]["datasets"][1]["data"],
            json!([null, 20.0, null, 40.0, null])
        );
    }

    #[test]
    fn text_categories_keep_first_seen_order() {
        let spec = ChartSpec::new("books.html", "Books", ChartKind::Bar)
            .series(Series::new("typed", [("Genesis", 1.0), ("Exodus", 2.0)]))
            .series(Series::new("total", [("Exodus", 3.0), ("Leviticus", 4.0)]));
        let cfg = spec.to_chart_js();
        assert_eq!(cfg["data"]["labels"], json!(["Genesis", "Exodus", "Leviticus"]));
    }

    #[test]
    fn scatter_keeps_numeric_points() {
        let spec = ChartSpec::new("scatter.html", "Scatter", ChartKind::Scatter)
            .series(Series::new("words", [(95.5, Some(70.0)), (80.0, None)]));
        let cfg = spec.to_chart_js();
        assert_eq!(cfg["data"]["datasets"][0]["data"], json!([{ "x": 95.5, "y": 70.0 }]));
    }

    #[test]
    fn embedded_text_cannot_close_the_script() {
        let spec = ChartSpec::new("x.html", "a</script>b", ChartKind::Bar)
            .series(Series::new("s", [("</script>", 1.0)]));
        let html = render_html(&spec).unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
        assert!(html.contains("<title>a&lt;/script&gt;b</title>"));
    }

    #[test]
    fn writer_skips_empty_charts_and_indexes_the_rest() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("charts");
        let mut writer = ChartWriter::new(&out).unwrap();
        let full = ChartSpec::new("full.html", "Full", ChartKind::Bar)
            .series(Series::new("s", [("a", 1.0)]));
        let empty = ChartSpec::new("empty.html", "Empty", ChartKind::Bar)
            .series(Series::new("s", Vec::<(&str, f64)>::new()));

        assert_eq!(writer.write_all(&[full, empty]).unwrap(), 1);
        assert!(out.join("full.html").exists());
        assert!(!out.join("empty.html").exists());

        let index = std::fs::read_to_string(writer.write_index("Charts").unwrap()).unwrap();
        assert!(index.contains("<a href=\"full.html\">Full</a>"));
        assert!(!index.contains("empty.html"));
    }
}
