//! Chart rendering via QuickChart
//!
//! The writer describes charts as loosely formatted tables. This module
//! sniffs the encoding (markdown pipe table, JSON, or delimited text), infers
//! a label column and a numeric value column, builds a Chart.js
//! specification and encodes it into a QuickChart image URL.
//!
//! Rendering never panics or propagates into the report: every problem is a
//! [`ChartError`] that the placeholder resolver logs and skips.

use crate::types::VisualizationRequest;
use crate::utils::config::ChartConfig;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Fill colours, cycled across data points
const BACKGROUND_PALETTE: [&str; 6] = [
    "rgba(54, 162, 235, 0.5)",
    "rgba(255, 99, 132, 0.5)",
    "rgba(75, 192, 192, 0.5)",
    "rgba(255, 206, 86, 0.5)",
    "rgba(153, 102, 255, 0.5)",
    "rgba(255, 159, 64, 0.5)",
];

const BORDER_PALETTE: [&str; 6] = [
    "rgba(54, 162, 235, 1)",
    "rgba(255, 99, 132, 1)",
    "rgba(75, 192, 192, 1)",
    "rgba(255, 206, 86, 1)",
    "rgba(153, 102, 255, 1)",
    "rgba(255, 159, 64, 1)",
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChartError {
    #[error("chart data is empty")]
    Empty,

    #[error("could not parse chart data: {0}")]
    Parse(String),

    #[error("no numeric value column found (columns: {0})")]
    NoNumericColumn(String),

    #[error("value column '{column}' has non-numeric entry '{value}'")]
    NonNumeric { column: String, value: String },

    #[error("could not encode chart URL: {0}")]
    Encode(String),

    #[error("chart rendering timed out after {0}s")]
    Timeout(u64),
}

/// Turns a visualization request into an image reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, request: &VisualizationRequest) -> Result<String, ChartError>;
}

/// Labels and values extracted from the writer's table
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Header plus string cells, before column inference
#[derive(Debug, Clone, PartialEq)]
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Parse chart data in any supported encoding.
pub fn parse_chart_data(raw: &str) -> Result<ChartData, ChartError> {
    let data = raw.trim();
    if data.is_empty() {
        return Err(ChartError::Empty);
    }

    let table = if data.starts_with('|') && data.contains('\n') {
        tracing::debug!("Parsing chart data as markdown table");
        parse_markdown_table(data)?
    } else if data.starts_with('[') || data.starts_with('{') {
        tracing::debug!("Parsing chart data as JSON");
        parse_json_table(data)?
    } else {
        tracing::debug!("Parsing chart data as delimited text");
        parse_delimited(data)?
    };

    infer_series(table)
}

fn split_pipe_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    cells.iter().all(|cell| {
        !cell.is_empty() && cell.chars().all(|c| c == '-' || c == ':' || c == ' ')
    })
}

fn parse_markdown_table(data: &str) -> Result<Table, ChartError> {
    let mut lines = data.lines().map(str::trim).filter(|line| !line.is_empty());

    let headers = split_pipe_row(lines.next().ok_or(ChartError::Empty)?);
    let mut rows = Vec::new();
    for line in lines {
        let cells = split_pipe_row(line);
        if is_separator_row(&cells) {
            continue;
        }
        rows.push(cells);
    }

    Table { headers, rows }.checked()
}

fn json_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_json_table(data: &str) -> Result<Table, ChartError> {
    let parsed: Value = serde_json::from_str(data).map_err(|e| ChartError::Parse(e.to_string()))?;

    match parsed {
        Value::Object(map) => Table {
            headers: vec!["Category".to_string(), "Value".to_string()],
            rows: map
                .iter()
                .map(|(key, value)| vec![key.clone(), json_cell(value)])
                .collect(),
        }
        .checked(),
        Value::Array(items) => {
            let Some(first) = items.first() else {
                return Err(ChartError::Empty);
            };
            match first {
                Value::Object(first_row) => {
                    let headers: Vec<String> = first_row.keys().cloned().collect();
                    let rows = items
                        .iter()
                        .map(|item| {
                            let obj = item.as_object().ok_or_else(|| {
                                ChartError::Parse("mixed objects and scalars in array".to_string())
                            })?;
                            Ok(headers
                                .iter()
                                .map(|h| obj.get(h).map(json_cell).unwrap_or_default())
                                .collect())
                        })
                        .collect::<Result<Vec<Vec<String>>, ChartError>>()?;
                    Table { headers, rows }.checked()
                }
                Value::Array(_) => {
                    let mut rows: Vec<Vec<String>> = items
                        .iter()
                        .map(|item| match item {
                            Value::Array(cells) => Ok(cells.iter().map(json_cell).collect()),
                            _ => Err(ChartError::Parse(
                                "mixed arrays and scalars in array".to_string(),
                            )),
                        })
                        .collect::<Result<_, _>>()?;
                    let header_row = rows[0].iter().all(|cell| parse_number(cell).is_none());
                    let headers = if header_row {
                        rows.remove(0)
                    } else {
                        (1..=rows[0].len()).map(|i| format!("Column {}", i)).collect()
                    };
                    Table { headers, rows }.checked()
                }
                _ => Table {
                    headers: vec!["Value".to_string()],
                    rows: items.iter().map(|item| vec![json_cell(item)]).collect(),
                }
                .checked(),
            }
        }
        _ => Err(ChartError::Parse("expected a JSON object or array".to_string())),
    }
}

fn detect_delimiter(header: &str) -> Option<char> {
    [',', ';', '\t']
        .into_iter()
        .map(|d| (d, header.matches(d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
}

/// Split one delimited line, honouring double-quoted fields.
fn split_delimited(line: &str, delimiter: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn parse_delimited(data: &str) -> Result<Table, ChartError> {
    let mut lines = data.lines().map(str::trim).filter(|line| !line.is_empty());
    let header_line = lines.next().ok_or(ChartError::Empty)?;

    let table = match detect_delimiter(header_line) {
        Some(delimiter) => Table {
            headers: split_delimited(header_line, delimiter),
            rows: lines.map(|line| split_delimited(line, delimiter)).collect(),
        },
        None => Table {
            headers: vec![header_line.to_string()],
            rows: lines.map(|line| vec![line.to_string()]).collect(),
        },
    };
    table.checked()
}

impl Table {
    /// Reject ragged or empty tables.
    fn checked(self) -> Result<Self, ChartError> {
        if self.headers.is_empty() || self.rows.is_empty() {
            return Err(ChartError::Empty);
        }
        let width = self.headers.len();
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != width {
                return Err(ChartError::Parse(format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    width
                )));
            }
        }
        Ok(self)
    }

    fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    fn is_numeric_column(&self, index: usize) -> bool {
        self.column(index).all(|cell| parse_number(cell).is_some())
    }
}

/// Parse a numeric cell, tolerating thousands separators, currency and percent signs.
fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '%' | '$' | '€' | '£' | '¥' | ' ' | '_'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Pick the label and value columns.
///
/// Labels come from the first column. Values come from the second column if
/// it is numeric, otherwise from the first numeric column after it. A
/// single-column table is all values, labelled `Item 0..n`.
fn infer_series(table: Table) -> Result<ChartData, ChartError> {
    if table.headers.len() == 1 {
        let values = numeric_column(&table, 0)?;
        let labels = (0..values.len()).map(|i| format!("Item {}", i)).collect();
        tracing::info!(column = %table.headers[0], "Using generated labels");
        return Ok(ChartData { labels, values });
    }

    let value_index = (1..table.headers.len())
        .find(|&i| table.is_numeric_column(i))
        .ok_or_else(|| ChartError::NoNumericColumn(table.headers[1..].join(", ")))?;

    tracing::info!(
        labels = %table.headers[0],
        values = %table.headers[value_index],
        rows = table.rows.len(),
        "Inferred chart columns"
    );

    Ok(ChartData {
        labels: table.column(0).map(str::to_string).collect(),
        values: numeric_column(&table, value_index)?,
    })
}

fn numeric_column(table: &Table, index: usize) -> Result<Vec<f64>, ChartError> {
    table
        .column(index)
        .map(|cell| {
            parse_number(cell).ok_or_else(|| ChartError::NonNumeric {
                column: table.headers[index].clone(),
                value: cell.to_string(),
            })
        })
        .collect()
}

/// Map a free-form chart type onto a Chart.js type.
pub fn chart_kind(kind: &str) -> &'static str {
    let kind = kind.to_lowercase();
    if kind.contains("line") {
        "line"
    } else if kind.contains("pie") {
        "pie"
    } else if kind.contains("scatter") {
        "scatter"
    } else if kind.contains("doughnut") {
        "doughnut"
    } else {
        "bar"
    }
}

/// Repeat `palette` to cover `len` data points.
fn cycle_palette(palette: &[&'static str], len: usize) -> Vec<&'static str> {
    (0..len.max(1)).map(|i| palette[i % palette.len()]).collect()
}

/// Build the Chart.js specification for a request.
pub fn build_chart_spec(request: &VisualizationRequest, data: &ChartData) -> Value {
    let kind = chart_kind(&request.kind);
    let count = data.values.len();

    let points: Value = if kind == "scatter" {
        data.labels
            .iter()
            .zip(&data.values)
            .enumerate()
            .map(|(i, (label, value))| {
                let x = parse_number(label).unwrap_or(i as f64);
                json!({ "x": x, "y": value })
            })
            .collect()
    } else {
        json!(data.values)
    };

    let mut options = json!({
        "responsive": true,
        "maintainAspectRatio": true,
        "plugins": {
            "title": {
                "display": true,
                "text": request.title,
                "font": { "size": 18, "family": "Arial" },
                "padding": 20
            },
            "legend": { "display": true, "position": "bottom" }
        }
    });
    if !matches!(kind, "pie" | "doughnut") {
        options["scales"] = json!({
            "y": {
                "beginAtZero": true,
                "grid": { "display": true, "color": "rgba(0, 0, 0, 0.1)" }
            },
            "x": { "grid": { "display": false } }
        });
    }

    json!({
        "type": kind,
        "data": {
            "labels": data.labels,
            "datasets": [{
                "label": request.title,
                "data": points,
                "backgroundColor": cycle_palette(&BACKGROUND_PALETTE, count),
                "borderColor": cycle_palette(&BORDER_PALETTE, count),
                "borderWidth": 2
            }]
        },
        "options": options
    })
}

/// Renders charts as QuickChart image URLs.
#[derive(Debug, Clone)]
pub struct QuickChartRenderer {
    base_url: String,
    max_url_length: usize,
}

impl QuickChartRenderer {
    pub fn new(base_url: impl Into<String>, max_url_length: usize) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_url_length,
        }
    }

    pub fn from_config(config: &ChartConfig) -> Self {
        Self::new(config.base_url.clone(), config.max_url_length)
    }

    /// Build the image URL synchronously.
    pub fn chart_url(&self, request: &VisualizationRequest) -> Result<String, ChartError> {
        tracing::info!(kind = %request.kind, title = %request.title, "Generating chart");

        let data = parse_chart_data(&request.data_payload)?;
        let spec = build_chart_spec(request, &data);
        let spec_json =
            serde_json::to_string(&spec).map_err(|e| ChartError::Encode(e.to_string()))?;

        let url = reqwest::Url::parse_with_params(
            &format!("{}/chart", self.base_url),
            &[("c", spec_json.as_str())],
        )
        .map_err(|e| ChartError::Encode(e.to_string()))?;

        let url = String::from(url);
        if url.len() > self.max_url_length {
            tracing::warn!(
                length = url.len(),
                limit = self.max_url_length,
                title = %request.title,
                "Chart URL exceeds length limit; some clients may not load it"
            );
        }
        Ok(url)
    }
}

impl Default for QuickChartRenderer {
    fn default() -> Self {
        Self::from_config(&ChartConfig::default())
    }
}

#[async_trait]
impl ChartRenderer for QuickChartRenderer {
    async fn render(&self, request: &VisualizationRequest) -> Result<String, ChartError> {
        self.chart_url(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(kind: &str, data: &str) -> VisualizationRequest {
        VisualizationRequest {
            kind: kind.to_string(),
            title: "Module prices".to_string(),
            data_payload: data.to_string(),
            description: "Average price per watt".to_string(),
            placeholder_token: "chart_1".to_string(),
        }
    }

    #[test]
    fn test_markdown_table() {
        let data =
            parse_chart_data("| Category | Value |\n|---|---|\n| A | 10 |\n| B | 20 |").unwrap();
        assert_eq!(data.labels, vec!["A", "B"]);
        assert_eq!(data.values, vec![10.0, 20.0]);
    }

    #[rstest]
    #[case::json_object(r#"{"A": 10, "B": 20}"#)]
    #[case::json_rows(r#"[{"name": "A", "count": 10}, {"name": "B", "count": 20}]"#)]
    #[case::json_matrix(r#"[["name", "count"], ["A", 10], ["B", 20]]"#)]
    #[case::csv("name,count\nA,10\nB,20")]
    #[case::semicolons("name;count\nA;10\nB;20")]
    #[case::tabs("name\tcount\nA\t10\nB\t20")]
    #[case::quoted("name,count\n\"A\",\"10\"\nB,20")]
    #[case::decorated("| Name | Share |\n|:---|---:|\n| A | 10% |\n| B | $20 |")]
    fn test_encodings_agree(#[case] raw: &str) {
        let data = parse_chart_data(raw).unwrap();
        assert_eq!(data.labels, vec!["A", "B"]);
        assert_eq!(data.values, vec![10.0, 20.0]);
    }

    #[test]
    fn test_single_column_gets_generated_labels() {
        let data = parse_chart_data("[3, 4, 5]").unwrap();
        assert_eq!(data.labels, vec!["Item 0", "Item 1", "Item 2"]);
        assert_eq!(data.values, vec![3.0, 4.0, 5.0]);

        let data = parse_chart_data("value\n1\n2").unwrap();
        assert_eq!(data.labels, vec!["Item 0", "Item 1"]);
    }

    #[test]
    fn test_value_column_skips_text_columns() {
        let data = parse_chart_data(
            "| Country | Region | GW |\n|---|---|---|\n| US | NA | 32.4 |\n| DE | EU | 14.1 |",
        )
        .unwrap();
        assert_eq!(data.labels, vec!["US", "DE"]);
        assert_eq!(data.values, vec![32.4, 14.1]);
    }

    #[test]
    fn test_thousands_separator() {
        let data = parse_chart_data("| Year | Installs |\n|---|---|\n| 2023 | \"1,200\" |");
        // Quotes are not stripped inside markdown cells.
        assert!(matches!(data, Err(ChartError::NoNumericColumn(_))));

        let data = parse_chart_data("year;installs\n2023;1,200").unwrap();
        assert_eq!(data.values, vec![1200.0]);
    }

    #[rstest]
    #[case::empty("   ", ChartError::Empty)]
    #[case::header_only("| A | B |\n|---|---|", ChartError::Empty)]
    #[case::empty_array("[]", ChartError::Empty)]
    #[case::empty_object("{}", ChartError::Empty)]
    #[case::empty_rows("[{}]", ChartError::Empty)]
    #[case::empty_matrix("[[],[]]", ChartError::Empty)]
    #[case::empty_header_row("[[]]", ChartError::Empty)]
    fn test_empty_inputs(#[case] raw: &str, #[case] expected: ChartError) {
        assert_eq!(parse_chart_data(raw).unwrap_err(), expected);
    }

    #[test]
    fn test_failures() {
        assert!(matches!(
            parse_chart_data("{not json"),
            Err(ChartError::Parse(_))
        ));
        assert!(matches!(
            parse_chart_data("| A | B |\n|---|---|\n| x | 1 | 2 |"),
            Err(ChartError::Parse(_))
        ));
        assert!(matches!(
            parse_chart_data("name,label\nA,high\nB,low"),
            Err(ChartError::NoNumericColumn(_))
        ));
        assert_eq!(
            parse_chart_data("value\n1\nlots"),
            Err(ChartError::NonNumeric {
                column: "value".to_string(),
                value: "lots".to_string()
            })
        );
        assert!(matches!(
            parse_chart_data("\"just a sentence\""),
            Err(ChartError::NoNumericColumn(_)) | Err(ChartError::Empty)
        ));
    }

    #[rstest]
    #[case("bar", "bar")]
    #[case("Line chart", "line")]
    #[case("PIE", "pie")]
    #[case("scatter plot", "scatter")]
    #[case("doughnut", "doughnut")]
    #[case("histogram", "bar")]
    fn test_chart_kind(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(chart_kind(input), expected);
    }

    #[test]
    fn test_spec_rotates_palette() {
        let data = ChartData {
            labels: (0..8).map(|i| i.to_string()).collect(),
            values: (0..8).map(f64::from).collect(),
        };
        let spec = build_chart_spec(&request("bar", ""), &data);

        let colors = spec["data"]["datasets"][0]["backgroundColor"]
            .as_array()
            .unwrap();
        assert_eq!(colors.len(), 8);
        assert_eq!(colors[0], colors[6]);
        assert_ne!(colors[0], colors[1]);
        assert_eq!(spec["options"]["plugins"]["title"]["text"], "Module prices");
        assert!(spec["options"].get("scales").is_some());
    }

    #[test]
    fn test_pie_has_no_axes() {
        let data = parse_chart_data("{\"A\": 1, \"B\": 2}").unwrap();
        let spec = build_chart_spec(&request("pie", ""), &data);
        assert_eq!(spec["type"], "pie");
        assert!(spec["options"].get("scales").is_none());
    }

    #[test]
    fn test_scatter_points() {
        let data = parse_chart_data("x,y\n1.5,3\n2.5,4").unwrap();
        let spec = build_chart_spec(&request("scatter", ""), &data);
        assert_eq!(
            spec["data"]["datasets"][0]["data"][1],
            json!({ "x": 2.5, "y": 4.0 })
        );
    }

    #[tokio::test]
    async fn test_render_url() {
        let renderer = QuickChartRenderer::new("https://quickchart.io/", 2000);
        let url = renderer
            .render(&request("bar", "| Category | Value |\n|---|---|\n| A | 10 |"))
            .await
            .unwrap();

        assert!(url.starts_with("https://quickchart.io/chart?c="));
        let parsed = reqwest::Url::parse(&url).unwrap();
        let (_, spec) = parsed.query_pairs().next().unwrap();
        let spec: Value = serde_json::from_str(&spec).unwrap();
        assert_eq!(spec["data"]["labels"], json!(["A"]));
    }

    #[tokio::test]
    async fn test_oversized_url_is_still_returned() {
        let renderer = QuickChartRenderer::new("https://quickchart.io", 100);
        let rows: String = (0..200).map(|i| format!("| item-{} | {} |\n", i, i)).collect();
        let data = format!("| Name | Value |\n|---|---|\n{}", rows);

        let url = renderer.render(&request("bar", &data)).await.unwrap();
        assert!(url.len() > 100);
    }

    #[tokio::test]
    async fn test_render_failure_is_an_error_value() {
        let renderer = QuickChartRenderer::default();
        let result = renderer.render(&request("bar", "no numbers here")).await;
        assert!(result.is_err());
    }
}
