//! Format-negotiated response rendering.
//!
//! REST payloads are built as `serde_json::Value` and rendered according
//! to the `format` query parameter: `json` (the default), `xml`, `csv`
//! or `html`. Unknown formats fall back to JSON. `download=true` adds a
//! Content-Disposition header with a filename derived from the request
//! path.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use hivebase_core::config::RenderConfig;
use hivebase_core::value::{is_object_rows, scalar_to_string};
use serde::Deserialize;
use serde_json::Value;

/// Rendering knobs taken from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderParams {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub download: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Xml,
    Csv,
    Html,
}

impl Format {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("xml") => Format::Xml,
            Some("csv") => Format::Csv,
            Some("html") => Format::Html,
            // Unknown formats render as JSON.
            _ => Format::Json,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Csv => "csv",
            Format::Html => "html",
        }
    }
}

/// Render `value` for the request at `path` using `params` and config
/// defaults.
pub fn respond(path: &str, params: &RenderParams, config: &RenderConfig, value: Value) -> Response {
    let format = Format::parse(params.format.as_deref());
    let download = params
        .download
        .as_deref()
        .map(|d| matches!(d.to_ascii_lowercase().as_str(), "true" | "yes" | "y" | "t" | "1"))
        .unwrap_or(false);
    let delimiter = params
        .delimiter
        .clone()
        .unwrap_or_else(|| config.csv_delimiter.clone());
    let filename = derive_filename(path);

    let (content_type, body) = match format {
        Format::Json => ("application/json", value.to_string()),
        Format::Xml => ("application/xml", to_xml(&value)),
        Format::Csv => (
            if download { "text/csv" } else { "text/plain; charset=utf-8" },
            to_csv(&value, &delimiter),
        ),
        Format::Html => ("text/html; charset=utf-8", to_html_page(&value, &filename)),
    };

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type.to_string())],
        body,
    )
        .into_response();

    if download {
        let disposition = format!(
            "attachment; filename={}.{}",
            filename,
            format.extension()
        );
        if let Ok(header_value) = disposition.parse() {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, header_value);
        }
    }

    response
}

/// The request path with slashes folded to underscores, `data` for the root.
fn derive_filename(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "data".to_string()
    } else {
        trimmed.replace('/', "_")
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Element names come from object keys; anything not XML-name-safe is
/// folded to underscores.
fn xml_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

fn to_xml(value: &Value) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><response>");
    write_xml_value(&mut out, value);
    out.push_str("</response>");
    out
}

fn write_xml_value(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let name = xml_name(key);
                out.push('<');
                out.push_str(&name);
                out.push('>');
                write_xml_value(out, child);
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
            }
        }
        Value::Array(items) => {
            for item in items {
                out.push_str("<item>");
                write_xml_value(out, item);
                out.push_str("</item>");
            }
        }
        scalar => out.push_str(&xml_escape(&scalar_to_string(scalar))),
    }
}

fn csv_cell(value: &Value, delimiter: &str) -> String {
    let text = scalar_to_string(value);
    if text.contains(delimiter) || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

fn to_csv(value: &Value, delimiter: &str) -> String {
    match value {
        Value::Array(rows) if is_object_rows(value) => {
            let keys: Vec<&String> = match rows.first() {
                Some(Value::Object(first)) => first.keys().collect(),
                _ => return String::new(),
            };
            let mut out = keys
                .iter()
                .map(|k| csv_cell(&Value::String((*k).clone()), delimiter))
                .collect::<Vec<_>>()
                .join(delimiter);
            out.push('\n');
            for row in rows {
                if let Value::Object(map) = row {
                    let line = keys
                        .iter()
                        .map(|k| csv_cell(map.get(*k).unwrap_or(&Value::Null), delimiter))
                        .collect::<Vec<_>>()
                        .join(delimiter);
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            out
        }
        Value::Object(map) => {
            let header = map
                .keys()
                .map(|k| csv_cell(&Value::String(k.clone()), delimiter))
                .collect::<Vec<_>>()
                .join(delimiter);
            let values = map
                .values()
                .map(|v| csv_cell(v, delimiter))
                .collect::<Vec<_>>()
                .join(delimiter);
            format!("{header}\n{values}\n")
        }
        Value::Array(items) => {
            let mut out = String::new();
            for item in items {
                out.push_str(&csv_cell(item, delimiter));
                out.push('\n');
            }
            out
        }
        scalar => format!("{}\n", csv_cell(scalar, delimiter)),
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn to_html_table(value: &Value) -> String {
    match value {
        Value::Array(rows) if is_object_rows(value) => {
            let keys: Vec<&String> = match rows.first() {
                Some(Value::Object(first)) => first.keys().collect(),
                _ => return String::new(),
            };
            let mut out = String::from("<table border=\"1\"><thead><tr>");
            for key in &keys {
                out.push_str("<th>");
                out.push_str(&html_escape(key));
                out.push_str("</th>");
            }
            out.push_str("</tr></thead><tbody>");
            for row in rows {
                if let Value::Object(map) = row {
                    out.push_str("<tr>");
                    for key in &keys {
                        out.push_str("<td>");
                        out.push_str(&html_escape(&scalar_to_string(
                            map.get(*key).unwrap_or(&Value::Null),
                        )));
                        out.push_str("</td>");
                    }
                    out.push_str("</tr>");
                }
            }
            out.push_str("</tbody></table>");
            out
        }
        Value::Object(map) => {
            let mut out = String::from("<table border=\"1\"><tbody>");
            for (key, child) in map {
                out.push_str("<tr><th>");
                out.push_str(&html_escape(key));
                out.push_str("</th><td>");
                out.push_str(&html_escape(&scalar_to_string(child)));
                out.push_str("</td></tr>");
            }
            out.push_str("</tbody></table>");
            out
        }
        other => format!("<pre>{}</pre>", html_escape(&other.to_string())),
    }
}

fn to_html_page(value: &Value, title: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>table{{border-collapse:collapse}}th,td{{padding:4px 8px}}</style>\
         </head><body>{}</body></html>",
        to_html_table(value),
        title = html_escape(title),
    )
}
