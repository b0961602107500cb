//! NDJSON report tool
//!
//! Renders a newline-delimited JSON file as a static HTML table, one row per
//! record, columns taken from the first record. A companion utility for
//! eyeballing run summaries; entirely separate from the backup pipeline.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use fhir_backup::error::{AppError, Result};
use serde_json::{Map, Value};

#[derive(Parser, Debug)]
#[command(
    name = "fhir-backup-report",
    version,
    about = "Render an NDJSON file as an HTML table"
)]
struct Cli {
    /// NDJSON input file
    #[arg(short = 'i', long = "in")]
    in_file: PathBuf,

    /// HTML output file
    #[arg(short = 'o', long = "out")]
    out_file: PathBuf,

    /// Report title
    #[arg(short, long)]
    title: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let content = fs::read_to_string(&cli.in_file)?;
    let rows = parse_ndjson(&content)?;
    if rows.is_empty() {
        return Err(AppError::config("input contains no records"));
    }

    fs::write(&cli.out_file, render(&rows, &cli.title))?;
    Ok(())
}

/// Parse one JSON object per non-empty line.
fn parse_ndjson(content: &str) -> Result<Vec<Map<String, Value>>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let value: Value = serde_json::from_str(line)?;
            value
                .as_object()
                .cloned()
                .ok_or_else(|| AppError::config("every NDJSON line must be a JSON object"))
        })
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the full HTML document.
fn render(rows: &[Map<String, Value>], title: &str) -> String {
    let columns: Vec<&String> = rows[0].keys().collect();

    let mut html = String::new();
    html.push_str("<html>\n<head>\n");
    html.push_str(
        "<link rel=\"stylesheet\" \
         href=\"https://unpkg.com/purecss@2.1.0/build/pure-min.css\" \
         crossorigin=\"anonymous\">\n",
    );
    html.push_str(
        "<style>\ntable { table-layout: fixed; width: 100%; }\n\
         td { word-wrap: break-word; }\n</style>\n",
    );
    html.push_str("</head>\n<body>\n<div class=\"pure-g\">\n");

    html.push_str("<div class=\"pure-u-1\"><h2>");
    html.push_str(&html_escape::encode_text(title));
    html.push_str("</h2></div>\n");

    html.push_str("<div class=\"pure-u-1\">\n");
    html.push_str(
        "<table class=\"pure-table pure-table-striped pure-table-bordered\">\n<thead>\n<tr>",
    );
    for column in &columns {
        html.push_str("<td><b><i>");
        html.push_str(&html_escape::encode_text(column));
        html.push_str("</i></b></td>");
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in rows {
        html.push_str("<tr>");
        for column in &columns {
            html.push_str("<td>");
            if let Some(value) = row.get(*column) {
                html.push_str(&html_escape::encode_text(&cell_text(value)));
            }
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</div>\n</div>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "{\"name\":\"LOINC\",\"count\":42}\n\n{\"name\":\"<UCUM>\",\"count\":null}\n";

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let rows = parse_ndjson(SAMPLE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "LOINC");
    }

    #[test]
    fn test_parse_ndjson_rejects_non_objects() {
        assert!(parse_ndjson("[1, 2]\n").is_err());
    }

    #[test]
    fn test_render_escapes_and_blanks_nulls() {
        let rows = parse_ndjson(SAMPLE).unwrap();
        let html = render(&rows, "Runs & Results");

        assert!(html.contains("Runs &amp; Results"));
        assert!(html.contains("&lt;UCUM&gt;"));
        assert!(html.contains("<td>42</td>"));
        assert!(html.contains("pure-table"));
        // null cell renders empty
        assert!(html.contains("<td></td>"));
    }
}
