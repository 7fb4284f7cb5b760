//! Construction report output.

use std::io::Write;
use std::path::Path;

use corrnet_rs::{ConstructionReport, Result};

/// Report encoding, selected by `--json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
}

/// Render a construction report and deliver it to stdout or a file.
pub fn emit_report(
    report: &ConstructionReport,
    format: Format,
    output_path: Option<&str>,
) -> Result<()> {
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(report).map_err(std::io::Error::from)?,
        Format::Text => render_text(report),
    };
    match output_path {
        Some(path) => std::fs::write(Path::new(path), rendered.as_bytes())?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", rendered)?;
        }
    }
    Ok(())
}

/// One-screen summary; phase timings appear only for the sketched modes.
fn render_text(report: &ConstructionReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("mode:      {}\n", report.mode));
    out.push_str(&format!("locations: {}\n", report.locations));
    out.push_str(&format!("pairs:     {}\n", report.pairs));
    if report.windows > 0 {
        out.push_str(&format!("windows:   {}\n", report.windows));
    }
    out.push_str(&format!("edges:     {}\n", report.edges));
    if report.sketch_secs > 0.0 {
        out.push_str(&format!("sketch:    {:.3}s\n", report.sketch_secs));
        out.push_str(&format!("query:     {:.3}s\n", report.query_secs));
    }
    out.push_str(&format!("total:     {:.3}s", report.total_secs));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_shows_phase_times_only_for_sketched_runs() {
        let mut report = ConstructionReport::new("exact", 3, 3, 0);
        report.edges = 2;
        report.total_secs = 0.5;

        let text = render_text(&report);
        assert!(text.contains("mode:      exact"));
        assert!(text.contains("edges:     2"));
        assert!(!text.contains("windows:"));
        assert!(!text.contains("sketch:"));

        report.windows = 8;
        report.sketch_secs = 0.1;
        report.query_secs = 0.2;
        let text = render_text(&report);
        assert!(text.contains("windows:   8"));
        assert!(text.contains("sketch:    0.100s"));
        assert!(text.contains("query:     0.200s"));
    }

    #[test]
    fn test_emit_report_writes_json_to_file() {
        let report = ConstructionReport::new("in-memory", 4, 6, 2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        emit_report(&report, Format::Json, path.to_str()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"mode\": \"in-memory\""));
        assert!(contents.contains("\"pairs\": 6"));
    }
}
