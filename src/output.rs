use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use colored::*;

use crate::cli::OutputFormat;
use crate::detector::results::FileReport;
use crate::detector::AnnotatedRow;

pub struct OutputWriter {
    format: OutputFormat,
    file: Option<PathBuf>,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, file: Option<PathBuf>) -> Result<Self> {
        Ok(Self { format, file })
    }

    pub fn write(&self, reports: &[FileReport]) -> Result<()> {
        let output = self.render(reports)?;

        match &self.file {
            Some(path) => {
                let file = File::create(path)?;
                let mut writer = BufWriter::new(file);
                writer.write_all(output.as_bytes())?;
                writer.flush()?;
            }
            None => {
                print!("{}", output);
                io::stdout().flush()?;
            }
        }

        Ok(())
    }

    pub fn render(&self, reports: &[FileReport]) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(format_human(reports)),
            OutputFormat::Json => format_json(reports),
            OutputFormat::Csv => format_csv(reports),
        }
    }
}

fn format_human(reports: &[FileReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{}\n\n",
        "INTRUSION SCREENING COMPLETE".truecolor(0, 255, 65).bold()
    ));

    let mut failed = 0;
    for report in reports {
        let view = &report.view;
        let elapsed = (report.finished_at - report.started_at).num_milliseconds();

        output.push_str(&format!(
            "{} {} {} {} {}\n",
            "⟦".truecolor(64, 64, 64),
            report.source.truecolor(255, 255, 255).bold(),
            "•".truecolor(0, 255, 65),
            format!("{}ms", elapsed).truecolor(0, 212, 255).bold(),
            "⟧".truecolor(64, 64, 64)
        ));

        if let Some(message) = view.error() {
            failed += 1;
            output.push_str(&format!(
                "{} {} {}\n\n",
                "✖".truecolor(255, 64, 64).bold(),
                "Error:".truecolor(255, 64, 64).bold(),
                message.truecolor(128, 128, 128)
            ));
            continue;
        }

        for (model, summary) in &view.results {
            output.push_str(&format!(
                "{} {} {} {}\n",
                "▶".truecolor(0, 255, 65).bold(),
                model.truecolor(191, 64, 191).bold(),
                "•".truecolor(64, 64, 64),
                summary.truecolor(255, 255, 255)
            ));
        }

        if !view.rows.is_empty() {
            output.push('\n');
            output.push_str(&format_table(&view.columns, &view.rows));
        }
        output.push('\n');
    }

    let status = if failed == 0 {
        format!("{} capture(s) analyzed", reports.len())
            .truecolor(0, 255, 65)
            .bold()
    } else {
        format!("{} capture(s) analyzed, {} failed", reports.len(), failed)
            .truecolor(255, 140, 0)
            .bold()
    };
    output.push_str(&format!("{} {}\n", "⚡".truecolor(0, 255, 65).bold(), status));

    output
}

fn format_table(columns: &[String], rows: &[AnnotatedRow]) -> String {
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|r| {
            [
                r.row.protocol.clone().unwrap_or_default(),
                r.row.time.to_string(),
                r.row.length.to_string(),
                r.prediction.to_string(),
            ]
        })
        .collect();

    let mut widths = [0usize; 4];
    for (i, width) in widths.iter_mut().enumerate() {
        let header = columns.get(i).map(|c| c.len()).unwrap_or(0);
        let longest = cells.iter().map(|row| row[i].len()).max().unwrap_or(0);
        *width = header.max(longest);
    }

    let mut table = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<w$}", c, w = w))
        .collect();
    table.push_str(&format!("  {}\n", header.join("  ").truecolor(128, 128, 128)));

    for (row, annotated) in cells.iter().zip(rows) {
        let text: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = w))
            .collect();
        let line = text.join("  ");
        if annotated.prediction == 1 {
            table.push_str(&format!("  {}\n", line.truecolor(255, 64, 64).bold()));
        } else {
            table.push_str(&format!("  {}\n", line.truecolor(255, 255, 255)));
        }
    }

    table
}

fn format_json(reports: &[FileReport]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(reports)?;
    json.push('\n');
    Ok(json)
}

/// One line per annotated row, prefixed by the capture it came from. Failed
/// captures contribute no rows.
fn format_csv(reports: &[FileReport]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["source", "Protocol", "Time", "Length", "Prediction"])?;

    for report in reports {
        for r in &report.view.rows {
            writer.write_record([
                report.source.clone(),
                r.row.protocol.clone().unwrap_or_default(),
                r.row.time.to_string(),
                r.row.length.to_string(),
                r.prediction.to_string(),
            ])?;
        }
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
