use std::io::{self, BufRead, Write};

use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;
use crate::error::ValidationErrors;
use crate::plans::PlanItem;
use crate::view::{Column, Notice, Pagination};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".to_string(), json!(true));
            response.insert("message".to_string(), json!(message));
            if let Some(Value::Object(extra)) = data {
                response.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });
            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

pub fn output_field_errors(output_format: &OutputFormat, errors: &ValidationErrors) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let fields: Map<String, Value> = errors.iter().map(|(f, m)| (f.to_string(), json!(m))).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error_code": "VALIDATION_ERROR",
                    "fields": fields
                }))?
            );
        }
        OutputFormat::Text => {
            for (field, message) in errors.iter() {
                eprintln!("  {}: {}", field, message);
            }
        }
    }
    Ok(())
}

pub fn output_notices(output_format: &OutputFormat, notices: &[Notice]) -> anyhow::Result<()> {
    for notice in notices {
        if notice.is_error() {
            output_error(output_format, &notice.message, None)?;
        } else {
            output_success(output_format, &notice.message, None)?;
        }
    }
    Ok(())
}

fn cell(item: &PlanItem, column: Column) -> String {
    match column {
        Column::DocNo => item.doc_no.clone(),
        Column::ProjectName => item.project_name.clone(),
        Column::Year => item.year.to_string(),
        Column::Description => item.description.clone(),
        Column::VolumeDivision => item.volume_division.to_string(),
        Column::Status => item.status.to_string(),
        Column::Actions => item.id.clone(),
    }
}

/// Plain-text table; `Actions` shows the id the row commands take
pub fn render_table(rows: &[PlanItem], columns: &[Column]) -> String {
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell(row, *c)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            table
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.label().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let pad = |text: &str, width: usize| {
        let fill = width.saturating_sub(text.chars().count());
        format!("{}{}", text, " ".repeat(fill))
    };

    let mut out = String::new();
    let header: Vec<String> = columns.iter().zip(&widths).map(|(c, w)| pad(c.label(), *w)).collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    for row in &table {
        let line: Vec<String> = row.iter().zip(&widths).map(|(v, w)| pad(v, *w)).collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn output_plans(
    output_format: &OutputFormat,
    rows: &[PlanItem],
    columns: &[Column],
    pagination: &Pagination,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "plans": rows,
                    "page": pagination.current,
                    "page_size": pagination.page_size,
                    "total": pagination.total,
                    "total_is_exact": pagination.total_is_exact,
                    "page_count": pagination.page_count(),
                }))?
            );
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No plans found");
            } else {
                print!("{}", render_table(rows, columns));
            }
            let approx = if pagination.total_is_exact { "" } else { " (at least)" };
            println!(
                "{}{}, page {} of {}",
                pagination.summary(),
                approx,
                pagination.current,
                pagination.page_count().max(1)
            );
        }
    }
    Ok(())
}

pub fn output_plan(output_format: &OutputFormat, message: &str, plan: &PlanItem) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_success(output_format, message, Some(json!({ "plan": plan }))),
        OutputFormat::Text => {
            output_success(output_format, message, None)?;
            print!("{}", render_table(std::slice::from_ref(plan), &Column::ALL));
            Ok(())
        }
    }
}

/// Read one line from stdin after printing `prompt`
pub fn read_line(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Yes/no question; `assume_yes` skips the prompt
pub fn confirm(prompt: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = read_line(&format!("{} [y/N] ", prompt))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "b" | "bəli")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_item;

    #[test]
    fn table_aligns_columns() {
        let rows = vec![sample_item(1), sample_item(12)];
        let table = render_table(&rows, &[Column::DocNo, Column::Status]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Sənədin nömrəsi  Status"));
        assert!(lines[1].starts_with("DOC-001"));
        assert!(lines[1].ends_with("Aktiv"));
        assert!(lines[2].ends_with("Deaktiv"));
    }

    #[test]
    fn confirmation_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(is_yes("bəli"));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(confirm("ignored", true).unwrap());
    }
}
