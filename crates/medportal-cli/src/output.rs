use colored::Colorize;
use medportal_client::DoctorRecord;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Table => print_as_table(value),
        _ => match render_document(value, format) {
            Ok(text) => println!("{}", text.trim_end()),
            Err(e) => print_error(&format!("Cannot render response: {e}")),
        },
    }
}

/// Serializes `value` for the document formats (JSON, YAML).
fn render_document(value: &Value, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        _ => serde_json::to_string_pretty(value)?,
    })
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_doctors(doctors: &[&DoctorRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let values: Vec<Value> = doctors
                .iter()
                .filter_map(|d| serde_json::to_value(d).ok())
                .collect();
            print_value(&Value::Array(values), format);
        }
        OutputFormat::Table => {
            if doctors.is_empty() {
                println!("No doctors found.");
                return;
            }
            let mut builder = Builder::default();
            builder.push_record(["ID", "Name", "Email", "Specialization", "Verified"]);
            for doctor in doctors {
                builder.push_record([
                    doctor.id.to_string(),
                    doctor.name.clone(),
                    doctor.email.clone(),
                    doctor.specialization.clone().unwrap_or_else(|| "-".into()),
                    if doctor.verified { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            println!("Total: {}", doctors.len());
        }
    }
}

fn print_as_table(value: &Value) {
    match value {
        Value::Array(rows) => print_rows(rows),
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, field) in map {
                builder.push_record([key.clone(), cell(field)]);
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
        other => println!("{}", cell(other)),
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        if rows.is_empty() {
            println!("No entries.");
        } else {
            for row in rows {
                println!("{}", cell(row));
            }
        }
        return;
    };

    let columns: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(columns.clone());
    for row in rows {
        builder.push_record(
            columns
                .iter()
                .map(|c| row.get(c).map(cell).unwrap_or_else(|| "-".into())),
        );
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(_) => "{…}".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yaml_document() {
        let dashboard = json!({"patients": 12, "recent": [{"id": 1, "name": "Ada"}]});
        let text = render_document(&dashboard, OutputFormat::Yaml).unwrap();
        assert!(text.contains("patients: 12"));
        assert!(text.contains("- id: 1"));
        assert!(text.contains("  name: Ada"));

        let back: Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, dashboard);
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell(&Value::Null), "-");
        assert_eq!(cell(&json!("Ada")), "Ada");
        assert_eq!(cell(&json!(12)), "12");
        assert_eq!(cell(&json!([1, 2, 3])), "[3 items]");
        assert_eq!(cell(&json!({"a": 1})), "{…}");
    }
}
