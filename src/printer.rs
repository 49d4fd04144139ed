use colored::{Color, Colorize};
use url::Url;

use crate::orchestrator::LogRecord;
use crate::request::RequestDescriptor;
use crate::response::{Payload, ResponseOutcome};
use crate::store::CurlHistoryEntry;

pub fn print_request(request: &RequestDescriptor) {
    println!("{} {}", request.method.bold(), request.url.cyan());
    if request.url != request.source.join() {
        println!(
            "{} {}",
            "Copied from:".bold(),
            request.source.origin.dimmed()
        );
    }
    for (name, value) in &request.headers {
        println!("  {}: {}", name.cyan(), value.dimmed());
    }
    if let Some(body) = &request.body {
        println!(
            "{} {}",
            "Request body:".bold(),
            format!("{} bytes", body.to_text().len()).dimmed()
        );
    }
}

pub fn print_outcome(outcome: &ResponseOutcome) {
    match outcome {
        ResponseOutcome::Success {
            status, payload, ..
        } => {
            println!(
                "{} {} {}",
                "✔".green().bold(),
                format!("{status}").color(status_color(*status)),
                format_elapsed(outcome.elapsed_seconds()).dimmed()
            );
            print_correlation(outcome.correlation_id());
            match payload {
                Payload::Attachment(attachment) => {
                    let saved = attachment
                        .saved_to
                        .as_deref()
                        .map(format_file_link)
                        .unwrap_or_else(|| attachment.filename.cyan().to_string());
                    println!(
                        "{} {} {}",
                        "Saved:".bold(),
                        saved,
                        format!("({} bytes)", attachment.bytes.len()).dimmed()
                    );
                }
                other => println!("{}", other.render()),
            }
        }
        ResponseOutcome::Failure {
            message,
            status_text,
            raw_body,
            ..
        } => {
            println!(
                "{} {} {}",
                "✖".red().bold(),
                message.red(),
                format_elapsed(outcome.elapsed_seconds()).dimmed()
            );
            if let Some(text) = status_text.as_deref().filter(|text| !text.is_empty()) {
                println!("{} {}", "Status:".bold(), text);
            }
            print_correlation(outcome.correlation_id());
            if let Some(body) = raw_body.as_deref().filter(|body| !body.is_empty()) {
                println!("{}", body.dimmed());
            }
        }
    }
}

pub fn print_logs(logs: &[LogRecord]) {
    if logs.is_empty() {
        println!("{}", "No log entries for this request".dimmed());
        return;
    }
    for record in logs {
        println!("{}", format_log_line(record));
        if let Some(exception) = record.exception.as_deref().filter(|e| !e.is_empty()) {
            println!("    {}", exception.red());
        }
    }
}

pub fn print_services(services: &[String], active: Option<&str>) {
    if services.is_empty() {
        println!("{}", "No services registered".dimmed());
        return;
    }
    for origin in services {
        if Some(origin.as_str()) == active {
            println!("{} {}", "*".green().bold(), origin.green());
        } else {
            println!("  {}", origin);
        }
    }
}

pub fn print_history(entries: &[CurlHistoryEntry]) {
    if entries.is_empty() {
        println!("{}", "History is empty".dimmed());
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}  {}  {}",
            index,
            entry.label.bold(),
            entry
                .saved_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed()
        );
    }
}

fn print_correlation(correlation_id: &str) {
    if !correlation_id.is_empty() {
        println!("{} {}", "Request id:".bold(), correlation_id.yellow());
    }
}

fn status_color(status: u16) -> Color {
    if status >= 400 {
        Color::Red
    } else if status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub fn format_elapsed(seconds: Option<f64>) -> String {
    match seconds {
        Some(value) => format!("({value:.3} s)"),
        None => String::new(),
    }
}

pub fn format_log_line(record: &LogRecord) -> String {
    let level = record.level.as_deref().unwrap_or("-");
    let level = match level.to_ascii_lowercase().as_str() {
        "error" | "fatal" | "critical" => level.red().bold(),
        "warning" | "warn" => level.yellow(),
        "debug" | "trace" | "verbose" => level.dimmed(),
        _ => level.normal(),
    };
    format!(
        "{} {:<11} {}",
        record.timestamp.as_deref().unwrap_or("-").dimmed(),
        level,
        record.message.as_deref().unwrap_or("")
    )
}

fn format_file_link(path: &std::path::Path) -> String {
    let display = path.to_string_lossy();
    match Url::from_file_path(path) {
        Ok(url) => format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, display.cyan()),
        Err(_) => display.cyan().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Attachment;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn format_elapsed_uses_seconds() {
        assert_eq!(format_elapsed(Some(0.5)), "(0.500 s)");
        assert_eq!(format_elapsed(None), "");
    }

    #[test]
    fn format_log_line_includes_message_and_timestamp() {
        colored::control::set_override(false);
        let record = LogRecord {
            level: Some("Error".to_string()),
            timestamp: Some("2024-03-01T10:00:00".to_string()),
            message: Some("Database unavailable".to_string()),
            ..LogRecord::default()
        };
        let line = format_log_line(&record);
        assert!(line.starts_with("2024-03-01T10:00:00 Error"));
        assert!(line.ends_with("Database unavailable"));
    }

    #[test]
    fn format_file_link_wraps_absolute_paths_only() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("report.pdf");
        assert!(format_file_link(&file).contains("\u{1b}]8;;"));
        assert!(!format_file_link(std::path::Path::new("relative.pdf")).contains("\u{1b}]8;;"));
    }

    #[test]
    fn print_outcome_handles_every_variant() {
        print_outcome(&ResponseOutcome::Success {
            status: 200,
            payload: Payload::Json(json!({"ok": true})),
            correlation_id: "req-1".to_string(),
            elapsed_seconds: Some(0.1),
        });
        print_outcome(&ResponseOutcome::Success {
            status: 200,
            payload: Payload::Attachment(Attachment {
                filename: "report.pdf".to_string(),
                bytes: vec![1, 2, 3],
                saved_to: None,
            }),
            correlation_id: String::new(),
            elapsed_seconds: None,
        });
        print_outcome(&ResponseOutcome::Failure {
            message: "Request failed with status code 500".to_string(),
            status_text: Some("Internal Server Error".to_string()),
            raw_body: Some("boom".to_string()),
            correlation_id: "req-2".to_string(),
            elapsed_seconds: None,
        });
    }
}
