use std::{
    fmt,
    io::{self, Write},
};

use anyhow::{anyhow, Result};
use inquire::{Confirm, InquireError, Select, Text};

use crate::{
    capabilities::Clipboard,
    interpreter::{to_curl_command, CurlDescriptor},
    orchestrator::Orchestrator,
    printer::{print_history, print_logs, print_outcome, print_request},
    request::is_origin,
    store::normalize_origin,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn run_interactive(orchestrator: &Orchestrator, clipboard: &dyn Clipboard) -> Result<()> {
    let mut ui = InquireUi;
    run_interactive_with_ui(orchestrator, clipboard, &mut ui).await
}

pub(crate) async fn run_interactive_with_ui(
    orchestrator: &Orchestrator,
    clipboard: &dyn Clipboard,
    ui: &mut dyn InteractiveUi,
) -> Result<()> {
    ui.print(&format!("curlhop v{}", VERSION));

    loop {
        let registry = orchestrator.services();
        let services = registry.list();
        let active = registry.active();
        ui.print(&format!(
            "Active service: {}",
            active.as_deref().unwrap_or("<curl origin>")
        ));

        let mut menu_items = vec![MenuItem::PasteAndRun];
        if !orchestrator.history().entries().is_empty() {
            menu_items.push(MenuItem::Rerun);
        }
        if !services.is_empty() {
            menu_items.push(MenuItem::ChooseService);
        }
        menu_items.push(MenuItem::AddService);
        if !services.is_empty() {
            menu_items.push(MenuItem::RemoveService);
        }
        menu_items.push(MenuItem::FetchLogs);
        if orchestrator.snapshot().request.is_some() {
            menu_items.push(MenuItem::CopyAsCurl);
        }
        menu_items.push(MenuItem::Quit);

        let labels: Vec<String> = menu_items.iter().map(|item| item.to_string()).collect();
        let index = ui.select("curlhop", &labels, 0)?;
        let choice = menu_items
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("invalid menu selection"))?;

        match choice {
            MenuItem::PasteAndRun => {
                ui.print("Paste a curl command (or press Ctrl+C to cancel).");
                match ui.read_multiline("curl>")? {
                    Some(text) if !text.trim().is_empty() => {
                        execute(orchestrator, ui, &text).await;
                    }
                    _ => ui.print("Cancelled."),
                }
            }
            MenuItem::Rerun => {
                let entries = orchestrator.history().entries();
                let labels: Vec<String> = entries
                    .iter()
                    .map(|entry| {
                        format!(
                            "{}  ({})",
                            entry.label,
                            entry.saved_at.format("%Y-%m-%d %H:%M")
                        )
                    })
                    .collect();
                print_history(&entries);
                let index = ui.select("Run again", &labels, 0)?;
                if let Some(entry) = entries.get(index) {
                    execute(orchestrator, ui, &entry.curl).await;
                }
            }
            MenuItem::ChooseService => {
                let mut options = services.clone();
                options.push(USE_CURL_ORIGIN.to_string());
                let start = active
                    .as_ref()
                    .and_then(|origin| options.iter().position(|o| o == origin))
                    .unwrap_or(options.len() - 1);
                let index = ui.select("Send requests to", &options, start)?;
                let selected = services.get(index).map(String::as_str);
                registry.set_active(selected)?;
                ui.print(&format!(
                    "Active service: {}",
                    selected.unwrap_or("<curl origin>")
                ));
            }
            MenuItem::AddService => {
                let Some(input) = ui.input("Service origin", None)? else {
                    continue;
                };
                let origin = normalize_origin(&input);
                if !is_origin(&origin) {
                    ui.print(&format!("Not an origin: {input}"));
                    continue;
                }
                registry.append_if_absent(&origin)?;
                registry.set_active(Some(&origin))?;
                ui.print(&format!("Active service: {origin}"));
            }
            MenuItem::RemoveService => {
                let index = ui.select("Remove service", &services, 0)?;
                let Some(origin) = services.get(index) else {
                    continue;
                };
                if ui.confirm(&format!("Remove {origin}?"), false)? {
                    registry.remove(origin)?;
                    ui.print(&format!("Removed {origin}"));
                }
            }
            MenuItem::FetchLogs => {
                let last = orchestrator.last_request_id();
                let Some(id) = ui.input("Request id", last.as_deref())? else {
                    continue;
                };
                match orchestrator.fetch_logs(&id).await {
                    Ok(logs) => print_logs(&logs),
                    Err(err) => ui.print(&format!("{err}")),
                }
            }
            MenuItem::CopyAsCurl => {
                if let Some(request) = orchestrator.snapshot().request {
                    let command = to_curl_command(&CurlDescriptor::from(&request));
                    clipboard.write_text(&command)?;
                }
            }
            MenuItem::Quit => break,
        }
        ui.print("");
    }

    Ok(())
}

const USE_CURL_ORIGIN: &str = "Use the origin from the curl command";

async fn execute(orchestrator: &Orchestrator, ui: &mut dyn InteractiveUi, text: &str) {
    let result = orchestrator.submit(text, None).await;
    if let Some(request) = orchestrator.snapshot().request {
        print_request(&request);
        ui.print("");
    }
    match result {
        Ok(outcome) => print_outcome(&outcome),
        Err(err) => ui.print(&format!("Error: {err}")),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum MenuItem {
    PasteAndRun,
    Rerun,
    ChooseService,
    AddService,
    RemoveService,
    FetchLogs,
    CopyAsCurl,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::PasteAndRun => write!(f, "⇢ Paste curl and run"),
            MenuItem::Rerun => write!(f, "↻ Run from history"),
            MenuItem::ChooseService => write!(f, "⇄ Choose service"),
            MenuItem::AddService => write!(f, "+ Add service"),
            MenuItem::RemoveService => write!(f, "- Remove service"),
            MenuItem::FetchLogs => write!(f, "≡ Fetch request logs"),
            MenuItem::CopyAsCurl => write!(f, "⧉ Copy last request as curl"),
            MenuItem::Quit => write!(f, "Quit"),
        }
    }
}

pub(crate) trait InteractiveUi {
    fn print(&mut self, message: &str);
    fn select(&mut self, prompt: &str, items: &[String], start: usize) -> Result<usize>;
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<Option<String>>;
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
    fn read_multiline(&mut self, prompt: &str) -> Result<Option<String>>;
}

struct InquireUi;

impl InteractiveUi for InquireUi {
    fn print(&mut self, message: &str) {
        println!("{}", message);
    }

    fn select(&mut self, prompt: &str, items: &[String], start: usize) -> Result<usize> {
        let choice = Select::new(prompt, items.to_vec())
            .with_page_size(10)
            .with_starting_cursor(start)
            .prompt()?;
        items
            .iter()
            .position(|item| item == &choice)
            .ok_or_else(|| anyhow!("selection not found"))
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<Option<String>> {
        let mut builder = Text::new(prompt);
        if let Some(value) = default {
            builder = builder.with_default(value);
        }
        match builder.prompt() {
            Ok(value) => Ok(Some(value)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        match Confirm::new(prompt).with_default(default).prompt() {
            Ok(value) => Ok(value),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
            Err(other) => Err(other.into()),
        }
    }

    fn read_multiline(&mut self, prompt: &str) -> Result<Option<String>> {
        read_multiline_from_stdin(prompt)
    }
}

/// Reads pasted lines until the command is complete: the last line has no
/// trailing backslash and no quote is left open.
fn read_multiline_from_stdin(prompt: &str) -> Result<Option<String>> {
    let stdin = io::stdin();
    let mut lines: Vec<String> = Vec::new();

    loop {
        print!("{} ", prompt);
        io::stdout().flush()?;

        let mut buffer = String::new();
        let bytes = stdin.read_line(&mut buffer)?;
        if bytes == 0 {
            // EOF
            return Ok((!lines.is_empty()).then(|| lines.join("\n")));
        }

        let trimmed = buffer.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() && lines.is_empty() {
            return Ok(None);
        }
        lines.push(trimmed.to_string());

        if is_complete(&lines.join("\n")) {
            break;
        }
    }

    Ok(Some(lines.join("\n")))
}

fn is_complete(text: &str) -> bool {
    !text.trim_end().ends_with('\\') && !has_open_quote(text)
}

fn has_open_quote(text: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (None, '\'' | '"') => quote = Some(ch),
            (None, '\\') | (Some('"'), '\\') => {
                chars.next();
            }
            (Some(open), _) if ch == open => quote = None,
            _ => {}
        }
    }
    quote.is_some()
}
