use std::{
    io::{self, Read, Write},
    sync::Mutex,
};

use anyhow::{Context, Result};

pub trait Clipboard: Send + Sync {
    fn read_text(&self) -> Result<String>;
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Terminal stand-in for a system clipboard: pasted text arrives on stdin,
/// copied text is printed to stdout for the terminal to pick up.
#[derive(Debug, Default)]
pub struct TerminalClipboard;

impl Clipboard for TerminalClipboard {
    fn read_text(&self) -> Result<String> {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading curl command from stdin")?;
        Ok(buffer)
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{text}")?;
        stdout.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<String>,
}

impl MemoryClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            contents: Mutex::new(text.to_string()),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&self) -> Result<String> {
        Ok(self
            .contents
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        *self.contents.lock().unwrap_or_else(|err| err.into_inner()) = text.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clipboard_replaces_contents() -> Result<()> {
        let clipboard = MemoryClipboard::with_text("curl https://a.example");
        assert_eq!(clipboard.read_text()?, "curl https://a.example");
        clipboard.write_text("curl https://b.example")?;
        assert_eq!(clipboard.read_text()?, "curl https://b.example");
        Ok(())
    }
}
