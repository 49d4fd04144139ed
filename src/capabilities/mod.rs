mod clipboard;
mod saver;

pub use clipboard::{Clipboard, MemoryClipboard, TerminalClipboard};
pub use saver::{sanitize_filename, DirectorySaver, FileSaver};
