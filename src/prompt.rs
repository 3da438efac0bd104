//! Line-based interactive prompts.

use std::io::{self, BufRead, Write};

use da_export_core::api::Folder;
use da_export_core::select::FolderDecider;

/// Prints `message` and reads one trimmed line from stdin.
pub fn prompt_line(message: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{message} ")?;
    stdout.flush()?;

    let mut buffer = String::new();
    io::stdin().lock().read_line(&mut buffer)?;
    Ok(buffer.trim().to_string())
}

/// Asks a yes/no question; anything but `y`/`yes` counts as no.
pub fn confirm(message: &str) -> io::Result<bool> {
    let answer = prompt_line(&format!("{message} (y/n)"))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Stdin-backed decider for the folder selection walk.
pub struct StdinDecider;

impl FolderDecider for StdinDecider {
    fn include(&mut self, folder: &Folder) -> bool {
        println!("Folder ID: {}, Folder Name: {}", folder.folderid, folder.name);
        confirm(&format!("Include '{}' in the export?", folder.name)).unwrap_or(false)
    }
}
