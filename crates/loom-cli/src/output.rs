//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use loom_core::{Book, DiaryEntry};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print one book with its full description
    pub fn print_book(&self, book: &Book, is_favorite: bool) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", book.id);
                println!("Title:       {}", book.title);
                println!("Author:      {}", book.author);
                if let Some(ref url) = book.image_url {
                    println!("Cover:       {}", url);
                }
                println!("Favorite:    {}", if is_favorite { "yes" } else { "no" });

                let description = book.plain_description();
                println!();
                if description.is_empty() {
                    println!("This book has no description.");
                } else {
                    println!("{}", description);
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "book": book,
                    "favorite": is_favorite
                }));
            }
            OutputFormat::Quiet => {
                println!("{}", book.id);
            }
        }
    }

    /// Print a list of books, marking favorites
    pub fn print_books(&self, books: &[Book], is_favorite: impl Fn(&Book) -> bool) {
        match self.format {
            OutputFormat::Human => {
                if books.is_empty() {
                    println!("No books found.");
                    return;
                }
                for book in books {
                    println!(
                        "{} {} | {} | {}",
                        if is_favorite(book) { "♥" } else { " " },
                        truncate(&book.id, 14),
                        truncate(&book.title, 40),
                        truncate(&book.author, 25)
                    );
                }
                println!("\n{} book(s)", books.len());
            }
            OutputFormat::Json => print_json(&books),
            OutputFormat::Quiet => {
                for book in books {
                    println!("{}", book.id);
                }
            }
        }
    }

    /// Print one diary entry
    pub fn print_entry(&self, entry: &DiaryEntry) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", entry.id);
                println!("Book:     {}", entry.book_title);
                if !entry.author.is_empty() {
                    println!("Author:   {}", entry.author);
                }
                if let Some(rating) = entry.rating() {
                    println!("Rating:   {} {}/5", stars(rating), rating);
                }
                println!("Date:     {}", entry.timestamp.format("%d/%m/%Y"));
                println!();
                println!("\"{}\"", entry.thoughts);
            }
            OutputFormat::Json => print_json(entry),
            OutputFormat::Quiet => {
                println!("{}", entry.id);
            }
        }
    }

    /// Print diary entries, newest first
    pub fn print_entries(&self, entries: &[DiaryEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("Keep documenting your reading journey...");
                    return;
                }
                for entry in entries {
                    let rating = entry.rating().map(stars).unwrap_or_default();
                    println!(
                        "{} | {} | {:<5} | {}",
                        entry.timestamp.format("%d/%m/%Y"),
                        truncate(&entry.book_title, 30),
                        rating,
                        truncate_line(&entry.thoughts, 40)
                    );
                }
                println!("\n{} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
            }
            OutputFormat::Json => print_json(&entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Tell the user something went wrong without failing the command
    pub fn notice(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("! {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "notice", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

fn stars(rating: u8) -> String {
    "★".repeat(rating as usize)
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // Must not split a character
        assert_eq!(truncate("Ébauche d'un roman", 8), "Ébauc...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
        assert_eq!(
            truncate_line("very long single line here", 10),
            "very lo..."
        );
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(3), "★★★");
        assert_eq!(stars(0), "");
    }

    #[test]
    fn test_should_prompt_only_for_humans() {
        assert!(Output::new(OutputFormat::Human).should_prompt());
        assert!(!Output::new(OutputFormat::Json).should_prompt());
        assert!(!Output::new(OutputFormat::Quiet).should_prompt());
    }
}
