//! Diary command handlers

use anyhow::{Context, Result};

use loom_core::{Library, NewDiaryEntry};

use super::resolve_id;
use crate::editor::{confirm, edit_text};
use crate::output::Output;

/// List entries, newest first
pub fn list(library: &Library, output: &Output) -> Result<()> {
    output.print_entries(&library.diary().entries());
    Ok(())
}

/// Show one entry by id or id prefix
pub fn show(library: &Library, id: String, output: &Output) -> Result<()> {
    let entries = library.diary().entries();
    let entry = resolve_id(&entries, &id, "diary entry", |e| &e.book_title)?;
    output.print_entry(entry);
    Ok(())
}

/// Write a new entry
///
/// Opens the editor when no thoughts are given.
pub async fn add(
    library: &Library,
    title: String,
    author: Option<String>,
    thoughts: Option<String>,
    rating: u8,
    output: &Output,
) -> Result<()> {
    let thoughts = match thoughts {
        Some(t) => t,
        None => edit_text(&thoughts_template(&title))?,
    };

    let entry = NewDiaryEntry::new(title, thoughts)
        .with_author(author.unwrap_or_default())
        .with_rating(rating);

    let entries = library
        .diary()
        .add_entry(entry)
        .await
        .context("Failed to save diary entry")?;

    if let Some(entry) = entries.first() {
        output.success(&format!("Saved entry for {}", entry.book_title));
        if !output.should_prompt() {
            output.print_entry(entry);
        }
    }
    Ok(())
}

/// Delete an entry by id or id prefix
pub async fn delete(library: &Library, id: String, yes: bool, output: &Output) -> Result<()> {
    let entries = library.diary().entries();
    let entry = resolve_id(&entries, &id, "diary entry", |e| &e.book_title)?;

    if output.should_prompt() && !yes {
        println!(
            "Delete entry: {} - {} ({})",
            entry.id,
            entry.book_title,
            entry.timestamp.format("%d/%m/%Y")
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library
        .diary()
        .delete_entry(&entry.id)
        .await
        .context("Failed to delete diary entry")?;

    output.success(&format!("Deleted entry: {}", entry.id));
    Ok(())
}

fn thoughts_template(title: &str) -> String {
    format!(
        "\n# Share your thoughts about {}.\n# Lines starting with '#' are ignored.\n",
        title.trim()
    )
}
