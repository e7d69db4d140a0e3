//! Command handlers

use anyhow::{bail, Result};

use loom_core::Record;

pub mod book;
pub mod config;
pub mod diary;
pub mod favorites;
pub mod search;
pub mod status;

/// Find the record whose id is `id` or starts with it
///
/// An exact match wins over prefix matches.
fn resolve_id<'a, T: Record>(
    records: &'a [T],
    id: &str,
    kind: &str,
    label: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    if let Some(exact) = records.iter().find(|r| r.id() == id) {
        return Ok(exact);
    }

    let matches: Vec<&T> = records.iter().filter(|r| r.id().starts_with(id)).collect();

    match matches.len() {
        0 => bail!("No {} found matching: {}", kind, id),
        1 => Ok(matches[0]),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, id);
            for record in &matches {
                eprintln!("  {} - {}", record.id(), label(record));
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
