//! Book command handlers

use anyhow::{Context, Result};
use tracing::warn;

use loom_core::Library;

use crate::output::Output;
use crate::search::CatalogClient;

/// Show a book's details
///
/// Falls back to the saved copy when the catalog is unreachable and the
/// book is a favorite.
pub async fn show(
    library: &Library,
    catalog: &CatalogClient,
    id: String,
    output: &Output,
) -> Result<()> {
    let saved = library.favorites().list().into_iter().find(|b| b.id == id);

    let book = match catalog.volume(&id).await {
        Ok(book) => book,
        Err(e) => match saved {
            Some(book) => {
                warn!("Volume lookup for {} failed: {:#}", id, e);
                output.notice("Catalog unavailable; showing the saved copy.");
                book
            }
            None => return Err(e).with_context(|| format!("Book not found: {}", id)),
        },
    };

    output.print_book(&book, library.favorites().is_favorite(&book.id));
    Ok(())
}
