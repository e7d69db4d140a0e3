//! Search command handler

use anyhow::Result;
use tracing::warn;

use loom_core::Library;

use crate::output::Output;
use crate::search::CatalogClient;

/// Search the catalog and list matches, marking favorites
///
/// A failed search shows a notice and an empty list.
pub async fn run(
    library: &Library,
    catalog: &CatalogClient,
    query: String,
    output: &Output,
) -> Result<()> {
    let books = match catalog.search(&query).await {
        Ok(books) => books,
        Err(e) => {
            warn!("Search for {:?} failed: {:#}", query, e);
            output.notice("Search failed. Check your connection and try again.");
            Vec::new()
        }
    };

    let favorites = library.favorites();
    output.print_books(&books, |book| favorites.is_favorite(&book.id));
    Ok(())
}
