//! Favorites command handlers

use anyhow::{Context, Result};

use loom_core::{Book, Library};

use super::resolve_id;
use crate::editor::confirm;
use crate::output::Output;
use crate::search::CatalogClient;

/// List favorites in the order they were added
pub fn list(library: &Library, output: &Output) -> Result<()> {
    let books = library.favorites().list();
    output.print_books(&books, |_| true);
    Ok(())
}

/// Look a book up in the catalog and add it to favorites
pub async fn add(
    library: &Library,
    catalog: &CatalogClient,
    id: String,
    output: &Output,
) -> Result<()> {
    if library.favorites().is_favorite(&id) {
        output.message(&format!("Already a favorite: {}", id));
        return Ok(());
    }

    let book = fetch(catalog, &id).await?;
    library
        .favorites()
        .add(book.clone())
        .await
        .context("Failed to add favorite")?;

    output.success(&format!("Added to favorites: {}", book.title));
    Ok(())
}

/// Remove a favorite by id or id prefix
pub async fn remove(library: &Library, id: String, yes: bool, output: &Output) -> Result<()> {
    let books = library.favorites().list();
    let book = resolve_id(&books, &id, "favorite", |b| &b.title)?;

    if output.should_prompt() && !yes {
        println!("Remove from favorites: {} - {}", book.id, book.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library
        .favorites()
        .remove(&book.id)
        .await
        .context("Failed to remove favorite")?;

    output.success(&format!("Removed from favorites: {}", book.title));
    Ok(())
}

/// Flip a book's favorite state
///
/// A saved favorite is removed without a catalog request.
pub async fn toggle(
    library: &Library,
    catalog: &CatalogClient,
    id: String,
    output: &Output,
) -> Result<()> {
    let saved = library.favorites().list().into_iter().find(|b| b.id == id);
    let book = match saved {
        Some(book) => book,
        None => fetch(catalog, &id).await?,
    };

    let favorites = library
        .favorites()
        .toggle(&book)
        .await
        .context("Failed to toggle favorite")?;

    if favorites.iter().any(|b| b.id == book.id) {
        output.success(&format!("Added to favorites: {}", book.title));
    } else {
        output.success(&format!("Removed from favorites: {}", book.title));
    }
    Ok(())
}

async fn fetch(catalog: &CatalogClient, id: &str) -> Result<Book> {
    catalog
        .volume(id)
        .await
        .with_context(|| format!("Could not look up book: {}", id))
}
