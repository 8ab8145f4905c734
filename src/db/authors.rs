use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::models::{Author, NewAuthor};

fn author_from_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        bio: row.get(3)?,
    })
}

/// Every author in insertion order, which is also id order.
pub fn fetch_authors(conn: &Connection) -> Result<Vec<Author>> {
    let mut stmt = conn
        .prepare("SELECT id, name, email, bio FROM author ORDER BY id")
        .context("failed to prepare author query")?;

    let authors = stmt
        .query_map([], author_from_row)
        .context("failed to load authors")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect authors")?;

    debug!(count = authors.len(), "fetched authors");
    Ok(authors)
}

pub fn find_author(conn: &Connection, id: i64) -> Result<Option<Author>> {
    conn.query_row(
        "SELECT id, name, email, bio FROM author WHERE id = ?1",
        [id],
        author_from_row,
    )
    .optional()
    .context("failed to look up author")
}

/// Insert a new author row, returning the hydrated struct so the caller can
/// show the generated id straight away.
pub fn create_author(conn: &Connection, author: &NewAuthor) -> Result<Author> {
    conn.execute(
        "INSERT INTO author (name, email, bio) VALUES (?1, ?2, ?3)",
        params![author.name, author.email, author.bio],
    )
    .context("failed to insert author")?;

    let author = author.clone().with_id(conn.last_insert_rowid());
    info!(id = author.id, name = %author.name, "author created");
    Ok(author)
}

/// How many recipes credit this author. Used to tell the user what a delete is
/// about to take with it.
pub fn count_recipes_by_author(conn: &Connection, author_id: i64) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM recipe WHERE author_id = ?1",
            [author_id],
            |row| row.get(0),
        )
        .context("failed to count author recipes")?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Remove an author and report what was removed. The schema cascades to the
/// author's recipes (and from there to their ingredient links), so nothing
/// else needs deleting here. `None` means no author had that id.
pub fn delete_author(conn: &Connection, id: i64) -> Result<Option<Author>> {
    let Some(author) = find_author(conn, id)? else {
        warn!(id, "author to delete not found");
        return Ok(None);
    };

    conn.execute("DELETE FROM author WHERE id = ?1", params![id])
        .context("failed to delete author")?;

    info!(id, name = %author.name, "author deleted");
    Ok(Some(author))
}
