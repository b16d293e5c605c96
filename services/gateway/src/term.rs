//! Catalog search term construction

use types::errors::RowError;
use types::row::Row;

/// Encode one fragment: words percent-encoded, whitespace runs become `+`.
fn encode_fragment(fragment: &str) -> String {
    fragment
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

/// Search term for a row: `title+author`, URL-safe.
pub fn build_term(row: &Row) -> Result<String, RowError> {
    let (title, author) = row.fragments()?;
    Ok(format!("{}+{}", encode_fragment(&title), encode_fragment(&author)))
}
