//! Batch Coordinator
//!
//! Splits multi-key work into provider-sized chunks and walks a full-table
//! scan page by page. Chunks and pages are dispatched strictly one after the
//! other.

use tracing::debug;

use crate::error::Result;
use crate::table::{TableClient, TableItem};

/// Partitions `items` into consecutive chunks of at most `size` (minimum 1).
pub fn chunked<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(size).collect());
    }
    chunks
}

/// Scans `table` in pages of `page_size`, calling `visit` for every row.
///
/// Follows the continuation cursor until a page comes back without one.
/// Returns the number of rows visited.
pub fn scan_all<F>(
    client: &dyn TableClient,
    table: &str,
    page_size: usize,
    mut visit: F,
) -> Result<usize>
where
    F: FnMut(TableItem) -> Result<()>,
{
    let mut cursor: Option<String> = None;
    let mut visited = 0;
    let mut pages = 0;

    loop {
        let page = client.scan(table, page_size.max(1), cursor.as_deref())?;
        pages += 1;
        for item in page.items {
            visit(item)?;
            visited += 1;
        }
        match page.last_evaluated_key {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(table, pages, visited, "scan complete");
    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{LocalTable, TableSchema};
    use serde_json::json;

    #[test]
    fn test_chunked_exact_and_remainder() {
        let chunks = chunked((0..7).collect(), 3);
        assert_eq!(chunks, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);

        let chunks = chunked((0..6).collect(), 3);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_chunked_empty() {
        let chunks: Vec<Vec<u8>> = chunked(Vec::new(), 25);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunked_zero_size_is_one() {
        let chunks = chunked(vec!["a", "b"], 0);
        assert_eq!(chunks, vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_scan_all_visits_every_page() {
        let service = LocalTable::new();
        service.create_table(&TableSchema::cache_table("t")).unwrap();
        for i in 0..23 {
            service
                .put_item(
                    "t",
                    TableItem {
                        id: format!("id{}", i),
                        value: json!(i),
                        expiry: None,
                    },
                )
                .unwrap();
        }

        let mut seen = Vec::new();
        let visited = scan_all(&service, "t", 5, |item| {
            seen.push(item.id);
            Ok(())
        })
        .unwrap();

        assert_eq!(visited, 23);
        assert_eq!(seen.len(), 23);
        assert_eq!(service.calls().scan, 5);
    }
}
