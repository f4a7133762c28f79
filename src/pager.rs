use tracing::debug;

use crate::cancel::Cancellation;
use crate::domain::{Cursor, Page};
use crate::error::ProfilerError;

/// Follows continuation cursors from `first` until a page comes back without
/// one, returning every item in server order.
///
/// `advance` receives the cursor and the 1-based index of the page being
/// requested. Any failure discards what was collected so far.
pub fn walk_pages<T, F>(
    first: Page<T>,
    cancel: &Cancellation,
    mut advance: F,
) -> Result<Vec<T>, ProfilerError>
where
    F: FnMut(&Cursor, usize) -> Result<Page<T>, ProfilerError>,
{
    let Page { mut items, mut next } = first;
    let mut pages = 1usize;

    while let Some(cursor) = next.take() {
        cancel.check()?;
        let page = advance(&cursor, pages + 1)?;
        pages += 1;
        debug!(page = pages, items = page.items.len(), "fetched page");
        items.extend(page.items);
        next = page.next;
    }

    debug!(pages, items = items.len(), "walk complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn cursor(value: &str) -> Option<Cursor> {
        Cursor::new(value)
    }

    #[test]
    fn single_page_needs_no_advance() {
        let mut calls = 0;
        let items = walk_pages(Page::last(vec![1, 2, 3]), &Cancellation::new(), |_, _| {
            calls += 1;
            Ok(Page::last(vec![]))
        })
        .unwrap();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(calls, 0);
    }

    #[test]
    fn concatenates_in_order() {
        let mut remaining = vec![
            Page::new(vec![3, 4], cursor("p3")),
            Page::last(vec![5]),
        ]
        .into_iter();
        let mut seen = Vec::new();
        let items = walk_pages(
            Page::new(vec![1, 2], cursor("p2")),
            &Cancellation::new(),
            |cursor, page| {
                seen.push((cursor.as_str().to_string(), page));
                Ok(remaining.next().unwrap())
            },
        )
        .unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(seen, vec![("p2".to_string(), 2), ("p3".to_string(), 3)]);
    }

    #[test]
    fn empty_pages_still_advance() {
        let mut remaining = vec![Page::new(vec![], cursor("p3")), Page::last(vec![7])].into_iter();
        let items = walk_pages(
            Page::<u32>::new(vec![], cursor("p2")),
            &Cancellation::new(),
            |_, _| Ok(remaining.next().unwrap()),
        )
        .unwrap();
        assert_eq!(items, vec![7]);
    }

    #[test]
    fn failure_discards_walk() {
        let result = walk_pages(
            Page::new(vec![1], cursor("p2")),
            &Cancellation::new(),
            |_, _| Err(ProfilerError::CatalogHttp("connection reset".to_string())),
        );
        assert_matches!(result, Err(ProfilerError::CatalogHttp(_)));
    }

    #[test]
    fn cancellation_stops_before_advance() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let mut calls = 0;
        let result = walk_pages(Page::new(vec![1], cursor("p2")), &cancel, |_, _| {
            calls += 1;
            Ok(Page::last(vec![2]))
        });
        assert_matches!(result, Err(ProfilerError::Cancelled));
        assert_eq!(calls, 0);
    }
}
