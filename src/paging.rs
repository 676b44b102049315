//! Cursor-based result pages shared by every list operation.
//!
//! Two construction paths exist. [`PagedResults::client_paged`] receives the
//! complete result set and slices it locally, which is how families whose
//! backend cannot page (key pairs, security groups, regions) behave; its
//! marker is the offset of the next record, since ids need not be unique.
//! [`PagedResults::server_paged`] receives a slice the backend already
//! limited; services ask the backend for one record more than the caller's
//! limit so the presence of that extra record tells whether another page
//! exists. Callers see the same contract either way.

use std::future::Future;
use std::ops::Deref;

use crate::resources::Identified;

/// One page of a list operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PagedResults<T> {
    data: Vec<T>,
    is_truncated: bool,
    marker: Option<String>,
    supports_server_paging: bool,
    total_results: Option<usize>,
}

impl<T: Identified> PagedResults<T> {
    /// Wraps a slice returned by a backend that pages server-side.
    ///
    /// `objects` is expected to hold up to `limit + 1` records; the surplus
    /// record only signals that another page exists and is dropped.
    #[must_use]
    pub fn server_paged(objects: Vec<T>, limit: Option<usize>) -> Self {
        let (data, is_truncated) = truncate(objects, limit);
        let marker = next_marker(&data, is_truncated);
        Self {
            data,
            is_truncated,
            marker,
            supports_server_paging: true,
            total_results: None,
        }
    }
}

fn truncate<T>(mut objects: Vec<T>, limit: Option<usize>) -> (Vec<T>, bool) {
    match limit {
        Some(max) if objects.len() > max => {
            objects.truncate(max);
            (objects, true)
        }
        _ => (objects, false),
    }
}

fn next_marker<T: Identified>(data: &[T], is_truncated: bool) -> Option<String> {
    if is_truncated {
        data.last().map(|object| object.id().to_owned())
    } else {
        None
    }
}

impl<T> PagedResults<T> {
    /// Pages a fully materialised result set.
    ///
    /// The marker is the offset of the first record on the requested page.
    /// A marker that is not an offset yields an empty page. Without a limit
    /// the whole remainder is returned as a single page.
    #[must_use]
    pub fn client_paged(objects: Vec<T>, limit: Option<usize>, marker: Option<&str>) -> Self {
        let total = objects.len();
        let start = marker.map_or(0, |offset| offset.parse::<usize>().unwrap_or(total));
        let remaining: Vec<T> = objects.into_iter().skip(start).collect();
        let (data, is_truncated) = truncate(remaining, limit);
        let next = is_truncated.then(|| start.saturating_add(data.len()).to_string());
        Self {
            data,
            is_truncated,
            marker: next,
            supports_server_paging: false,
            total_results: Some(total),
        }
    }

    /// Returns the records on this page.
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consumes the page and returns its records.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns `true` when another page can be requested.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.is_truncated
    }

    /// Opaque cursor to pass as `marker` for the next page.
    #[must_use]
    pub fn next_marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Returns `true` when the backend applied the limit itself.
    #[must_use]
    pub const fn supports_server_paging(&self) -> bool {
        self.supports_server_paging
    }

    /// Size of the unpaged result set, known only for client-side paging.
    #[must_use]
    pub const fn total_results(&self) -> Option<usize> {
        self.total_results
    }
}

impl<T> Deref for PagedResults<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> IntoIterator for PagedResults<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PagedResults<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// Follows next-page markers until the listing is exhausted.
///
/// `fetch` receives the marker for the page to load (`None` for the first
/// page) and typically calls a service's `list` with a fixed limit.
///
/// # Errors
///
/// Returns the first error produced by `fetch`.
pub async fn fetch_all<T, E, F, Fut>(mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<PagedResults<T>, E>>,
{
    let mut collected = Vec::new();
    let mut marker = None;
    loop {
        let page = fetch(marker.take()).await?;
        let next = page.next_marker().map(str::to_owned);
        let more = page.has_more();
        collected.extend(page);
        match next {
            Some(next) if more => marker = Some(next),
            _ => return Ok(collected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Clone, Debug, Eq, PartialEq)]
    struct Item(String);

    impl Identified for Item {
        fn id(&self) -> &str {
            &self.0
        }
    }

    fn items(count: usize) -> Vec<Item> {
        (1..=count).map(|n| Item(format!("item-{n}"))).collect()
    }

    fn ids(page: &PagedResults<Item>) -> Vec<&str> {
        page.iter().map(Identified::id).collect()
    }

    #[rstest]
    fn client_paging_without_limit_returns_everything() {
        let page = PagedResults::client_paged(items(3), None, None);
        assert_eq!(page.len(), 3);
        assert!(!page.has_more());
        assert_eq!(page.next_marker(), None);
        assert_eq!(page.total_results(), Some(3));
        assert!(!page.supports_server_paging());
    }

    #[rstest]
    fn client_paging_slices_and_points_at_next_offset() {
        let page = PagedResults::client_paged(items(5), Some(2), None);
        assert_eq!(ids(&page), ["item-1", "item-2"]);
        assert!(page.has_more());
        assert_eq!(page.next_marker(), Some("2"));
    }

    #[rstest]
    fn client_paging_resumes_after_marker() {
        let page = PagedResults::client_paged(items(5), Some(2), Some("2"));
        assert_eq!(ids(&page), ["item-3", "item-4"]);
        assert_eq!(page.next_marker(), Some("4"));
    }

    #[rstest]
    #[case(Some("5"))]
    #[case(Some("item-2"))]
    fn marker_past_the_end_yields_empty_page(#[case] marker: Option<&str>) {
        let page = PagedResults::client_paged(items(5), Some(2), marker);
        assert!(page.is_empty());
        assert!(!page.has_more());
    }

    #[rstest]
    fn exact_fit_is_not_truncated() {
        let page = PagedResults::client_paged(items(2), Some(2), None);
        assert!(!page.has_more());
        assert_eq!(page.next_marker(), None);
    }

    #[rstest]
    fn server_paging_drops_the_probe_record() {
        let page = PagedResults::server_paged(items(3), Some(2));
        assert_eq!(ids(&page), ["item-1", "item-2"]);
        assert!(page.has_more());
        assert_eq!(page.next_marker(), Some("item-2"));
        assert!(page.supports_server_paging());
        assert_eq!(page.total_results(), None);
    }

    #[rstest]
    fn server_paging_short_page_is_final() {
        let page = PagedResults::server_paged(items(1), Some(2));
        assert_eq!(page.len(), 1);
        assert!(!page.has_more());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(7)]
    #[tokio::test]
    async fn following_markers_reproduces_full_listing(#[case] limit: usize) {
        let all = items(7);
        let collected = fetch_all(|marker| {
            let source = all.clone();
            async move {
                Ok::<_, std::convert::Infallible>(PagedResults::client_paged(
                    source,
                    Some(limit),
                    marker.as_deref(),
                ))
            }
        })
        .await
        .expect("infallible");
        assert_eq!(collected, all);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_ids_page_to_completion() {
        let all = vec![Item(String::from("RegionOne")); 3];
        let mut pages = 0_usize;
        let collected = fetch_all(|marker| {
            pages += 1;
            let source = all.clone();
            async move {
                Ok::<_, std::convert::Infallible>(PagedResults::client_paged(
                    source,
                    Some(1),
                    marker.as_deref(),
                ))
            }
        })
        .await
        .expect("infallible");
        assert_eq!(collected, all);
        assert_eq!(pages, 3);
    }
}
