//! Paged responses.
//!
//! A [Page] holds the items of one page along with what's needed to request the next one. Pages are fetched only when
//! asked for: either explicitly with [next_page](Page::next_page), or by iterating every item across pages with
//! [paging_each_item](Page::paging_each_item). Neither a page nor its iterator is meant to be shared between threads;
//! consuming the same pages concurrently needs coordination by the caller.

use std::{fmt, iter::FusedIterator, mem, sync::OnceLock, vec};

use log::{debug, trace};
use serde_json::Value;
use url::Url;

use super::Model;
use crate::{
    client::{
        transport::{Request, Transport},
        Client,
    },
    coerce::{coerce_with, Path},
    error::{CoercionError, CoercionErrorKind, Result},
    schema::{Descriptor, FieldSchema, ModelSchema},
    value::{Maybe, Record, Typed},
};

/// How an endpoint tells where the next page starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagingStyle {
    /// The next page is requested with `offset` and `limit` query parameters.
    Offset,
    /// The next page is requested with an opaque `after` cursor.
    Cursor,
}

/// Where a page object is in a response, and how to request the page after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pagination {
    pub style: PagingStyle,
    /// The key of the page object in the response body, or `None` if the body is the page object itself.
    pub envelope: Option<&'static str>,
}

/// A page of items.
pub struct Page<'c, T, Tr> {
    client: &'c Client<Tr>,
    request: Request,
    pagination: Pagination,
    items: Vec<T>,
    total: Option<u64>,
    next: Option<NextPage>,
}

/// An iterator over every item in a page and the pages after it. Returned by [Page::paging_each_item].
pub struct PagingItems<'c, T, Tr> {
    page: Option<Page<'c, T, Tr>>,
    items: vec::IntoIter<T>,
}

/// The query parameters a cursor-paged link may continue with.
const CURSOR_PARAMETERS: [&str; 2] = ["after", "before"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum NextPage {
    Offset { offset: u64, limit: Option<u64> },
    Cursor { key: &'static str, value: String },
}

/// Everything in a page object except its items.
#[derive(Debug, Clone, PartialEq)]
struct PageMeta {
    next: Maybe<String>,
    total: Maybe<u64>,
    offset: Maybe<u64>,
    limit: Maybe<u64>,
    cursors: Maybe<Cursors>,
}

#[derive(Debug, Clone, PartialEq)]
struct Cursors {
    after: Maybe<String>,
    before: Maybe<String>,
}

impl Pagination {
    pub fn offset() -> Self {
        Self {
            style: PagingStyle::Offset,
            envelope: None,
        }
    }

    pub fn cursor() -> Self {
        Self {
            style: PagingStyle::Cursor,
            envelope: None,
        }
    }

    /// Returns this pagination with the page object found under the given key of the response.
    pub fn within(self, envelope: &'static str) -> Self {
        Self {
            envelope: Some(envelope),
            ..self
        }
    }
}

impl<'c, T, Tr> Page<'c, T, Tr>
where
    T: Typed,
    Tr: Transport,
{
    /// Build a page from a response body. `request` is the request the body is the response to.
    pub(crate) fn from_raw(
        client: &'c Client<Tr>,
        request: Request,
        pagination: Pagination,
        body: &Value,
    ) -> Result<Self> {
        let (raw, path) = match pagination.envelope {
            Some(key) => (
                body.get(key)
                    .ok_or_else(|| CoercionError::missing_field(Path::root(), key))?,
                Path::root().key(key),
            ),

            None => (body, Path::root()),
        };

        let options = client.coercion_options();
        let meta: PageMeta = coerce_with(raw, options).map_err(|err| err.within(&path))?;

        let items = raw
            .get("items")
            .ok_or_else(|| CoercionError::missing_field(path.clone(), "items"))?;
        let items: Vec<T> = coerce_with(items, options).map_err(|err| err.within(&path.key("items")))?;

        let next = meta.next_page(pagination.style, &path)?;
        debug!(
            "Got page of {} items from {} (total {:?}), next: {next:?}",
            items.len(),
            request.path,
            meta.total.get()
        );

        Ok(Self {
            client,
            request,
            pagination,
            items,
            total: meta.total.into_option(),
            next,
        })
    }

    /// Return the items in this page.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Return the items in this page while consuming the page.
    pub fn take_items(self) -> Vec<T> {
        self.items
    }

    /// Return the total amount of items across every page, if the API reported it.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Returns whether there's a page after this one.
    pub fn has_next_page(&self) -> bool {
        self.next.is_some()
    }

    /// Return the next page from this page, if it exists.
    ///
    /// Requests the next page every time it's called; the page itself is left untouched.
    pub fn next_page(&self) -> Result<Option<Page<'c, T, Tr>>> {
        let Some(next) = &self.next else {
            return Ok(None);
        };

        let request = match next {
            NextPage::Cursor { key, value } => CURSOR_PARAMETERS
                .iter()
                .fold(self.request.clone(), |request, parameter| request.without_query(parameter))
                .with_query(*key, value),

            NextPage::Offset { offset, limit } => {
                let request = self.request.clone().with_query("offset", offset);

                match limit {
                    Some(limit) => request.with_query("limit", limit),
                    None => request,
                }
            }
        };

        debug!("Requesting next page: {} {:?}", request.path, request.query);
        self.client.paginate(request, self.pagination).map(Some)
    }

    /// Return an iterator over every item in this page and every page after it.
    ///
    /// The next page is requested only once the current page's items are exhausted and another item is asked for. An
    /// error requesting a page is returned as an item, after which the iterator ends.
    pub fn paging_each_item(mut self) -> PagingItems<'c, T, Tr> {
        let items = mem::take(&mut self.items).into_iter();

        PagingItems {
            page: Some(self),
            items,
        }
    }
}

impl<'c, T, Tr> fmt::Debug for Page<'c, T, Tr>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("request", &self.request)
            .field("pagination", &self.pagination)
            .field("items", &self.items)
            .field("total", &self.total)
            .field("next", &self.next)
            .finish()
    }
}

impl<'c, T, Tr> Iterator for PagingItems<'c, T, Tr>
where
    T: Typed,
    Tr: Transport,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(Ok(item));
            }

            let page = self.page.take()?;

            match page.next_page() {
                Ok(Some(mut next)) => {
                    trace!("Moving on to the next page with {} items", next.items.len());

                    self.items = mem::take(&mut next.items).into_iter();
                    self.page = Some(next);
                }

                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

impl<'c, T, Tr> FusedIterator for PagingItems<'c, T, Tr>
where
    T: Typed,
    Tr: Transport,
{
}

impl PageMeta {
    /// Find where the next page starts. `path` is the path of the page object.
    fn next_page(&self, style: PagingStyle, path: &Path) -> std::result::Result<Option<NextPage>, CoercionError> {
        let link = match &self.next {
            Maybe::Set(link) => link,
            Maybe::Null => return Ok(None),
            Maybe::Unset => return Ok(self.next_from_total(style)),
        };

        let invalid = |reason: String| {
            CoercionError::new(
                path.key("next"),
                CoercionErrorKind::InvalidLink {
                    link: link.clone(),
                    reason,
                },
            )
        };

        let url = Url::parse(link).map_err(|err| invalid(err.to_string()))?;

        match style {
            PagingStyle::Cursor => {
                // the link names the direction to continue in, the cursors object is only a fallback
                let (key, value) = CURSOR_PARAMETERS
                    .iter()
                    .find_map(|&key| query_parameter(&url, key).map(|value| (key, value)))
                    .or_else(|| self.cursors.get().and_then(Cursors::continuation))
                    .ok_or_else(|| invalid(String::from("no cursor to continue from")))?;

                Ok(Some(NextPage::Cursor { key, value }))
            }

            PagingStyle::Offset => {
                let limit = query_parameter(&url, "limit")
                    .and_then(|limit| limit.parse().ok())
                    .or_else(|| self.limit.get().copied());

                let offset = query_parameter(&url, "offset")
                    .and_then(|offset| offset.parse().ok())
                    .or_else(|| Some(self.offset.get()? + self.limit.get()?))
                    .ok_or_else(|| invalid(String::from("no offset to continue from")))?;

                Ok(Some(NextPage::Offset { offset, limit }))
            }
        }
    }

    /// With no `next` key at all, an offset page continues while it hasn't reached the total.
    fn next_from_total(&self, style: PagingStyle) -> Option<NextPage> {
        if style == PagingStyle::Cursor {
            return None;
        }

        let offset = self.offset.get()?;
        let limit = self.limit.get()?;
        let total = self.total.get()?;

        (offset + limit < *total).then_some(NextPage::Offset {
            offset: offset + limit,
            limit: Some(*limit),
        })
    }
}

impl Cursors {
    fn continuation(&self) -> Option<(&'static str, String)> {
        match (&self.after, &self.before) {
            (Maybe::Set(after), _) => Some(("after", after.clone())),
            (_, Maybe::Set(before)) => Some(("before", before.clone())),
            _ => None,
        }
    }
}

/// Returns the percent-decoded value of a query parameter in an URL.
fn query_parameter(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

impl Model for PageMeta {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Page",
                vec![
                    FieldSchema::nullable("next", Descriptor::STRING),
                    FieldSchema::optional("total", Descriptor::INTEGER),
                    FieldSchema::optional("offset", Descriptor::INTEGER),
                    FieldSchema::optional("limit", Descriptor::INTEGER),
                    FieldSchema::nullable("cursors", Cursors::descriptor()),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> std::result::Result<Self, CoercionError> {
        Ok(Self {
            next: record.take("next")?,
            total: record.take("total")?,
            offset: record.take("offset")?,
            limit: record.take("limit")?,
            cursors: record.take("cursors")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_field("next", &self.next)
            .with_field("total", &self.total)
            .with_field("offset", &self.offset)
            .with_field("limit", &self.limit)
            .with_field("cursors", &self.cursors)
    }
}

impl Model for Cursors {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Cursors",
                vec![
                    FieldSchema::nullable("after", Descriptor::STRING),
                    FieldSchema::nullable("before", Descriptor::STRING),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> std::result::Result<Self, CoercionError> {
        Ok(Self {
            after: record.take("after")?,
            before: record.take("before")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_field("after", &self.after)
            .with_field("before", &self.before)
    }
}

typed_model!(PageMeta, Cursors);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        client::transport::{mock::MockTransport, RawResponse, TransportError},
        error::Error,
    };

    const SAVED_TRACKS: &str = "https://api.spotify.com/v1/me/tracks";

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn offset_page(items: Value, offset: u64, next: Option<u64>) -> Value {
        json!({
            "href": format!("{SAVED_TRACKS}?offset={offset}&limit=2"),
            "items": items,
            "limit": 2,
            "offset": offset,
            "total": 6,
            "next": next.map(|next| format!("{SAVED_TRACKS}?offset={next}&limit=2")),
            "previous": null
        })
    }

    fn three_pages() -> MockTransport {
        MockTransport::json([
            offset_page(json!(["a", "b"]), 0, Some(2)),
            offset_page(json!(["c", "d"]), 2, Some(4)),
            offset_page(json!(["e", "f"]), 4, None),
        ])
    }

    #[test]
    fn paging_stops_after_last_page() {
        init_logging();

        let transport = three_pages();
        let client = Client::new(&transport);

        let page = client
            .paginate::<String>(Request::get("me/tracks"), Pagination::offset())
            .unwrap();
        let items: Vec<_> = page.paging_each_item().collect::<Result<_>>().unwrap();

        assert_eq!(items, ["a", "b", "c", "d", "e", "f"]);
        assert_eq!(transport.request_count(), 3);

        let offsets: Vec<_> = transport
            .requests()
            .iter()
            .map(|request| request.query_value("offset").map(str::to_owned))
            .collect();
        assert_eq!(offsets, [None, Some(String::from("2")), Some(String::from("4"))]);
    }

    #[test]
    fn items_does_not_fetch() {
        init_logging();

        let transport = three_pages();
        let client = Client::new(&transport);

        let page = client
            .paginate::<String>(Request::get("me/tracks"), Pagination::offset())
            .unwrap();

        assert_eq!(page.items(), ["a", "b"]);
        assert_eq!(page.total(), Some(6));
        assert!(page.has_next_page());
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn iterator_is_lazy() {
        init_logging();

        let transport = three_pages();
        let client = Client::new(&transport);

        let mut items = client
            .paginate::<String>(Request::get("me/tracks"), Pagination::offset())
            .unwrap()
            .paging_each_item();

        assert_eq!(items.next().unwrap().unwrap(), "a");
        assert_eq!(items.next().unwrap().unwrap(), "b");
        assert_eq!(transport.request_count(), 1);

        assert_eq!(items.next().unwrap().unwrap(), "c");
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn next_page_does_not_mutate() {
        let transport = three_pages();
        let client = Client::new(&transport);

        let page = client
            .paginate::<String>(Request::get("me/tracks"), Pagination::offset())
            .unwrap();
        let second = page.next_page().unwrap().unwrap();

        assert_eq!(page.items(), ["a", "b"]);
        assert_eq!(second.items(), ["c", "d"]);

        let third = second.next_page().unwrap().unwrap();
        assert!(!third.has_next_page());
        assert!(third.next_page().unwrap().is_none());
        assert_eq!(transport.request_count(), 3);
    }

    #[test]
    fn offset_from_total_without_next_key() {
        let transport = MockTransport::json([
            json!({"items": [1, 2], "offset": 0, "limit": 2, "total": 3}),
            json!({"items": [3], "offset": 2, "limit": 2, "total": 3}),
        ]);
        let client = Client::new(&transport);

        let items: Vec<i64> = client
            .paginate(Request::get("albums/abc/tracks"), Pagination::offset())
            .unwrap()
            .paging_each_item()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(items, [1, 2, 3]);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.requests()[1].query_value("limit"), Some("2"));
    }

    #[test]
    fn cursor_paging() {
        init_logging();

        let transport = MockTransport::json([
            json!({
                "items": ["a"],
                "next": "https://api.spotify.com/v1/me/player/recently-played?after=1700000000000&limit=1",
                "cursors": {"after": "1700000000000", "before": "1690000000000"},
                "limit": 1
            }),
            json!({
                "items": ["b"],
                "next": "https://api.spotify.com/v1/me/player/recently-played?after=1710000000000&limit=1",
                "cursors": null,
                "limit": 1
            }),
            json!({"items": [], "next": null, "cursors": null, "limit": 1}),
        ]);
        let client = Client::new(&transport);

        let items: Vec<String> = client
            .paginate(Request::get("me/player/recently-played"), Pagination::cursor())
            .unwrap()
            .paging_each_item()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(items, ["a", "b"]);

        let cursors: Vec<_> = transport
            .requests()
            .iter()
            .map(|request| request.query_value("after").map(str::to_owned))
            .collect();
        assert_eq!(
            cursors,
            [
                None,
                Some(String::from("1700000000000")),
                Some(String::from("1710000000000"))
            ]
        );
    }

    #[test]
    fn empty_page_in_the_middle() {
        let transport = MockTransport::json([
            offset_page(json!(["a"]), 0, Some(2)),
            offset_page(json!([]), 2, Some(4)),
            offset_page(json!(["e"]), 4, None),
        ]);
        let client = Client::new(&transport);

        let items: Vec<String> = client
            .paginate(Request::get("me/tracks"), Pagination::offset())
            .unwrap()
            .paging_each_item()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(items, ["a", "e"]);
    }

    #[test]
    fn error_ends_iteration() {
        init_logging();

        let transport = MockTransport::new([
            RawResponse::new(200, offset_page(json!(["a"]), 0, Some(2)).to_string()),
            RawResponse::new(502, "bad gateway"),
        ]);
        let client = Client::new(&transport);

        let mut items = client
            .paginate::<String>(Request::get("me/tracks"), Pagination::offset())
            .unwrap()
            .paging_each_item();

        assert_eq!(items.next().unwrap().unwrap(), "a");
        assert!(matches!(
            items.next(),
            Some(Err(Error::Transport(TransportError::Server { status: 502, .. })))
        ));
        assert!(items.next().is_none());
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn enveloped_page() {
        let transport = MockTransport::json([json!({"tracks": {"items": ["a"], "next": null}})]);
        let client = Client::new(&transport);

        let page = client
            .paginate::<String>(Request::get("search"), Pagination::offset().within("tracks"))
            .unwrap();

        assert_eq!(page.items(), ["a"]);
        assert!(!page.has_next_page());
    }

    #[test]
    fn ill_typed_item_reports_path() {
        let transport = MockTransport::json([json!({"tracks": {"items": ["a", 5], "next": null}})]);
        let client = Client::new(&transport);

        let err = client
            .paginate::<String>(Request::get("search"), Pagination::offset().within("tracks"))
            .unwrap_err();

        let Error::Coercion(err) = err else {
            panic!("expected a coercion error");
        };

        assert_eq!(err.path.to_string(), "$.tracks.items[1]");
    }

    #[test]
    fn cursor_follows_link_direction() {
        init_logging();

        let transport = MockTransport::json([
            json!({
                "items": ["a"],
                "next": "https://api.spotify.com/v1/me/player/recently-played?before=1709280000000&limit=1",
                "cursors": {"after": "1709280000001", "before": "1709280000000"},
                "limit": 1
            }),
            json!({"items": ["b"], "next": null, "cursors": null, "limit": 1}),
        ]);
        let client = Client::new(&transport);

        let items: Vec<String> = client
            .paginate(
                Request::get("me/player/recently-played").with_query("after", "1"),
                Pagination::cursor(),
            )
            .unwrap()
            .paging_each_item()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(items, ["a", "b"]);

        let second = &transport.requests()[1];
        assert_eq!(second.query_value("before"), Some("1709280000000"));
        assert_eq!(second.query_value("after"), None);
    }

    #[test]
    fn cursor_link_without_cursors_object() {
        let transport = MockTransport::json([json!({
            "items": ["a"],
            "next": "https://api.spotify.com/v1/me/player/recently-played?before=1709280000000&limit=1",
            "cursors": null,
            "limit": 1
        })]);
        let client = Client::new(&transport);

        let page = client
            .paginate::<String>(Request::get("me/player/recently-played"), Pagination::cursor())
            .unwrap();

        assert!(page.has_next_page());
    }

    #[test]
    fn cursor_is_percent_decoded() {
        let transport = MockTransport::json([
            json!({
                "items": ["a"],
                "next": "https://api.spotify.com/v1/me/following?type=artist&after=abc%3D%3D&limit=1",
                "cursors": null
            }),
            json!({"items": [], "next": null, "cursors": null}),
        ]);
        let client = Client::new(&transport);

        let page = client
            .paginate::<String>(Request::get("me/following"), Pagination::cursor())
            .unwrap();
        page.next_page().unwrap();

        assert_eq!(transport.requests()[1].query_value("after"), Some("abc=="));
    }

    #[test]
    fn next_link_without_position_is_an_error() {
        let transport = MockTransport::json([
            json!({"items": ["a"], "next": "https://api.spotify.com/v1/me/tracks?market=FI"}),
            json!({"tracks": {"items": ["a"], "next": "https://api.spotify.com/v1/me/tracks?market=FI"}}),
            json!({"items": ["a"], "next": "not a link"}),
        ]);
        let client = Client::new(&transport);

        let err = client
            .paginate::<String>(Request::get("me/tracks"), Pagination::offset())
            .unwrap_err();
        let Error::Coercion(err) = err else {
            panic!("expected a coercion error");
        };
        assert!(matches!(err.kind, CoercionErrorKind::InvalidLink { .. }));
        assert_eq!(err.path.to_string(), "$.next");

        let err = client
            .paginate::<String>(Request::get("search"), Pagination::offset().within("tracks"))
            .unwrap_err();
        let Error::Coercion(err) = err else {
            panic!("expected a coercion error");
        };
        assert_eq!(err.path.to_string(), "$.tracks.next");

        assert!(matches!(
            client.paginate::<String>(Request::get("me/tracks"), Pagination::cursor()),
            Err(Error::Coercion(CoercionError {
                kind: CoercionErrorKind::InvalidLink { .. },
                ..
            }))
        ));
    }
}
