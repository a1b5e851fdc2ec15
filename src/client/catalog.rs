//! Requests against the public catalog.

use log::trace;

use super::{
    transport::{Method, Transport},
    Client, API_ALBUMS_ENDPOINT, API_SEARCH_ENDPOINT, API_TRACKS_ENDPOINT,
};
use crate::{
    error::{Error, Result},
    model::{
        page::{Page, Pagination},
        search::{envelope_key, SearchResults, DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_TYPES},
        track::{Track, TracksResponse},
        ItemType,
    },
};

/// A builder for a search in the catalog. New instances are returned by [Client::search].
pub struct SearchBuilder<'c, Tr> {
    client: &'c Client<Tr>,
    query: String,
    types: Vec<ItemType>,
    limit: u32,
    offset: u32,
    market: Option<String>,
}

impl<Tr> Client<Tr>
where
    Tr: Transport,
{
    /// Get a track from the catalog.
    pub fn track(&self, id: &str) -> Result<Track> {
        self.request(self.new_request(Method::Get, format!("{API_TRACKS_ENDPOINT}/{id}")))
    }

    /// Get several tracks from the catalog. The returned list has an element for each ID, in order. IDs that don't
    /// correspond to a track are `None`.
    pub fn tracks<I, S>(&self, ids: I) -> Result<Vec<Option<Track>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = ids
            .into_iter()
            .map(|id| id.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(",");

        let request = self
            .new_request(Method::Get, API_TRACKS_ENDPOINT)
            .with_query("ids", ids);
        let response: TracksResponse = self.request(request)?;

        Ok(response.tracks)
    }

    /// Get the tracks of an album, a page at a time.
    pub fn album_tracks(&self, album_id: &str, limit: Option<u32>) -> Result<Page<'_, Track, Tr>> {
        let mut request = self.new_request(Method::Get, format!("{API_ALBUMS_ENDPOINT}/{album_id}/tracks"));

        if let Some(limit) = limit {
            request = request.with_query("limit", limit);
        }

        self.paginate(request, Pagination::offset())
    }

    /// Search for items in the catalog. Returns a [SearchBuilder] that can be configured further before sending.
    pub fn search<S>(&self, query: S) -> SearchBuilder<'_, Tr>
    where
        S: Into<String>,
    {
        SearchBuilder {
            client: self,
            query: query.into(),
            types: DEFAULT_SEARCH_TYPES.to_vec(),
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
            market: None,
        }
    }
}

impl<'c, Tr> SearchBuilder<'c, Tr>
where
    Tr: Transport,
{
    /// Set specific item types to search for. Only tracks, artists and albums are supported.
    ///
    /// By default, all supported types are searched for.
    pub fn types<I>(self, types: I) -> Self
    where
        I: IntoIterator<Item = ItemType>,
    {
        Self {
            types: types.into_iter().collect(),
            ..self
        }
    }

    /// The maximum number of results to return in each item type.
    ///
    /// Default: 20. Maximum: 50.
    pub fn limit(self, limit: u32) -> Self {
        Self { limit, ..self }
    }

    /// The index of the first result to return.
    ///
    /// Default: 0.
    pub fn offset(self, offset: u32) -> Self {
        Self { offset, ..self }
    }

    /// Specify a country such that only content available in that market will be returned.
    pub fn market<S>(self, market: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            market: Some(market.into()),
            ..self
        }
    }

    /// Send the search and return the first page of results of each type.
    pub fn send(self) -> Result<SearchResults<'c, Tr>> {
        let types = self
            .types
            .iter()
            .filter(|item_type| envelope_key(item_type).is_some())
            .map(ItemType::as_wire)
            .collect::<Vec<_>>()
            .join(",");

        let mut request = self
            .client
            .new_request(Method::Get, API_SEARCH_ENDPOINT)
            .with_query("q", &self.query)
            .with_query("type", types)
            .with_query("limit", self.limit)
            .with_query("offset", self.offset);

        if let Some(market) = &self.market {
            request = request.with_query("market", market);
        }

        trace!("Search request: {request:?}");

        let body = self.client.send_for_json(&request)?.ok_or(Error::EmptyResponse)?;
        SearchResults::from_raw(self.client, &request, &body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::client::transport::mock::MockTransport;

    fn track(id: &str) -> Value {
        json!({"id": id, "name": format!("Track {id}"), "duration_ms": 1000, "type": "track"})
    }

    #[test]
    fn single_track() {
        let transport = MockTransport::json([track("abc")]);
        let client = Client::new(&transport);

        let track = client.track("abc").unwrap();

        assert_eq!(track.id(), "abc");
        assert_eq!(transport.requests()[0].path, "tracks/abc");
    }

    #[test]
    fn several_tracks_with_missing() {
        let transport = MockTransport::json([json!({"tracks": [track("a"), null, track("c")]})]);
        let client = Client::new(&transport);

        let tracks = client.tracks(["a", "nope", "c"]).unwrap();

        assert_eq!(tracks.len(), 3);
        assert!(tracks[1].is_none());
        assert_eq!(transport.requests()[0].query_value("ids"), Some("a,nope,c"));
    }

    #[test]
    fn album_tracks_page() {
        let transport = MockTransport::json([json!({
            "items": [track("a"), track("b")],
            "limit": 2,
            "offset": 0,
            "total": 2,
            "next": null
        })]);
        let client = Client::new(&transport);

        let page = client.album_tracks("xyz", Some(2)).unwrap();

        assert_eq!(page.items().len(), 2);
        assert!(!page.has_next_page());
        assert_eq!(transport.requests()[0].path, "albums/xyz/tracks");
    }

    #[test]
    fn search_continuations_restrict_type() {
        let transport = MockTransport::json([
            json!({
                "tracks": {
                    "items": [track("a")],
                    "limit": 1,
                    "offset": 0,
                    "total": 2,
                    "next": "https://api.spotify.com/v1/search?q=nightcall&type=track&offset=1&limit=1"
                },
                "albums": {
                    "items": [{"id": "b", "total_tracks": 4, "type": "album"}],
                    "limit": 1,
                    "offset": 0,
                    "total": 1,
                    "next": null
                }
            }),
            json!({
                "tracks": {
                    "items": [track("c")],
                    "limit": 1,
                    "offset": 1,
                    "total": 2,
                    "next": null
                }
            }),
        ]);
        let client = Client::new(&transport);

        let results = client
            .search("nightcall")
            .types([ItemType::Track, ItemType::Album, ItemType::Playlist])
            .limit(1)
            .send()
            .unwrap();

        assert!(results.artists().is_none());
        assert_eq!(results.albums().map(|page| page.items().len()), Some(1));

        let tracks: Vec<Track> = results
            .into_tracks()
            .unwrap()
            .paging_each_item()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(tracks.len(), 2);

        let requests = transport.requests();
        assert_eq!(requests[0].query_value("type"), Some("track,album"));
        assert_eq!(requests[1].query_value("type"), Some("track"));
        assert_eq!(requests[1].query_value("offset"), Some("1"));
        assert_eq!(requests[1].query_value("q"), Some("nightcall"));
    }
}
