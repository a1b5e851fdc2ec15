//! Requests against the user's library and listening history.

use super::{
    transport::{Method, Transport},
    Client, API_RECENTLY_PLAYED_ENDPOINT, API_SAVED_TRACKS_ENDPOINT,
};
use crate::{
    error::Result,
    model::{
        library::{PlayHistory, SaveTracksRequest, SavedTrack},
        page::{Page, Pagination},
    },
};

impl<Tr> Client<Tr>
where
    Tr: Transport,
{
    /// Get the tracks saved in the user's library, a page at a time.
    pub fn saved_tracks(&self, limit: Option<u32>) -> Result<Page<'_, SavedTrack, Tr>> {
        let mut request = self.new_request(Method::Get, API_SAVED_TRACKS_ENDPOINT);

        if let Some(limit) = limit {
            request = request.with_query("limit", limit);
        }

        self.paginate(request, Pagination::offset())
    }

    /// Save tracks into the user's library.
    pub fn save_tracks<I, S>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let body = SaveTracksRequest::new(ids);
        self.execute(self.new_request_with_body(Method::Put, API_SAVED_TRACKS_ENDPOINT, &body)?)
    }

    /// Get the tracks the user has recently played, a page at a time. The history is paged with cursors.
    pub fn recently_played(&self, limit: Option<u32>) -> Result<Page<'_, PlayHistory, Tr>> {
        let mut request = self.new_request(Method::Get, API_RECENTLY_PLAYED_ENDPOINT);

        if let Some(limit) = limit {
            request = request.with_query("limit", limit);
        }

        self.paginate(request, Pagination::cursor())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::client::transport::{mock::MockTransport, RawResponse};

    fn track(id: &str) -> Value {
        json!({"id": id, "name": "Cut To The Feeling", "duration_ms": 207_959, "type": "track"})
    }

    #[test]
    fn saved_tracks_page() {
        let transport = MockTransport::json([json!({
            "items": [{"added_at": "2023-01-05T13:37:00Z", "track": track("a")}],
            "limit": 1,
            "offset": 0,
            "total": 1,
            "next": null
        })]);
        let client = Client::new(&transport);

        let page = client.saved_tracks(Some(1)).unwrap();

        assert_eq!(page.items()[0].track().id(), "a");
        assert_eq!(transport.requests()[0].path, "me/tracks");
        assert_eq!(transport.requests()[0].query_value("limit"), Some("1"));
    }

    #[test]
    fn save_tracks_body() {
        let transport = MockTransport::new([RawResponse::new(200, "")]);
        let client = Client::new(&transport);

        client.save_tracks(["a", "b"]).unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.body, Some(json!({"ids": ["a", "b"]})));
    }

    #[test]
    fn recently_played_goes_back_in_time() {
        let transport = MockTransport::json([
            json!({
                "items": [{"track": track("a"), "played_at": "2024-03-01T08:00:00Z", "context": null}],
                "next": "https://api.spotify.com/v1/me/player/recently-played?before=1709280000000&limit=1",
                "cursors": {"after": "1709280000001", "before": "1709280000000"},
                "limit": 1
            }),
            json!({"items": [], "next": null, "cursors": null, "limit": 1}),
        ]);
        let client = Client::new(&transport);

        let history: Vec<PlayHistory> = client
            .recently_played(Some(1))
            .unwrap()
            .paging_each_item()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(transport.requests()[1].query_value("before"), Some("1709280000000"));
        assert_eq!(transport.requests()[1].query_value("after"), None);
    }
}
