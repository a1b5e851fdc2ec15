//! Search results.

use log::debug;
use serde_json::Value;

use super::{
    album::SimplifiedAlbum,
    artist::SimplifiedArtist,
    page::{Page, Pagination},
    track::Track,
    ItemType,
};
use crate::{
    client::{transport::Request, Client, Transport},
    error::Result,
    value::Typed,
};

/// The default search types.
pub const DEFAULT_SEARCH_TYPES: [ItemType; 3] = [ItemType::Album, ItemType::Artist, ItemType::Track];
/// The default search limit, i.e. how many items there are in each page.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// First pages of search results from a [search](crate::client::Client::search).
///
/// Each item type is paged separately. Requesting the next page of one item type searches for that type only.
#[derive(Debug)]
pub struct SearchResults<'c, Tr> {
    tracks: Option<Page<'c, Track, Tr>>,
    artists: Option<Page<'c, SimplifiedArtist, Tr>>,
    albums: Option<Page<'c, SimplifiedAlbum, Tr>>,
}

/// The key in a search response holding the page of the given type, if this library knows the type's items.
pub(crate) fn envelope_key(item_type: &ItemType) -> Option<&'static str> {
    match item_type {
        ItemType::Track => Some("tracks"),
        ItemType::Artist => Some("artists"),
        ItemType::Album => Some("albums"),
        _ => None,
    }
}

impl<'c, Tr> SearchResults<'c, Tr>
where
    Tr: Transport,
{
    /// Build the results from a search response. `request` is the search request the body is the response to.
    pub(crate) fn from_raw(client: &'c Client<Tr>, request: &Request, body: &Value) -> Result<Self> {
        Ok(Self {
            tracks: results_page(client, request, body, ItemType::Track)?,
            artists: results_page(client, request, body, ItemType::Artist)?,
            albums: results_page(client, request, body, ItemType::Album)?,
        })
    }

    /// Return the page of tracks in these search results. `None` if tracks weren't searched for.
    pub fn tracks(&self) -> Option<&Page<'c, Track, Tr>> {
        self.tracks.as_ref()
    }

    /// Return the page of artists in these search results. `None` if artists weren't searched for.
    pub fn artists(&self) -> Option<&Page<'c, SimplifiedArtist, Tr>> {
        self.artists.as_ref()
    }

    /// Return the page of albums in these search results. `None` if albums weren't searched for.
    pub fn albums(&self) -> Option<&Page<'c, SimplifiedAlbum, Tr>> {
        self.albums.as_ref()
    }

    pub fn into_tracks(self) -> Option<Page<'c, Track, Tr>> {
        self.tracks
    }

    pub fn into_artists(self) -> Option<Page<'c, SimplifiedArtist, Tr>> {
        self.artists
    }

    pub fn into_albums(self) -> Option<Page<'c, SimplifiedAlbum, Tr>> {
        self.albums
    }
}

fn results_page<'c, T, Tr>(
    client: &'c Client<Tr>,
    request: &Request,
    body: &Value,
    item_type: ItemType,
) -> Result<Option<Page<'c, T, Tr>>>
where
    T: Typed,
    Tr: Transport,
{
    let Some(key) = envelope_key(&item_type) else {
        return Ok(None);
    };

    if body.get(key).is_none() {
        debug!("Search response has no {key}");
        return Ok(None);
    }

    // continuations of this page search for this one type only
    let request = request.clone().with_query("type", &item_type);
    Page::from_raw(client, request, Pagination::offset().within(key), body).map(Some)
}
