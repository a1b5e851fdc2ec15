//! Everything related to tracks.

use std::{sync::OnceLock, time::Duration};

use super::{album::SimplifiedAlbum, artist::SimplifiedArtist, ExternalUrls, ItemType, Model};
use crate::{
    error::CoercionError,
    schema::{Descriptor, FieldSchema, ModelSchema},
    value::{Maybe, Record, Typed},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    id: String,
    name: String,
    duration: Duration,
    object_type: ItemType,
    album: Maybe<SimplifiedAlbum>,
    artists: Maybe<Vec<SimplifiedArtist>>,
    track_number: Maybe<u32>,
    disc_number: Maybe<u32>,
    explicit: Maybe<bool>,
    popularity: Maybe<u32>,
    is_local: Maybe<bool>,
    uri: Maybe<String>,
    preview_url: Maybe<String>,
    external_urls: Maybe<ExternalUrls>,
}

/// The response of the several tracks endpoint. IDs that don't correspond to a track come back as `null` in their
/// position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TracksResponse {
    pub tracks: Vec<Option<Track>>,
}

impl Track {
    pub fn new<I, N>(id: I, name: N, duration: Duration) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            duration,
            object_type: ItemType::Track,
            album: Maybe::Unset,
            artists: Maybe::Unset,
            track_number: Maybe::Unset,
            disc_number: Maybe::Unset,
            explicit: Maybe::Unset,
            popularity: Maybe::Unset,
            is_local: Maybe::Unset,
            uri: Maybe::Unset,
            preview_url: Maybe::Unset,
            external_urls: Maybe::Unset,
        }
    }
}

model_fields!(Track {
    id / with_id: String,
    name / with_name: String,
    duration / with_duration: Duration,
    object_type / with_object_type: ItemType,
    album / with_album: Maybe<SimplifiedAlbum>,
    artists / with_artists: Maybe<Vec<SimplifiedArtist>>,
    track_number / with_track_number: Maybe<u32>,
    disc_number / with_disc_number: Maybe<u32>,
    explicit / with_explicit: Maybe<bool>,
    popularity / with_popularity: Maybe<u32>,
    is_local / with_is_local: Maybe<bool>,
    uri / with_uri: Maybe<String>,
    preview_url / with_preview_url: Maybe<String>,
    external_urls / with_external_urls: Maybe<ExternalUrls>,
});

impl Model for Track {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Track",
                vec![
                    FieldSchema::required("id", Descriptor::STRING),
                    FieldSchema::required("name", Descriptor::STRING),
                    FieldSchema::required("duration", Duration::descriptor()).renamed("duration_ms"),
                    FieldSchema::required("object_type", ItemType::descriptor()).renamed("type"),
                    FieldSchema::optional("album", SimplifiedAlbum::descriptor()),
                    FieldSchema::optional("artists", Vec::<SimplifiedArtist>::descriptor()),
                    FieldSchema::optional("track_number", Descriptor::INTEGER),
                    FieldSchema::optional("disc_number", Descriptor::INTEGER),
                    FieldSchema::optional("explicit", Descriptor::BOOLEAN),
                    FieldSchema::optional("popularity", Descriptor::INTEGER),
                    FieldSchema::optional("is_local", Descriptor::BOOLEAN),
                    FieldSchema::optional("uri", Descriptor::STRING),
                    FieldSchema::nullable("preview_url", Descriptor::STRING),
                    FieldSchema::optional("external_urls", ExternalUrls::descriptor()),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            id: record.require("id")?,
            name: record.require("name")?,
            duration: record.require("duration")?,
            object_type: record.require("object_type")?,
            album: record.take("album")?,
            artists: record.take("artists")?,
            track_number: record.take("track_number")?,
            disc_number: record.take("disc_number")?,
            explicit: record.take("explicit")?,
            popularity: record.take("popularity")?,
            is_local: record.take("is_local")?,
            uri: record.take("uri")?,
            preview_url: record.take("preview_url")?,
            external_urls: record.take("external_urls")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("id", &self.id)
            .with_value("name", &self.name)
            .with_value("duration", &self.duration)
            .with_value("object_type", &self.object_type)
            .with_field("album", &self.album)
            .with_field("artists", &self.artists)
            .with_field("track_number", &self.track_number)
            .with_field("disc_number", &self.disc_number)
            .with_field("explicit", &self.explicit)
            .with_field("popularity", &self.popularity)
            .with_field("is_local", &self.is_local)
            .with_field("uri", &self.uri)
            .with_field("preview_url", &self.preview_url)
            .with_field("external_urls", &self.external_urls)
    }
}

impl Model for TracksResponse {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "TracksResponse",
                vec![FieldSchema::required("tracks", Vec::<Option<Track>>::descriptor())],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            tracks: record.require("tracks")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema()).with_value("tracks", &self.tracks)
    }
}

typed_model!(Track, TracksResponse);
