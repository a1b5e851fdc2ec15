use std::sync::OnceLock;

use super::{artist::SimplifiedArtist, DatePrecision, ExternalUrls, Image, ItemType, Model};
use crate::{
    error::CoercionError,
    schema::{Descriptor, FieldSchema, ModelSchema},
    value::{Maybe, Record, Typed},
};

wire_enum! {
    pub enum AlbumType {
        Album => "album",
        Single => "single",
        Compilation => "compilation",
    }
}

/// An album as it appears nested in tracks and search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifiedAlbum {
    id: String,
    total_tracks: u32,
    object_type: ItemType,
    name: Maybe<String>,
    album_type: Maybe<AlbumType>,
    artists: Maybe<Vec<SimplifiedArtist>>,
    images: Maybe<Vec<Image>>,
    release_date: Maybe<String>,
    release_date_precision: Maybe<DatePrecision>,
    external_urls: Maybe<ExternalUrls>,
}

impl SimplifiedAlbum {
    pub fn new<S>(id: S, total_tracks: u32) -> Self
    where
        S: Into<String>,
    {
        Self {
            id: id.into(),
            total_tracks,
            object_type: ItemType::Album,
            name: Maybe::Unset,
            album_type: Maybe::Unset,
            artists: Maybe::Unset,
            images: Maybe::Unset,
            release_date: Maybe::Unset,
            release_date_precision: Maybe::Unset,
            external_urls: Maybe::Unset,
        }
    }
}

model_fields!(SimplifiedAlbum {
    id / with_id: String,
    total_tracks / with_total_tracks: u32,
    object_type / with_object_type: ItemType,
    name / with_name: Maybe<String>,
    album_type / with_album_type: Maybe<AlbumType>,
    artists / with_artists: Maybe<Vec<SimplifiedArtist>>,
    images / with_images: Maybe<Vec<Image>>,
    release_date / with_release_date: Maybe<String>,
    release_date_precision / with_release_date_precision: Maybe<DatePrecision>,
    external_urls / with_external_urls: Maybe<ExternalUrls>,
});

impl Model for SimplifiedAlbum {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "SimplifiedAlbum",
                vec![
                    FieldSchema::required("id", Descriptor::STRING),
                    FieldSchema::required("total_tracks", Descriptor::INTEGER),
                    FieldSchema::required("object_type", ItemType::descriptor()).renamed("type"),
                    FieldSchema::optional("name", Descriptor::STRING),
                    FieldSchema::optional("album_type", AlbumType::descriptor()),
                    FieldSchema::optional("artists", Vec::<SimplifiedArtist>::descriptor()),
                    FieldSchema::optional("images", Vec::<Image>::descriptor()),
                    FieldSchema::optional("release_date", Descriptor::STRING),
                    FieldSchema::optional("release_date_precision", DatePrecision::descriptor()),
                    FieldSchema::optional("external_urls", ExternalUrls::descriptor()),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            id: record.require("id")?,
            total_tracks: record.require("total_tracks")?,
            object_type: record.require("object_type")?,
            name: record.take("name")?,
            album_type: record.take("album_type")?,
            artists: record.take("artists")?,
            images: record.take("images")?,
            release_date: record.take("release_date")?,
            release_date_precision: record.take("release_date_precision")?,
            external_urls: record.take("external_urls")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("id", &self.id)
            .with_value("total_tracks", &self.total_tracks)
            .with_value("object_type", &self.object_type)
            .with_field("name", &self.name)
            .with_field("album_type", &self.album_type)
            .with_field("artists", &self.artists)
            .with_field("images", &self.images)
            .with_field("release_date", &self.release_date)
            .with_field("release_date_precision", &self.release_date_precision)
            .with_field("external_urls", &self.external_urls)
    }
}

typed_model!(SimplifiedAlbum);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_item_type_round_trips() {
        let raw = json!({"id": "abc", "total_tracks": 3, "type": "unknown_future_type"});
        let album = SimplifiedAlbum::from_wire(&raw).unwrap();

        assert_eq!(
            album.object_type(),
            &ItemType::Unrecognized(String::from("unknown_future_type"))
        );
        assert_eq!(album.to_wire().unwrap(), raw);
    }

    #[test]
    fn full_album_round_trips() {
        let raw = json!({
            "id": "4m2880jivSbbyEGAKfITCa",
            "total_tracks": 11,
            "type": "album",
            "name": "Random Access Memories",
            "album_type": "album",
            "artists": [{"name": "Daft Punk", "id": "4tZwfgrHOc3mvqYlEYSvVi", "uri": "spotify:artist:4tZwfgrHOc3mvqYlEYSvVi"}],
            "images": [],
            "release_date": "2013-05-20",
            "release_date_precision": "day",
            "external_urls": {"spotify": "https://open.spotify.com/album/4m2880jivSbbyEGAKfITCa"}
        });

        let album = SimplifiedAlbum::from_wire(&raw).unwrap();

        assert_eq!(album.album_type(), &Maybe::Set(AlbumType::Album));
        assert_eq!(album.images(), &Maybe::Set(Vec::new()));
        assert_eq!(album.release_date_precision(), &Maybe::Set(DatePrecision::Day));
        assert_eq!(album.to_wire().unwrap(), raw);
    }

    #[test]
    fn new_album_is_minimal() {
        let album = SimplifiedAlbum::new("abc", 1).with_name(Maybe::Set(String::from("Single")));

        assert_eq!(
            album.to_wire().unwrap(),
            json!({"id": "abc", "total_tracks": 1, "type": "album", "name": "Single"})
        );
    }

    #[test]
    fn missing_required_field() {
        let err = SimplifiedAlbum::from_wire(&json!({"id": "abc", "type": "album"})).unwrap_err();
        assert_eq!(err.to_string(), "missing required field `total_tracks` (at $)");
    }
}
