use std::{sync::OnceLock, time::Duration};

use super::{DatePrecision, ExternalUrls, Image, ItemType, Model};
use crate::{
    error::CoercionError,
    schema::{Descriptor, FieldSchema, ModelSchema},
    value::{Maybe, Record, Typed},
};

/// A podcast episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    id: String,
    name: String,
    duration: Duration,
    object_type: ItemType,
    description: Maybe<String>,
    explicit: Maybe<bool>,
    images: Maybe<Vec<Image>>,
    release_date: Maybe<String>,
    release_date_precision: Maybe<DatePrecision>,
    is_playable: Maybe<bool>,
    uri: Maybe<String>,
    external_urls: Maybe<ExternalUrls>,
}

impl Episode {
    pub fn new<I, N>(id: I, name: N, duration: Duration) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            duration,
            object_type: ItemType::Episode,
            description: Maybe::Unset,
            explicit: Maybe::Unset,
            images: Maybe::Unset,
            release_date: Maybe::Unset,
            release_date_precision: Maybe::Unset,
            is_playable: Maybe::Unset,
            uri: Maybe::Unset,
            external_urls: Maybe::Unset,
        }
    }
}

model_fields!(Episode {
    id / with_id: String,
    name / with_name: String,
    duration / with_duration: Duration,
    object_type / with_object_type: ItemType,
    description / with_description: Maybe<String>,
    explicit / with_explicit: Maybe<bool>,
    images / with_images: Maybe<Vec<Image>>,
    release_date / with_release_date: Maybe<String>,
    release_date_precision / with_release_date_precision: Maybe<DatePrecision>,
    is_playable / with_is_playable: Maybe<bool>,
    uri / with_uri: Maybe<String>,
    external_urls / with_external_urls: Maybe<ExternalUrls>,
});

impl Model for Episode {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Episode",
                vec![
                    FieldSchema::required("id", Descriptor::STRING),
                    FieldSchema::required("name", Descriptor::STRING),
                    FieldSchema::required("duration", Duration::descriptor()).renamed("duration_ms"),
                    FieldSchema::required("object_type", ItemType::descriptor()).renamed("type"),
                    FieldSchema::optional("description", Descriptor::STRING),
                    FieldSchema::optional("explicit", Descriptor::BOOLEAN),
                    FieldSchema::optional("images", Vec::<Image>::descriptor()),
                    FieldSchema::optional("release_date", Descriptor::STRING),
                    FieldSchema::optional("release_date_precision", DatePrecision::descriptor()),
                    FieldSchema::optional("is_playable", Descriptor::BOOLEAN),
                    FieldSchema::optional("uri", Descriptor::STRING),
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
            description: record.take("description")?,
            explicit: record.take("explicit")?,
            images: record.take("images")?,
            release_date: record.take("release_date")?,
            release_date_precision: record.take("release_date_precision")?,
            is_playable: record.take("is_playable")?,
            uri: record.take("uri")?,
            external_urls: record.take("external_urls")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("id", &self.id)
            .with_value("name", &self.name)
            .with_value("duration", &self.duration)
            .with_value("object_type", &self.object_type)
            .with_field("description", &self.description)
            .with_field("explicit", &self.explicit)
            .with_field("images", &self.images)
            .with_field("release_date", &self.release_date)
            .with_field("release_date_precision", &self.release_date_precision)
            .with_field("is_playable", &self.is_playable)
            .with_field("uri", &self.uri)
            .with_field("external_urls", &self.external_urls)
    }
}

typed_model!(Episode);
