use std::sync::OnceLock;

use super::{ExternalUrls, Model};
use crate::{
    error::CoercionError,
    schema::{Descriptor, FieldSchema, ModelSchema},
    value::{Maybe, Record, Typed},
};

/// An artist as it appears nested in albums and tracks.
///
/// Local tracks have artists without an ID or an URI, so both are nullable.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifiedArtist {
    name: String,
    id: Maybe<String>,
    uri: Maybe<String>,
    external_urls: Maybe<ExternalUrls>,
}

impl SimplifiedArtist {
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            id: Maybe::Unset,
            uri: Maybe::Unset,
            external_urls: Maybe::Unset,
        }
    }
}

model_fields!(SimplifiedArtist {
    name / with_name: String,
    id / with_id: Maybe<String>,
    uri / with_uri: Maybe<String>,
    external_urls / with_external_urls: Maybe<ExternalUrls>,
});

impl Model for SimplifiedArtist {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "SimplifiedArtist",
                vec![
                    FieldSchema::required("name", Descriptor::STRING),
                    FieldSchema::nullable("id", Descriptor::STRING),
                    FieldSchema::nullable("uri", Descriptor::STRING),
                    FieldSchema::optional("external_urls", ExternalUrls::descriptor()),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            name: record.require("name")?,
            id: record.take("id")?,
            uri: record.take("uri")?,
            external_urls: record.take("external_urls")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("name", &self.name)
            .with_field("id", &self.id)
            .with_field("uri", &self.uri)
            .with_field("external_urls", &self.external_urls)
    }
}

typed_model!(SimplifiedArtist);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn local_artist() {
        let artist = SimplifiedArtist::from_wire(&json!({
            "name": "Some Local Artist",
            "id": null,
            "uri": null,
            "type": "artist"
        }))
        .unwrap();

        assert_eq!(artist.name(), "Some Local Artist");
        assert!(artist.id().is_null());
        assert!(artist.external_urls().is_unset());
    }

    #[test]
    fn nested_error_path() {
        let err = SimplifiedArtist::from_wire(&json!({
            "name": "Kavinsky",
            "external_urls": {"spotify": 5}
        }))
        .unwrap_err();

        assert_eq!(err.path.to_string(), "$.external_urls.spotify");
    }
}
