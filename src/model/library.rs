//! The user's saved items and listening history.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};

use super::{playback::Context, track::Track, Model};
use crate::{
    error::CoercionError,
    schema::{Descriptor, FieldSchema, ModelSchema},
    value::{Maybe, Record, Typed},
};

/// A track in the user's library, along with when it was saved.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedTrack {
    added_at: DateTime<FixedOffset>,
    track: Track,
}

/// A track the user has recently played.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayHistory {
    track: Track,
    played_at: DateTime<FixedOffset>,
    context: Maybe<Context>,
}

/// The body of a request to save tracks into the user's library.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTracksRequest {
    ids: Vec<String>,
}

impl SavedTrack {
    pub fn new(added_at: DateTime<FixedOffset>, track: Track) -> Self {
        Self { added_at, track }
    }
}

model_fields!(SavedTrack {
    added_at / with_added_at: DateTime<FixedOffset>,
    track / with_track: Track,
});

impl Model for SavedTrack {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "SavedTrack",
                vec![
                    FieldSchema::required("added_at", Descriptor::DATE_TIME),
                    FieldSchema::required("track", Track::descriptor()),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            added_at: record.require("added_at")?,
            track: record.require("track")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("added_at", &self.added_at)
            .with_value("track", &self.track)
    }
}

impl PlayHistory {
    pub fn new(track: Track, played_at: DateTime<FixedOffset>) -> Self {
        Self {
            track,
            played_at,
            context: Maybe::Unset,
        }
    }
}

model_fields!(PlayHistory {
    track / with_track: Track,
    played_at / with_played_at: DateTime<FixedOffset>,
    context / with_context: Maybe<Context>,
});

impl Model for PlayHistory {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "PlayHistory",
                vec![
                    FieldSchema::required("track", Track::descriptor()),
                    FieldSchema::required("played_at", Descriptor::DATE_TIME),
                    FieldSchema::nullable("context", Context::descriptor()),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            track: record.require("track")?,
            played_at: record.require("played_at")?,
            context: record.take("context")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("track", &self.track)
            .with_value("played_at", &self.played_at)
            .with_field("context", &self.context)
    }
}

impl SaveTracksRequest {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

model_fields!(SaveTracksRequest {
    ids / with_ids: Vec<String>,
});

impl Model for SaveTracksRequest {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "SaveTracksRequest",
                vec![FieldSchema::required("ids", Vec::<String>::descriptor())],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            ids: record.require("ids")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema()).with_value("ids", &self.ids)
    }
}

typed_model!(SavedTrack, PlayHistory, SaveTracksRequest);
