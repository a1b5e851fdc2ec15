//! Playback state, devices and the items that can be played.

use std::{sync::OnceLock, time::Duration};

use super::{episode::Episode, track::Track, ExternalUrls, ItemType, Model};
use crate::{
    coerce::Path,
    error::CoercionError,
    schema::{Descriptor, FieldSchema, ModelSchema, UnionSchema, UnionVariant},
    value::{unexpected, Maybe, Record, Typed, TypedValue, UnionValue},
};

wire_enum! {
    /// The kind of item that is playing.
    pub enum CurrentlyPlayingType {
        Track => "track",
        Episode => "episode",
        Ad => "ad",
        Unknown => "unknown",
    }
}

wire_enum! {
    /// Possible item repeat states.
    pub enum RepeatState {
        Off => "off",
        Track => "track",
        Context => "context",
    }
}

wire_enum! {
    /// A device's type.
    pub enum DeviceType {
        Computer => "Computer",
        Tablet => "Tablet",
        Smartphone => "Smartphone",
        Speaker => "Speaker",
        Tv => "TV",
        Avr => "AVR",
        Stb => "STB",
        AudioDongle => "AudioDongle",
        GameConsole => "GameConsole",
        CastVideo => "CastVideo",
        CastAudio => "CastAudio",
        Automobile => "Automobile",
        Unknown => "Unknown",
    }
}

/// Something that can be played: either a track or a podcast episode.
///
/// The variant is picked by the object's `type` key. Objects with an unfamiliar `type` are matched against each
/// variant's shape in turn, tracks first.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayableItem {
    Track(Box<Track>),
    Episode(Box<Episode>),
}

/// A device in an user's account that may be used for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    id: Maybe<String>,
    name: String,
    device_type: DeviceType,
    is_active: bool,
    is_private_session: Maybe<bool>,
    is_restricted: Maybe<bool>,
    volume_percent: Maybe<u32>,
}

/// The context of the current playback (i.e. album, artist, playlist or show).
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    context_type: ItemType,
    uri: String,
    href: Maybe<String>,
    external_urls: Maybe<ExternalUrls>,
}

/// The user's currently playing item, along with the state of the playback.
///
/// The item and its context are `null` when nothing public is playing, such as during a private session.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentlyPlaying {
    is_playing: bool,
    currently_playing_type: CurrentlyPlayingType,
    timestamp: Maybe<i64>,
    progress: Maybe<Duration>,
    context: Maybe<Context>,
    item: Maybe<PlayableItem>,
    device: Maybe<Device>,
    repeat_state: Maybe<RepeatState>,
    shuffle_state: Maybe<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DevicesResponse {
    pub devices: Vec<Device>,
}

/// The body of a request to start or resume playback.
///
/// An empty request resumes the current playback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayRequest {
    context_uri: Maybe<String>,
    uris: Maybe<Vec<String>>,
    offset: Maybe<PlayOffset>,
    position: Maybe<Duration>,
}

/// Where in the context playback should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOffset {
    /// A zero-based position in the context.
    Position(u32),
    /// The URI of an item in the context.
    Uri(String),
}

impl PlayableItem {
    pub fn schema() -> &'static UnionSchema {
        static SCHEMA: OnceLock<UnionSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            UnionSchema::new(
                "PlayableItem",
                Some("type"),
                vec![
                    UnionVariant::new("track", Track::descriptor()),
                    UnionVariant::new("episode", Episode::descriptor()),
                ],
            )
        })
    }

    pub fn name(&self) -> &str {
        match self {
            PlayableItem::Track(track) => track.name(),
            PlayableItem::Episode(episode) => episode.name(),
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            PlayableItem::Track(track) => *track.duration(),
            PlayableItem::Episode(episode) => *episode.duration(),
        }
    }
}

impl From<Track> for PlayableItem {
    fn from(track: Track) -> Self {
        PlayableItem::Track(Box::new(track))
    }
}

impl From<Episode> for PlayableItem {
    fn from(episode: Episode) -> Self {
        PlayableItem::Episode(Box::new(episode))
    }
}

impl Typed for PlayableItem {
    fn descriptor() -> Descriptor {
        Descriptor::Union(Self::schema())
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::Union(UnionValue { tag: "track", value }) => Ok(Track::from_typed(*value, path)?.into()),
            TypedValue::Union(UnionValue { tag: "episode", value }) => Ok(Episode::from_typed(*value, path)?.into()),
            other => Err(unexpected(&other, Self::descriptor(), path)),
        }
    }

    fn to_typed(&self) -> TypedValue {
        match self {
            PlayableItem::Track(track) => TypedValue::Union(UnionValue::new("track", track.to_typed())),
            PlayableItem::Episode(episode) => TypedValue::Union(UnionValue::new("episode", episode.to_typed())),
        }
    }
}

impl Device {
    pub fn new<S>(name: S, device_type: DeviceType, is_active: bool) -> Self
    where
        S: Into<String>,
    {
        Self {
            id: Maybe::Unset,
            name: name.into(),
            device_type,
            is_active,
            is_private_session: Maybe::Unset,
            is_restricted: Maybe::Unset,
            volume_percent: Maybe::Unset,
        }
    }
}

model_fields!(Device {
    id / with_id: Maybe<String>,
    name / with_name: String,
    device_type / with_device_type: DeviceType,
    is_active / with_is_active: bool,
    is_private_session / with_is_private_session: Maybe<bool>,
    is_restricted / with_is_restricted: Maybe<bool>,
    volume_percent / with_volume_percent: Maybe<u32>,
});

impl Model for Device {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Device",
                vec![
                    FieldSchema::nullable("id", Descriptor::STRING),
                    FieldSchema::required("name", Descriptor::STRING),
                    FieldSchema::required("device_type", DeviceType::descriptor()).renamed("type"),
                    FieldSchema::required("is_active", Descriptor::BOOLEAN),
                    FieldSchema::optional("is_private_session", Descriptor::BOOLEAN),
                    FieldSchema::optional("is_restricted", Descriptor::BOOLEAN),
                    FieldSchema::nullable("volume_percent", Descriptor::INTEGER),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            id: record.take("id")?,
            name: record.require("name")?,
            device_type: record.require("device_type")?,
            is_active: record.require("is_active")?,
            is_private_session: record.take("is_private_session")?,
            is_restricted: record.take("is_restricted")?,
            volume_percent: record.take("volume_percent")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_field("id", &self.id)
            .with_value("name", &self.name)
            .with_value("device_type", &self.device_type)
            .with_value("is_active", &self.is_active)
            .with_field("is_private_session", &self.is_private_session)
            .with_field("is_restricted", &self.is_restricted)
            .with_field("volume_percent", &self.volume_percent)
    }
}

impl Context {
    pub fn new<S>(context_type: ItemType, uri: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            context_type,
            uri: uri.into(),
            href: Maybe::Unset,
            external_urls: Maybe::Unset,
        }
    }
}

model_fields!(Context {
    context_type / with_context_type: ItemType,
    uri / with_uri: String,
    href / with_href: Maybe<String>,
    external_urls / with_external_urls: Maybe<ExternalUrls>,
});

impl Model for Context {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Context",
                vec![
                    FieldSchema::required("context_type", ItemType::descriptor()).renamed("type"),
                    FieldSchema::required("uri", Descriptor::STRING),
                    FieldSchema::optional("href", Descriptor::STRING),
                    FieldSchema::optional("external_urls", ExternalUrls::descriptor()),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            context_type: record.require("context_type")?,
            uri: record.require("uri")?,
            href: record.take("href")?,
            external_urls: record.take("external_urls")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("context_type", &self.context_type)
            .with_value("uri", &self.uri)
            .with_field("href", &self.href)
            .with_field("external_urls", &self.external_urls)
    }
}

impl CurrentlyPlaying {
    pub fn new(is_playing: bool, currently_playing_type: CurrentlyPlayingType) -> Self {
        Self {
            is_playing,
            currently_playing_type,
            timestamp: Maybe::Unset,
            progress: Maybe::Unset,
            context: Maybe::Unset,
            item: Maybe::Unset,
            device: Maybe::Unset,
            repeat_state: Maybe::Unset,
            shuffle_state: Maybe::Unset,
        }
    }
}

model_fields!(CurrentlyPlaying {
    is_playing / with_is_playing: bool,
    currently_playing_type / with_currently_playing_type: CurrentlyPlayingType,
    timestamp / with_timestamp: Maybe<i64>,
    progress / with_progress: Maybe<Duration>,
    context / with_context: Maybe<Context>,
    item / with_item: Maybe<PlayableItem>,
    device / with_device: Maybe<Device>,
    repeat_state / with_repeat_state: Maybe<RepeatState>,
    shuffle_state / with_shuffle_state: Maybe<bool>,
});

impl Model for CurrentlyPlaying {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "CurrentlyPlaying",
                vec![
                    FieldSchema::required("is_playing", Descriptor::BOOLEAN),
                    FieldSchema::required("currently_playing_type", CurrentlyPlayingType::descriptor()),
                    FieldSchema::optional("timestamp", Descriptor::INTEGER),
                    FieldSchema::nullable("progress", Duration::descriptor()).renamed("progress_ms"),
                    FieldSchema::nullable("context", Context::descriptor()),
                    FieldSchema::nullable("item", PlayableItem::descriptor()),
                    FieldSchema::optional("device", Device::descriptor()),
                    FieldSchema::optional("repeat_state", RepeatState::descriptor()),
                    FieldSchema::optional("shuffle_state", Descriptor::BOOLEAN),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            is_playing: record.require("is_playing")?,
            currently_playing_type: record.require("currently_playing_type")?,
            timestamp: record.take("timestamp")?,
            progress: record.take("progress")?,
            context: record.take("context")?,
            item: record.take("item")?,
            device: record.take("device")?,
            repeat_state: record.take("repeat_state")?,
            shuffle_state: record.take("shuffle_state")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("is_playing", &self.is_playing)
            .with_value("currently_playing_type", &self.currently_playing_type)
            .with_field("timestamp", &self.timestamp)
            .with_field("progress", &self.progress)
            .with_field("context", &self.context)
            .with_field("item", &self.item)
            .with_field("device", &self.device)
            .with_field("repeat_state", &self.repeat_state)
            .with_field("shuffle_state", &self.shuffle_state)
    }
}

impl Model for DevicesResponse {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "DevicesResponse",
                vec![FieldSchema::required("devices", Vec::<Device>::descriptor())],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            devices: record.require("devices")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema()).with_value("devices", &self.devices)
    }
}

impl PlayRequest {
    /// Returns a request that resumes the current playback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a request that plays the given album, artist or playlist.
    pub fn context<S>(context_uri: S) -> Self
    where
        S: Into<String>,
    {
        Self::new().with_context_uri(Maybe::Set(context_uri.into()))
    }

    /// Returns a request that plays the given tracks or episodes.
    pub fn items<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().with_uris(Maybe::Set(uris.into_iter().map(Into::into).collect()))
    }
}

model_fields!(PlayRequest {
    context_uri / with_context_uri: Maybe<String>,
    uris / with_uris: Maybe<Vec<String>>,
    offset / with_offset: Maybe<PlayOffset>,
    position / with_position: Maybe<Duration>,
});

impl Model for PlayRequest {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "PlayRequest",
                vec![
                    FieldSchema::optional("context_uri", Descriptor::STRING),
                    FieldSchema::optional("uris", Vec::<String>::descriptor()),
                    FieldSchema::optional("offset", PlayOffset::descriptor()),
                    FieldSchema::optional("position", Duration::descriptor()).renamed("position_ms"),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> Result<Self, CoercionError> {
        Ok(Self {
            context_uri: record.take("context_uri")?,
            uris: record.take("uris")?,
            offset: record.take("offset")?,
            position: record.take("position")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_field("context_uri", &self.context_uri)
            .with_field("uris", &self.uris)
            .with_field("offset", &self.offset)
            .with_field("position", &self.position)
    }
}

impl PlayOffset {
    /// The offset is either `{"position": n}` or `{"uri": "..."}`. There's no discriminator, so the shapes are tried in
    /// order.
    pub fn schema() -> &'static UnionSchema {
        static SCHEMA: OnceLock<UnionSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            UnionSchema::new(
                "PlayOffset",
                None,
                vec![
                    UnionVariant::new("position", Descriptor::Model(position_offset_schema())),
                    UnionVariant::new("uri", Descriptor::Model(uri_offset_schema())),
                ],
            )
        })
    }
}

fn position_offset_schema() -> &'static ModelSchema {
    static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        ModelSchema::new(
            "PositionOffset",
            vec![FieldSchema::required("position", Descriptor::INTEGER)],
        )
    })
}

fn uri_offset_schema() -> &'static ModelSchema {
    static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| ModelSchema::new("UriOffset", vec![FieldSchema::required("uri", Descriptor::STRING)]))
}

impl Typed for PlayOffset {
    fn descriptor() -> Descriptor {
        Descriptor::Union(Self::schema())
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        let UnionValue { tag, value } = match value {
            TypedValue::Union(value) => value,
            other => return Err(unexpected(&other, Self::descriptor(), path)),
        };

        let mut record = match *value {
            TypedValue::Model(record) => record,
            other => return Err(unexpected(&other, "object", path)),
        };

        let offset = match tag {
            "position" => record.require("position").map(PlayOffset::Position),
            _ => record.require("uri").map(PlayOffset::Uri),
        };

        offset.map_err(|err| err.within(path))
    }

    fn to_typed(&self) -> TypedValue {
        match self {
            PlayOffset::Position(position) => TypedValue::Union(UnionValue::new(
                "position",
                TypedValue::Model(Record::new(position_offset_schema()).with_value("position", position)),
            )),

            PlayOffset::Uri(uri) => TypedValue::Union(UnionValue::new(
                "uri",
                TypedValue::Model(Record::new(uri_offset_schema()).with_value("uri", uri)),
            )),
        }
    }
}

typed_model!(Device, Context, CurrentlyPlaying, DevicesResponse, PlayRequest);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn episode() -> serde_json::Value {
        json!({
            "id": "512ojhOuo1ktJprKbVcKyQ",
            "name": "Hello World",
            "duration_ms": 1_686_230,
            "type": "episode",
            "description": "A podcast episode"
        })
    }

    #[test]
    fn playable_item_by_discriminator() {
        let item: PlayableItem = crate::coerce::coerce(&episode()).unwrap();

        assert!(matches!(item, PlayableItem::Episode(_)));
        assert_eq!(item.name(), "Hello World");
    }

    #[test]
    fn playable_item_discriminator_beats_shape() {
        // shaped like both; the track variant would win a trial but the discriminator names the episode
        let raw = json!({"id": "abc", "name": "Both", "duration_ms": 1000, "type": "episode"});
        let item: PlayableItem = crate::coerce::coerce(&raw).unwrap();

        assert!(matches!(item, PlayableItem::Episode(_)));
    }

    #[test]
    fn playable_item_unknown_type_falls_back_to_shape() {
        let raw = json!({"id": "abc", "name": "Chapter 1", "duration_ms": 1000, "type": "chapter"});
        let item: PlayableItem = crate::coerce::coerce(&raw).unwrap();

        let PlayableItem::Track(track) = &item else {
            panic!("expected a track");
        };

        assert_eq!(track.object_type(), &ItemType::Unrecognized(String::from("chapter")));
        assert_eq!(crate::dump::dump(&item).unwrap(), raw);
    }

    #[test]
    fn currently_playing_private_session() {
        let raw = json!({
            "is_playing": true,
            "currently_playing_type": "unknown",
            "timestamp": 1_700_000_000_000i64,
            "progress_ms": null,
            "context": null,
            "item": null,
            "device": {
                "id": null,
                "name": "Kitchen",
                "type": "Speaker",
                "is_active": true,
                "volume_percent": 40
            }
        });

        let playing = CurrentlyPlaying::from_wire(&raw).unwrap();

        assert!(playing.item().is_null());
        assert!(playing.progress().is_null());
        assert_eq!(
            playing.device().get().map(Device::device_type),
            Some(&DeviceType::Speaker)
        );
        assert_eq!(playing.to_wire().unwrap(), raw);
    }

    #[test]
    fn currently_playing_episode() {
        let raw = json!({
            "is_playing": false,
            "currently_playing_type": "episode",
            "progress_ms": 5000,
            "context": {"type": "show", "uri": "spotify:show:5CfCWKI5pZ28U0uOzXkDHe"},
            "item": episode(),
            "repeat_state": "off",
            "shuffle_state": false
        });

        let playing = CurrentlyPlaying::from_wire(&raw).unwrap();

        assert_eq!(playing.progress(), &Maybe::Set(Duration::from_secs(5)));
        assert_eq!(
            playing.item().get().map(PlayableItem::duration),
            Some(Duration::from_millis(1_686_230))
        );
        assert_eq!(playing.to_wire().unwrap(), raw);
    }

    #[test]
    fn unknown_device_type_kept() {
        let device = Device::from_wire(&json!({"name": "Fridge", "type": "Refrigerator", "is_active": false})).unwrap();
        assert_eq!(device.device_type(), &DeviceType::Unrecognized(String::from("Refrigerator")));
    }

    #[test]
    fn play_request_dump() {
        let request = PlayRequest::context("spotify:album:5ht7ItJgpBH7W6vJ5BqpPr")
            .with_offset(Maybe::Set(PlayOffset::Position(5)))
            .with_position(Maybe::Set(Duration::from_secs(1)));

        assert_eq!(
            request.to_wire().unwrap(),
            json!({
                "context_uri": "spotify:album:5ht7ItJgpBH7W6vJ5BqpPr",
                "offset": {"position": 5},
                "position_ms": 1000
            })
        );
    }

    #[test]
    fn play_offset_by_shape() {
        let offset: PlayOffset = crate::coerce::coerce(&json!({"uri": "spotify:track:1301WleyT98MSxVHPZCA6M"})).unwrap();
        assert_eq!(offset, PlayOffset::Uri(String::from("spotify:track:1301WleyT98MSxVHPZCA6M")));

        let offset: PlayOffset = crate::coerce::coerce(&json!({"position": 2})).unwrap();
        assert_eq!(offset, PlayOffset::Position(2));
    }

    #[test]
    fn empty_play_request() {
        assert_eq!(PlayRequest::new().to_wire().unwrap(), json!({}));
    }
}
