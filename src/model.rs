//! Typed models of the objects the API sends and receives.
//!
//! Every model implements [Model]: it declares its field table once, converts to and from a [Record], and thereby gets
//! [construction from raw JSON](Model::from_wire), [conversion back to JSON](Model::to_wire) and the [checked
//! builder](Model::with) for free. Models keep their fields private; each field has a getter and a `with_`-prefixed
//! setter that returns a modified copy, leaving the original untouched.
//!
//! ```
//! # use spotwire::model::{track::Track, Model};
//! # use serde_json::json;
//! let track = Track::with([
//!     ("id", json!("2pDPOMX0kWA7kcPBcDCQBu")),
//!     ("name", json!("Nightcall")),
//!     ("duration", json!(258_000)),
//!     ("object_type", json!("track")),
//! ])
//! .unwrap();
//!
//! let renamed = track.with_name("Nightcall (Remix)");
//! assert_eq!(track.name(), "Nightcall");
//! assert_eq!(renamed.name(), "Nightcall (Remix)");
//!
//! // a required field can't be left out
//! assert!(Track::with([("id", json!("2pDPOMX0kWA7kcPBcDCQBu"))]).is_err());
//! ```

/// Declares an enum whose values come from a closed set of wire strings, plus an `Unrecognized` variant that keeps
/// values the set doesn't know about. Values are equal when their wire strings are, so an `Unrecognized` holding a
/// known wire string equals the matching variant.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$variant_meta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis enum $name {
            $( $(#[$variant_meta])* $variant, )+
            /// A value this library doesn't know about. The original wire string is kept as is.
            Unrecognized(String),
        }

        impl $name {
            pub fn schema() -> &'static $crate::schema::EnumSchema {
                static SCHEMA: $crate::schema::EnumSchema = $crate::schema::EnumSchema {
                    name: stringify!($name),
                    values: &[ $( ($wire, stringify!($variant)), )+ ],
                };

                &SCHEMA
            }

            pub fn from_wire(wire: &str) -> Self {
                match wire {
                    $( $wire => Self::$variant, )+
                    other => Self::Unrecognized(other.to_owned()),
                }
            }

            pub fn as_wire(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Unrecognized(wire) => wire,
                }
            }
        }

        impl $crate::value::Typed for $name {
            fn descriptor() -> $crate::schema::Descriptor {
                $crate::schema::Descriptor::Enum(Self::schema())
            }

            fn from_typed(
                value: $crate::value::TypedValue,
                path: &$crate::coerce::Path,
            ) -> ::std::result::Result<Self, $crate::error::CoercionError> {
                match value {
                    $crate::value::TypedValue::Enum(value) => Ok(Self::from_wire(value.wire())),
                    other => Err($crate::value::unexpected(&other, Self::descriptor(), path)),
                }
            }

            fn to_typed(&self) -> $crate::value::TypedValue {
                $crate::value::TypedValue::Enum(match self {
                    $(
                        Self::$variant => $crate::value::EnumValue::Known {
                            symbol: stringify!($variant),
                            wire: $wire,
                        },
                    )+
                    Self::Unrecognized(wire) => $crate::value::EnumValue::Unrecognized(wire.clone()),
                })
            }
        }

        impl ::std::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.as_wire() == other.as_wire()
            }
        }

        impl ::std::cmp::Eq for $name {}

        impl ::std::hash::Hash for $name {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                ::std::hash::Hash::hash(self.as_wire(), state)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_wire())
            }
        }
    };
}

/// Implements [Typed](crate::value::Typed) for models by going through their [Model] implementation.
macro_rules! typed_model {
    ($($model:ty),+ $(,)?) => {
        $(
            impl $crate::value::Typed for $model {
                fn descriptor() -> $crate::schema::Descriptor {
                    $crate::schema::Descriptor::Model(<$model as $crate::model::Model>::schema())
                }

                fn from_typed(
                    value: $crate::value::TypedValue,
                    path: &$crate::coerce::Path,
                ) -> ::std::result::Result<Self, $crate::error::CoercionError> {
                    match value {
                        $crate::value::TypedValue::Model(record) => {
                            <$model as $crate::model::Model>::from_record(record).map_err(|err| err.within(path))
                        }

                        other => Err($crate::value::unexpected(
                            &other,
                            <Self as $crate::value::Typed>::descriptor(),
                            path,
                        )),
                    }
                }

                fn to_typed(&self) -> $crate::value::TypedValue {
                    $crate::value::TypedValue::Model(<$model as $crate::model::Model>::to_record(self))
                }
            }
        )+
    };
}

/// Generates a getter and a copy-on-write setter for each listed field of a model.
macro_rules! model_fields {
    ($model:ident { $( $field:ident / $setter:ident : $ty:ty ),+ $(,)? }) => {
        impl $model {
            $(
                pub fn $field(&self) -> &$ty {
                    &self.$field
                }

                /// Returns a copy of this object with the field replaced.
                pub fn $setter(&self, $field: impl Into<$ty>) -> Self {
                    let mut copy = self.clone();
                    copy.$field = $field.into();
                    copy
                }
            )+
        }
    };
}

pub mod album;
pub mod artist;
pub mod episode;
pub mod error;
pub mod library;
pub mod page;
pub mod playback;
pub mod search;
pub mod track;

use std::{fmt::Debug, sync::OnceLock};

use serde_json::{Map, Value};

use crate::{
    coerce,
    dump,
    error::{CoercionError, Error, Result},
    schema::{Descriptor, FieldSchema, ModelSchema},
    value::{Maybe, Record, Typed},
};

/// The contract every model fulfills.
pub trait Model: Typed + Clone + PartialEq + Debug {
    /// The model's field table.
    fn schema() -> &'static ModelSchema;

    /// Build the model from a record that has already been coerced against [schema](Model::schema).
    fn from_record(record: Record) -> std::result::Result<Self, CoercionError>;

    fn to_record(&self) -> Record;

    /// Build a model from pairs of field names and raw values.
    ///
    /// Fails if a required field is missing, if a name isn't one of the model's fields, or if a value doesn't have the
    /// field's shape. The field names are the in-memory names, not the wire keys.
    fn with<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let schema = Self::schema();
        let mut object = Map::new();

        for (name, value) in fields {
            let name = name.as_ref();
            let field = schema.field(name).ok_or_else(|| Error::UnknownField {
                model: schema.name,
                field: name.to_owned(),
            })?;

            object.insert(field.wire_key.to_owned(), value);
        }

        if let Some(field) = schema
            .required_fields()
            .find(|field| !object.contains_key(field.wire_key))
        {
            return Err(Error::MissingRequiredField {
                model: schema.name,
                field: field.name,
            });
        }

        Ok(Self::from_wire(&Value::Object(object))?)
    }

    /// Coerce a raw value into this model.
    fn from_wire(raw: &Value) -> std::result::Result<Self, CoercionError> {
        coerce::coerce(raw)
    }

    /// Dump this model into its raw wire representation.
    fn to_wire(&self) -> std::result::Result<Value, CoercionError> {
        dump::dump(self)
    }
}

wire_enum! {
    /// The kinds of objects in the catalog.
    pub enum ItemType {
        Album => "album",
        Artist => "artist",
        Playlist => "playlist",
        Track => "track",
        Show => "show",
        Episode => "episode",
        Audiobook => "audiobook",
    }
}

wire_enum! {
    pub enum DatePrecision {
        Year => "year",
        Month => "month",
        Day => "day",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    url: String,
    height: Maybe<u32>,
    width: Maybe<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalUrls {
    spotify: Maybe<String>,
}

impl Image {
    pub fn new<S>(url: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            url: url.into(),
            height: Maybe::Unset,
            width: Maybe::Unset,
        }
    }
}

model_fields!(Image {
    url / with_url: String,
    height / with_height: Maybe<u32>,
    width / with_width: Maybe<u32>,
});

impl Model for Image {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Image",
                vec![
                    FieldSchema::required("url", Descriptor::STRING),
                    FieldSchema::nullable("height", Descriptor::INTEGER),
                    FieldSchema::nullable("width", Descriptor::INTEGER),
                ],
            )
        })
    }

    fn from_record(mut record: Record) -> std::result::Result<Self, CoercionError> {
        Ok(Self {
            url: record.require("url")?,
            height: record.take("height")?,
            width: record.take("width")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema())
            .with_value("url", &self.url)
            .with_field("height", &self.height)
            .with_field("width", &self.width)
    }
}

model_fields!(ExternalUrls {
    spotify / with_spotify: Maybe<String>,
});

impl Model for ExternalUrls {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "ExternalUrls",
                vec![FieldSchema::optional("spotify", Descriptor::STRING)],
            )
        })
    }

    fn from_record(mut record: Record) -> std::result::Result<Self, CoercionError> {
        Ok(Self {
            spotify: record.take("spotify")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::schema()).with_field("spotify", &self.spotify)
    }
}

typed_model!(Image, ExternalUrls);
