//! Converting untyped JSON into typed values.
//!
//! [coerce_value] walks a raw [serde_json::Value] alongside a [Descriptor] and produces a [TypedValue], or fails with a
//! [CoercionError] pointing at the offending position. [coerce] is the typed front end for anything implementing
//! [Typed].
//!
//! # Leniencies
//!
//! Coercion is strict about shapes with two deliberate exceptions:
//! - an enum value that isn't one of the enum's known values is kept as
//!   [EnumValue::Unrecognized](crate::value::EnumValue::Unrecognized) instead of failing, since the API adds new values
//!   over time;
//! - a JSON integer is accepted where a float is expected, and by default a float with no fractional part is accepted
//!   where an integer is expected. The latter is controlled by [IntegerStrictness].
//!
//! Keys in objects that the model's schema doesn't know about are ignored.

pub mod union;

use std::fmt::{self, Display};

use chrono::DateTime;
use log::{debug, log_enabled, trace, Level};
use serde_json::{Map, Value};

use crate::{
    error::{CoercionError, CoercionErrorKind},
    schema::{Descriptor, ModelSchema, Presence, PrimitiveKind},
    value::{EnumValue, Maybe, Record, Typed, TypedValue, UnionValue},
};

const MAX_RENDERED_STRING_LENGTH: usize = 32;

/// How to treat floats in positions where integers are expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IntegerStrictness {
    /// Accept floats with no fractional part, such as `3.0`.
    #[default]
    AllowIntegralFloats,
    /// Accept only integer literals.
    Strict,
}

/// Options that tune the coercion engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CoercionOptions {
    pub integer_strictness: IntegerStrictness,
}

/// A location within a raw value, rendered like `$.items[2].album.name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key<S>(&self, key: S) -> Self
    where
        S: Into<String>,
    {
        self.child(PathSegment::Key(key.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// Returns a new path with the given path appended to this one.
    pub fn join(&self, other: &Path) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;

        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }

        Ok(())
    }
}

impl CoercionError {
    /// Returns this error with its path placed under the given prefix.
    pub fn within(self, prefix: &Path) -> Self {
        Self {
            path: prefix.join(&self.path),
            ..self
        }
    }
}

/// Coerce a raw value into a concrete type with the default options.
pub fn coerce<T>(raw: &Value) -> Result<T, CoercionError>
where
    T: Typed,
{
    coerce_with(raw, &CoercionOptions::default())
}

/// Coerce a raw value into a concrete type.
pub fn coerce_with<T>(raw: &Value, options: &CoercionOptions) -> Result<T, CoercionError>
where
    T: Typed,
{
    let path = Path::root();
    let value = coerce_at(raw, &T::descriptor(), options, &path)?;
    T::from_typed(value, &path)
}

/// Coerce a raw value into a [TypedValue] according to a descriptor.
pub fn coerce_value(
    raw: &Value,
    descriptor: &Descriptor,
    options: &CoercionOptions,
) -> Result<TypedValue, CoercionError> {
    coerce_at(raw, descriptor, options, &Path::root())
}

fn coerce_at(
    raw: &Value,
    descriptor: &Descriptor,
    options: &CoercionOptions,
    path: &Path,
) -> Result<TypedValue, CoercionError> {
    match descriptor {
        Descriptor::Primitive(kind) => coerce_primitive(raw, *kind, options, path),

        Descriptor::Enum(schema) => match raw {
            Value::String(wire) => match schema.lookup(wire) {
                Some((symbol, wire)) => Ok(TypedValue::Enum(EnumValue::Known { symbol, wire })),

                None => {
                    debug!("Unrecognized value {wire:?} for enum {} at {path}", schema.name);
                    Ok(TypedValue::Enum(EnumValue::Unrecognized(wire.clone())))
                }
            },

            other => Err(mismatch(path, descriptor, other)),
        },

        Descriptor::Model(schema) => match raw {
            Value::Object(object) => coerce_model(object, *schema, options, path),
            other => Err(mismatch(path, descriptor, other)),
        },

        Descriptor::List(element) => match raw {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| coerce_at(item, element, options, &path.index(index)))
                .collect::<Result<_, _>>()
                .map(TypedValue::List),

            other => Err(mismatch(path, descriptor, other)),
        },

        Descriptor::Map(element) => match raw {
            Value::Object(object) => object
                .iter()
                .map(|(key, value)| {
                    let value = coerce_at(value, element, options, &path.key(key.as_str()))?;
                    Ok((key.clone(), value))
                })
                .collect::<Result<_, _>>()
                .map(TypedValue::Map),

            other => Err(mismatch(path, descriptor, other)),
        },

        Descriptor::Union(schema) => {
            let (variant, value) = union::resolve_variant(raw, schema, options, path)?;
            Ok(TypedValue::Union(UnionValue::new(variant.tag, value)))
        }

        Descriptor::Nullable(inner) => match raw {
            Value::Null => Ok(TypedValue::Null),
            other => coerce_at(other, inner, options, path),
        },
    }
}

fn coerce_model(
    object: &Map<String, Value>,
    schema: &'static ModelSchema,
    options: &CoercionOptions,
    path: &Path,
) -> Result<TypedValue, CoercionError> {
    let mut record = Record::new(schema);

    for (index, field) in schema.fields.iter().enumerate() {
        let value = match (object.get(field.wire_key), field.presence) {
            (None, Presence::Required) => return Err(CoercionError::missing_field(path.clone(), field.wire_key)),
            (None, _) => Maybe::Unset,
            (Some(Value::Null), Presence::Nullable) => Maybe::Null,
            (Some(raw), _) => Maybe::Set(coerce_at(raw, &field.descriptor, options, &path.key(field.wire_key))?),
        };

        record.set_at(index, value);
    }

    if log_enabled!(Level::Trace) {
        for key in object.keys() {
            if !schema.fields.iter().any(|field| field.wire_key == key) {
                trace!("Ignoring unknown key {key:?} in {} at {path}", schema.name);
            }
        }
    }

    Ok(TypedValue::Model(record))
}

fn coerce_primitive(
    raw: &Value,
    kind: PrimitiveKind,
    options: &CoercionOptions,
    path: &Path,
) -> Result<TypedValue, CoercionError> {
    match (kind, raw) {
        (PrimitiveKind::String, Value::String(value)) => Ok(TypedValue::String(value.clone())),
        (PrimitiveKind::Boolean, Value::Bool(value)) => Ok(TypedValue::Boolean(*value)),

        (PrimitiveKind::Integer, Value::Number(number)) => {
            if let Some(value) = number.as_i64() {
                return Ok(TypedValue::Integer(value));
            }

            if number.is_u64() {
                return Err(CoercionError::mismatch(
                    path.clone(),
                    "64-bit signed integer",
                    render(raw),
                ));
            }

            let value = number.as_f64().unwrap_or(f64::NAN);
            let integral = value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64;

            if integral && options.integer_strictness == IntegerStrictness::AllowIntegralFloats {
                Ok(TypedValue::Integer(value as i64))
            } else {
                Err(CoercionError::new(
                    path.clone(),
                    CoercionErrorKind::FractionalInteger(value),
                ))
            }
        }

        // integer literals are widened into floats
        (PrimitiveKind::Float, Value::Number(number)) => match number.as_f64() {
            Some(value) => Ok(TypedValue::Float(value)),
            None => Err(CoercionError::mismatch(path.clone(), kind, render(raw))),
        },

        (PrimitiveKind::DateTime, Value::String(value)) => DateTime::parse_from_rfc3339(value)
            .map(TypedValue::DateTime)
            .map_err(|err| {
                CoercionError::new(
                    path.clone(),
                    CoercionErrorKind::InvalidDateTime {
                        value: value.clone(),
                        reason: err.to_string(),
                    },
                )
            }),

        (kind, other) => Err(CoercionError::mismatch(path.clone(), kind, render(other))),
    }
}

fn mismatch(path: &Path, descriptor: &Descriptor, raw: &Value) -> CoercionError {
    CoercionError::mismatch(path.clone(), descriptor, render(raw))
}

/// Render a short description of a raw value for error messages.
pub(crate) fn render(raw: &Value) -> String {
    match raw {
        Value::Null => String::from("null"),
        Value::Bool(value) => format!("boolean {value}"),
        Value::Number(value) => format!("number {value}"),

        Value::String(value) if value.chars().count() > MAX_RENDERED_STRING_LENGTH => {
            let truncated: String = value.chars().take(MAX_RENDERED_STRING_LENGTH).collect();
            format!("string {truncated:?}...")
        }

        Value::String(value) => format!("string {value:?}"),
        Value::Array(items) => format!("array of {} items", items.len()),
        Value::Object(object) => format!("object with {} keys", object.len()),
    }
}
