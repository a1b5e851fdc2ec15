//! Converting typed values back into untyped JSON.
//!
//! Dumping is the structural inverse of [coercion](crate::coerce): for any value that coerced successfully, dumping it
//! and coercing the result again gives back an equal value. Models are written field by field under their wire keys,
//! with unset fields left out and null fields written as `null`. Unions are written using the variant the value
//! actually holds, and enum values are written as their wire strings, including values that weren't recognized when
//! they were coerced.

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use crate::{
    coerce::Path,
    error::{CoercionError, CoercionErrorKind},
    schema::{Descriptor, Presence, PrimitiveKind},
    value::{Maybe, Record, Typed, TypedValue},
};

/// Dump a concrete value into its wire representation.
pub fn dump<T>(value: &T) -> Result<Value, CoercionError>
where
    T: Typed,
{
    dump_value(&value.to_typed(), &T::descriptor())
}

/// Dump a [TypedValue] according to a descriptor.
///
/// Fails only if the value doesn't match the descriptor, which can happen with hand-built [Records](Record), such as a
/// record with a required field left unset.
pub fn dump_value(value: &TypedValue, descriptor: &Descriptor) -> Result<Value, CoercionError> {
    dump_at(value, descriptor, &Path::root())
}

fn dump_at(value: &TypedValue, descriptor: &Descriptor, path: &Path) -> Result<Value, CoercionError> {
    match (descriptor, value) {
        (Descriptor::Nullable(_), TypedValue::Null) => Ok(Value::Null),
        (Descriptor::Nullable(inner), value) => dump_at(value, inner, path),

        (Descriptor::Primitive(PrimitiveKind::String), TypedValue::String(value)) => Ok(Value::String(value.clone())),
        (Descriptor::Primitive(PrimitiveKind::Integer), TypedValue::Integer(value)) => Ok(Value::from(*value)),
        (Descriptor::Primitive(PrimitiveKind::Integer), TypedValue::Float(value)) if value.fract() != 0.0 => Err(
            CoercionError::new(path.clone(), CoercionErrorKind::FractionalInteger(*value)),
        ),
        (Descriptor::Primitive(PrimitiveKind::Boolean), TypedValue::Boolean(value)) => Ok(Value::Bool(*value)),

        (Descriptor::Primitive(PrimitiveKind::Float), TypedValue::Float(value)) => Number::from_f64(*value)
            .map(Value::Number)
            .ok_or_else(|| CoercionError::mismatch(path.clone(), "finite float", value.to_string())),

        (Descriptor::Primitive(PrimitiveKind::DateTime), TypedValue::DateTime(value)) => {
            Ok(Value::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
        }

        (Descriptor::Enum(_), TypedValue::Enum(value)) => Ok(Value::String(value.wire().to_owned())),

        (Descriptor::Model(schema), TypedValue::Model(record)) if record.schema().name == schema.name => {
            dump_record(record, path)
        }

        (Descriptor::List(element), TypedValue::List(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| dump_at(item, element, &path.index(index)))
            .collect::<Result<_, _>>()
            .map(Value::Array),

        (Descriptor::Map(element), TypedValue::Map(entries)) => entries
            .iter()
            .map(|(key, value)| {
                let value = dump_at(value, element, &path.key(key.as_str()))?;
                Ok((key.clone(), value))
            })
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),

        // the value knows which variant it is, there's no need to look at the discriminator
        (Descriptor::Union(schema), TypedValue::Union(value)) => match schema.variant(value.tag) {
            Some(variant) => dump_at(&value.value, &variant.descriptor, path),
            None => Err(CoercionError::mismatch(
                path.clone(),
                descriptor,
                format!("unknown variant {}", value.tag),
            )),
        },

        (descriptor, value) => Err(CoercionError::mismatch(path.clone(), descriptor, value.kind_name())),
    }
}

fn dump_record(record: &Record, path: &Path) -> Result<Value, CoercionError> {
    let mut object = Map::new();

    for (field, value) in record.fields() {
        let field_path = path.key(field.wire_key);

        match (value, field.presence) {
            (Maybe::Unset, Presence::Required) => return Err(CoercionError::missing_field(path.clone(), field.wire_key)),
            (Maybe::Unset, _) => {}

            (Maybe::Null, Presence::Nullable) => {
                object.insert(field.wire_key.to_owned(), Value::Null);
            }

            (Maybe::Null, _) => return Err(CoercionError::mismatch(field_path, &field.descriptor, "null")),

            (Maybe::Set(value), _) => {
                object.insert(field.wire_key.to_owned(), dump_at(value, &field.descriptor, &field_path)?);
            }
        }
    }

    Ok(Value::Object(object))
}
