//! Typed values produced by the coercion engine and consumed by the dump engine.
//!
//! A [TypedValue] is the engine-level representation of a value that already matched its descriptor. Concrete Rust
//! types move in and out of it through the [Typed] trait. Model instances pass through a [Record], which holds one
//! three-state [Maybe] per field in schema order.

use std::{collections::BTreeMap, fmt::Display, time::Duration};

use chrono::{DateTime, FixedOffset};

use crate::{
    coerce::Path,
    error::CoercionError,
    schema::{Descriptor, FieldSchema, ModelSchema},
};

/// A field that may be unset, explicitly `null`, or set to a value.
///
/// An unset field is missing from the wire representation altogether, while a null field is written out as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Maybe<T> {
    Unset,
    Null,
    Set(T),
}

/// A value that matched its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<FixedOffset>),
    Enum(EnumValue),
    Model(Record),
    List(Vec<TypedValue>),
    Map(BTreeMap<String, TypedValue>),
    Union(UnionValue),
    Null,
}

/// A coerced enum value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumValue {
    Known { symbol: &'static str, wire: &'static str },
    /// The wire value isn't in the enum's known values. The API adds new values over time, so the original string is
    /// kept instead of failing.
    Unrecognized(String),
}

/// A coerced union value, tagged with the variant it was resolved into.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionValue {
    pub tag: &'static str,
    pub value: Box<TypedValue>,
}

/// The fields of a single model instance, in the order of the model's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: &'static ModelSchema,
    values: Vec<Maybe<TypedValue>>,
}

/// Conversion between a concrete Rust type and a [TypedValue].
pub trait Typed: Sized {
    /// The shape of this type on the wire.
    fn descriptor() -> Descriptor;

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError>;

    fn to_typed(&self) -> TypedValue;
}

impl<T> Maybe<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Maybe::Set(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Maybe::Null)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Maybe::Unset)
    }

    pub fn as_ref(&self) -> Maybe<&T> {
        match self {
            Maybe::Unset => Maybe::Unset,
            Maybe::Null => Maybe::Null,
            Maybe::Set(value) => Maybe::Set(value),
        }
    }

    /// Return the value if it's set. Unset and null are both `None`.
    pub fn get(&self) -> Option<&T> {
        match self {
            Maybe::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Maybe::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Maybe<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Maybe::Unset => Maybe::Unset,
            Maybe::Null => Maybe::Null,
            Maybe::Set(value) => Maybe::Set(f(value)),
        }
    }
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Maybe::Unset
    }
}

/// `None` is unset. A `null` has to be asked for explicitly with [Maybe::Null].
impl<T> From<Option<T>> for Maybe<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Maybe::Set(value),
            None => Maybe::Unset,
        }
    }
}

impl TypedValue {
    /// A short name for the kind of this value, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::String(_) => "string",
            TypedValue::Integer(_) => "integer",
            TypedValue::Float(_) => "float",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::DateTime(_) => "datetime",
            TypedValue::Enum(_) => "enum value",
            TypedValue::Model(_) => "object",
            TypedValue::List(_) => "list",
            TypedValue::Map(_) => "map",
            TypedValue::Union(_) => "union value",
            TypedValue::Null => "null",
        }
    }
}

impl EnumValue {
    pub fn wire(&self) -> &str {
        match self {
            EnumValue::Known { wire, .. } => wire,
            EnumValue::Unrecognized(wire) => wire,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, EnumValue::Known { .. })
    }
}

impl UnionValue {
    pub fn new(tag: &'static str, value: TypedValue) -> Self {
        Self {
            tag,
            value: Box::new(value),
        }
    }
}

impl Record {
    /// Returns a new record with every field unset.
    pub fn new(schema: &'static ModelSchema) -> Self {
        Self {
            schema,
            values: vec![Maybe::Unset; schema.fields.len()],
        }
    }

    pub fn schema(&self) -> &'static ModelSchema {
        self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Maybe<TypedValue>> {
        self.schema.position(name).map(|index| &self.values[index])
    }

    /// Set a field's value. Returns false if the schema has no field with the given name.
    pub fn set(&mut self, name: &str, value: Maybe<TypedValue>) -> bool {
        match self.schema.position(name) {
            Some(index) => {
                self.values[index] = value;
                true
            }

            None => false,
        }
    }

    /// Iterate over every field in schema order alongside its value.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSchema, &Maybe<TypedValue>)> {
        self.schema.fields.iter().zip(self.values.iter())
    }

    pub(crate) fn set_at(&mut self, index: usize, value: Maybe<TypedValue>) {
        self.values[index] = value;
    }

    /// Take a field's value out of the record and convert it into a concrete type.
    pub fn take<T>(&mut self, name: &'static str) -> Result<Maybe<T>, CoercionError>
    where
        T: Typed,
    {
        let (index, path) = self.locate(name)?;

        match std::mem::take(&mut self.values[index]) {
            Maybe::Unset => Ok(Maybe::Unset),
            Maybe::Null => Ok(Maybe::Null),
            Maybe::Set(value) => T::from_typed(value, &path).map(Maybe::Set),
        }
    }

    /// Take a field's value out of the record, failing if it isn't set.
    pub fn require<T>(&mut self, name: &'static str) -> Result<T, CoercionError>
    where
        T: Typed,
    {
        let (index, path) = self.locate(name)?;
        let wire_key = self.schema.fields[index].wire_key;

        match self.take(name)? {
            Maybe::Set(value) => Ok(value),
            Maybe::Unset => Err(CoercionError::missing_field(Path::root(), wire_key)),
            Maybe::Null => Err(CoercionError::mismatch(path, T::descriptor(), "null")),
        }
    }

    /// Set a field to the given value.
    pub fn with_value<T>(mut self, name: &'static str, value: &T) -> Self
    where
        T: Typed,
    {
        let known = self.set(name, Maybe::Set(value.to_typed()));
        debug_assert!(known, "{} has no field {}", self.schema.name, name);
        self
    }

    /// Set a field to the given three-state value.
    pub fn with_field<T>(mut self, name: &'static str, value: &Maybe<T>) -> Self
    where
        T: Typed,
    {
        let known = self.set(name, value.as_ref().map(Typed::to_typed));
        debug_assert!(known, "{} has no field {}", self.schema.name, name);
        self
    }

    fn locate(&self, name: &'static str) -> Result<(usize, Path), CoercionError> {
        match self.schema.position(name) {
            Some(index) => Ok((index, Path::root().key(self.schema.fields[index].wire_key))),
            None => Err(CoercionError::missing_field(Path::root(), name)),
        }
    }
}

pub(crate) fn unexpected<E>(value: &TypedValue, expected: E, path: &Path) -> CoercionError
where
    E: Display,
{
    CoercionError::mismatch(path.clone(), expected, value.kind_name())
}

impl Typed for String {
    fn descriptor() -> Descriptor {
        Descriptor::STRING
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::String(value) => Ok(value),
            other => Err(unexpected(&other, Self::descriptor(), path)),
        }
    }

    fn to_typed(&self) -> TypedValue {
        TypedValue::String(self.clone())
    }
}

impl Typed for bool {
    fn descriptor() -> Descriptor {
        Descriptor::BOOLEAN
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::Boolean(value) => Ok(value),
            other => Err(unexpected(&other, Self::descriptor(), path)),
        }
    }

    fn to_typed(&self) -> TypedValue {
        TypedValue::Boolean(*self)
    }
}

impl Typed for i64 {
    fn descriptor() -> Descriptor {
        Descriptor::INTEGER
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::Integer(value) => Ok(value),
            other => Err(unexpected(&other, Self::descriptor(), path)),
        }
    }

    fn to_typed(&self) -> TypedValue {
        TypedValue::Integer(*self)
    }
}

impl Typed for u32 {
    fn descriptor() -> Descriptor {
        Descriptor::INTEGER
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        let value = i64::from_typed(value, path)?;
        u32::try_from(value)
            .map_err(|_| CoercionError::mismatch(path.clone(), "unsigned 32-bit integer", value.to_string()))
    }

    fn to_typed(&self) -> TypedValue {
        TypedValue::Integer(i64::from(*self))
    }
}

impl Typed for u64 {
    fn descriptor() -> Descriptor {
        Descriptor::INTEGER
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        let value = i64::from_typed(value, path)?;
        u64::try_from(value)
            .map_err(|_| CoercionError::mismatch(path.clone(), "unsigned integer", value.to_string()))
    }

    fn to_typed(&self) -> TypedValue {
        // a value past i64::MAX is kept as a float, which dumping rejects where an integer is expected
        i64::try_from(*self)
            .map(TypedValue::Integer)
            .unwrap_or(TypedValue::Float(*self as f64))
    }
}

impl Typed for f64 {
    fn descriptor() -> Descriptor {
        Descriptor::FLOAT
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::Float(value) => Ok(value),
            other => Err(unexpected(&other, Self::descriptor(), path)),
        }
    }

    fn to_typed(&self) -> TypedValue {
        TypedValue::Float(*self)
    }
}

impl Typed for DateTime<FixedOffset> {
    fn descriptor() -> Descriptor {
        Descriptor::DATE_TIME
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::DateTime(value) => Ok(value),
            other => Err(unexpected(&other, Self::descriptor(), path)),
        }
    }

    fn to_typed(&self) -> TypedValue {
        TypedValue::DateTime(*self)
    }
}

/// Durations are carried as whole milliseconds on the wire. A duration with a fraction of a millisecond can't be
/// dumped.
impl Typed for Duration {
    fn descriptor() -> Descriptor {
        Descriptor::INTEGER
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        u64::from_typed(value, path).map(Duration::from_millis)
    }

    fn to_typed(&self) -> TypedValue {
        match i64::try_from(self.as_millis()) {
            Ok(millis) if self.subsec_nanos() % 1_000_000 == 0 => TypedValue::Integer(millis),
            _ => TypedValue::Float(self.as_nanos() as f64 / 1_000_000.0),
        }
    }
}

impl<T> Typed for Vec<T>
where
    T: Typed,
{
    fn descriptor() -> Descriptor {
        Descriptor::list(T::descriptor())
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| T::from_typed(item, &path.index(index)))
                .collect(),

            other => Err(unexpected(&other, Self::descriptor(), path)),
        }
    }

    fn to_typed(&self) -> TypedValue {
        TypedValue::List(self.iter().map(Typed::to_typed).collect())
    }
}

impl<T> Typed for BTreeMap<String, T>
where
    T: Typed,
{
    fn descriptor() -> Descriptor {
        Descriptor::map(T::descriptor())
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| {
                    let value = T::from_typed(value, &path.key(&key))?;
                    Ok((key, value))
                })
                .collect(),

            other => Err(unexpected(&other, Self::descriptor(), path)),
        }
    }

    fn to_typed(&self) -> TypedValue {
        TypedValue::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_typed()))
                .collect(),
        )
    }
}

impl<T> Typed for Option<T>
where
    T: Typed,
{
    fn descriptor() -> Descriptor {
        Descriptor::nullable(T::descriptor())
    }

    fn from_typed(value: TypedValue, path: &Path) -> Result<Self, CoercionError> {
        match value {
            TypedValue::Null => Ok(None),
            other => T::from_typed(other, path).map(Some),
        }
    }

    fn to_typed(&self) -> TypedValue {
        match self {
            Some(value) => value.to_typed(),
            None => TypedValue::Null,
        }
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::String(value.to_owned())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::String(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::Integer(i64::from(value))
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::Integer(value)
    }
}

impl From<u32> for TypedValue {
    fn from(value: u32) -> Self {
        TypedValue::Integer(i64::from(value))
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        TypedValue::Float(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Boolean(value)
    }
}

impl From<DateTime<FixedOffset>> for TypedValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        TypedValue::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;

    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Test",
                vec![
                    FieldSchema::required("id", Descriptor::STRING),
                    FieldSchema::nullable("total", Descriptor::INTEGER).renamed("total_count"),
                ],
            )
        })
    }

    #[test]
    fn maybe_from_option() {
        assert_eq!(Maybe::from(Some(5)), Maybe::Set(5));
        assert_eq!(Maybe::<i32>::from(None), Maybe::Unset);
        assert_eq!(Maybe::<i32>::default(), Maybe::Unset);
    }

    #[test]
    fn record_take_and_require() {
        let mut record = Record::new(schema());
        assert!(record.set("id", Maybe::Set("abc".into())));
        assert!(!record.set("nope", Maybe::Null));

        assert_eq!(record.require::<String>("id").unwrap(), "abc");
        assert_eq!(record.take::<i64>("total").unwrap(), Maybe::Unset);
    }

    #[test]
    fn record_require_unset_fails() {
        let mut record = Record::new(schema());
        let err = record.require::<String>("id").unwrap_err();

        assert_eq!(err.to_string(), "missing required field `id` (at $)");
    }

    #[test]
    fn record_require_unset_reports_wire_key() {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        let schema = SCHEMA.get_or_init(|| {
            ModelSchema::new(
                "Renamed",
                vec![FieldSchema::required("duration", Descriptor::INTEGER).renamed("duration_ms")],
            )
        });

        let err = Record::new(schema).require::<i64>("duration").unwrap_err();
        assert_eq!(err, CoercionError::missing_field(Path::root(), "duration_ms"));
    }

    #[test]
    fn record_take_reports_wire_key() {
        let mut record = Record::new(schema());
        record.set("total", Maybe::Set("not a number".into()));

        let err = record.take::<i64>("total").unwrap_err();
        assert_eq!(err.path.to_string(), "$.total_count");
    }

    #[test]
    fn u32_rejects_negative() {
        let err = u32::from_typed(TypedValue::Integer(-1), &Path::root()).unwrap_err();
        assert!(err.to_string().contains("unsigned 32-bit integer"));
    }

    #[test]
    fn duration_in_milliseconds() {
        let duration = Duration::from_typed(TypedValue::Integer(258_000), &Path::root()).unwrap();

        assert_eq!(duration, Duration::from_secs(258));
        assert_eq!(duration.to_typed(), TypedValue::Integer(258_000));
        assert!(Duration::from_typed(TypedValue::Integer(-5), &Path::root()).is_err());
    }

    #[test]
    fn unrepresentable_integers_fail_to_dump() {
        let err = crate::dump::dump(&Duration::from_micros(1500)).unwrap_err();
        assert_eq!(err.kind, crate::error::CoercionErrorKind::FractionalInteger(1.5));

        assert!(crate::dump::dump(&u64::MAX).is_err());
        assert_eq!(crate::dump::dump(&Duration::from_millis(7)).unwrap(), serde_json::json!(7));
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<String>::from_typed(TypedValue::Null, &Path::root()).unwrap(), None);
        assert_eq!(Some(3i64).to_typed(), TypedValue::Integer(3));
    }
}
