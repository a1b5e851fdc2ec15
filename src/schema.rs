//! Static declarations of the shapes values take on the wire.
//!
//! Every generated model, enum and union declares its shape once as a [ModelSchema], [EnumSchema] or [UnionSchema].
//! The [coercion](crate::coerce) and [dump](crate::dump) engines are driven purely by these tables; nothing about a
//! particular API object is compiled into the engines themselves.
//!
//! Schemas are built once and live for the rest of the program, so descriptors refer to them with `'static`
//! references:
//!
//! ```
//! # use spotwire::schema::{Descriptor, FieldSchema, ModelSchema};
//! # use std::sync::OnceLock;
//! fn image_schema() -> &'static ModelSchema {
//!     static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
//!     SCHEMA.get_or_init(|| {
//!         ModelSchema::new(
//!             "Image",
//!             vec![
//!                 FieldSchema::required("url", Descriptor::STRING),
//!                 FieldSchema::nullable("height", Descriptor::INTEGER),
//!                 FieldSchema::nullable("width", Descriptor::INTEGER),
//!             ],
//!         )
//!     })
//! }
//!
//! assert_eq!(image_schema().field("url").unwrap().wire_key, "url");
//! ```

use std::fmt::{self, Display};

/// The kinds of scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Integer,
    Float,
    Boolean,
    /// An RFC 3339 timestamp string.
    DateTime,
}

/// Describes the expected shape of a single value.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Primitive(PrimitiveKind),
    Enum(&'static EnumSchema),
    Model(&'static ModelSchema),
    List(Box<Descriptor>),
    Map(Box<Descriptor>),
    Union(&'static UnionSchema),
    /// A value that may also be `null`. Fields express nullability with [Presence] instead; this is for positions
    /// that aren't fields, such as list elements.
    Nullable(Box<Descriptor>),
}

/// Whether a field has to be present in a model, and whether it may be `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// The key must be present and not `null`.
    Required,
    /// The key may be missing, but may not be `null`.
    Optional,
    /// The key may be missing or `null`.
    Nullable,
}

/// One field in a model's field table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// The field's name in the in-memory model.
    pub name: &'static str,
    /// The key the field is stored under on the wire.
    pub wire_key: &'static str,
    pub descriptor: Descriptor,
    pub presence: Presence,
}

/// A model's name and field table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub name: &'static str,
    pub fields: Vec<FieldSchema>,
}

/// A closed set of enum values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    pub name: &'static str,
    /// Pairs of wire value and symbolic name.
    pub values: &'static [(&'static str, &'static str)],
}

/// One variant of a union.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariant {
    /// The discriminator value that selects this variant.
    pub tag: &'static str,
    pub descriptor: Descriptor,
}

/// A union of several shapes.
///
/// The variants are tried in declaration order when the discriminator can't pick one directly, so variants with more
/// specific shapes should be declared before the less specific ones.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    pub name: &'static str,
    pub discriminator: Option<&'static str>,
    pub variants: Vec<UnionVariant>,
}

impl Descriptor {
    pub const STRING: Descriptor = Descriptor::Primitive(PrimitiveKind::String);
    pub const INTEGER: Descriptor = Descriptor::Primitive(PrimitiveKind::Integer);
    pub const FLOAT: Descriptor = Descriptor::Primitive(PrimitiveKind::Float);
    pub const BOOLEAN: Descriptor = Descriptor::Primitive(PrimitiveKind::Boolean);
    pub const DATE_TIME: Descriptor = Descriptor::Primitive(PrimitiveKind::DateTime);

    pub fn list(element: Descriptor) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map(element: Descriptor) -> Self {
        Self::Map(Box::new(element))
    }

    pub fn nullable(inner: Descriptor) -> Self {
        Self::Nullable(Box::new(inner))
    }
}

impl FieldSchema {
    pub fn new(name: &'static str, descriptor: Descriptor, presence: Presence) -> Self {
        Self {
            name,
            wire_key: name,
            descriptor,
            presence,
        }
    }

    pub fn required(name: &'static str, descriptor: Descriptor) -> Self {
        Self::new(name, descriptor, Presence::Required)
    }

    pub fn optional(name: &'static str, descriptor: Descriptor) -> Self {
        Self::new(name, descriptor, Presence::Optional)
    }

    pub fn nullable(name: &'static str, descriptor: Descriptor) -> Self {
        Self::new(name, descriptor, Presence::Nullable)
    }

    /// Store this field under a different key on the wire.
    pub fn renamed(self, wire_key: &'static str) -> Self {
        Self { wire_key, ..self }
    }
}

impl ModelSchema {
    pub fn new(name: &'static str, fields: Vec<FieldSchema>) -> Self {
        Self { name, fields }
    }

    /// Look up a field by its in-memory name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Iterate over the fields that must always be present.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields
            .iter()
            .filter(|field| field.presence == Presence::Required)
    }
}

impl EnumSchema {
    /// Return the symbolic name and the static wire value for a wire string, if it's one of the known values.
    pub fn lookup(&self, wire: &str) -> Option<(&'static str, &'static str)> {
        self.values
            .iter()
            .find(|(value, _)| *value == wire)
            .map(|(value, symbol)| (*symbol, *value))
    }
}

impl UnionSchema {
    pub fn new(name: &'static str, discriminator: Option<&'static str>, variants: Vec<UnionVariant>) -> Self {
        Self {
            name,
            discriminator,
            variants,
        }
    }

    pub fn variant(&self, tag: &str) -> Option<&UnionVariant> {
        self.variants.iter().find(|variant| variant.tag == tag)
    }
}

impl UnionVariant {
    pub fn new(tag: &'static str, descriptor: Descriptor) -> Self {
        Self { tag, descriptor }
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::String => write!(f, "string"),
            PrimitiveKind::Integer => write!(f, "integer"),
            PrimitiveKind::Float => write!(f, "float"),
            PrimitiveKind::Boolean => write!(f, "boolean"),
            PrimitiveKind::DateTime => write!(f, "datetime"),
        }
    }
}

impl Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Primitive(kind) => write!(f, "{kind}"),
            Descriptor::Enum(schema) => write!(f, "enum {}", schema.name),
            Descriptor::Model(schema) => write!(f, "object {}", schema.name),
            Descriptor::List(element) => write!(f, "list of {element}"),
            Descriptor::Map(element) => write!(f, "map of {element}"),
            Descriptor::Union(schema) => write!(f, "union {}", schema.name),
            Descriptor::Nullable(inner) => write!(f, "nullable {inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ALBUM_TYPE: EnumSchema = EnumSchema {
        name: "AlbumType",
        values: &[("album", "Album"), ("single", "Single")],
    };

    #[test]
    fn renamed_field_keeps_name() {
        let field = FieldSchema::required("duration", Descriptor::INTEGER).renamed("duration_ms");

        assert_eq!(field.name, "duration");
        assert_eq!(field.wire_key, "duration_ms");
        assert_eq!(field.presence, Presence::Required);
    }

    #[test]
    fn required_fields_filters_presence() {
        let schema = ModelSchema::new(
            "Test",
            vec![
                FieldSchema::required("id", Descriptor::STRING),
                FieldSchema::optional("name", Descriptor::STRING),
                FieldSchema::nullable("href", Descriptor::STRING),
            ],
        );

        let required: Vec<_> = schema.required_fields().map(|field| field.name).collect();
        assert_eq!(required, ["id"]);
        assert_eq!(schema.position("href"), Some(2));
    }

    #[test]
    fn enum_lookup() {
        assert_eq!(ALBUM_TYPE.lookup("single"), Some(("Single", "single")));
        assert_eq!(ALBUM_TYPE.lookup("Single"), None);
    }

    #[test]
    fn descriptor_display() {
        let descriptor = Descriptor::list(Descriptor::map(Descriptor::Enum(&ALBUM_TYPE)));
        assert_eq!(descriptor.to_string(), "list of map of enum AlbumType");
    }
}
