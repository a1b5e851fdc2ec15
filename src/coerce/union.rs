//! Picking the variant of a union a raw value represents.
//!
//! When the union has a discriminator key and the raw object's value under that key names one of the variants, that
//! variant is chosen directly and its coercion result is final. Otherwise every variant is tried in declaration order
//! and the first one that coerces wins. When several variants could accept the same raw shape, the one declared
//! first silently takes precedence, so unions without a discriminator should list their most specific variants first.

use log::{debug, trace};
use serde_json::Value;

use super::{coerce_at, CoercionOptions, Path};
use crate::{
    error::{CoercionError, CoercionErrorKind, UnionResolutionError},
    schema::{UnionSchema, UnionVariant},
    value::TypedValue,
};

/// Select the variant of `union` the raw value represents and coerce the value into it.
pub fn resolve_variant<'s>(
    raw: &Value,
    union: &'s UnionSchema,
    options: &CoercionOptions,
    path: &Path,
) -> Result<(&'s UnionVariant, TypedValue), CoercionError> {
    if let Some(variant) = discriminated_variant(raw, union, path) {
        trace!("Union {} at {path} discriminated into {}", union.name, variant.tag);

        let value = coerce_at(raw, &variant.descriptor, options, path)?;
        return Ok((variant, value));
    }

    let mut attempts = Vec::with_capacity(union.variants.len());

    for variant in &union.variants {
        match coerce_at(raw, &variant.descriptor, options, path) {
            Ok(value) => {
                trace!("Union {} at {path} resolved into {} by trial", union.name, variant.tag);
                return Ok((variant, value));
            }

            Err(err) => attempts.push((variant.tag, err)),
        }
    }

    Err(CoercionError::new(
        path.clone(),
        CoercionErrorKind::Union(UnionResolutionError {
            union: union.name,
            attempts,
        }),
    ))
}

fn discriminated_variant<'s>(raw: &Value, union: &'s UnionSchema, path: &Path) -> Option<&'s UnionVariant> {
    let key = union.discriminator?;
    let tag = raw.get(key)?.as_str()?;
    let variant = union.variant(tag);

    if variant.is_none() {
        debug!(
            "Unrecognized discriminator {tag:?} for union {} at {path}, trying every variant",
            union.name
        );
    }

    variant
}
