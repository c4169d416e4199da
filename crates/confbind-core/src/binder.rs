//! Binding configuration sections onto options types
//!
//! Binding walks a [`Shape`] field by field. Missing values leave the field at
//! its default; present values must coerce cleanly. Every coercion failure in
//! one bind is collected and reported together so the caller sees all of them.

use crate::error::{BindingError, CoercionError, Error, Result};
use crate::path::PathKey;
use crate::section::SectionView;
use crate::shape::{Options, Scalar, Shape};

/// Knobs that change how a bind treats the configuration it finds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Report keys under an object section that match no declared field
    pub error_on_unknown_keys: bool,
}

impl BindOptions {
    /// Default options with unknown-key reporting switched on or off
    pub fn error_on_unknown_keys(mut self, enabled: bool) -> Self {
        self.error_on_unknown_keys = enabled;
        self
    }
}

/// Problems collected during a single bind call
#[derive(Debug, Default)]
pub(crate) struct BindContext {
    options: BindOptions,
    errors: Vec<CoercionError>,
    unknown_keys: Vec<PathKey>,
}

impl BindContext {
    fn new(options: BindOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub(crate) fn options(&self) -> BindOptions {
        self.options
    }

    pub(crate) fn coercion_failed(&mut self, error: CoercionError) {
        self.errors.push(error);
    }

    pub(crate) fn unknown_key(&mut self, key: PathKey) {
        self.unknown_keys.push(key);
    }

    fn finish(self, type_name: &'static str, section: &PathKey) -> Result<()> {
        if self.errors.is_empty() && self.unknown_keys.is_empty() {
            return Ok(());
        }
        Err(Error::binding(BindingError {
            type_name,
            section: section.clone(),
            errors: self.errors,
            unknown_keys: self.unknown_keys,
        }))
    }
}

/// Bind `section` onto a new `T`
pub fn bind<T: Options>(section: &SectionView<'_>) -> Result<T> {
    bind_with(section, &BindOptions::default())
}

/// Bind `section` onto a new `T` with explicit options
pub fn bind_with<T: Options>(section: &SectionView<'_>, options: &BindOptions) -> Result<T> {
    bind_shape(T::shape(), section, options)
}

/// Bind `section` onto an existing value.
///
/// Fields without a configured value keep whatever `target` already holds.
pub fn bind_into<T: Options>(section: &SectionView<'_>, target: &mut T) -> Result<()> {
    bind_into_with(section, target, &BindOptions::default())
}

/// Bind `section` onto an existing value with explicit options
pub fn bind_into_with<T: Options>(
    section: &SectionView<'_>,
    target: &mut T,
    options: &BindOptions,
) -> Result<()> {
    let shape = T::shape();
    let mut cx = BindContext::new(*options);
    shape.bind_fields(target, section, &mut cx);
    cx.finish(shape.type_name(), section.path())
}

pub(crate) fn bind_shape<T: Default>(
    shape: &Shape<T>,
    section: &SectionView<'_>,
    options: &BindOptions,
) -> Result<T> {
    let mut target = T::default();
    let mut cx = BindContext::new(*options);
    shape.bind_fields(&mut target, section, &mut cx);
    cx.finish(shape.type_name(), section.path())?;
    Ok(target)
}

/// Convert one raw value found at `path`
pub fn coerce<S: Scalar>(path: &PathKey, raw: &str) -> std::result::Result<S, CoercionError> {
    S::coerce(raw).ok_or_else(|| CoercionError {
        path: path.clone(),
        expected: S::KIND,
        value: raw.to_string(),
    })
}

/// Set `slot` from the section's own value, if it has one.
///
/// A failed coercion is recorded and leaves `slot` untouched.
pub(crate) fn bind_scalar<S: Scalar>(slot: &mut S, section: &SectionView<'_>, cx: &mut BindContext) {
    let Some(raw) = section.value() else {
        return;
    };
    match coerce(section.path(), raw) {
        Ok(value) => *slot = value,
        Err(e) => cx.coercion_failed(e),
    }
}

/// Replace `slot` with the contiguous `0..k-1` prefix of an indexed section.
///
/// A missing section keeps the default; a section whose children are not all
/// indices binds to an empty sequence. An index present only as a `null` or
/// empty entry still counts and binds as the element default.
pub(crate) fn bind_sequence<E>(
    slot: &mut Vec<E>,
    section: &SectionView<'_>,
    cx: &mut BindContext,
    element: impl Fn(&SectionView<'_>, &mut BindContext) -> E,
) {
    if !section.exists() {
        return;
    }

    slot.clear();
    if !section.is_collection() {
        return;
    }

    // Children of a collection come back in numeric order
    for (index, child) in section.children().iter().enumerate() {
        if child.key() != index.to_string() {
            break;
        }
        slot.push(element(child, cx));
    }
}
