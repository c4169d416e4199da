//! Static descriptions of bindable options types
//!
//! An options type declares its layout once through [`Options::shape`]: the
//! fields it exposes, what each field holds, and how to reach it. The binder
//! walks that description instead of inspecting the type at runtime.
//!
//! ```rust
//! use std::sync::OnceLock;
//! use confbind_core::{Options, Shape};
//!
//! #[derive(Debug, Default)]
//! struct ContainerOptions {
//!     name: String,
//!     index: i32,
//! }
//!
//! impl Options for ContainerOptions {
//!     fn shape() -> &'static Shape<Self> {
//!         static SHAPE: OnceLock<Shape<ContainerOptions>> = OnceLock::new();
//!         SHAPE.get_or_init(|| {
//!             Shape::<Self>::builder("ContainerOptions")
//!                 .scalar("Name", |c| &mut c.name)
//!                 .scalar("Index", |c| &mut c.index)
//!                 .build()
//!         })
//!     }
//! }
//! ```

use std::fmt;

use crate::binder::{self, BindContext};
use crate::error::Result;
use crate::path::segment_eq;
use crate::section::SectionView;

/// The scalar kinds a raw string can be coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Base-10 signed integer literal
    Integer,
    /// `true` or `false`, case-insensitive
    Boolean,
    /// Any string
    String,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Integer => write!(f, "integer"),
            ScalarKind::Boolean => write!(f, "boolean"),
            ScalarKind::String => write!(f, "string"),
        }
    }
}

/// A leaf type that can be produced from a single raw value.
pub trait Scalar: Sized + Default {
    /// The kind reported when coercion fails
    const KIND: ScalarKind;

    /// Convert a raw value, or `None` if it is not acceptable for this type
    fn coerce(raw: &str) -> Option<Self>;
}

/// Optional `-` followed by one or more ASCII digits, nothing else
fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

macro_rules! integer_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                const KIND: ScalarKind = ScalarKind::Integer;

                fn coerce(raw: &str) -> Option<Self> {
                    if is_integer_literal(raw) {
                        raw.parse().ok()
                    } else {
                        None
                    }
                }
            }
        )*
    };
}

integer_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Boolean;

    fn coerce(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("true") {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn coerce(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

/// A type that can be bound from a configuration section.
///
/// `Default` supplies the value of every field that has no configured value.
pub trait Options: Default + Send + Sync + 'static {
    /// The layout of this type, built once and reused for every bind
    fn shape() -> &'static Shape<Self>;
}

/// What a field holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A single coerced value
    Scalar(ScalarKind),
    /// A nested options type (by type name)
    Object(&'static str),
    /// An ordered sequence of elements of the inner kind
    Collection(Box<FieldKind>),
}

type BindFn<T> = Box<dyn Fn(&mut T, &SectionView<'_>, &mut BindContext) + Send + Sync>;

/// One named field of a [`Shape`]
pub struct Field<T> {
    name: &'static str,
    kind: FieldKind,
    bind: BindFn<T>,
}

impl<T> Field<T> {
    /// Configuration key of the field, relative to the bound section
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// What the field holds
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// The declared layout of an options type
pub struct Shape<T> {
    type_name: &'static str,
    fields: Vec<Field<T>>,
}

impl<T: Default + 'static> Shape<T> {
    /// Start declaring the layout of `T`
    pub fn builder(type_name: &'static str) -> ShapeBuilder<T> {
        ShapeBuilder {
            type_name,
            fields: Vec::new(),
        }
    }

    /// Bind `section` onto a fresh `T::default()`
    pub fn bind(&self, section: &SectionView<'_>) -> Result<T> {
        binder::bind_shape(self, section, &binder::BindOptions::default())
    }
}

impl<T> Shape<T> {
    /// Name used in error messages
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Look up a field by name, case-insensitively
    pub fn field(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| segment_eq(f.name, name))
    }

    /// Apply every field binder to `target`, then report unmatched keys if asked to
    pub(crate) fn bind_fields(&self, target: &mut T, section: &SectionView<'_>, cx: &mut BindContext) {
        for field in &self.fields {
            (field.bind)(target, section, cx);
        }

        if cx.options().error_on_unknown_keys {
            for child in section.children() {
                if self.field(child.key()).is_none() {
                    cx.unknown_key(child.path().clone());
                }
            }
        }
    }
}

impl<T> fmt::Debug for Shape<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder returned by [`Shape::builder`]
#[must_use = "builders do nothing until .build() is called"]
pub struct ShapeBuilder<T> {
    type_name: &'static str,
    fields: Vec<Field<T>>,
}

impl<T: 'static> ShapeBuilder<T> {
    fn push(mut self, name: &'static str, kind: FieldKind, bind: BindFn<T>) -> Self {
        self.fields.push(Field { name, kind, bind });
        self
    }

    /// A field holding a single scalar value
    pub fn scalar<F: Scalar + 'static>(self, name: &'static str, access: fn(&mut T) -> &mut F) -> Self {
        let bind: BindFn<T> = Box::new(
            move |target: &mut T, section: &SectionView<'_>, cx: &mut BindContext| {
                binder::bind_scalar(access(target), &section.get_section(name), cx)
            },
        );
        self.push(name, FieldKind::Scalar(F::KIND), bind)
    }

    /// A field holding a nested options type
    pub fn object<F: Options>(self, name: &'static str, access: fn(&mut T) -> &mut F) -> Self {
        let bind: BindFn<T> = Box::new(
            move |target: &mut T, section: &SectionView<'_>, cx: &mut BindContext| {
                F::shape().bind_fields(access(target), &section.get_section(name), cx)
            },
        );
        self.push(name, FieldKind::Object(std::any::type_name::<F>()), bind)
    }

    /// A field holding an ordered sequence of scalars
    pub fn scalar_list<F: Scalar + 'static>(
        self,
        name: &'static str,
        access: fn(&mut T) -> &mut Vec<F>,
    ) -> Self {
        let bind: BindFn<T> = Box::new(
            move |target: &mut T, section: &SectionView<'_>, cx: &mut BindContext| {
                binder::bind_sequence(access(target), &section.get_section(name), cx, |child, cx| {
                    let mut element = F::default();
                    binder::bind_scalar(&mut element, child, cx);
                    element
                })
            },
        );
        let kind = FieldKind::Collection(Box::new(FieldKind::Scalar(F::KIND)));
        self.push(name, kind, bind)
    }

    /// A field holding an ordered sequence of nested options types
    pub fn object_list<F: Options>(self, name: &'static str, access: fn(&mut T) -> &mut Vec<F>) -> Self {
        let bind: BindFn<T> = Box::new(
            move |target: &mut T, section: &SectionView<'_>, cx: &mut BindContext| {
                binder::bind_sequence(access(target), &section.get_section(name), cx, |child, cx| {
                    let mut element = F::default();
                    F::shape().bind_fields(&mut element, child, cx);
                    element
                })
            },
        );
        let kind = FieldKind::Collection(Box::new(FieldKind::Object(std::any::type_name::<F>())));
        self.push(name, kind, bind)
    }

    /// Finish the layout
    pub fn build(self) -> Shape<T> {
        Shape {
            type_name: self.type_name,
            fields: self.fields,
        }
    }
}
