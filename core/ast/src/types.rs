//! Type annotations
//!
//! A [`TypeAnnotation`] is the single type representation shared by the syntax
//! tree and the semantic passes. Declaration sites hold their annotation in a
//! [`TypeSlot`], a shared mutable cell: the parser fills it with what the source
//! spelled out (or [`TypeAnnotation::Placeholder`] when nothing was written) and
//! the type checker replaces placeholders in place once it knows better.

use core::fmt;
use std::{
    cell::RefCell,
    fmt::{Display, Formatter},
    rc::Rc,
};

/// Fixed-width primitive kinds.
///
/// The declaration order is the widening order used by numeric compatibility:
/// a value may widen from a kind to any numeric kind declared after it.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PrimitiveKind {
    pub const ALL: &'static [PrimitiveKind] = &[
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::I8,
        PrimitiveKind::U8,
        PrimitiveKind::I16,
        PrimitiveKind::U16,
        PrimitiveKind::I32,
        PrimitiveKind::U32,
        PrimitiveKind::I64,
        PrimitiveKind::U64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
    ];

    /// Canonical source spelling. `int`, `uint` and `float` are the 64-bit kinds.
    #[must_use = "returns the string representation without modifying self"]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::I64 => "int",
            PrimitiveKind::U64 => "uint",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "float",
        }
    }

    /// Parses a primitive type name, accepting the sized aliases `i64`, `u64`
    /// and `f64` next to the canonical spellings.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "i64" => Some(PrimitiveKind::I64),
            "u64" => Some(PrimitiveKind::U64),
            "f64" => Some(PrimitiveKind::F64),
            _ => Self::ALL.iter().find(|kind| kind.as_str() == name).copied(),
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, PrimitiveKind::Bool | PrimitiveKind::Char)
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_integer(&self) -> bool {
        self.is_numeric() && !self.is_float()
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveKind::F32 | PrimitiveKind::F64)
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub enum TypeAnnotation {
    /// Not yet inferred. Must be gone before code generation.
    Placeholder,
    Primitive(PrimitiveKind),
    Simple {
        name: String,
        arguments: Vec<TypeAnnotation>,
    },
    Function {
        name: String,
        returns: Box<TypeAnnotation>,
        parameters: Vec<TypeAnnotation>,
    },
    Reference(Box<TypeAnnotation>),
    /// A type qualified by an enclosing module or type path, e.g. `io.File`.
    Member {
        path: Vec<String>,
        inner: Box<TypeAnnotation>,
    },
    /// An unbound generic parameter.
    Parameter(String),
}

impl TypeAnnotation {
    pub const UNIT: &'static str = "unit";
    pub const STRING: &'static str = "string";
    pub const ARRAY: &'static str = "Array";
    pub const TUPLE: &'static str = "Tuple";

    /// Names of the non-primitive types every module knows without declaring them.
    pub const BUILTIN_SIMPLE: &'static [&'static str] =
        &[Self::UNIT, Self::STRING, Self::ARRAY, Self::TUPLE];

    #[must_use]
    pub fn unit() -> Self {
        Self::simple(Self::UNIT)
    }

    #[must_use]
    pub fn string() -> Self {
        Self::simple(Self::STRING)
    }

    #[must_use]
    pub fn int() -> Self {
        TypeAnnotation::Primitive(PrimitiveKind::I64)
    }

    #[must_use]
    pub fn boolean() -> Self {
        TypeAnnotation::Primitive(PrimitiveKind::Bool)
    }

    #[must_use]
    pub fn simple(name: &str) -> Self {
        TypeAnnotation::Simple {
            name: name.to_string(),
            arguments: vec![],
        }
    }

    #[must_use]
    pub fn generic(name: &str, arguments: Vec<TypeAnnotation>) -> Self {
        TypeAnnotation::Simple {
            name: name.to_string(),
            arguments,
        }
    }

    #[must_use]
    pub fn array(element: TypeAnnotation) -> Self {
        Self::generic(Self::ARRAY, vec![element])
    }

    #[must_use]
    pub fn tuple(elements: Vec<TypeAnnotation>) -> Self {
        Self::generic(Self::TUPLE, elements)
    }

    #[must_use]
    pub fn function(name: &str, parameters: Vec<TypeAnnotation>, returns: TypeAnnotation) -> Self {
        TypeAnnotation::Function {
            name: name.to_string(),
            returns: Box::new(returns),
            parameters,
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, TypeAnnotation::Placeholder)
    }

    /// True if a placeholder occurs anywhere inside this annotation.
    #[must_use = "this is a pure check with no side effects"]
    pub fn contains_placeholder(&self) -> bool {
        match self {
            TypeAnnotation::Placeholder => true,
            TypeAnnotation::Primitive(_) | TypeAnnotation::Parameter(_) => false,
            TypeAnnotation::Simple { arguments, .. } => {
                arguments.iter().any(TypeAnnotation::contains_placeholder)
            }
            TypeAnnotation::Function {
                returns,
                parameters,
                ..
            } => {
                returns.contains_placeholder()
                    || parameters.iter().any(TypeAnnotation::contains_placeholder)
            }
            TypeAnnotation::Reference(inner) | TypeAnnotation::Member { inner, .. } => {
                inner.contains_placeholder()
            }
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_unit(&self) -> bool {
        matches!(self, TypeAnnotation::Simple { name, arguments } if name == Self::UNIT && arguments.is_empty())
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_string(&self) -> bool {
        matches!(self, TypeAnnotation::Simple { name, .. } if name == Self::STRING)
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_bool(&self) -> bool {
        matches!(self, TypeAnnotation::Primitive(PrimitiveKind::Bool))
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeAnnotation::Primitive(kind) if kind.is_numeric())
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_integer(&self) -> bool {
        matches!(self, TypeAnnotation::Primitive(kind) if kind.is_integer())
    }

    /// Element type of an `Array<T>`.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn array_element(&self) -> Option<&TypeAnnotation> {
        match self {
            TypeAnnotation::Simple { name, arguments } if name == Self::ARRAY => arguments.first(),
            _ => None,
        }
    }

    /// Element types of a tuple.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn tuple_elements(&self) -> Option<&[TypeAnnotation]> {
        match self {
            TypeAnnotation::Simple { name, arguments } if name == Self::TUPLE => Some(arguments),
            _ => None,
        }
    }

    /// The name used to find this type's own scope: the simple name, looking
    /// through references and member qualification.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn scope_name(&self) -> Option<&str> {
        match self {
            TypeAnnotation::Simple { name, .. } => Some(name),
            TypeAnnotation::Reference(inner) | TypeAnnotation::Member { inner, .. } => {
                inner.scope_name()
            }
            _ => None,
        }
    }

    /// Strips a leading reference.
    #[must_use]
    pub fn dereferenced(&self) -> &TypeAnnotation {
        match self {
            TypeAnnotation::Reference(inner) => inner.dereferenced(),
            other => other,
        }
    }
}

impl Display for TypeAnnotation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TypeAnnotation::Placeholder => write!(f, "_"),
            TypeAnnotation::Primitive(kind) => write!(f, "{}", kind.as_str()),
            TypeAnnotation::Simple { name, arguments } => {
                if name == Self::TUPLE {
                    let elements = arguments
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    return write!(f, "({elements})");
                }
                if arguments.is_empty() {
                    return write!(f, "{name}");
                }
                let arguments = arguments
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{name}<{arguments}>")
            }
            TypeAnnotation::Function {
                returns,
                parameters,
                ..
            } => {
                let parameters = parameters
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "fn({parameters}) -> {returns}")
            }
            TypeAnnotation::Reference(inner) => write!(f, "&{inner}"),
            TypeAnnotation::Member { path, inner } => write!(f, "{}.{inner}", path.join(".")),
            TypeAnnotation::Parameter(name) => write!(f, "{name}'"),
        }
    }
}

/// Shared, replaceable type annotation of a declaration site.
///
/// Cloning a slot shares the cell, so the symbol created for a declaration and
/// the declaration node observe the same replacement.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TypeSlot(Rc<RefCell<TypeAnnotation>>);

impl TypeSlot {
    #[must_use]
    pub fn new(ty: TypeAnnotation) -> Self {
        Self(Rc::new(RefCell::new(ty)))
    }

    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(TypeAnnotation::Placeholder)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn get(&self) -> TypeAnnotation {
        self.0.borrow().clone()
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_placeholder(&self) -> bool {
        self.0.borrow().is_placeholder()
    }

    /// Replaces the annotation in place, returning the previous one.
    pub fn replace(&self, ty: TypeAnnotation) -> TypeAnnotation {
        self.0.replace(ty)
    }

    /// True if both slots are the same cell.
    #[must_use = "this is a pure check with no side effects"]
    pub fn shares_cell_with(&self, other: &TypeSlot) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for TypeSlot {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl From<TypeAnnotation> for TypeSlot {
    fn from(ty: TypeAnnotation) -> Self {
        Self::new(ty)
    }
}
