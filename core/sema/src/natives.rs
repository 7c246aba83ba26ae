//! Native functions
//!
//! The console-style built-ins every module can call without importing
//! anything. The table is a `static`; each session materializes it once into
//! its native root scope and gives every entry an id.

use std::rc::Rc;

use tern_ast::nodes::Location;
use tern_ast::types::{PrimitiveKind, TypeAnnotation, TypeSlot};

use crate::{
    errors::SemaError,
    ids::IdAllocator,
    scope::{Scope, ScopeKind},
    symbol::{Modifiers, Symbol, SymbolKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NativeType {
    Unit,
    Bool,
    Int,
    Float,
    Str,
    /// The single generic parameter `T`.
    Any,
    /// `Array<string>`; as the last parameter it makes the function variadic.
    Strings,
}

impl NativeType {
    fn annotation(self) -> TypeAnnotation {
        match self {
            NativeType::Unit => TypeAnnotation::unit(),
            NativeType::Bool => TypeAnnotation::boolean(),
            NativeType::Int => TypeAnnotation::int(),
            NativeType::Float => TypeAnnotation::Primitive(PrimitiveKind::F64),
            NativeType::Str => TypeAnnotation::string(),
            NativeType::Any => TypeAnnotation::Parameter("T".to_string()),
            NativeType::Strings => TypeAnnotation::array(TypeAnnotation::string()),
        }
    }
}

struct NativeFunction {
    name: &'static str,
    parameters: &'static [NativeType],
    returns: NativeType,
}

impl NativeFunction {
    fn signature(&self) -> TypeAnnotation {
        TypeAnnotation::function(
            self.name,
            self.parameters.iter().map(|p| p.annotation()).collect(),
            self.returns.annotation(),
        )
    }

    fn is_generic(&self) -> bool {
        self.parameters.contains(&NativeType::Any) || self.returns == NativeType::Any
    }
}

static NATIVE_FUNCTIONS: &[NativeFunction] = &[
    NativeFunction {
        name: "print",
        parameters: &[NativeType::Any],
        returns: NativeType::Unit,
    },
    NativeFunction {
        name: "println",
        parameters: &[NativeType::Any],
        returns: NativeType::Unit,
    },
    NativeFunction {
        name: "eprintln",
        parameters: &[NativeType::Any],
        returns: NativeType::Unit,
    },
    NativeFunction {
        name: "readln",
        parameters: &[],
        returns: NativeType::Str,
    },
    NativeFunction {
        name: "to_string",
        parameters: &[NativeType::Any],
        returns: NativeType::Str,
    },
    NativeFunction {
        name: "parse_int",
        parameters: &[NativeType::Str],
        returns: NativeType::Int,
    },
    NativeFunction {
        name: "parse_float",
        parameters: &[NativeType::Str],
        returns: NativeType::Float,
    },
    NativeFunction {
        name: "concat",
        parameters: &[NativeType::Strings],
        returns: NativeType::Str,
    },
    NativeFunction {
        name: "assert",
        parameters: &[NativeType::Bool, NativeType::Str],
        returns: NativeType::Unit,
    },
    NativeFunction {
        name: "exit",
        parameters: &[NativeType::Int],
        returns: NativeType::Unit,
    },
];

/// Names of all native functions, in table order.
pub fn native_names() -> impl Iterator<Item = &'static str> {
    NATIVE_FUNCTIONS.iter().map(|native| native.name)
}

/// Builds the native root scope, allocating one id per native.
pub(crate) fn native_scope(scope_id: u32, ids: &IdAllocator) -> Result<Scope, SemaError> {
    let mut scope = Scope::new(scope_id, "natives", ScopeKind::Natives);
    for native in NATIVE_FUNCTIONS {
        let symbol = Symbol::new(
            native.name,
            SymbolKind::Native,
            TypeSlot::new(native.signature()),
            Location::default(),
        )
        .with_modifiers(Modifiers::PUBLIC)
        .with_type_parameters(if native.is_generic() {
            vec!["T".to_string()]
        } else {
            vec![]
        })
        .bound(ids.allocate());
        scope.declare_value(Rc::new(symbol))?;
    }
    Ok(scope)
}
