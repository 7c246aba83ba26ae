use std::{cell::Cell, rc::Rc};

use bitflags::bitflags;
use tern_ast::nodes::Location;
use tern_ast::types::{TypeAnnotation, TypeSlot};

use crate::errors::InternalError;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const MUTABLE = 1 << 0;
        const PUBLIC = 1 << 1;
        /// Methods only: may mutate `self`.
        const MUTATING = 1 << 2;
        const FOREIGN = 1 << 3;
        /// Copied into an import scope from another unit.
        const IMPORTED = 1 << 4;
        /// Id assigned before any body was walked.
        const HOISTED = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Parameter,
    SelfValue,
    Function,
    Method,
    Field,
    EnumCase,
    Struct,
    Enum,
    TypeAlias,
    TypeParameter,
    Import,
    Native,
}

impl SymbolKind {
    /// Variables, parameters and `self`: the symbols that hold runtime values
    /// a closure can capture and an assignment can target.
    #[must_use = "this is a pure check with no side effects"]
    pub fn is_variable(self) -> bool {
        matches!(
            self,
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::SelfValue
        )
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Struct | SymbolKind::Enum | SymbolKind::TypeAlias | SymbolKind::TypeParameter
        )
    }

    #[must_use = "discarding the description has no effect"]
    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::SelfValue => "self",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::EnumCase => "enum case",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::TypeAlias => "type alias",
            SymbolKind::TypeParameter => "type parameter",
            SymbolKind::Import => "import",
            SymbolKind::Native => "native function",
        }
    }
}

/// A declaration. Created by the skeleton pass with id `0`; the binder
/// assigns the real id exactly once.
#[derive(Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Shared with the declaration node, so inference results show up in both.
    pub ty: TypeSlot,
    pub modifiers: Modifiers,
    /// Generic parameters of functions, methods and structs, in declaration order.
    pub type_parameters: Vec<String>,
    pub location: Location,
    id: Cell<u32>,
}

pub type SymbolRef = Rc<Symbol>;

impl Symbol {
    #[must_use]
    pub fn new(name: &str, kind: SymbolKind, ty: TypeSlot, location: Location) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ty,
            modifiers: Modifiers::empty(),
            type_parameters: vec![],
            location,
            id: Cell::new(0),
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    #[must_use]
    pub fn with_type_parameters(mut self, type_parameters: Vec<String>) -> Self {
        self.type_parameters = type_parameters;
        self
    }

    /// Gives a freshly created symbol its id up front.
    #[must_use]
    pub(crate) fn bound(self, id: u32) -> Self {
        self.id.set(id);
        self
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn id(&self) -> u32 {
        self.id.get()
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_bound(&self) -> bool {
        self.id.get() != 0
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_mutable(&self) -> bool {
        self.modifiers.contains(Modifiers::MUTABLE)
    }

    pub(crate) fn assign_id(&self, id: u32) -> Result<(), InternalError> {
        let existing = self.id.get();
        if existing != 0 {
            return Err(InternalError::IdReassigned {
                name: self.name.clone(),
                existing,
                location: self.location.clone(),
            });
        }
        self.id.set(id);
        Ok(())
    }

    /// A copy with its own type cell and a fresh id, for merging into another unit.
    #[must_use]
    pub(crate) fn remapped(&self, id: u32, extra: Modifiers) -> Symbol {
        Symbol {
            name: self.name.clone(),
            kind: self.kind,
            ty: TypeSlot::new(self.ty.get()),
            modifiers: self.modifiers | extra,
            type_parameters: self.type_parameters.clone(),
            location: self.location.clone(),
            id: Cell::new(id),
        }
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn type_annotation(&self) -> TypeAnnotation {
        self.ty.get()
    }
}
