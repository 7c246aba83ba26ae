//! Flow Checker
//!
//! Definite-assignment analysis over the bodies of functions, methods and
//! closures. Every local introduced by a `let` owns two bits of a bit vector:
//! bit `2·i` is set while the local is definitely assigned, bit `2·i + 1` once
//! it has definitely held a value (it survives `delete`).
//!
//! A state of `None` stands for an unreachable point: after `return`,
//! `break`, `continue` or `throw`. Joins intersect the reachable states.
//!
//! Loop bodies are walked until the state at the loop head stops shrinking,
//! with diagnostics held back until the final walk. A `catch` body starts from
//! the intersection of every state its `try` body passed through.
//!
//! Runs after type checking, when enabled in the options, and relies only on
//! the symbol ids the binder left on identifiers.

use rustc_hash::FxHashMap;
use tern_ast::nodes::{
    Block, Expression, FunctionDefinition, Identifier, Item, LetStatement, SourceFile, Statement,
};

use crate::{
    diagnostics::Diagnostics,
    errors::{Abort, SemaError},
};

/// A growable set of bit indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BitSet {
    bits: Vec<u64>,
}

impl BitSet {
    fn ensure_capacity(&mut self, n: usize) {
        let words = n.div_ceil(64);
        if words > self.bits.len() {
            self.bits.resize(words, 0);
        }
    }

    fn insert(&mut self, index: usize) {
        self.ensure_capacity(index + 1);
        self.bits[index / 64] |= 1u64 << (index % 64);
    }

    fn remove(&mut self, index: usize) {
        if let Some(word) = self.bits.get_mut(index / 64) {
            *word &= !(1u64 << (index % 64));
        }
    }

    fn contains(&self, index: usize) -> bool {
        self.bits
            .get(index / 64)
            .is_some_and(|&word| word & (1u64 << (index % 64)) != 0)
    }

    fn intersect_with(&mut self, other: &BitSet) {
        for (i, word) in self.bits.iter_mut().enumerate() {
            *word &= other.bits.get(i).copied().unwrap_or(0);
        }
    }
}

type State = Option<BitSet>;

/// Joins two control-flow paths.
fn join(left: State, right: State) -> State {
    match (left, right) {
        (None, other) | (other, None) => other,
        (Some(mut left), Some(right)) => {
            left.intersect_with(&right);
            Some(left)
        }
    }
}

fn join_all(states: impl IntoIterator<Item = State>) -> State {
    states.into_iter().fold(None, join)
}

#[derive(Default)]
struct LoopExits {
    /// State where the loop condition was found false.
    finished: State,
    breaks: Vec<State>,
    continues: Vec<State>,
}

pub(crate) struct FlowChecker<'a> {
    diagnostics: &'a mut Diagnostics,
    /// Dense index of each tracked local, keyed by symbol id.
    slots: FxHashMap<u32, usize>,
    loops: Vec<LoopExits>,
    /// Union of the states each enclosing `try` body may throw from.
    throw_sites: Vec<State>,
    /// Nonzero while walking a loop body whose head has not settled.
    quiet: u32,
}

impl<'a> FlowChecker<'a> {
    pub(crate) fn new(diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            diagnostics,
            slots: FxHashMap::default(),
            loops: Vec::new(),
            throw_sites: Vec::new(),
            quiet: 0,
        }
    }

    #[tracing::instrument(skip_all, fields(file = %file.name))]
    pub(crate) fn check(mut self, file: &SourceFile) -> Result<(), Abort> {
        for item in &file.items {
            match item {
                Item::Function(function) => self.function(function)?,
                Item::Struct(definition) => {
                    for method in &definition.methods {
                        self.function(method)?;
                    }
                }
                Item::Let(let_statement) => {
                    // Module bindings are not tracked, but closures in their
                    // initializers are.
                    if let Some(value) = &let_statement.value {
                        let mut state = Some(BitSet::default());
                        self.expression(value, &mut state)?;
                    }
                }
                Item::Enum(_) | Item::TypeAlias(_) | Item::Import(_) => {}
            }
        }
        tracing::debug!(tracked = self.slots.len(), "flow check finished");
        Ok(())
    }

    fn function(&mut self, function: &FunctionDefinition) -> Result<(), Abort> {
        let mut state = Some(BitSet::default());
        self.block(&function.body, &mut state)
    }

    fn slot(&mut self, symbol_id: u32) -> usize {
        let next = self.slots.len();
        *self.slots.entry(symbol_id).or_insert(next)
    }

    fn read(&mut self, identifier: &Identifier, state: &State) -> Result<(), Abort> {
        let Some(state) = state else {
            return Ok(());
        };
        let Some(&slot) = self.slots.get(&identifier.symbol_id()) else {
            return Ok(());
        };
        if state.contains(2 * slot) || self.quiet > 0 {
            return Ok(());
        }
        let error = if state.contains(2 * slot + 1) {
            SemaError::UseAfterDelete {
                name: identifier.name.clone(),
                location: identifier.location.clone(),
            }
        } else {
            SemaError::UseBeforeInitialization {
                name: identifier.name.clone(),
                location: identifier.location.clone(),
            }
        };
        self.diagnostics.report(error)
    }

    fn write(&mut self, identifier: &Identifier, state: &mut State) {
        let Some(&slot) = self.slots.get(&identifier.symbol_id()) else {
            return;
        };
        if let Some(state) = state {
            state.insert(2 * slot);
            state.insert(2 * slot + 1);
        }
    }

    fn let_statement(&mut self, statement: &LetStatement, state: &mut State) -> Result<(), Abort> {
        if let Some(value) = &statement.value {
            self.expression(value, state)?;
        }
        for binding in statement.pattern.bindings() {
            let slot = self.slot(binding.name.symbol_id());
            tracing::trace!(name = %binding.name.name, slot, "tracking local");
            if let Some(state) = state {
                if statement.value.is_some() {
                    state.insert(2 * slot);
                    state.insert(2 * slot + 1);
                } else {
                    state.remove(2 * slot);
                    state.remove(2 * slot + 1);
                }
            }
        }
        Ok(())
    }

    fn block(&mut self, block: &Block, state: &mut State) -> Result<(), Abort> {
        for statement in &block.statements {
            self.statement(statement, state)?;
        }
        Ok(())
    }

    /// One pass over a loop: the condition at the head, then the body.
    fn loop_pass(
        &mut self,
        condition: Option<&Expression>,
        body: &Block,
        head: &State,
    ) -> Result<(State, LoopExits), Abort> {
        let mut body_state = head.clone();
        if let Some(condition) = condition {
            self.expression(condition, &mut body_state)?;
        }
        self.loops.push(LoopExits {
            finished: body_state.clone(),
            ..LoopExits::default()
        });
        let walked = self.block(body, &mut body_state);
        let exits = self.loops.pop().unwrap_or_default();
        walked?;
        Ok((body_state, exits))
    }

    /// Walks a loop entered with `entry` and returns the state after it.
    ///
    /// `condition` is evaluated at the head of every iteration. A loop without
    /// a condition that cannot skip its body only exits through `break`.
    fn loop_body(
        &mut self,
        condition: Option<&Expression>,
        body: &Block,
        entry: &State,
        may_skip: bool,
    ) -> Result<State, Abort> {
        let mut head = entry.clone();
        loop {
            self.quiet += 1;
            let pass = self.loop_pass(condition, body, &head);
            self.quiet -= 1;
            let (body_state, exits) = pass?;
            let next = join(
                entry.clone(),
                join_all(std::iter::once(body_state).chain(exits.continues)),
            );
            if next == head {
                break;
            }
            head = next;
        }
        let (_, exits) = self.loop_pass(condition, body, &head)?;
        if !may_skip {
            return Ok(join_all(exits.breaks));
        }
        Ok(join_all(std::iter::once(exits.finished).chain(exits.breaks)))
    }

    /// Records `state` as one the innermost `try` body may throw from.
    fn may_throw(&mut self, state: &State) {
        if let Some(sites) = self.throw_sites.last_mut() {
            *sites = join(sites.take(), state.clone());
        }
    }

    fn statement(&mut self, statement: &Statement, state: &mut State) -> Result<(), Abort> {
        self.may_throw(state);
        match statement {
            Statement::Let(let_statement) => self.let_statement(let_statement, state)?,
            Statement::Assign(assign) => {
                self.expression(&assign.value, state)?;
                match &assign.target {
                    Expression::Identifier(identifier) => self.write(identifier, state),
                    other => self.expression(other, state)?,
                }
            }
            Statement::Expression(statement) => self.expression(&statement.expression, state)?,
            Statement::Return(statement) => {
                if let Some(value) = &statement.value {
                    self.expression(value, state)?;
                }
                *state = None;
            }
            Statement::If(statement) => {
                self.expression(&statement.condition, state)?;
                let mut then_state = state.clone();
                self.block(&statement.then_branch, &mut then_state)?;
                let mut else_state = state.clone();
                if let Some(else_branch) = &statement.else_branch {
                    self.block(else_branch, &mut else_state)?;
                }
                *state = join(then_state, else_state);
            }
            Statement::While(statement) => {
                *state = self.loop_body(Some(&statement.condition), &statement.body, state, true)?;
            }
            Statement::Loop(statement) => {
                *state = self.loop_body(None, &statement.body, state, false)?;
            }
            Statement::For(statement) => {
                self.expression(&statement.iterable, state)?;
                *state = self.loop_body(None, &statement.body, state, true)?;
            }
            Statement::Break(_) => {
                let exit = state.take();
                if let Some(frame) = self.loops.last_mut() {
                    frame.breaks.push(exit);
                }
            }
            Statement::Continue(_) => {
                let exit = state.take();
                if let Some(frame) = self.loops.last_mut() {
                    frame.continues.push(exit);
                }
            }
            Statement::Block(block) => self.block(block, state)?,
            Statement::Try(statement) => {
                self.throw_sites.push(state.clone());
                let walked = self.block(&statement.body, state);
                let sites = self.throw_sites.pop().flatten();
                walked?;
                let mut catch_state = join(sites, state.clone());
                self.block(&statement.catch_body, &mut catch_state)?;
                *state = join(state.take(), catch_state);
            }
            Statement::Throw(statement) => {
                self.expression(&statement.value, state)?;
                self.may_throw(state);
                *state = None;
            }
            Statement::Delete(statement) => {
                if let (Some(&slot), Some(state)) =
                    (self.slots.get(&statement.target.symbol_id()), state.as_mut())
                {
                    state.remove(2 * slot);
                    state.insert(2 * slot + 1);
                }
            }
        }
        Ok(())
    }

    fn expression(&mut self, expression: &Expression, state: &mut State) -> Result<(), Abort> {
        match expression {
            Expression::Literal(_) | Expression::Path(_) => Ok(()),
            Expression::Identifier(identifier) => self.read(identifier, state),
            Expression::Binary(binary) => {
                self.expression(&binary.left, state)?;
                self.expression(&binary.right, state)
            }
            Expression::Unary(unary) => self.expression(&unary.operand, state),
            Expression::Call(call) => {
                self.expression(&call.callee, state)?;
                for argument in &call.arguments {
                    self.expression(argument, state)?;
                }
                Ok(())
            }
            Expression::Member(member) => self.expression(&member.object, state),
            Expression::Construct(construct) => {
                for field in &construct.fields {
                    self.expression(&field.value, state)?;
                }
                Ok(())
            }
            Expression::Array(array) => {
                for element in &array.elements {
                    self.expression(element, state)?;
                }
                Ok(())
            }
            Expression::Tuple(tuple) => {
                for element in &tuple.elements {
                    self.expression(element, state)?;
                }
                Ok(())
            }
            Expression::Index(index) => {
                self.expression(&index.target, state)?;
                self.expression(&index.index, state)
            }
            Expression::Closure(closure) => {
                // The body runs later, if at all: check it against the state at
                // creation and leave the enclosing state untouched.
                let loops = std::mem::take(&mut self.loops);
                let throw_sites = std::mem::take(&mut self.throw_sites);
                let mut body_state = state.clone();
                let result = self.block(&closure.body, &mut body_state);
                self.loops = loops;
                self.throw_sites = throw_sites;
                result
            }
            Expression::Match(match_expression) => {
                self.expression(&match_expression.scrutinee, state)?;
                if match_expression.arms.is_empty() {
                    return Ok(());
                }
                let mut exits = Vec::with_capacity(match_expression.arms.len());
                for arm in &match_expression.arms {
                    let mut arm_state = state.clone();
                    if let Some(guard) = &arm.guard {
                        self.expression(guard, &mut arm_state)?;
                    }
                    self.block(&arm.body, &mut arm_state)?;
                    exits.push(arm_state);
                }
                *state = join_all(exits);
                Ok(())
            }
            Expression::Cast(cast) => self.expression(&cast.value, state),
        }
    }
}
