//! Executable form of a derivation tree.
//!
//! [`compile`] runs the terminal sequence of a walked tree through a stack
//! machine and produces a closed expression tree together with its rendering.
//! Binary operators take their left operand from the first pop.

use super::context::{self, EvaluationContext};
use super::pretty::PrettyString;
use super::symbol::Symbol;
use crate::error::{HeuristicGenError, HgResult};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Which node a leaf reads: the node being scored, or the neighbor an
/// enclosing aggregation is currently visiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Outer,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarProperty {
    Degree,
    Threshold,
    ActiveNeighborsCount,
    Deficit,
    InactiveNeighborsCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetProperty {
    Neighbors,
    InactiveNeighbors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Exp,
    SquareRoot,
    Log,
    Reciprocal,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Pow,
    Maximum,
    Minimum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Average,
    Maximum,
    Minimum,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    Constant(f64),
    Property(ScalarProperty, Binding),
    Unary(UnaryOp, Box<ScalarExpr>),
    Binary(BinaryOp, Box<ScalarExpr>, Box<ScalarExpr>),
    /// Reduces the body over the inactive neighbors of the outer node.
    Aggregate(Reduction, Box<ScalarExpr>),
    Cardinality(Box<SetExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetExpr {
    Property(SetProperty, Binding),
    Binary(SetOp, Box<SetExpr>, Box<SetExpr>),
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    outer: usize,
    current: usize,
}

impl Scope {
    fn resolve(self, binding: Binding) -> usize {
        match binding {
            Binding::Outer => self.outer,
            Binding::Current => self.current,
        }
    }
}

impl ScalarExpr {
    /// Scores `node`. May still yield NaN from unguarded arithmetic such as `inf - inf`.
    pub fn evaluate(&self, node: usize, ctx: &EvaluationContext<'_>) -> f64 {
        self.eval_in(
            Scope {
                outer: node,
                current: node,
            },
            ctx,
        )
    }

    fn eval_in(&self, scope: Scope, ctx: &EvaluationContext<'_>) -> f64 {
        match self {
            ScalarExpr::Constant(c) => *c,
            ScalarExpr::Property(property, binding) => {
                let node = scope.resolve(*binding);
                match property {
                    ScalarProperty::Degree => ctx.degree(node),
                    ScalarProperty::Threshold => ctx.threshold(node),
                    ScalarProperty::ActiveNeighborsCount => ctx.active_neighbors_count(node),
                    ScalarProperty::Deficit => ctx.deficit(node),
                    ScalarProperty::InactiveNeighborsCount => ctx.inactive_neighbors_count(node),
                }
            }
            ScalarExpr::Unary(op, operand) => {
                let x = operand.eval_in(scope, ctx);
                match op {
                    UnaryOp::Negate => -x,
                    UnaryOp::Exp => context::exp(x),
                    UnaryOp::SquareRoot => context::square_root(x),
                    UnaryOp::Log => context::log(x),
                    UnaryOp::Reciprocal => context::reciprocal(x),
                    UnaryOp::Square => context::square(x),
                }
            }
            ScalarExpr::Binary(op, left, right) => {
                let a = left.eval_in(scope, ctx);
                let b = right.eval_in(scope, ctx);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Subtract => a - b,
                    BinaryOp::Multiply => a * b,
                    BinaryOp::Divide => context::divide(a, b),
                    BinaryOp::Pow => context::pow(a, b),
                    BinaryOp::Maximum => context::maximum(a, b),
                    BinaryOp::Minimum => context::minimum(a, b),
                }
            }
            ScalarExpr::Aggregate(reduction, body) => {
                let members = &ctx.inactive_neighbors[scope.outer];
                let values = members.iter().map(|&neighbor| {
                    body.eval_in(
                        Scope {
                            outer: scope.outer,
                            current: neighbor,
                        },
                        ctx,
                    )
                });
                match reduction {
                    Reduction::Sum => values.sum(),
                    Reduction::Average => {
                        context::divide(values.sum::<f64>(), members.len() as f64)
                    }
                    Reduction::Maximum => values.fold(f64::NEG_INFINITY, context::maximum),
                    Reduction::Minimum => values.fold(f64::INFINITY, context::minimum),
                }
            }
            ScalarExpr::Cardinality(set) => set.eval_in(scope, ctx).len() as f64,
        }
    }
}

impl SetExpr {
    fn eval_in<'a>(&self, scope: Scope, ctx: &EvaluationContext<'a>) -> Cow<'a, BTreeSet<usize>> {
        match self {
            SetExpr::Property(property, binding) => {
                let node = scope.resolve(*binding);
                let sets: &'a [BTreeSet<usize>] = match property {
                    SetProperty::Neighbors => ctx.neighbors,
                    SetProperty::InactiveNeighbors => ctx.inactive_neighbors,
                };
                Cow::Borrowed(&sets[node])
            }
            SetExpr::Binary(op, left, right) => {
                let a = left.eval_in(scope, ctx);
                let b = right.eval_in(scope, ctx);
                Cow::Owned(match op {
                    SetOp::Union => context::union(&a, &b),
                    SetOp::Intersection => context::intersection(&a, &b),
                    SetOp::Difference => context::set_difference(&a, &b),
                    SetOp::SymmetricDifference => context::symmetric_set_difference(&a, &b),
                })
            }
        }
    }
}

/// Precedence class of a rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpClass {
    ConstantOrVariable,
    FunctionCall,
    InfixAdditive,
    InfixMultiplicative,
}

enum Value {
    Scalar(ScalarExpr),
    Set(SetExpr),
}

struct Fragment {
    value: Value,
    class: OpClass,
    text: PrettyString,
}

fn parenthesize(fragment: &Fragment, when: &[OpClass]) -> PrettyString {
    if when.contains(&fragment.class) {
        PrettyString::wrap("(", &fragment.text, ")")
    } else {
        fragment.text.clone()
    }
}

struct StackMachine {
    stack: Vec<Fragment>,
    scope_depth: usize,
}

impl StackMachine {
    fn pop(&mut self, symbol: Symbol) -> HgResult<Fragment> {
        self.stack.pop().ok_or_else(|| {
            HeuristicGenError::MalformedProgram(format!(
                "{} found an empty operand stack",
                symbol.name()
            ))
        })
    }

    fn pop_scalar(&mut self, symbol: Symbol) -> HgResult<(ScalarExpr, Fragment)> {
        let mut fragment = self.pop(symbol)?;
        match std::mem::replace(&mut fragment.value, Value::Scalar(ScalarExpr::Constant(0.0))) {
            Value::Scalar(expr) => Ok((expr, fragment)),
            Value::Set(_) => Err(HeuristicGenError::MalformedProgram(format!(
                "{} expects a number but found a set",
                symbol.name()
            ))),
        }
    }

    fn pop_set(&mut self, symbol: Symbol) -> HgResult<(SetExpr, Fragment)> {
        let mut fragment = self.pop(symbol)?;
        match std::mem::replace(&mut fragment.value, Value::Scalar(ScalarExpr::Constant(0.0))) {
            Value::Set(expr) => Ok((expr, fragment)),
            Value::Scalar(_) => Err(HeuristicGenError::MalformedProgram(format!(
                "{} expects a set but found a number",
                symbol.name()
            ))),
        }
    }

    fn push_scalar(&mut self, expr: ScalarExpr, class: OpClass, text: PrettyString) {
        self.stack.push(Fragment {
            value: Value::Scalar(expr),
            class,
            text,
        });
    }

    fn push_set(&mut self, expr: SetExpr, class: OpClass, text: PrettyString) {
        self.stack.push(Fragment {
            value: Value::Set(expr),
            class,
            text,
        });
    }

    fn current_name(&self) -> &'static str {
        if self.scope_depth > 0 {
            "neighbor"
        } else {
            "node"
        }
    }

    fn scalar_leaf(&mut self, property: ScalarProperty, binding: Binding) -> HgResult<()> {
        let name = match binding {
            Binding::Outer => "node",
            Binding::Current => self.current_name(),
        };
        let label = match property {
            ScalarProperty::Degree => "degree",
            ScalarProperty::Threshold => "threshold",
            ScalarProperty::ActiveNeighborsCount => "num_active_neighbors",
            ScalarProperty::Deficit => "deficit",
            ScalarProperty::InactiveNeighborsCount => "num_inactive_neighbors",
        };
        self.push_scalar(
            ScalarExpr::Property(property, binding),
            OpClass::ConstantOrVariable,
            PrettyString::line(format!("{}({})", label, name)),
        );
        Ok(())
    }

    fn set_leaf(&mut self, property: SetProperty, binding: Binding) -> HgResult<()> {
        let name = match binding {
            Binding::Outer => "node",
            Binding::Current => self.current_name(),
        };
        let label = match property {
            SetProperty::Neighbors => "neighbors",
            SetProperty::InactiveNeighbors => "inactive_neighbors",
        };
        self.push_set(
            SetExpr::Property(property, binding),
            OpClass::ConstantOrVariable,
            PrettyString::line(format!("{}({})", label, name)),
        );
        Ok(())
    }

    fn constant(&mut self, value: f64, text: &str) -> HgResult<()> {
        self.push_scalar(
            ScalarExpr::Constant(value),
            OpClass::ConstantOrVariable,
            PrettyString::line(text),
        );
        Ok(())
    }

    fn binary(&mut self, symbol: Symbol, op: BinaryOp) -> HgResult<()> {
        let (l, left) = self.pop_scalar(symbol)?;
        let (r, right) = self.pop_scalar(symbol)?;
        use OpClass::*;
        let (class, text) = match op {
            BinaryOp::Add => (
                InfixAdditive,
                PrettyString::join("", " + ", "", &[left.text, right.text]),
            ),
            BinaryOp::Subtract => (
                InfixAdditive,
                PrettyString::join(
                    "",
                    " - ",
                    "",
                    &[left.text, parenthesize(&right, &[InfixAdditive])],
                ),
            ),
            BinaryOp::Multiply => (
                InfixMultiplicative,
                PrettyString::join(
                    "",
                    " * ",
                    "",
                    &[
                        parenthesize(&left, &[InfixAdditive]),
                        parenthesize(&right, &[InfixAdditive]),
                    ],
                ),
            ),
            BinaryOp::Divide => (
                InfixMultiplicative,
                PrettyString::join(
                    "",
                    " / ",
                    "",
                    &[
                        parenthesize(&left, &[InfixAdditive]),
                        parenthesize(&right, &[InfixAdditive, InfixMultiplicative]),
                    ],
                ),
            ),
            BinaryOp::Pow => (
                FunctionCall,
                PrettyString::join("pow(", ", ", ")", &[left.text, right.text]),
            ),
            BinaryOp::Maximum => (
                FunctionCall,
                PrettyString::join("max(", ", ", ")", &[left.text, right.text]),
            ),
            BinaryOp::Minimum => (
                FunctionCall,
                PrettyString::join("min(", ", ", ")", &[left.text, right.text]),
            ),
        };
        self.push_scalar(ScalarExpr::Binary(op, Box::new(l), Box::new(r)), class, text);
        Ok(())
    }

    fn unary(&mut self, symbol: Symbol, op: UnaryOp) -> HgResult<()> {
        let (x, operand) = self.pop_scalar(symbol)?;
        let (class, text) = match op {
            UnaryOp::Negate => (
                operand.class,
                PrettyString::wrap("-", &parenthesize(&operand, &[OpClass::InfixAdditive]), ""),
            ),
            _ => {
                let name = match op {
                    UnaryOp::Exp => "exp(",
                    UnaryOp::SquareRoot => "sqrt(",
                    UnaryOp::Log => "ln(",
                    UnaryOp::Reciprocal => "reciprocal(",
                    _ => "square(",
                };
                (OpClass::FunctionCall, PrettyString::wrap(name, &operand.text, ")"))
            }
        };
        self.push_scalar(ScalarExpr::Unary(op, Box::new(x)), class, text);
        Ok(())
    }

    fn set_binary(&mut self, symbol: Symbol, op: SetOp) -> HgResult<()> {
        let (l, left) = self.pop_set(symbol)?;
        let (r, right) = self.pop_set(symbol)?;
        let name = match op {
            SetOp::Union => "union(",
            SetOp::Intersection => "intersection(",
            SetOp::Difference => "difference(",
            SetOp::SymmetricDifference => "sym_difference(",
        };
        self.push_set(
            SetExpr::Binary(op, Box::new(l), Box::new(r)),
            OpClass::FunctionCall,
            PrettyString::join(name, ", ", ")", &[left.text, right.text]),
        );
        Ok(())
    }

    fn cardinality(&mut self, symbol: Symbol) -> HgResult<()> {
        let (set, operand) = self.pop_set(symbol)?;
        self.push_scalar(
            ScalarExpr::Cardinality(Box::new(set)),
            OpClass::FunctionCall,
            PrettyString::wrap("cardinality(", &operand.text, ")"),
        );
        Ok(())
    }

    /// Closes a scope. Only the outermost aggregation emits a reduction;
    /// nested ones leave their body untouched.
    fn close_scope(&mut self, symbol: Symbol, reduction: Reduction) -> HgResult<()> {
        if self.scope_depth == 0 {
            return Err(HeuristicGenError::MalformedProgram(format!(
                "{} without an open aggregation scope",
                symbol.name()
            )));
        }
        self.scope_depth -= 1;
        if self.scope_depth > 0 {
            return Ok(());
        }
        let (body, fragment) = self.pop_scalar(symbol)?;
        let prologue = match reduction {
            Reduction::Sum => "sum_over_inactive_neighbors[",
            Reduction::Average => "average_over_inactive_neighbors[",
            Reduction::Maximum => "max_over_inactive_neighbors[",
            Reduction::Minimum => "min_over_inactive_neighbors[",
        };
        self.push_scalar(
            ScalarExpr::Aggregate(reduction, Box::new(body)),
            OpClass::FunctionCall,
            PrettyString::wrap(prologue, &fragment.text, "]"),
        );
        Ok(())
    }

    fn step(&mut self, symbol: Symbol) -> HgResult<()> {
        use Symbol::*;
        match symbol {
            AggregationScopeMarker => {
                self.scope_depth += 1;
                Ok(())
            }
            Add => self.binary(symbol, BinaryOp::Add),
            Subtract => self.binary(symbol, BinaryOp::Subtract),
            Multiply => self.binary(symbol, BinaryOp::Multiply),
            Divide => self.binary(symbol, BinaryOp::Divide),
            Pow => self.binary(symbol, BinaryOp::Pow),
            Maximum => self.binary(symbol, BinaryOp::Maximum),
            Minimum => self.binary(symbol, BinaryOp::Minimum),
            Negate => self.unary(symbol, UnaryOp::Negate),
            Exp => self.unary(symbol, UnaryOp::Exp),
            SquareRoot => self.unary(symbol, UnaryOp::SquareRoot),
            Log => self.unary(symbol, UnaryOp::Log),
            Reciprocal => self.unary(symbol, UnaryOp::Reciprocal),
            Square => self.unary(symbol, UnaryOp::Square),
            Cardinality => self.cardinality(symbol),
            Union => self.set_binary(symbol, SetOp::Union),
            Intersection => self.set_binary(symbol, SetOp::Intersection),
            SetDifference => self.set_binary(symbol, SetOp::Difference),
            SymmetricSetDifference => self.set_binary(symbol, SetOp::SymmetricDifference),
            SumOverInactiveNeighbors => self.close_scope(symbol, Reduction::Sum),
            AverageOverInactiveNeighbors => self.close_scope(symbol, Reduction::Average),
            MaximumOverInactiveNeighbors => self.close_scope(symbol, Reduction::Maximum),
            MinimumOverInactiveNeighbors => self.close_scope(symbol, Reduction::Minimum),
            DegreeInCurrentScope => self.scalar_leaf(ScalarProperty::Degree, Binding::Current),
            ThresholdInCurrentScope => {
                self.scalar_leaf(ScalarProperty::Threshold, Binding::Current)
            }
            ActiveNeighborsCountInCurrentScope => {
                self.scalar_leaf(ScalarProperty::ActiveNeighborsCount, Binding::Current)
            }
            DeficitInCurrentScope => self.scalar_leaf(ScalarProperty::Deficit, Binding::Current),
            InactiveNeighborsCountInCurrentScope => {
                self.scalar_leaf(ScalarProperty::InactiveNeighborsCount, Binding::Current)
            }
            NeighborsInCurrentScope => self.set_leaf(SetProperty::Neighbors, Binding::Current),
            InactiveNeighborsInCurrentScope => {
                self.set_leaf(SetProperty::InactiveNeighbors, Binding::Current)
            }
            DegreeInOuterScope => self.scalar_leaf(ScalarProperty::Degree, Binding::Outer),
            ThresholdInOuterScope => self.scalar_leaf(ScalarProperty::Threshold, Binding::Outer),
            ActiveNeighborsCountInOuterScope => {
                self.scalar_leaf(ScalarProperty::ActiveNeighborsCount, Binding::Outer)
            }
            DeficitInOuterScope => self.scalar_leaf(ScalarProperty::Deficit, Binding::Outer),
            InactiveNeighborsCountInOuterScope => {
                self.scalar_leaf(ScalarProperty::InactiveNeighborsCount, Binding::Outer)
            }
            NeighborsInOuterScope => self.set_leaf(SetProperty::Neighbors, Binding::Outer),
            InactiveNeighborsInOuterScope => {
                self.set_leaf(SetProperty::InactiveNeighbors, Binding::Outer)
            }
            OneSixteenth => self.constant(1.0 / 16.0, "0.0625"),
            OneEighth => self.constant(1.0 / 8.0, "0.125"),
            OneQuarter => self.constant(0.25, "0.25"),
            OneHalf => self.constant(0.5, "0.5"),
            Zero => self.constant(0.0, "0"),
            One => self.constant(1.0, "1"),
            Two => self.constant(2.0, "2"),
            Four => self.constant(4.0, "4"),
            Eight => self.constant(8.0, "8"),
            Sixteen => self.constant(16.0, "16"),
            _ => Err(HeuristicGenError::MalformedProgram(format!(
                "Non-terminal {} in the instruction stream",
                symbol.name()
            ))),
        }
    }
}

/// Compiles terminals (non-terminals are skipped) in walk order.
pub fn compile<I>(symbols: I) -> HgResult<(ScalarExpr, PrettyString)>
where
    I: IntoIterator<Item = Symbol>,
{
    let mut machine = StackMachine {
        stack: Vec::with_capacity(32),
        scope_depth: 0,
    };
    for symbol in symbols.into_iter().filter(|s| s.is_terminal()) {
        machine.step(symbol)?;
    }

    if machine.scope_depth != 0 {
        return Err(HeuristicGenError::MalformedProgram(
            "Unclosed aggregation scope".to_string(),
        ));
    }
    if machine.stack.len() != 1 {
        return Err(HeuristicGenError::MalformedProgram(format!(
            "Program leaves {} values on the stack",
            machine.stack.len()
        )));
    }
    let (expr, fragment) = machine.pop_scalar(Symbol::Expression)?;
    Ok((expr, fragment.text))
}
