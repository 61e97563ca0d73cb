use super::context::*;
use super::net::*;

use crate::error::ConstructionError;

use std::fmt;
use std::ptr;

/// A combinational expression node, allocated in a [`Context`].
///
/// `Expr`s are created by [`ModuleBuilder`] methods (eg. [`net`], [`lit`]) or by combining existing `Expr`s (eg. [`mux`], [`select`]). Every `Expr` has a fixed bit width, and combinators reject operands whose widths don't line up.
///
/// # Examples
///
/// ```
/// use muxgen::*;
///
/// let c = Context::new();
///
/// let mut m = c.module("m");
/// let sel = m.input("sel", 2).unwrap();
/// let a = m.input("a", 1).unwrap();
/// let b = m.input("b", 1).unwrap();
///
/// let sel = m.net(sel);
/// let picked = sel.select(vec![m.net(a), m.net(b)]).unwrap();
/// assert_eq!(picked.bit_width(), 1);
/// assert_eq!(sel.eq_lit(1).bit_width(), 1);
/// ```
///
/// [`ModuleBuilder`]: ./struct.ModuleBuilder.html
/// [`net`]: ./struct.ModuleBuilder.html#method.net
/// [`lit`]: ./struct.ModuleBuilder.html#method.lit
/// [`mux`]: #method.mux
/// [`select`]: #method.select
#[must_use]
pub struct Expr<'a> {
    pub(super) context: &'a Context<'a>,
    pub(crate) data: ExprData<'a>,
}

#[derive(Debug)]
pub enum ExprData<'a> {
    Lit {
        value: u64,
        bit_width: u32,
    },
    Net(Net<'a>),
    Bit {
        net: Net<'a>,
        index: u32,
    },
    Eq {
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
    Mux {
        cond: &'a Expr<'a>,
        when_true: &'a Expr<'a>,
        when_false: &'a Expr<'a>,
    },
    /// `cases[sel]`, or `0` when `sel` has no case.
    Select {
        sel: &'a Expr<'a>,
        cases: Vec<&'a Expr<'a>>,
    },
}

impl<'a> Expr<'a> {
    pub fn data(&self) -> &ExprData<'a> {
        &self.data
    }

    #[must_use]
    pub fn bit_width(&self) -> u32 {
        match &self.data {
            ExprData::Lit { bit_width, .. } => *bit_width,
            ExprData::Net(net) => net.bit_width(),
            ExprData::Bit { .. } => 1,
            ExprData::Eq { .. } => 1,
            ExprData::Mux { when_true, .. } => when_true.bit_width(),
            ExprData::Select { cases, .. } => cases[0].bit_width(),
        }
    }

    /// Returns the value of this `Expr` if it is a literal.
    pub fn const_value(&self) -> Option<u64> {
        match self.data {
            ExprData::Lit { value, .. } => Some(value),
            _ => None,
        }
    }

    pub(crate) fn is_compound(&self) -> bool {
        matches!(
            self.data,
            ExprData::Eq { .. } | ExprData::Mux { .. } | ExprData::Select { .. }
        )
    }

    /// Creates a 1-bit `Expr` that is high when this `Expr` equals `rhs`.
    pub fn eq(&'a self, rhs: &'a Expr<'a>) -> Result<&'a Expr<'a>, ConstructionError> {
        if self.bit_width() != rhs.bit_width() {
            return Err(ConstructionError::WidthMismatch {
                context: "equality operands".into(),
                expected: self.bit_width(),
                actual: rhs.bit_width(),
            });
        }
        Ok(self.context.alloc_expr(ExprData::Eq { lhs: self, rhs }))
    }

    /// Creates a 1-bit `Expr` that is high when this `Expr` equals the constant `value`.
    ///
    /// If `value` can't be represented in this `Expr`'s width, the comparison can never hold and a constant `0` is returned instead.
    pub fn eq_lit(&'a self, value: u64) -> &'a Expr<'a> {
        let bit_width = self.bit_width();
        if !fits(value, bit_width) {
            return self.context.alloc_expr(ExprData::Lit {
                value: 0,
                bit_width: 1,
            });
        }
        let rhs = self
            .context
            .alloc_expr(ExprData::Lit { value, bit_width });
        self.context.alloc_expr(ExprData::Eq { lhs: self, rhs })
    }

    /// Creates an `Expr` that is `when_true` when this 1-bit `Expr` is high, and `when_false` otherwise.
    ///
    /// A literal condition is folded away, as is a mux whose two branches are the same node.
    pub fn mux(
        &'a self,
        when_true: &'a Expr<'a>,
        when_false: &'a Expr<'a>,
    ) -> Result<&'a Expr<'a>, ConstructionError> {
        if self.bit_width() != 1 {
            return Err(ConstructionError::WidthMismatch {
                context: "mux condition".into(),
                expected: 1,
                actual: self.bit_width(),
            });
        }
        if when_true.bit_width() != when_false.bit_width() {
            return Err(ConstructionError::WidthMismatch {
                context: "mux branches".into(),
                expected: when_true.bit_width(),
                actual: when_false.bit_width(),
            });
        }
        if ptr::eq(when_true, when_false) {
            return Ok(when_true);
        }
        match self.const_value() {
            Some(0) => Ok(when_false),
            Some(_) => Ok(when_true),
            None => Ok(self.context.alloc_expr(ExprData::Mux {
                cond: self,
                when_true,
                when_false,
            })),
        }
    }

    /// Creates an `Expr` that picks `cases[self]`, using this `Expr` as the selector.
    ///
    /// Selector values without a corresponding case produce `0`. Cases whose index the selector can't represent are kept in the graph but can never be picked.
    pub fn select<I>(&'a self, cases: I) -> Result<&'a Expr<'a>, ConstructionError>
    where
        I: IntoIterator<Item = &'a Expr<'a>>,
    {
        let cases: Vec<_> = cases.into_iter().collect();
        let bit_width = match cases.first() {
            Some(first) => first.bit_width(),
            None => return Err(ConstructionError::EmptyMux),
        };
        for case in cases.iter() {
            if case.bit_width() != bit_width {
                return Err(ConstructionError::WidthMismatch {
                    context: "indexed mux cases".into(),
                    expected: bit_width,
                    actual: case.bit_width(),
                });
            }
        }
        Ok(self.context.alloc_expr(ExprData::Select { sel: self, cases }))
    }
}

impl<'a> fmt::Debug for Expr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data.fmt(f)
    }
}

/// Whether `value` can be represented in `bit_width` bits.
pub fn fits(value: u64, bit_width: u32) -> bool {
    bit_width >= 64 || value < (1u64 << bit_width)
}
