use super::expr::*;
use super::module::*;
use super::net::*;

use typed_arena::Arena;

/// A top-level container/owner object for a module graph.
///
/// A `Context` owns every port, signal and expression node of the modules built from it, and hands out references that live as long as the `Context` itself.
///
/// # Examples
///
/// ```
/// use muxgen::*;
///
/// let c = Context::new();
///
/// let mut m = c.module("passthrough");
/// let i = m.input("i", 1).unwrap();
/// let o = m.output("o", 1).unwrap();
/// m.assign(Target::whole(o), m.net(i)).unwrap();
/// let passthrough = m.elaborate().unwrap();
/// assert_eq!(passthrough.ports().len(), 2);
/// ```
#[must_use]
pub struct Context<'a> {
    pub(super) port_arena: Arena<Port>,
    pub(super) signal_arena: Arena<Signal>,
    pub(super) expr_arena: Arena<Expr<'a>>,
}

impl<'a> Context<'a> {
    /// Creates a new, empty `Context`.
    pub fn new() -> Context<'a> {
        Context {
            port_arena: Arena::new(),
            signal_arena: Arena::new(),
            expr_arena: Arena::new(),
        }
    }

    /// Starts building a new module called `name` in this `Context`.
    pub fn module<S: Into<String>>(&'a self, name: S) -> ModuleBuilder<'a> {
        ModuleBuilder::new(self, name.into())
    }

    pub(super) fn alloc_expr(&'a self, data: ExprData<'a>) -> &'a Expr<'a> {
        self.expr_arena.alloc(Expr {
            context: self,
            data,
        })
    }
}

impl<'a> Default for Context<'a> {
    fn default() -> Context<'a> {
        Context::new()
    }
}
