use super::context::*;
use super::expr::*;
use super::instance::*;
use super::net::*;

use crate::error::ConstructionError;
use crate::validation::validate_module;

use std::collections::BTreeMap;
use std::fmt;

/// A single combinational routing rule: `target = expr`.
#[derive(Debug)]
pub struct Assignment<'a> {
    pub(crate) target: Target<'a>,
    pub(crate) expr: &'a Expr<'a>,
}

impl<'a> Assignment<'a> {
    pub fn target(&self) -> Target<'a> {
        self.target
    }

    pub fn expr(&self) -> &'a Expr<'a> {
        self.expr
    }
}

/// Accumulates the ports, internal signals, assignments and instances of a module, created by [`Context::module`].
///
/// Every name claimed through a `ModuleBuilder` (ports, signals, instances) must be unique within the module; collisions are reported at the call site. Once everything is declared, [`elaborate`] checks the module as a whole and returns the finished, immutable [`Module`].
///
/// [`Context::module`]: ./struct.Context.html#method.module
/// [`elaborate`]: #method.elaborate
/// [`Module`]: ./struct.Module.html
#[must_use]
pub struct ModuleBuilder<'a> {
    context: &'a Context<'a>,

    name: String,

    ports: Vec<&'a Port>,
    signals: Vec<&'a Signal>,
    names: BTreeMap<String, usize>,
    assignments: Vec<Assignment<'a>>,
    instances: Vec<Instance<'a>>,
}

impl<'a> ModuleBuilder<'a> {
    pub(super) fn new(context: &'a Context<'a>, name: String) -> ModuleBuilder<'a> {
        ModuleBuilder {
            context,

            name,

            ports: Vec::new(),
            signals: Vec::new(),
            names: BTreeMap::new(),
            assignments: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an input port called `name` with `bit_width` bits.
    pub fn input<S: Into<String>>(
        &mut self,
        name: S,
        bit_width: u32,
    ) -> Result<&'a Port, ConstructionError> {
        self.port(name.into(), Direction::Input, bit_width)
    }

    /// Creates an output port called `name` with `bit_width` bits. Every bit must be driven before the module is elaborated.
    pub fn output<S: Into<String>>(
        &mut self,
        name: S,
        bit_width: u32,
    ) -> Result<&'a Port, ConstructionError> {
        self.port(name.into(), Direction::Output, bit_width)
    }

    fn port(
        &mut self,
        name: String,
        direction: Direction,
        bit_width: u32,
    ) -> Result<&'a Port, ConstructionError> {
        check_width(&name, bit_width)?;
        self.claim_name(&name)?;
        let port = self.context.port_arena.alloc(Port {
            name,
            direction,
            bit_width,
        });
        let port: &'a Port = port;
        self.ports.push(port);
        Ok(port)
    }

    /// Creates an internal combinational signal called `name` with `bit_width` bits.
    pub fn signal<S: Into<String>>(
        &mut self,
        name: S,
        bit_width: u32,
    ) -> Result<&'a Signal, ConstructionError> {
        let name = name.into();
        check_width(&name, bit_width)?;
        self.claim_name(&name)?;
        let signal = self.context.signal_arena.alloc(Signal { name, bit_width });
        let signal: &'a Signal = signal;
        self.signals.push(signal);
        Ok(signal)
    }

    /// Creates an `Expr` for the constant `value` with `bit_width` bits.
    pub fn lit(&self, value: u64, bit_width: u32) -> Result<&'a Expr<'a>, ConstructionError> {
        check_width("literal", bit_width)?;
        if !fits(value, bit_width) {
            return Err(ConstructionError::ValueTooWide { value, bit_width });
        }
        Ok(self.context.alloc_expr(ExprData::Lit { value, bit_width }))
    }

    /// A single `0` bit.
    pub fn low(&self) -> &'a Expr<'a> {
        self.context.alloc_expr(ExprData::Lit {
            value: 0,
            bit_width: 1,
        })
    }

    /// A single `1` bit.
    pub fn high(&self) -> &'a Expr<'a> {
        self.context.alloc_expr(ExprData::Lit {
            value: 1,
            bit_width: 1,
        })
    }

    /// Creates an `Expr` that reads the whole of `net`.
    pub fn net<N: Into<Net<'a>>>(&self, net: N) -> &'a Expr<'a> {
        self.context.alloc_expr(ExprData::Net(net.into()))
    }

    /// Creates a 1-bit `Expr` that reads bit `index` of `net`.
    pub fn net_bit<N: Into<Net<'a>>>(
        &self,
        net: N,
        index: u32,
    ) -> Result<&'a Expr<'a>, ConstructionError> {
        let net = net.into();
        if index >= net.bit_width() {
            return Err(ConstructionError::BitIndexOutOfRange {
                name: net.name().into(),
                index,
                bit_width: net.bit_width(),
            });
        }
        Ok(self.context.alloc_expr(ExprData::Bit { net, index }))
    }

    /// Drives `target` with `expr`.
    ///
    /// The target must be an output port or signal of this module, and `expr` must be exactly as wide as the target.
    pub fn assign(
        &mut self,
        target: Target<'a>,
        expr: &'a Expr<'a>,
    ) -> Result<(), ConstructionError> {
        if !self.owns(target.net) {
            return Err(ConstructionError::ForeignNet {
                module: self.name.clone(),
                name: target.net.name().into(),
            });
        }
        if target.net.is_input() {
            return Err(ConstructionError::DrivesInput {
                module: self.name.clone(),
                name: target.net.name().into(),
            });
        }
        if let Some(index) = target.bit {
            if index >= target.net.bit_width() {
                return Err(ConstructionError::BitIndexOutOfRange {
                    name: target.net.name().into(),
                    index,
                    bit_width: target.net.bit_width(),
                });
            }
        }
        if target.bit_width() != expr.bit_width() {
            return Err(ConstructionError::WidthMismatch {
                context: format!("assignment to \"{}\"", target.net.name()),
                expected: target.bit_width(),
                actual: expr.bit_width(),
            });
        }
        self.assignments.push(Assignment { target, expr });
        Ok(())
    }

    /// Adds a fully-connected `instance` to this module. The instance name shares the module's namespace with its nets.
    pub fn add_instance(&mut self, instance: Instance<'a>) -> Result<(), ConstructionError> {
        self.claim_name(&instance.name)?;
        self.instances.push(instance);
        Ok(())
    }

    /// Finishes this module.
    ///
    /// Assignments are ordered by the declaration order of their targets, so the result doesn't depend on the order in which routing rules were added.
    ///
    /// # Errors
    ///
    /// Fails if any output or signal bit is undriven or driven more than once, if any instance port is left unconnected, or if any expression reads a net from another module.
    pub fn elaborate(self) -> Result<Module<'a>, ConstructionError> {
        let ModuleBuilder {
            name,
            ports,
            signals,
            names,
            mut assignments,
            instances,
            ..
        } = self;

        assignments.sort_by_key(|a| (names[a.target.net.name()], a.target.bit.unwrap_or(0)));

        let module = Module {
            name,
            ports,
            signals,
            assignments,
            instances,
        };
        validate_module(&module)?;
        Ok(module)
    }

    fn claim_name(&mut self, name: &str) -> Result<(), ConstructionError> {
        if self.names.contains_key(name) {
            return Err(ConstructionError::DuplicateName {
                module: self.name.clone(),
                name: name.into(),
            });
        }
        let order = self.names.len();
        self.names.insert(name.into(), order);
        Ok(())
    }

    fn owns(&self, net: Net<'a>) -> bool {
        match net {
            Net::Port(port) => self.ports.iter().any(|p| std::ptr::eq(*p, port)),
            Net::Signal(signal) => self.signals.iter().any(|s| std::ptr::eq(*s, signal)),
        }
    }
}

fn check_width(name: &str, bit_width: u32) -> Result<(), ConstructionError> {
    if !(MIN_NET_BIT_WIDTH..=MAX_NET_BIT_WIDTH).contains(&bit_width) {
        return Err(ConstructionError::InvalidWidth {
            name: name.into(),
            bit_width,
            min: MIN_NET_BIT_WIDTH,
            max: MAX_NET_BIT_WIDTH,
        });
    }
    Ok(())
}

/// A finished, immutable module: the structural core handed to renderers.
#[must_use]
pub struct Module<'a> {
    pub(crate) name: String,

    pub(crate) ports: Vec<&'a Port>,
    pub(crate) signals: Vec<&'a Signal>,
    pub(crate) assignments: Vec<Assignment<'a>>,
    pub(crate) instances: Vec<Instance<'a>>,
}

impl<'a> Module<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ports(&self) -> &[&'a Port] {
        &self.ports
    }

    pub fn signals(&self) -> &[&'a Signal] {
        &self.signals
    }

    pub fn assignments(&self) -> &[Assignment<'a>] {
        &self.assignments
    }

    pub fn instances(&self) -> &[Instance<'a>] {
        &self.instances
    }

    pub fn port(&self, name: &str) -> Option<&'a Port> {
        self.ports.iter().copied().find(|p| p.name == name)
    }

    pub fn signal(&self, name: &str) -> Option<&'a Signal> {
        self.signals.iter().copied().find(|s| s.name == name)
    }

    /// Looks up a port or signal by name.
    pub fn net(&self, name: &str) -> Option<Net<'a>> {
        self.port(name)
            .map(Net::Port)
            .or_else(|| self.signal(name).map(Net::Signal))
    }
}

impl<'a> fmt::Debug for Module<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("ports", &self.ports.len())
            .field("signals", &self.signals.len())
            .field("assignments", &self.assignments.len())
            .field("instances", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_error() {
        let c = Context::new();
        let mut m = c.module("a");
        m.input("x", 1).unwrap();

        assert_eq!(
            m.signal("x", 1).unwrap_err(),
            ConstructionError::DuplicateName {
                module: "a".into(),
                name: "x".into(),
            }
        );
    }

    #[test]
    fn instance_name_collides_with_net() {
        let c = Context::new();
        let mut m = c.module("a");
        m.signal("u", 1).unwrap();

        assert!(matches!(
            m.add_instance(Instance::new("u", "core")),
            Err(ConstructionError::DuplicateName { .. })
        ));
    }

    #[test]
    fn zero_width_error() {
        let c = Context::new();
        let mut m = c.module("a");

        assert_eq!(
            m.input("i", 0).unwrap_err(),
            ConstructionError::InvalidWidth {
                name: "i".into(),
                bit_width: 0,
                min: 1,
                max: 64,
            }
        );
    }

    #[test]
    fn lit_value_too_wide_error() {
        let c = Context::new();
        let m = c.module("a");

        assert_eq!(
            m.lit(4, 2).unwrap_err(),
            ConstructionError::ValueTooWide {
                value: 4,
                bit_width: 2
            }
        );
        assert_eq!(m.lit(3, 2).unwrap().const_value(), Some(3));
    }

    #[test]
    fn net_bit_out_of_range_error() {
        let c = Context::new();
        let mut m = c.module("a");
        let i = m.input("i", 4).unwrap();

        assert_eq!(
            m.net_bit(i, 4).unwrap_err(),
            ConstructionError::BitIndexOutOfRange {
                name: "i".into(),
                index: 4,
                bit_width: 4,
            }
        );
    }

    #[test]
    fn assign_to_input_error() {
        let c = Context::new();
        let mut m = c.module("a");
        let i = m.input("i", 1).unwrap();
        let low = m.low();

        assert_eq!(
            m.assign(Target::whole(i), low),
            Err(ConstructionError::DrivesInput {
                module: "a".into(),
                name: "i".into(),
            })
        );
    }

    #[test]
    fn assign_width_mismatch_error() {
        let c = Context::new();
        let mut m = c.module("a");
        let o = m.output("o", 2).unwrap();
        let low = m.low();

        assert!(matches!(
            m.assign(Target::whole(o), low),
            Err(ConstructionError::WidthMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn assign_to_foreign_net_error() {
        let c = Context::new();
        let mut a = c.module("a");
        let mut b = c.module("b");
        let o = b.output("o", 1).unwrap();
        let low = a.low();

        assert_eq!(
            a.assign(Target::whole(o), low),
            Err(ConstructionError::ForeignNet {
                module: "a".into(),
                name: "o".into(),
            })
        );
    }

    #[test]
    fn elaborate_orders_assignments_by_declaration() {
        let c = Context::new();
        let mut m = c.module("a");
        let i = m.input("i", 1).unwrap();
        let o = m.output("o", 2).unwrap();
        let s = m.signal("s", 1).unwrap();

        let si = m.net(s);
        let ii = m.net(i);
        m.assign(Target::bit(o, 1), si).unwrap();
        m.assign(Target::whole(s), ii).unwrap();
        m.assign(Target::bit(o, 0), ii).unwrap();

        let module = m.elaborate().unwrap();
        let order: Vec<_> = module
            .assignments()
            .iter()
            .map(|a| (a.target().net.name(), a.target().bit))
            .collect();
        assert_eq!(order, vec![("o", Some(0)), ("o", Some(1)), ("s", None)]);
    }

    #[test]
    fn lookup_by_name() {
        let c = Context::new();
        let mut m = c.module("a");
        let i = m.input("i", 1).unwrap();
        let o = m.output("o", 1).unwrap();
        let s = m.signal("s", 1).unwrap();
        let ii = m.net(i);
        m.assign(Target::whole(s), ii).unwrap();
        let ss = m.net(s);
        m.assign(Target::whole(o), ss).unwrap();

        let module = m.elaborate().unwrap();

        assert_eq!(module.net("i"), Some(Net::Port(i)));
        assert_eq!(module.net("s"), Some(Net::Signal(s)));
        assert_eq!(module.net("nope"), None);
        assert!(std::ptr::eq(module.port("o").unwrap(), o));
    }
}
