//! A combinational evaluator over an elaborated [`Module`], used to check routing behavior in tests.
//!
//! Nets that no assignment drives (inputs, and signals driven by instances) take whatever value was last [`set`] for them, or 0.
//!
//! [`Module`]: ../graph/struct.Module.html
//! [`set`]: struct.Evaluator.html#method.set

use crate::graph::*;

use std::collections::HashMap;

pub struct Evaluator<'m, 'a> {
    module: &'m Module<'a>,
    values: HashMap<String, u64>,
}

fn mask(value: u64, bit_width: u32) -> u64 {
    if bit_width >= 64 {
        value
    } else {
        value & ((1 << bit_width) - 1)
    }
}

impl<'m, 'a> Evaluator<'m, 'a> {
    pub fn new(module: &'m Module<'a>) -> Evaluator<'m, 'a> {
        Evaluator {
            module,
            values: HashMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: u64) {
        self.values.insert(name.into(), value);
    }

    /// Evaluates the net called `name`.
    pub fn read(&self, name: &str) -> u64 {
        let net = self
            .module
            .net(name)
            .unwrap_or_else(|| panic!("no net called \"{}\"", name));
        self.read_net(net)
    }

    fn read_net(&self, net: Net<'a>) -> u64 {
        let mut driven = false;
        let mut value = 0;
        for assignment in self.module.assignments().iter() {
            let target = assignment.target();
            if target.net != net {
                continue;
            }
            driven = true;
            let (low, _) = target.bit_range();
            value |= self.eval(assignment.expr()) << low;
        }
        if !driven {
            value = self.values.get(net.name()).copied().unwrap_or(0);
        }
        mask(value, net.bit_width())
    }

    fn eval(&self, expr: &Expr<'a>) -> u64 {
        let value = match expr.data() {
            ExprData::Lit { value, .. } => *value,
            ExprData::Net(net) => self.read_net(*net),
            ExprData::Bit { net, index } => (self.read_net(*net) >> index) & 1,
            ExprData::Eq { lhs, rhs } => (self.eval(lhs) == self.eval(rhs)) as u64,
            ExprData::Mux {
                cond,
                when_true,
                when_false,
            } => {
                if self.eval(cond) != 0 {
                    self.eval(when_true)
                } else {
                    self.eval(when_false)
                }
            }
            ExprData::Select { sel, cases } => {
                let sel = self.eval(sel);
                cases
                    .get(sel as usize)
                    .map_or(0, |case| self.eval(case))
            }
        };
        mask(value, expr.bit_width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_assignments() {
        let c = Context::new();
        let mut m = c.module("m");
        let sel = m.input("sel", 2).unwrap();
        let a = m.input("a", 4).unwrap();
        let o = m.output("o", 2).unwrap();

        let picked = m
            .net(sel)
            .select(vec![m.net_bit(a, 0).unwrap(), m.net_bit(a, 3).unwrap()])
            .unwrap();
        m.assign(Target::bit(o, 0), picked).unwrap();
        let is_one = m.net(sel).eq_lit(1);
        m.assign(Target::bit(o, 1), is_one).unwrap();
        let module = m.elaborate().unwrap();

        let mut ev = Evaluator::new(&module);
        ev.set("a", 0b1000);
        ev.set("sel", 1);
        assert_eq!(ev.read("o"), 0b11);
        ev.set("sel", 0);
        assert_eq!(ev.read("o"), 0b00);
        ev.set("sel", 3);
        assert_eq!(ev.read("o"), 0b00);
    }
}
