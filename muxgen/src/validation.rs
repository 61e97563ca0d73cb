use crate::error::ConstructionError;
use crate::graph::*;

use std::collections::BTreeMap;

pub(crate) fn validate_module(m: &Module<'_>) -> Result<(), ConstructionError> {
    detect_foreign_nets(m)?;
    detect_unconnected_instance_ports(m)?;
    detect_undriven_and_multiply_driven_nets(m)?;
    Ok(())
}

fn owns(m: &Module<'_>, net: Net<'_>) -> bool {
    m.net(net.name()).map_or(false, |own| own == net)
}

fn foreign_net(m: &Module<'_>, net: Net<'_>) -> ConstructionError {
    ConstructionError::ForeignNet {
        module: m.name.clone(),
        name: net.name().into(),
    }
}

fn detect_foreign_nets(m: &Module<'_>) -> Result<(), ConstructionError> {
    for assignment in m.assignments.iter() {
        let mut frames = vec![assignment.expr];
        while let Some(expr) = frames.pop() {
            match expr.data {
                ExprData::Lit { .. } => (),
                ExprData::Net(net) | ExprData::Bit { net, .. } => {
                    if !owns(m, net) {
                        return Err(foreign_net(m, net));
                    }
                }
                ExprData::Eq { lhs, rhs } => {
                    frames.push(lhs);
                    frames.push(rhs);
                }
                ExprData::Mux {
                    cond,
                    when_true,
                    when_false,
                } => {
                    frames.push(cond);
                    frames.push(when_true);
                    frames.push(when_false);
                }
                ExprData::Select { sel, ref cases } => {
                    frames.push(sel);
                    frames.extend(cases.iter().copied());
                }
            }
        }
    }

    for instance in m.instances.iter() {
        for net in instance.connections.values() {
            if !owns(m, *net) {
                return Err(foreign_net(m, *net));
            }
        }
    }

    Ok(())
}

fn detect_unconnected_instance_ports(m: &Module<'_>) -> Result<(), ConstructionError> {
    for instance in m.instances.iter() {
        for port in instance.ports.iter() {
            if !instance.connections.contains_key(&port.name) {
                return Err(ConstructionError::Unconnected {
                    instance: instance.name.clone(),
                    port: port.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn detect_undriven_and_multiply_driven_nets(m: &Module<'_>) -> Result<(), ConstructionError> {
    let mut drivers: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
    for port in m.ports.iter() {
        if port.direction == Direction::Output {
            drivers.insert(&port.name, vec![0; port.bit_width as usize]);
        }
    }
    for signal in m.signals.iter() {
        drivers.insert(&signal.name, vec![0; signal.bit_width as usize]);
    }

    let mut drive = |name: &str, low: u32, high: u32| -> Result<(), ConstructionError> {
        if let Some(counts) = drivers.get_mut(name) {
            for bit in low..=high {
                counts[bit as usize] += 1;
                if counts[bit as usize] > 1 {
                    return Err(ConstructionError::MultipleDrivers {
                        name: name.into(),
                        bit,
                    });
                }
            }
        }
        Ok(())
    };

    for assignment in m.assignments.iter() {
        let (low, high) = assignment.target.bit_range();
        drive(assignment.target.net.name(), low, high)?;
    }
    for instance in m.instances.iter() {
        for port in instance.ports.iter() {
            if port.direction != Direction::Output {
                continue;
            }
            if let Some(net) = instance.connections.get(&port.name) {
                drive(net.name(), 0, net.bit_width() - 1)?;
            }
        }
    }

    for (name, counts) in drivers.iter() {
        if let Some(bit) = counts.iter().position(|count| *count == 0) {
            return Err(ConstructionError::Undriven {
                name: (*name).into(),
                bit: bit as u32,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undriven_output_error() {
        let c = Context::new();
        let mut m = c.module("a");
        let o = m.output("o", 2).unwrap();
        let low = m.low();
        m.assign(Target::bit(o, 0), low).unwrap();

        assert_eq!(
            m.elaborate().unwrap_err(),
            ConstructionError::Undriven {
                name: "o".into(),
                bit: 1,
            }
        );
    }

    #[test]
    fn undriven_signal_error() {
        let c = Context::new();
        let mut m = c.module("a");
        let _ = m.signal("s", 1).unwrap();

        assert_eq!(
            m.elaborate().unwrap_err(),
            ConstructionError::Undriven {
                name: "s".into(),
                bit: 0,
            }
        );
    }

    #[test]
    fn multiply_driven_bit_error() {
        let c = Context::new();
        let mut m = c.module("a");
        let o = m.output("o", 2).unwrap();
        let low = m.lit(0, 2).unwrap();
        let high = m.high();
        m.assign(Target::whole(o), low).unwrap();
        m.assign(Target::bit(o, 1), high).unwrap();

        assert_eq!(
            m.elaborate().unwrap_err(),
            ConstructionError::MultipleDrivers {
                name: "o".into(),
                bit: 1,
            }
        );
    }

    #[test]
    fn instance_output_counts_as_driver() {
        let c = Context::new();
        let mut m = c.module("a");
        let s = m.signal("s", 3).unwrap();
        let o = m.output("o", 3).unwrap();
        let ss = m.net(s);
        m.assign(Target::whole(o), ss).unwrap();

        let mut inst = Instance::new("u", "core");
        inst.port("q", Direction::Output, 3).unwrap();
        inst.connect("q", s).unwrap();
        m.add_instance(inst).unwrap();

        assert!(m.elaborate().is_ok());
    }

    #[test]
    fn instance_and_assignment_both_driving_error() {
        let c = Context::new();
        let mut m = c.module("a");
        let s = m.signal("s", 1).unwrap();
        let low = m.low();
        m.assign(Target::whole(s), low).unwrap();

        let mut inst = Instance::new("u", "core");
        inst.port("q", Direction::Output, 1).unwrap();
        inst.connect("q", s).unwrap();
        m.add_instance(inst).unwrap();

        assert!(matches!(
            m.elaborate(),
            Err(ConstructionError::MultipleDrivers { .. })
        ));
    }

    #[test]
    fn unconnected_instance_port_error() {
        let c = Context::new();
        let mut m = c.module("a");
        let mut inst = Instance::new("u", "core");
        inst.port("d", Direction::Input, 1).unwrap();
        m.add_instance(inst).unwrap();

        assert_eq!(
            m.elaborate().unwrap_err(),
            ConstructionError::Unconnected {
                instance: "u".into(),
                port: "d".into(),
            }
        );
    }

    #[test]
    fn foreign_net_in_expression_error() {
        let c = Context::new();
        let mut a = c.module("a");
        let mut b = c.module("b");
        let foreign = b.input("i", 1).unwrap();
        let o = a.output("o", 1).unwrap();
        let read = a.net(foreign);
        a.assign(Target::whole(o), read).unwrap();

        assert_eq!(
            a.elaborate().unwrap_err(),
            ConstructionError::ForeignNet {
                module: "a".into(),
                name: "i".into(),
            }
        );
    }
}
