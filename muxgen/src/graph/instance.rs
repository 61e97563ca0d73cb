use super::net::*;

use crate::error::ConstructionError;

use std::collections::BTreeMap;

/// A port declared on an [`Instance`]'s (opaque) module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstancePort {
    pub(crate) name: String,
    pub(crate) direction: Direction,
    pub(crate) bit_width: u32,
}

impl InstancePort {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }
}

/// An instance of a module whose implementation lives outside this graph.
///
/// Only the instantiated module's interface is known: its ports, and the integer parameters attached to it. Each port is connected to a whole [`Net`] of the enclosing module before the instance is added with [`ModuleBuilder::add_instance`].
///
/// # Examples
///
/// ```
/// use muxgen::*;
///
/// let c = Context::new();
/// let mut m = c.module("top");
/// let clk = m.input("clk", 1).unwrap();
/// let ready = m.output("ready", 1).unwrap();
///
/// let mut inst = Instance::new("u_core", "core");
/// inst.port("clk", Direction::Input, 1).unwrap();
/// inst.port("ready", Direction::Output, 1).unwrap();
/// inst.parameter("WIDTH", 32);
/// inst.rename_port("clk", "CLK").unwrap();
/// inst.connect("CLK", clk).unwrap();
/// inst.connect("ready", ready).unwrap();
///
/// m.add_instance(inst).unwrap();
/// let top = m.elaborate().unwrap();
/// assert_eq!(top.instances().len(), 1);
/// ```
///
/// [`ModuleBuilder::add_instance`]: ./struct.ModuleBuilder.html#method.add_instance
#[derive(Debug)]
pub struct Instance<'a> {
    pub(crate) name: String,
    pub(crate) module_name: String,
    pub(crate) parameters: Vec<(String, u64)>,
    pub(crate) ports: Vec<InstancePort>,
    pub(crate) connections: BTreeMap<String, Net<'a>>,
}

impl<'a> Instance<'a> {
    pub fn new<S: Into<String>, M: Into<String>>(name: S, module_name: M) -> Instance<'a> {
        Instance {
            name: name.into(),
            module_name: module_name.into(),
            parameters: Vec::new(),
            ports: Vec::new(),
            connections: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn parameters(&self) -> &[(String, u64)] {
        &self.parameters
    }

    pub fn ports(&self) -> &[InstancePort] {
        &self.ports
    }

    pub fn connection(&self, port: &str) -> Option<Net<'a>> {
        self.connections.get(port).copied()
    }

    /// Declares a port of the instantiated module.
    pub fn port<S: Into<String>>(
        &mut self,
        name: S,
        direction: Direction,
        bit_width: u32,
    ) -> Result<(), ConstructionError> {
        let name = name.into();
        if self.find_port(&name).is_some() {
            return Err(ConstructionError::DuplicateInstancePort {
                instance: self.name.clone(),
                port: name,
            });
        }
        if !(MIN_NET_BIT_WIDTH..=MAX_NET_BIT_WIDTH).contains(&bit_width) {
            return Err(ConstructionError::InvalidWidth {
                name,
                bit_width,
                min: MIN_NET_BIT_WIDTH,
                max: MAX_NET_BIT_WIDTH,
            });
        }
        self.ports.push(InstancePort {
            name,
            direction,
            bit_width,
        });
        Ok(())
    }

    /// Attaches a parameter value to this instance, replacing any previous value for `name`.
    pub fn parameter<S: Into<String>>(&mut self, name: S, value: u64) {
        let name = name.into();
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.parameters.push((name, value)),
        }
    }

    /// Renames the port `from` to `to`, carrying over any existing connection.
    pub fn rename_port(&mut self, from: &str, to: &str) -> Result<(), ConstructionError> {
        if from != to && self.find_port(to).is_some() {
            return Err(ConstructionError::DuplicateInstancePort {
                instance: self.name.clone(),
                port: to.into(),
            });
        }
        let index = self.find_port(from).ok_or_else(|| self.unknown_port(from))?;
        self.ports[index].name = to.into();
        if let Some(net) = self.connections.remove(from) {
            self.connections.insert(to.into(), net);
        }
        Ok(())
    }

    /// Connects the port `port` to `net`.
    ///
    /// Outputs of the instance may only drive signals or output ports of the enclosing module.
    pub fn connect<N: Into<Net<'a>>>(
        &mut self,
        port: &str,
        net: N,
    ) -> Result<(), ConstructionError> {
        let net = net.into();
        let index = self.find_port(port).ok_or_else(|| self.unknown_port(port))?;
        let declared = &self.ports[index];
        if self.connections.contains_key(port) {
            return Err(ConstructionError::AlreadyConnected {
                instance: self.name.clone(),
                port: port.into(),
            });
        }
        if declared.bit_width != net.bit_width() {
            return Err(ConstructionError::WidthMismatch {
                context: format!("port \"{}\" of instance \"{}\"", port, self.name),
                expected: declared.bit_width,
                actual: net.bit_width(),
            });
        }
        if declared.direction == Direction::Output && net.is_input() {
            return Err(ConstructionError::DirectionMismatch {
                instance: self.name.clone(),
                port: port.into(),
                net: net.name().into(),
            });
        }
        self.connections.insert(port.into(), net);
        Ok(())
    }

    fn find_port(&self, name: &str) -> Option<usize> {
        self.ports.iter().position(|p| p.name == name)
    }

    fn unknown_port(&self, port: &str) -> ConstructionError {
        ConstructionError::UnknownInstancePort {
            instance: self.name.clone(),
            module: self.module_name.clone(),
            port: port.into(),
        }
    }
}
