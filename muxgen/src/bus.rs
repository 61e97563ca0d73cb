//! The AXI4-Lite control bus and the opaque slave that implements the register map.

use crate::error::ConstructionError;
use crate::fabric::Channel;
use crate::graph::*;
use crate::params::{BusConfig, Params};
use crate::regmap::{FieldKind, RegisterMap};

use tracing::debug;

/// Prefix of the top-level bus ports, and of the slave's bus-facing ports before renaming.
pub const BUS_PREFIX: &str = "s_axi";

pub const SLAVE_MODULE_NAME: &str = "aximux_axi_slave";
pub const SLAVE_INSTANCE_NAME: &str = "axislave";

pub const PARAM_ADDR_WIDTH: &str = "C_S_AXI_ADDR_WIDTH";
pub const PARAM_DATA_WIDTH: &str = "C_S_AXI_DATA_WIDTH";
pub const PARAM_SIGNAL_COUNT: &str = "C_SIG_COUNT";
pub const PARAM_ALT_SIGNAL_COUNT: &str = "C_ALT_SIG_COUNT";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BusWidth {
    Fixed(u32),
    Address,
    Data,
    Strobe,
}

impl BusWidth {
    fn resolve(self, bus: &BusConfig) -> u32 {
        match self {
            BusWidth::Fixed(bit_width) => bit_width,
            BusWidth::Address => bus.addr_width,
            BusWidth::Data => bus.data_width,
            BusWidth::Strobe => bus.strobe_width(),
        }
    }
}

/// Every AXI4-Lite slave signal, with its direction as seen from the slave.
const AXI4_LITE_SLAVE: &[(&str, Direction, BusWidth)] = &[
    ("aclk", Direction::Input, BusWidth::Fixed(1)),
    ("aresetn", Direction::Input, BusWidth::Fixed(1)),
    ("awaddr", Direction::Input, BusWidth::Address),
    ("awprot", Direction::Input, BusWidth::Fixed(3)),
    ("awvalid", Direction::Input, BusWidth::Fixed(1)),
    ("awready", Direction::Output, BusWidth::Fixed(1)),
    ("wdata", Direction::Input, BusWidth::Data),
    ("wstrb", Direction::Input, BusWidth::Strobe),
    ("wvalid", Direction::Input, BusWidth::Fixed(1)),
    ("wready", Direction::Output, BusWidth::Fixed(1)),
    ("bresp", Direction::Output, BusWidth::Fixed(2)),
    ("bvalid", Direction::Output, BusWidth::Fixed(1)),
    ("bready", Direction::Input, BusWidth::Fixed(1)),
    ("araddr", Direction::Input, BusWidth::Address),
    ("arprot", Direction::Input, BusWidth::Fixed(3)),
    ("arvalid", Direction::Input, BusWidth::Fixed(1)),
    ("arready", Direction::Output, BusWidth::Fixed(1)),
    ("rdata", Direction::Output, BusWidth::Data),
    ("rresp", Direction::Output, BusWidth::Fixed(2)),
    ("rvalid", Direction::Output, BusWidth::Fixed(1)),
    ("rready", Direction::Input, BusWidth::Fixed(1)),
];

/// The top-level ports of an AXI4-Lite slave interface.
#[derive(Debug)]
pub struct BusInterface<'a> {
    prefix: String,
    ports: Vec<(&'static str, &'a Port)>,
}

impl<'a> BusInterface<'a> {
    /// Declares one port per AXI4-Lite signal on `m`, named `<prefix>_<signal>`.
    pub fn declare(
        m: &mut ModuleBuilder<'a>,
        prefix: &str,
        bus: &BusConfig,
    ) -> Result<BusInterface<'a>, ConstructionError> {
        let mut ports = Vec::with_capacity(AXI4_LITE_SLAVE.len());
        for &(signal, direction, width) in AXI4_LITE_SLAVE.iter() {
            let name = format!("{}_{}", prefix, signal);
            let port = match direction {
                Direction::Input => m.input(name, width.resolve(bus))?,
                Direction::Output => m.output(name, width.resolve(bus))?,
            };
            ports.push((signal, port));
        }
        Ok(BusInterface {
            prefix: prefix.into(),
            ports,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ports(&self) -> impl Iterator<Item = &'a Port> + '_ {
        self.ports.iter().map(|(_, port)| *port)
    }

    /// Looks up a port by its unprefixed AXI signal name, eg. `"awaddr"`.
    pub fn port(&self, signal: &str) -> Option<&'a Port> {
        self.ports
            .iter()
            .find(|(s, _)| *s == signal)
            .map(|(_, port)| *port)
    }
}

/// Builds the bus-slave instance and wires it up.
///
/// The slave's ports are declared under generic lower-case names, its bus-facing ports are bound to `bus_ports`, and then every port is renamed to upper case before the per-channel control outputs are bound to the selection signals of `channels`.
pub fn slave_instance<'a>(
    params: &Params,
    bus: &BusConfig,
    register_map: &RegisterMap,
    bus_ports: &BusInterface<'a>,
    channels: &[Channel<'a>],
) -> Result<Instance<'a>, ConstructionError> {
    let mut slave = Instance::new(SLAVE_INSTANCE_NAME, SLAVE_MODULE_NAME);
    slave.parameter(PARAM_ADDR_WIDTH, u64::from(bus.addr_width));
    slave.parameter(PARAM_DATA_WIDTH, u64::from(bus.data_width));
    slave.parameter(PARAM_SIGNAL_COUNT, u64::from(params.signal_count()));
    slave.parameter(PARAM_ALT_SIGNAL_COUNT, u64::from(params.alternate_count()));

    for &(signal, direction, width) in AXI4_LITE_SLAVE.iter() {
        let name = format!("{}_{}", BUS_PREFIX, signal);
        slave.port(name.as_str(), direction, width.resolve(bus))?;
        if let Some(port) = bus_ports.port(signal) {
            slave.connect(&name, port)?;
        }
    }
    for field in register_map.control_fields() {
        slave.port(field.name(), Direction::Output, field.bit_width())?;
    }

    let generic_names: Vec<String> = slave.ports().iter().map(|p| p.name().into()).collect();
    for name in generic_names.iter() {
        slave.rename_port(name, &name.to_uppercase())?;
    }

    for field in register_map.control_fields() {
        if let FieldKind::Control { channel, role } = field.kind() {
            let target = channels
                .iter()
                .find(|c| c.index() == channel)
                .ok_or(ConstructionError::UnknownChannel { channel })?;
            slave.connect(&field.name().to_uppercase(), target.signals().get(role))?;
        }
    }

    debug!(
        instance = SLAVE_INSTANCE_NAME,
        module = SLAVE_MODULE_NAME,
        ports = slave.ports().len(),
        "bound bus slave"
    );
    Ok(slave)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fabric::*;

    #[test]
    fn declares_axi4_lite_ports() {
        let c = Context::new();
        let mut m = c.module("top");
        let bus = BusConfig::default();

        let ports = BusInterface::declare(&mut m, BUS_PREFIX, &bus).unwrap();

        assert_eq!(ports.ports().count(), 21);
        assert_eq!(ports.prefix(), "s_axi");
        let awaddr = ports.port("awaddr").unwrap();
        assert_eq!(awaddr.name(), "s_axi_awaddr");
        assert_eq!(awaddr.bit_width(), 8);
        assert_eq!(ports.port("wstrb").unwrap().bit_width(), 4);
        assert_eq!(ports.port("rdata").unwrap().direction(), Direction::Output);
        assert_eq!(ports.port("rdata").unwrap().bit_width(), 32);
        assert!(ports.port("nope").is_none());
    }

    #[test]
    fn slave_ports_are_upper_case_and_bound() {
        let c = Context::new();
        let mut m = c.module("top");
        let params = Params::new(2, 3).unwrap();
        let bus = BusConfig::default();
        let map = RegisterMap::build(&params, &bus).unwrap();
        let bus_ports = BusInterface::declare(&mut m, BUS_PREFIX, &bus).unwrap();
        let fabric = FabricPorts::allocate(&mut m, &params).unwrap();
        let channels = allocate_channels(&mut m, &fabric, &params).unwrap();

        let slave = slave_instance(&params, &bus, &map, &bus_ports, &channels).unwrap();

        assert_eq!(slave.name(), SLAVE_INSTANCE_NAME);
        assert_eq!(slave.module_name(), SLAVE_MODULE_NAME);
        assert_eq!(slave.ports().len(), 21 + 2 * 4);
        assert!(slave
            .ports()
            .iter()
            .all(|p| p.name() == p.name().to_uppercase()));
        assert_eq!(
            slave.connection("S_AXI_AWADDR"),
            Some(Net::Port(bus_ports.port("awaddr").unwrap()))
        );
        assert_eq!(
            slave.connection("SRCSEL1"),
            Some(Net::Signal(channels[1].signals().source_select))
        );
        assert_eq!(
            slave.connection("DIRCTL0"),
            Some(Net::Signal(channels[0].signals().direction_override))
        );
        assert_eq!(slave.connection("srcsel1"), None);
        assert_eq!(
            slave.parameters(),
            &[
                (PARAM_ADDR_WIDTH.to_string(), 8u64),
                (PARAM_DATA_WIDTH.to_string(), 32u64),
                (PARAM_SIGNAL_COUNT.to_string(), 2u64),
                (PARAM_ALT_SIGNAL_COUNT.to_string(), 3u64),
            ][..]
        );
    }

    #[test]
    fn missing_channel_error() {
        let c = Context::new();
        let mut m = c.module("top");
        let params = Params::new(2, 1).unwrap();
        let bus = BusConfig::default();
        let map = RegisterMap::build(&params, &bus).unwrap();
        let bus_ports = BusInterface::declare(&mut m, BUS_PREFIX, &bus).unwrap();
        let fabric = FabricPorts::allocate(&mut m, &params).unwrap();
        let mut channels = allocate_channels(&mut m, &fabric, &params).unwrap();
        channels.truncate(1);

        assert_eq!(
            slave_instance(&params, &bus, &map, &bus_ports, &channels).unwrap_err(),
            ConstructionError::UnknownChannel { channel: 1 }
        );
    }
}
