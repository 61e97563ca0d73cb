use super::ports::*;

use crate::error::ConstructionError;
use crate::graph::*;
use crate::params::Params;

use tracing::debug;

use std::collections::BTreeMap;

/// The internal selection signals each channel owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectRole {
    SourceSelect,
    ShortCircuit,
    DirectionEnable,
    DirectionOverride,
    HardwareDirection,
}

impl SelectRole {
    pub const ALL: [SelectRole; 5] = [
        SelectRole::SourceSelect,
        SelectRole::ShortCircuit,
        SelectRole::DirectionEnable,
        SelectRole::DirectionOverride,
        SelectRole::HardwareDirection,
    ];

    /// Roles driven by the bus slave's control registers, in register order.
    pub const REGISTER_MAPPED: [SelectRole; 4] = [
        SelectRole::SourceSelect,
        SelectRole::ShortCircuit,
        SelectRole::DirectionEnable,
        SelectRole::DirectionOverride,
    ];

    pub fn signal_name(self, channel: u32) -> String {
        let prefix = match self {
            SelectRole::SourceSelect => "srcsel",
            SelectRole::ShortCircuit => "shortsel",
            SelectRole::DirectionEnable => "diren",
            SelectRole::DirectionOverride => "dirctl",
            SelectRole::HardwareDirection => "hw_dir_sig",
        };
        format!("{}{}", prefix, channel)
    }

    pub fn bit_width(self, params: &Params) -> u32 {
        match self {
            SelectRole::SourceSelect => params.select_width(),
            _ => 1,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ChannelSignals<'a> {
    pub source_select: &'a Signal,
    pub short_circuit: &'a Signal,
    pub direction_enable: &'a Signal,
    pub direction_override: &'a Signal,
    pub hardware_direction: &'a Signal,
}

impl<'a> ChannelSignals<'a> {
    pub fn get(&self, role: SelectRole) -> &'a Signal {
        match role {
            SelectRole::SourceSelect => self.source_select,
            SelectRole::ShortCircuit => self.short_circuit,
            SelectRole::DirectionEnable => self.direction_enable,
            SelectRole::DirectionOverride => self.direction_override,
            SelectRole::HardwareDirection => self.hardware_direction,
        }
    }
}

/// The three ports of one (channel, slot) pair. Never mutated after allocation.
#[derive(Clone, Copy, Debug)]
pub struct AlternateEndpoint<'a> {
    pub slot: u32,
    pub direction_control: &'a Port,
    pub incoming: &'a Port,
    pub outgoing: &'a Port,
}

/// One muxed signal line.
#[derive(Debug)]
pub struct Channel<'a> {
    index: u32,
    signals: ChannelSignals<'a>,
    endpoints: Vec<AlternateEndpoint<'a>>,
}

/// Declares the selection signals of every channel on `m` and gathers each channel's endpoint ports from `ports`.
///
/// Signals are declared grouped by role (every `srcsel`, then every `shortsel`, ...), each group in channel order.
pub fn allocate_channels<'a>(
    m: &mut ModuleBuilder<'a>,
    ports: &FabricPorts<'a>,
    params: &Params,
) -> Result<Vec<Channel<'a>>, ConstructionError> {
    let mut signals = BTreeMap::new();
    for role in SelectRole::ALL.iter().copied() {
        for channel in 0..params.signal_count() {
            let signal = m.signal(role.signal_name(channel), role.bit_width(params))?;
            signals.insert((channel, role), signal);
        }
    }

    let mut channels = Vec::with_capacity(params.signal_count() as usize);
    for index in 0..params.signal_count() {
        let signals = ChannelSignals {
            source_select: signals[&(index, SelectRole::SourceSelect)],
            short_circuit: signals[&(index, SelectRole::ShortCircuit)],
            direction_enable: signals[&(index, SelectRole::DirectionEnable)],
            direction_override: signals[&(index, SelectRole::DirectionOverride)],
            hardware_direction: signals[&(index, SelectRole::HardwareDirection)],
        };
        channels.push(Channel::new(index, signals, ports)?);
    }
    Ok(channels)
}

impl<'a> Channel<'a> {
    pub fn new(
        index: u32,
        signals: ChannelSignals<'a>,
        ports: &FabricPorts<'a>,
    ) -> Result<Channel<'a>, ConstructionError> {
        let endpoint = |slot, role| {
            ports.endpoint(EndpointKey {
                channel: index,
                slot,
                role,
            })
        };
        let endpoints = (0..ports.slot_count(index))
            .map(|slot| -> Result<AlternateEndpoint<'a>, ConstructionError> {
                Ok(AlternateEndpoint {
                    slot,
                    direction_control: endpoint(slot, EndpointRole::DirectionControl)?,
                    incoming: endpoint(slot, EndpointRole::Incoming)?,
                    outgoing: endpoint(slot, EndpointRole::Outgoing)?,
                })
            })
            .collect::<Result<Vec<_>, ConstructionError>>()?;
        Ok(Channel {
            index,
            signals,
            endpoints,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn signals(&self) -> &ChannelSignals<'a> {
        &self.signals
    }

    /// Every endpoint, including the reserved direct slot at the end.
    pub fn endpoints(&self) -> &[AlternateEndpoint<'a>] {
        &self.endpoints
    }

    /// Number of genuine alternates, excluding the reserved direct slot.
    pub fn alternate_count(&self) -> u32 {
        (self.endpoints.len() as u32).saturating_sub(1)
    }

    pub fn select_width(&self) -> u32 {
        self.signals.source_select.bit_width()
    }

    /// Emits this channel's routing rules into `m`:
    ///
    /// - `hw_dir_sig = ctl[srcsel]`
    /// - `sig_dir[c] = diren ? hw_dir_sig : dirctl`
    /// - `sig_out[c] = outgoing[srcsel]`
    /// - `incoming[k] = (srcsel == k) ? sig_in[c] : (shortsel ? sig_in[c] : 0)` for every slot `k`
    ///
    /// Channels share no state, so the order in which they are elaborated doesn't matter.
    pub fn elaborate(
        &self,
        m: &mut ModuleBuilder<'a>,
        ports: &FabricPorts<'a>,
    ) -> Result<(), ConstructionError> {
        if self.alternate_count() < 1 {
            return Err(ConstructionError::NoAlternates {
                channel: self.index,
            });
        }
        let s = &self.signals;
        let src_sel = m.net(s.source_select);

        let dir_controls: Vec<_> = self
            .endpoints
            .iter()
            .map(|e| m.net(e.direction_control))
            .collect();
        let hw_dir = src_sel.select(dir_controls)?;
        m.assign(Target::whole(s.hardware_direction), hw_dir)?;

        let dir = m
            .net(s.direction_enable)
            .mux(m.net(s.hardware_direction), m.net(s.direction_override))?;
        m.assign(Target::bit(ports.sig_dir, self.index), dir)?;

        let outgoing: Vec<_> = self.endpoints.iter().map(|e| m.net(e.outgoing)).collect();
        let out = src_sel.select(outgoing)?;
        m.assign(Target::bit(ports.sig_out, self.index), out)?;

        let sig_in = m.net_bit(ports.sig_in, self.index)?;
        let broadcast = m.net(s.short_circuit).mux(sig_in, m.low())?;
        for e in self.endpoints.iter() {
            let incoming = src_sel.eq_lit(u64::from(e.slot)).mux(sig_in, broadcast)?;
            m.assign(Target::whole(e.incoming), incoming)?;
        }

        debug!(
            channel = self.index,
            slots = self.endpoints.len(),
            select_width = self.select_width(),
            "elaborated channel"
        );
        Ok(())
    }
}
