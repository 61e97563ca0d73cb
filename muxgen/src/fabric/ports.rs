use crate::error::ConstructionError;
use crate::graph::*;
use crate::params::Params;

use std::collections::BTreeMap;

pub const SIG_IN: &str = "sig_in";
pub const SIG_OUT: &str = "sig_out";
pub const SIG_DIR: &str = "sig_dir";

/// The three single-bit ports every (channel, slot) pair owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EndpointRole {
    /// Hardware direction request from the alternate.
    DirectionControl,
    /// Channel input delivered to the alternate.
    Incoming,
    /// Alternate's value offered to the channel output.
    Outgoing,
}

impl EndpointRole {
    pub const ALL: [EndpointRole; 3] = [
        EndpointRole::DirectionControl,
        EndpointRole::Incoming,
        EndpointRole::Outgoing,
    ];

    pub fn direction(self) -> Direction {
        match self {
            EndpointRole::DirectionControl => Direction::Input,
            EndpointRole::Incoming => Direction::Output,
            EndpointRole::Outgoing => Direction::Input,
        }
    }

    /// The port name for this role at `(channel, slot)`. Both indices appear in every name, so names never collide across pairs.
    pub fn port_name(self, channel: u32, slot: u32) -> String {
        match self {
            EndpointRole::DirectionControl => format!("sig{}ctl{}", channel, slot),
            EndpointRole::Incoming => format!("sig{}incoming{}", channel, slot),
            EndpointRole::Outgoing => format!("sig{}outgoing{}", channel, slot),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
    pub channel: u32,
    pub slot: u32,
    pub role: EndpointRole,
}

/// The fabric's external ports: the whole-width `sig_in`/`sig_out`/`sig_dir` buses and every per-(channel, slot) endpoint port, looked up by typed key.
#[derive(Debug)]
pub struct FabricPorts<'a> {
    pub sig_in: &'a Port,
    pub sig_out: &'a Port,
    pub sig_dir: &'a Port,
    endpoints: BTreeMap<EndpointKey, &'a Port>,
}

impl<'a> FabricPorts<'a> {
    /// Declares the fabric's ports on `m`.
    ///
    /// Endpoint ports are declared grouped by role (all direction controls, then all incoming, then all outgoing), each group in `(channel, slot)` order.
    pub fn allocate(
        m: &mut ModuleBuilder<'a>,
        params: &Params,
    ) -> Result<FabricPorts<'a>, ConstructionError> {
        let sig_in = m.input(SIG_IN, params.signal_count())?;
        let sig_out = m.output(SIG_OUT, params.signal_count())?;
        let sig_dir = m.output(SIG_DIR, params.signal_count())?;

        let mut endpoints = BTreeMap::new();
        for role in EndpointRole::ALL.iter().copied() {
            for channel in 0..params.signal_count() {
                for slot in 0..params.slot_count() {
                    let name = role.port_name(channel, slot);
                    let port = match role.direction() {
                        Direction::Input => m.input(name, 1)?,
                        Direction::Output => m.output(name, 1)?,
                    };
                    endpoints.insert(
                        EndpointKey {
                            channel,
                            slot,
                            role,
                        },
                        port,
                    );
                }
            }
        }

        Ok(FabricPorts {
            sig_in,
            sig_out,
            sig_dir,
            endpoints,
        })
    }

    pub fn endpoint(&self, key: EndpointKey) -> Result<&'a Port, ConstructionError> {
        self.endpoints
            .get(&key)
            .copied()
            .ok_or(ConstructionError::UnknownEndpoint {
                channel: key.channel,
                slot: key.slot,
            })
    }

    /// Number of slots allocated for `channel`.
    pub fn slot_count(&self, channel: u32) -> u32 {
        self.endpoints
            .keys()
            .filter(|key| key.channel == channel && key.role == EndpointRole::DirectionControl)
            .count() as u32
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}
