use crate::params::ParamError;

use thiserror::Error;

use std::io;

/// An internal invariant was violated while building the structural model.
///
/// These are generator logic errors; a run that hits one produces no artifact.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("\"{name}\" is not a valid module name")]
    InvalidModuleName { name: String },
    #[error("module \"{module}\" already contains a net or instance called \"{name}\"")]
    DuplicateName { module: String, name: String },
    #[error("cannot create \"{name}\" with {bit_width} bit(s), widths must be in the range [{min}, {max}]")]
    InvalidWidth {
        name: String,
        bit_width: u32,
        min: u32,
        max: u32,
    },
    #[error("{context}: expected {expected} bit(s) but got {actual}")]
    WidthMismatch {
        context: String,
        expected: u32,
        actual: u32,
    },
    #[error("bit index {index} is out of range for \"{name}\" with a width of {bit_width} bit(s)")]
    BitIndexOutOfRange {
        name: String,
        index: u32,
        bit_width: u32,
    },
    #[error("value {value} does not fit into {bit_width} bit(s)")]
    ValueTooWide { value: u64, bit_width: u32 },
    #[error("an indexed mux needs at least one case")]
    EmptyMux,
    #[error("\"{name}\" does not belong to module \"{module}\"")]
    ForeignNet { module: String, name: String },
    #[error("\"{name}\" is an input of module \"{module}\" and cannot be driven from inside it")]
    DrivesInput { module: String, name: String },
    #[error("bit {bit} of \"{name}\" is driven more than once")]
    MultipleDrivers { name: String, bit: u32 },
    #[error("bit {bit} of \"{name}\" is never driven")]
    Undriven { name: String, bit: u32 },
    #[error("channel {channel} has no alternates, at least one alternate is required")]
    NoAlternates { channel: u32 },
    #[error("no channel {channel} exists")]
    UnknownChannel { channel: u32 },
    #[error("no endpoint port exists for channel {channel}, slot {slot}")]
    UnknownEndpoint { channel: u32, slot: u32 },
    #[error("a {bit_width}-bit source select for {alternate_count} alternates does not fit the {available}-bit register field")]
    SelectWidth {
        alternate_count: u32,
        bit_width: u32,
        available: u32,
    },
    #[error("instance \"{instance}\" of \"{module}\" has no port called \"{port}\"")]
    UnknownInstancePort {
        instance: String,
        module: String,
        port: String,
    },
    #[error("instance \"{instance}\" already has a port called \"{port}\"")]
    DuplicateInstancePort { instance: String, port: String },
    #[error("port \"{port}\" of instance \"{instance}\" is already connected")]
    AlreadyConnected { instance: String, port: String },
    #[error("port \"{port}\" of instance \"{instance}\" is not connected")]
    Unconnected { instance: String, port: String },
    #[error("output \"{port}\" of instance \"{instance}\" cannot drive input \"{net}\"")]
    DirectionMismatch {
        instance: String,
        port: String,
        net: String,
    },
    #[error("register field \"{name}\" overlaps field \"{other}\" at address {address:#04x}")]
    FieldOverlap {
        name: String,
        other: String,
        address: u32,
    },
    #[error("register field \"{name}\" does not fit a {data_width}-bit register")]
    FieldTooWide { name: String, data_width: u32 },
    #[error("register address {address:#04x} is not reachable with a {addr_width}-bit address bus")]
    AddressOutOfRange { address: u32, addr_width: u32 },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
