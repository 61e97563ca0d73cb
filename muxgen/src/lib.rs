//! A structural generator for runtime-reconfigurable signal multiplexers with an AXI4-Lite control interface.
//!
//! Given a signal count and an alternate count, muxgen elaborates a complete design: `signal_count` channels, each routable among `alternate_count` alternates (plus one reserved direct slot), with per-channel source-select, short-circuit and direction-override controls exposed through memory-mapped registers. The design is held in a renderer-agnostic [`StructuralModel`], which can be rendered as [Verilog](struct.Verilog.html) or as a [C header](struct.CHeader.html) describing the register map.
//!
//! # Examples
//!
//! ```rust
//! # fn main() -> muxgen::Result<()> {
//! use muxgen::*;
//!
//! // Create a context, which will own the design's ports, signals and expressions
//! let c = Context::new();
//!
//! // Elaborate 8 channels with 4 alternates each
//! let model = generate(&c, 8, 4)?;
//! assert_eq!(model.channels().len(), 8);
//! assert_eq!(model.register_map().fields().len(), 8 * 4 + 1);
//!
//! // Render verilog code
//! render(&model, &Verilog, std::io::stdout())?;
//!
//! // Render a C header for drivers
//! render(&model, &CHeader, std::io::stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! [`StructuralModel`]: ./struct.StructuralModel.html

mod bus;
mod c_header;
mod code_writer;
mod error;
#[cfg(test)]
mod eval;
mod fabric;
mod generator;
mod graph;
mod params;
mod regmap;
mod render;
mod validation;
mod verilog;

pub use bus::*;
pub use c_header::*;
pub use error::*;
pub use fabric::*;
pub use generator::*;
pub use graph::*;
pub use params::*;
pub use regmap::*;
pub use render::*;
pub use verilog::*;
