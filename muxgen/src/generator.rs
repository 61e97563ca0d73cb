use crate::bus::*;
use crate::error::{ConstructionError, Result};
use crate::fabric::*;
use crate::graph::*;
use crate::params::{BusConfig, Limits, Params};
use crate::regmap::RegisterMap;
use crate::render::Renderer;
use crate::verilog::Verilog;

use tracing::{debug, info};

use std::fmt;
use std::io::Write;

/// Everything one generation run produces: the elaborated top-level module, its channels and the register map the bus slave implements.
///
/// Built once by [`Generator::generate`] and immutable afterwards.
pub struct StructuralModel<'a> {
    params: Params,
    bus: BusConfig,
    module: Module<'a>,
    channels: Vec<Channel<'a>>,
    register_map: RegisterMap,
}

impl<'a> StructuralModel<'a> {
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn bus(&self) -> &BusConfig {
        &self.bus
    }

    pub fn module(&self) -> &Module<'a> {
        &self.module
    }

    pub fn channels(&self) -> &[Channel<'a>] {
        &self.channels
    }

    pub fn register_map(&self) -> &RegisterMap {
        &self.register_map
    }

    /// The opaque bus-slave instance.
    pub fn slave(&self) -> Option<&Instance<'a>> {
        self.module
            .instances()
            .iter()
            .find(|i| i.name() == SLAVE_INSTANCE_NAME)
    }
}

impl<'a> fmt::Debug for StructuralModel<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuralModel")
            .field("params", &self.params)
            .field("bus", &self.bus)
            .field("module", &self.module)
            .field("channels", &self.channels.len())
            .field("register_fields", &self.register_map.fields().len())
            .finish()
    }
}

/// Default top-level module name for a `(signal_count, alternate_count)` pair.
pub fn default_module_name(params: &Params) -> String {
    format!(
        "aximux__{}__{}",
        params.signal_count(),
        params.alternate_count()
    )
}

/// Configures and runs generation.
///
/// # Examples
///
/// ```
/// use muxgen::*;
///
/// let c = Context::new();
/// let model = Generator::new()
///     .module_name("pinmux")
///     .generate(&c, 4, 2)
///     .unwrap();
///
/// assert_eq!(model.module().name(), "pinmux");
/// assert_eq!(model.channels().len(), 4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Generator {
    limits: Limits,
    bus: BusConfig,
    module_name: Option<String>,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl Generator {
    pub fn new() -> Generator {
        Generator::default()
    }

    pub fn limits(mut self, limits: Limits) -> Generator {
        self.limits = limits;
        self
    }

    pub fn bus(mut self, bus: BusConfig) -> Generator {
        self.bus = bus;
        self
    }

    /// Overrides the default `aximux__<signal_count>__<alternate_count>` module name.
    pub fn module_name<S: Into<String>>(mut self, name: S) -> Generator {
        self.module_name = Some(name.into());
        self
    }

    /// Validates the parameters and elaborates the complete design in `c`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Param`] if either count is out of bounds; nothing is elaborated in that case. Any other failure is an [`Error::Construction`].
    ///
    /// [`Error::Param`]: ./enum.Error.html#variant.Param
    /// [`Error::Construction`]: ./enum.Error.html#variant.Construction
    pub fn generate<'a>(
        &self,
        c: &'a Context<'a>,
        signal_count: i64,
        alternate_count: i64,
    ) -> Result<StructuralModel<'a>> {
        let params = Params::with_limits(signal_count, alternate_count, &self.limits)?;
        let order: Vec<u32> = (0..params.signal_count()).collect();
        self.build(c, params, &order)
    }

    /// Elaborates channels in `order`, which must be a permutation of the channel indices.
    pub(crate) fn build<'a>(
        &self,
        c: &'a Context<'a>,
        params: Params,
        order: &[u32],
    ) -> Result<StructuralModel<'a>> {
        info!(
            signal_count = params.signal_count(),
            alternate_count = params.alternate_count(),
            "generating multiplexer"
        );

        let register_map = RegisterMap::build(&params, &self.bus)?;

        let name = self
            .module_name
            .clone()
            .unwrap_or_else(|| default_module_name(&params));
        if !is_identifier(&name) {
            return Err(ConstructionError::InvalidModuleName { name }.into());
        }
        let mut m = c.module(name);
        let bus_ports = BusInterface::declare(&mut m, BUS_PREFIX, &self.bus)?;
        let ports = FabricPorts::allocate(&mut m, &params)?;
        let channels = allocate_channels(&mut m, &ports, &params)?;
        debug!(
            endpoints = ports.endpoint_count(),
            channels = channels.len(),
            "allocated fabric"
        );

        for &index in order.iter() {
            channels
                .get(index as usize)
                .ok_or(ConstructionError::UnknownChannel { channel: index })?
                .elaborate(&mut m, &ports)?;
        }

        let slave = slave_instance(&params, &self.bus, &register_map, &bus_ports, &channels)?;
        m.add_instance(slave)?;

        let module = m.elaborate()?;
        info!(
            module = module.name(),
            ports = module.ports().len(),
            signals = module.signals().len(),
            assignments = module.assignments().len(),
            "elaborated"
        );

        Ok(StructuralModel {
            params,
            bus: self.bus,
            module,
            channels,
            register_map,
        })
    }
}

/// Generates the design for `(signal_count, alternate_count)` with default limits and bus geometry.
pub fn generate<'a>(
    c: &'a Context<'a>,
    signal_count: i64,
    alternate_count: i64,
) -> Result<StructuralModel<'a>> {
    Generator::new().generate(c, signal_count, alternate_count)
}

/// Hands `model` to `renderer`, writing the artifact to `w`.
pub fn render<R: Renderer, W: Write>(model: &StructuralModel<'_>, renderer: &R, w: W) -> Result<()> {
    renderer.render(model, w)?;
    Ok(())
}

/// Generates the design and renders it as Verilog in one step.
pub fn generate_verilog(signal_count: i64, alternate_count: i64) -> Result<String> {
    let c = Context::new();
    let model = generate(&c, signal_count, alternate_count)?;
    let text = Verilog.render_to_string(&model)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;
    use crate::params::ParamError;

    #[test]
    fn default_name() {
        let c = Context::new();
        let model = generate(&c, 8, 4).unwrap();

        assert_eq!(model.module().name(), "aximux__8__4");
        assert_eq!(model.params(), &Params::new(8, 4).unwrap());
        assert_eq!(model.bus(), &BusConfig::default());
    }

    #[test]
    fn parameters_are_checked_before_elaboration() {
        let c = Context::new();

        assert!(matches!(
            generate(&c, 8, 0),
            Err(Error::Param(ParamError::InvalidAlternateCount { count: 0 }))
        ));
    }

    #[test]
    fn custom_limits() {
        let c = Context::new();
        let generator = Generator::new().limits(Limits {
            max_signals: 2,
            max_alternates: 15,
        });

        assert!(generator.generate(&c, 2, 3).is_ok());
        assert!(matches!(
            generator.generate(&c, 3, 3),
            Err(Error::Param(ParamError::TooManySignals { count: 3, max: 2 }))
        ));
    }

    #[test]
    fn limits_are_capped_at_fixed_ceilings() {
        let c = Context::new();
        let generator = Generator::new().limits(Limits {
            max_signals: u32::MAX,
            max_alternates: 31,
        });

        assert!(matches!(
            generator.generate(&c, 1, 17),
            Err(Error::Param(ParamError::TooManyAlternates { count: 17, max: 15 }))
        ));
        assert!(matches!(
            generator.generate(&c, 1_100_000_000, 4),
            Err(Error::Param(ParamError::TooManySignals {
                count: 1_100_000_000,
                max: 32
            }))
        ));
        assert!(generator.generate(&c, 32, 15).is_ok());
    }

    #[test]
    fn module_name_must_be_an_identifier() {
        let c = Context::new();

        for name in ["my-mux", "a b", "0mux", ""].iter() {
            match Generator::new().module_name(*name).generate(&c, 2, 2) {
                Err(Error::Construction(ConstructionError::InvalidModuleName { name: n })) => {
                    assert_eq!(n, *name)
                }
                Err(other) => panic!("\"{}\": unexpected error {}", name, other),
                Ok(_) => panic!("\"{}\" was accepted", name),
            }
        }
        assert!(Generator::new()
            .module_name("_pinmux0")
            .generate(&c, 2, 2)
            .is_ok());
    }

    #[test]
    fn slave_is_attached() {
        let c = Context::new();
        let model = generate(&c, 2, 2).unwrap();
        let slave = model.slave().unwrap();

        assert_eq!(slave.module_name(), SLAVE_MODULE_NAME);
        assert_eq!(
            slave.connection("SHORTSEL1").map(|n| n.name()),
            Some("shortsel1")
        );
    }

    #[test]
    fn unknown_channel_in_order_error() {
        let c = Context::new();
        let params = Params::new(2, 1).unwrap();

        assert!(matches!(
            Generator::new().build(&c, params, &[0, 2]),
            Err(Error::Construction(ConstructionError::UnknownChannel { channel: 2 }))
        ));
    }

    #[test]
    fn elaboration_order_has_no_effect() {
        let forward = Context::new();
        let reversed = Context::new();
        let params = Params::new(6, 5).unwrap();
        let order: Vec<u32> = (0..6).collect();
        let reverse: Vec<u32> = (0..6).rev().collect();

        let a = Generator::new().build(&forward, params, &order).unwrap();
        let b = Generator::new().build(&reversed, params, &reverse).unwrap();

        assert_eq!(
            Verilog.render_to_string(&a).unwrap(),
            Verilog.render_to_string(&b).unwrap()
        );
    }
}
