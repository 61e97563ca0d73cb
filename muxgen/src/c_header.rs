//! C header generation for software drivers.

use crate::code_writer::CodeWriter;
use crate::fabric::SelectRole;
use crate::generator::StructuralModel;
use crate::regmap::*;
use crate::render::Renderer;

use std::io::{Result, Write};

/// Renders the register map of a [`StructuralModel`] as a C header.
///
/// Every macro is prefixed with the upper-cased module name, so headers for several parameterizations can be included side by side.
///
/// [`StructuralModel`]: ./struct.StructuralModel.html
#[derive(Clone, Copy, Debug, Default)]
pub struct CHeader;

fn role_suffix(role: SelectRole) -> &'static str {
    match role {
        SelectRole::SourceSelect => "SRCSEL",
        SelectRole::ShortCircuit => "SHORTSEL",
        SelectRole::DirectionEnable => "DIREN",
        SelectRole::DirectionOverride => "DIRCTL",
        SelectRole::HardwareDirection => "HWDIR",
    }
}

impl Renderer for CHeader {
    fn render<W: Write>(&self, model: &StructuralModel<'_>, w: W) -> Result<()> {
        let prefix = model.module().name().to_uppercase();
        let guard = format!("{}_H", prefix);
        let map = model.register_map();
        let mut w = CodeWriter::new(w);

        w.append_line(&format!(
            "/* Register map of {}. Generated by muxgen, do not edit. */",
            model.module().name()
        ))?;
        w.append_newline()?;
        w.append_line(&format!("#ifndef {}", guard))?;
        w.append_line(&format!("#define {}", guard))?;
        w.append_newline()?;

        w.append_line(&format!(
            "#define {}_SIG_COUNT {}",
            prefix,
            model.params().signal_count()
        ))?;
        w.append_line(&format!(
            "#define {}_ALT_SIG_COUNT {}",
            prefix,
            model.params().alternate_count()
        ))?;
        w.append_newline()?;

        w.append_line(&format!(
            "#define {}_REG_CTL(channel) ((channel) * {})",
            prefix, CONTROL_REGISTER_STRIDE
        ))?;
        for field in map.fields().iter() {
            if let FieldKind::Control {
                channel,
                role: SelectRole::SourceSelect,
            } = field.kind()
            {
                w.append_line(&format!(
                    "#define {}_REG_CTL{} {:#04x}",
                    prefix,
                    channel,
                    field.address()
                ))?;
            }
        }
        w.append_line(&format!(
            "#define {}_REG_{} {:#04x}",
            prefix, MODULE_INFO_NAME, MODULE_INFO_ADDRESS
        ))?;
        w.append_newline()?;

        // Every channel register shares channel 0's layout.
        for field in map.control_fields() {
            if let FieldKind::Control { channel: 0, role } = field.kind() {
                let name = format!("{}_{}", prefix, role_suffix(role));
                w.append_line(&format!("#define {}_SHIFT {}", name, field.bit_offset()))?;
                w.append_line(&format!("#define {}_MASK {:#04x}", name, field.mask()))?;
            }
        }
        w.append_newline()?;

        let field_mask = (1u32 << MODULE_INFO_FIELD_WIDTH) - 1;
        w.append_line(&format!(
            "#define {}_{}_SIG_COUNT(word) (((word) >> {}) & {:#04x})",
            prefix, MODULE_INFO_NAME, MODULE_INFO_SIGNAL_COUNT_OFFSET, field_mask
        ))?;
        w.append_line(&format!(
            "#define {}_{}_ALT_SIG_COUNT(word) (((word) >> {}) & {:#04x})",
            prefix, MODULE_INFO_NAME, MODULE_INFO_ALTERNATE_COUNT_OFFSET, field_mask
        ))?;
        w.append_line(&format!(
            "#define {}_{}_VALUE {:#010x}",
            prefix,
            MODULE_INFO_NAME,
            map.module_info_word()
        ))?;
        w.append_newline()?;

        w.append_line(&format!("#endif /* {} */", guard))?;
        w.flush()
    }
}
