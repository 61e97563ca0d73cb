//! Verilog code generation.

use crate::code_writer::CodeWriter;
use crate::generator::StructuralModel;
use crate::graph::*;
use crate::regmap::RegisterField;
use crate::render::Renderer;

use std::io::{Result, Write};

/// Renders a [`StructuralModel`] as a single Verilog-2001 module.
///
/// Every routing rule becomes one continuous `assign`, the bus slave becomes a parameterised instantiation, and the register map is listed in a comment block above the module.
///
/// # Examples
///
/// ```
/// use muxgen::*;
///
/// let c = Context::new();
/// let model = generate(&c, 2, 3).unwrap();
/// let verilog = Verilog.render_to_string(&model).unwrap();
///
/// assert!(verilog.contains("module aximux__2__3("));
/// assert!(verilog.contains("assign sig_dir[1] = diren1 ? hw_dir_sig1 : dirctl1;"));
/// ```
///
/// [`StructuralModel`]: ./struct.StructuralModel.html
#[derive(Clone, Copy, Debug, Default)]
pub struct Verilog;

impl Renderer for Verilog {
    fn render<W: Write>(&self, model: &StructuralModel<'_>, w: W) -> Result<()> {
        let m = model.module();
        let mut w = CodeWriter::new(w);

        w.append_line(&format!(
            "// {}: {} signal(s), {} alternate(s) per signal",
            m.name(),
            model.params().signal_count(),
            model.params().alternate_count()
        ))?;
        w.append_line("//")?;
        w.append_line(&format!(
            "// Control registers ({}-bit address, {}-bit data):",
            model.bus().addr_width,
            model.bus().data_width
        ))?;
        for field in model.register_map().fields().iter() {
            w.append_line(&register_comment(field))?;
        }
        w.append_newline()?;

        w.append_line(&format!("module {}(", m.name()))?;
        w.indent();
        let num_ports = m.ports().len();
        for (i, port) in m.ports().iter().enumerate() {
            w.append_indent()?;
            w.append(port.direction().keyword())?;
            w.append(" wire ")?;
            w.append(&range(port.bit_width()))?;
            w.append(port.name())?;
            if i < num_ports - 1 {
                w.append(",")?;
            }
            w.append_newline()?;
        }
        w.unindent()?;
        w.append_line(");")?;
        w.append_newline()?;
        w.indent();

        for signal in m.signals().iter() {
            w.append_line(&format!(
                "wire {}{};",
                range(signal.bit_width()),
                signal.name()
            ))?;
        }
        if !m.signals().is_empty() {
            w.append_newline()?;
        }

        for assignment in m.assignments().iter() {
            w.append_line(&format!(
                "assign {} = {};",
                target(assignment.target()),
                expr(assignment.expr())
            ))?;
        }
        if !m.assignments().is_empty() {
            w.append_newline()?;
        }

        for instance in m.instances().iter() {
            write_instance(&mut w, instance)?;
            w.append_newline()?;
        }

        w.unindent()?;
        w.append_line("endmodule")?;
        w.flush()
    }
}

fn register_comment(field: &RegisterField) -> String {
    let bits = if field.bit_width() > 1 {
        format!(
            "[{}:{}]",
            field.bit_offset() + field.bit_width() - 1,
            field.bit_offset()
        )
    } else {
        format!("[{}]", field.bit_offset())
    };
    let mut line = format!(
        "//   {:#04x}  {:<8}{}  {}",
        field.address(),
        bits,
        field.access().abbreviation(),
        field.name()
    );
    if let Some(value) = field.value() {
        line.push_str(&format!(" = {:#010x}", value));
    }
    line
}

fn write_instance<W: Write>(w: &mut CodeWriter<W>, instance: &Instance<'_>) -> Result<()> {
    if instance.parameters().is_empty() {
        w.append_line(&format!(
            "{} {} (",
            instance.module_name(),
            instance.name()
        ))?;
    } else {
        w.append_line(&format!("{} #(", instance.module_name()))?;
        w.indent();
        let num_parameters = instance.parameters().len();
        for (i, (name, value)) in instance.parameters().iter().enumerate() {
            let separator = if i < num_parameters - 1 { "," } else { "" };
            w.append_line(&format!(".{}({}){}", name, value, separator))?;
        }
        w.unindent()?;
        w.append_line(&format!(") {} (", instance.name()))?;
    }

    w.indent();
    let num_ports = instance.ports().len();
    for (i, port) in instance.ports().iter().enumerate() {
        let net = instance
            .connection(port.name())
            .map(|net| net.name())
            .unwrap_or("");
        let separator = if i < num_ports - 1 { "," } else { "" };
        w.append_line(&format!(".{}({}){}", port.name(), net, separator))?;
    }
    w.unindent()?;
    w.append_line(");")?;

    Ok(())
}

fn range(bit_width: u32) -> String {
    if bit_width > 1 {
        format!("[{}:{}] ", bit_width - 1, 0)
    } else {
        String::new()
    }
}

fn lit(value: u64, bit_width: u32) -> String {
    format!("{}'h{:x}", bit_width, value)
}

fn bit(net: Net<'_>, index: u32) -> String {
    if net.bit_width() > 1 {
        format!("{}[{}]", net.name(), index)
    } else {
        net.name().into()
    }
}

fn target(target: Target<'_>) -> String {
    match target.bit {
        Some(index) => bit(target.net, index),
        None => target.net.name().into(),
    }
}

fn expr(e: &Expr<'_>) -> String {
    match e.data() {
        ExprData::Lit { value, bit_width } => lit(*value, *bit_width),
        ExprData::Net(net) => net.name().into(),
        ExprData::Bit { net, index } => bit(*net, *index),
        ExprData::Eq { lhs, rhs } => format!("{} == {}", operand(lhs), operand(rhs)),
        ExprData::Mux {
            cond,
            when_true,
            when_false,
        } => format!(
            "{} ? {} : {}",
            operand(cond),
            operand(when_true),
            operand(when_false)
        ),
        ExprData::Select { sel, cases } => select(sel, cases),
    }
}

fn operand(e: &Expr<'_>) -> String {
    if e.is_compound() {
        format!("({})", expr(e))
    } else {
        expr(e)
    }
}

// Cases the selector can't address are dropped. When the remaining cases cover every selector value, the last one is the fallback; otherwise unaddressed values produce 0.
fn select(sel: &Expr<'_>, cases: &[&Expr<'_>]) -> String {
    let sel_width = sel.bit_width();
    let reachable: Vec<_> = cases
        .iter()
        .enumerate()
        .take_while(|(k, _)| fits(*k as u64, sel_width))
        .map(|(_, case)| *case)
        .collect();
    let covers_all = sel_width < 64 && reachable.len() as u64 == 1u64 << sel_width;

    let sel = operand(sel);
    let (chained, fallback) = match (covers_all, reachable.split_last()) {
        (true, Some((last, init))) => (init, operand(last)),
        _ => (&reachable[..], lit(0, cases[0].bit_width())),
    };
    let mut text = String::new();
    for (k, case) in chained.iter().enumerate() {
        text.push_str(&format!(
            "{} == {} ? {} : ",
            sel,
            lit(k as u64, sel_width),
            operand(case)
        ));
    }
    text.push_str(&fallback);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::generator::generate;

    fn render(signal_count: i64, alternate_count: i64) -> String {
        let c = Context::new();
        let model = generate(&c, signal_count, alternate_count).unwrap();
        Verilog.render_to_string(&model).unwrap()
    }

    #[test]
    fn minimal_design() {
        let verilog = render(1, 1);

        assert!(verilog.contains("module aximux__1__1(\n"));
        assert!(verilog.contains("    input wire s_axi_aclk,\n"));
        assert!(verilog.contains("    input wire [7:0] s_axi_awaddr,\n"));
        assert!(verilog.contains("    output wire [31:0] s_axi_rdata,\n"));
        assert!(verilog.contains("    output wire sig_out,\n"));
        assert!(verilog.contains("    input wire sig0outgoing1\n);\n"));
        assert!(verilog.contains("    wire srcsel0;\n"));
        assert!(verilog
            .contains("    assign hw_dir_sig0 = srcsel0 == 1'h0 ? sig0ctl0 : sig0ctl1;\n"));
        assert!(verilog.contains("    assign sig_dir = diren0 ? hw_dir_sig0 : dirctl0;\n"));
        assert!(verilog
            .contains("    assign sig_out = srcsel0 == 1'h0 ? sig0outgoing0 : sig0outgoing1;\n"));
        assert!(verilog.contains(
            "    assign sig0incoming1 = (srcsel0 == 1'h1) ? sig_in : (shortsel0 ? sig_in : 1'h0);\n"
        ));
        assert!(verilog.ends_with("endmodule\n"));
    }

    #[test]
    fn unreachable_reserved_slot_is_dropped() {
        let verilog = render(2, 4);

        assert!(verilog.contains(
            "    assign sig_out[1] = srcsel1 == 2'h0 ? sig1outgoing0 : srcsel1 == 2'h1 ? sig1outgoing1 : srcsel1 == 2'h2 ? sig1outgoing2 : sig1outgoing3;\n"
        ));
        assert!(verilog.contains("    assign sig1incoming4 = shortsel1 ? sig_in[1] : 1'h0;\n"));
    }

    #[test]
    fn unaddressed_selector_values_default_to_zero() {
        let verilog = render(1, 5);

        assert!(verilog.contains("srcsel0 == 3'h5 ? sig0ctl5 : 1'h0;\n"));
        assert!(verilog.contains("    wire [2:0] srcsel0;\n"));
    }

    #[test]
    fn register_map_comment() {
        let verilog = render(2, 3);

        assert!(verilog.contains("//   0x00  [1:0]   RW  srcsel0\n"));
        assert!(verilog.contains("//   0x04  [7]     RW  dirctl1\n"));
        assert!(verilog.contains("//   0x80  [15:0]  RO  MUXINFO = 0x00000302\n"));
    }

    #[test]
    fn slave_instantiation() {
        let verilog = render(1, 2);

        assert!(verilog.contains(
            "    aximux_axi_slave #(\n        .C_S_AXI_ADDR_WIDTH(8),\n        .C_S_AXI_DATA_WIDTH(32),\n        .C_SIG_COUNT(1),\n        .C_ALT_SIG_COUNT(2)\n    ) axislave (\n"
        ));
        assert!(verilog.contains("        .S_AXI_AWADDR(s_axi_awaddr),\n"));
        assert!(verilog.contains("        .SRCSEL0(srcsel0),\n"));
        assert!(verilog.contains("        .DIRCTL0(dirctl0)\n    );\n"));
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(render(8, 4), render(8, 4));
    }

    #[test]
    fn instance_without_parameters() {
        let mut buf = Vec::new();
        {
            let c = Context::new();
            let mut m = c.module("top");
            let i = m.input("i", 4).unwrap();
            let mut inst = Instance::new("u", "core");
            inst.port("d", Direction::Input, 4).unwrap();
            inst.connect("d", i).unwrap();
            m.add_instance(inst).unwrap();
            let module = m.elaborate().unwrap();

            let mut w = CodeWriter::new(&mut buf);
            write_instance(&mut w, &module.instances()[0]).unwrap();
        }

        assert_eq!(String::from_utf8(buf).unwrap(), "core u (\n    .d(i)\n);\n");
    }
}
