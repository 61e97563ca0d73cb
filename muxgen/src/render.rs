use crate::generator::StructuralModel;

use std::io::{self, Write};

/// Turns a finished [`StructuralModel`] into a text artifact.
///
/// The generator only depends on this trait; the concrete output syntax lives entirely in implementors such as [`Verilog`] and [`CHeader`].
///
/// [`StructuralModel`]: ./struct.StructuralModel.html
/// [`Verilog`]: ./struct.Verilog.html
/// [`CHeader`]: ./struct.CHeader.html
pub trait Renderer {
    fn render<W: Write>(&self, model: &StructuralModel<'_>, w: W) -> io::Result<()>;

    fn render_to_string(&self, model: &StructuralModel<'_>) -> io::Result<String> {
        let mut buf = Vec::new();
        self.render(model, &mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
