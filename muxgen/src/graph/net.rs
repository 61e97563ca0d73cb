use std::ptr;

/// The minimum allowed bit width for any port, signal or expression.
pub const MIN_NET_BIT_WIDTH: u32 = 1;
/// The maximum allowed bit width for any port, signal or expression.
///
/// Values are carried as `u64` literals, so nothing wider can be represented.
pub const MAX_NET_BIT_WIDTH: u32 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// A named port on a module's external interface, created by [`ModuleBuilder::input`] or [`ModuleBuilder::output`].
///
/// [`ModuleBuilder::input`]: ./struct.ModuleBuilder.html#method.input
/// [`ModuleBuilder::output`]: ./struct.ModuleBuilder.html#method.output
#[derive(Debug, PartialEq, Eq)]
pub struct Port {
    pub(crate) name: String,
    pub(crate) direction: Direction,
    pub(crate) bit_width: u32,
}

impl Port {
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

/// An internal, combinational wire of a module, created by [`ModuleBuilder::signal`].
///
/// [`ModuleBuilder::signal`]: ./struct.ModuleBuilder.html#method.signal
#[derive(Debug, PartialEq, Eq)]
pub struct Signal {
    pub(crate) name: String,
    pub(crate) bit_width: u32,
}

impl Signal {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }
}

/// Either a [`Port`] or a [`Signal`]; anything that can be read by name or driven.
///
/// Equality is identity: two `Net`s are equal only if they refer to the same arena allocation.
#[derive(Clone, Copy, Debug)]
pub enum Net<'a> {
    Port(&'a Port),
    Signal(&'a Signal),
}

impl<'a> Net<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            Net::Port(port) => &port.name,
            Net::Signal(signal) => &signal.name,
        }
    }

    pub fn bit_width(&self) -> u32 {
        match *self {
            Net::Port(port) => port.bit_width,
            Net::Signal(signal) => signal.bit_width,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Net::Port(port) if port.direction == Direction::Input)
    }
}

impl<'a> PartialEq for Net<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Net::Port(a), Net::Port(b)) => ptr::eq(a, b),
            (Net::Signal(a), Net::Signal(b)) => ptr::eq(a, b),
            _ => false,
        }
    }
}

impl<'a> Eq for Net<'a> {}

impl<'a> From<&'a Port> for Net<'a> {
    fn from(port: &'a Port) -> Net<'a> {
        Net::Port(port)
    }
}

impl<'a> From<&'a Signal> for Net<'a> {
    fn from(signal: &'a Signal) -> Net<'a> {
        Net::Signal(signal)
    }
}

/// The destination of an assignment: a whole net, or a single bit of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target<'a> {
    pub net: Net<'a>,
    pub bit: Option<u32>,
}

impl<'a> Target<'a> {
    pub fn whole<N: Into<Net<'a>>>(net: N) -> Target<'a> {
        Target {
            net: net.into(),
            bit: None,
        }
    }

    pub fn bit<N: Into<Net<'a>>>(net: N, index: u32) -> Target<'a> {
        Target {
            net: net.into(),
            bit: Some(index),
        }
    }

    pub fn bit_width(&self) -> u32 {
        match self.bit {
            Some(_) => 1,
            None => self.net.bit_width(),
        }
    }

    /// The range of bits of `net` covered by this target, as `(low, high)` inclusive.
    pub fn bit_range(&self) -> (u32, u32) {
        match self.bit {
            Some(index) => (index, index),
            None => (0, self.net.bit_width() - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_identity() {
        let a = Signal {
            name: "a".into(),
            bit_width: 1,
        };
        let b = Signal {
            name: "a".into(),
            bit_width: 1,
        };

        assert_eq!(Net::from(&a), Net::from(&a));
        assert_ne!(Net::from(&a), Net::from(&b));
    }

    #[test]
    fn target_ranges() {
        let p = Port {
            name: "sig_out".into(),
            direction: Direction::Output,
            bit_width: 8,
        };

        assert_eq!(Target::whole(&p).bit_range(), (0, 7));
        assert_eq!(Target::whole(&p).bit_width(), 8);
        assert_eq!(Target::bit(&p, 3).bit_range(), (3, 3));
        assert_eq!(Target::bit(&p, 3).bit_width(), 1);
        assert!(!Net::from(&p).is_input());
    }
}
