//! Generation parameters, their bounds, and the bus geometry of the generated design.

use thiserror::Error;

/// The maximum number of muxed signals a single fabric may carry.
///
/// Each channel owns one 32-bit control register below the module-info register at `0x80`, so this also bounds the address space.
pub const MAX_SIGNALS: u32 = 32;
/// The maximum number of alternates per channel.
///
/// The source-select field has 4 bits available in the channel control register.
pub const MAX_ALT_SIGNALS: u32 = 15;

/// Data width of the generated AXI4-Lite slave interface.
pub const AXI_DATA_WIDTH: u32 = 32;
/// Byte address width of the generated AXI4-Lite slave interface. Wide enough to reach the module-info register.
pub const AXI_ADDR_WIDTH: u32 = 8;

/// Upper bounds applied by [`Params::with_limits`].
///
/// Limits can only tighten the fixed ceilings; anything above [`MAX_SIGNALS`] or [`MAX_ALT_SIGNALS`] is clamped to them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_signals: u32,
    pub max_alternates: u32,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            max_signals: MAX_SIGNALS,
            max_alternates: MAX_ALT_SIGNALS,
        }
    }
}

impl Limits {
    /// These limits, tightened to the fixed ceilings.
    pub fn clamped(&self) -> Limits {
        Limits {
            max_signals: self.max_signals.min(MAX_SIGNALS),
            max_alternates: self.max_alternates.min(MAX_ALT_SIGNALS),
        }
    }
}

/// Geometry of the memory-mapped control bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusConfig {
    pub addr_width: u32,
    pub data_width: u32,
}

impl Default for BusConfig {
    fn default() -> BusConfig {
        BusConfig {
            addr_width: AXI_ADDR_WIDTH,
            data_width: AXI_DATA_WIDTH,
        }
    }
}

impl BusConfig {
    /// Width of the write strobe, one bit per data byte.
    pub fn strobe_width(&self) -> u32 {
        (self.data_width + 7) / 8
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("alternate signal count {count} exceeds maximum of {max}")]
    TooManyAlternates { count: i64, max: u32 },
    #[error("signal count {count} exceeds maximum of {max}")]
    TooManySignals { count: i64, max: u32 },
    #[error("invalid signal count {count}, at least 1 signal is required")]
    InvalidSignalCount { count: i64 },
    #[error("invalid alternate signal count {count}, at least 1 alternate is required")]
    InvalidAlternateCount { count: i64 },
}

/// A validated `(signal_count, alternate_count)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Params {
    pub(crate) signal_count: u32,
    pub(crate) alternate_count: u32,
}

impl Params {
    /// Validates `signal_count` and `alternate_count` against the default [`Limits`].
    ///
    /// # Examples
    ///
    /// ```
    /// use muxgen::*;
    ///
    /// let params = Params::new(8, 4).unwrap();
    /// assert_eq!(params.slot_count(), 5);
    /// assert_eq!(params.select_width(), 2);
    ///
    /// assert_eq!(
    ///     Params::new(8, 16),
    ///     Err(ParamError::TooManyAlternates { count: 16, max: 15 })
    /// );
    /// ```
    pub fn new(signal_count: i64, alternate_count: i64) -> Result<Params, ParamError> {
        Params::with_limits(signal_count, alternate_count, &Limits::default())
    }

    pub fn with_limits(
        signal_count: i64,
        alternate_count: i64,
        limits: &Limits,
    ) -> Result<Params, ParamError> {
        let limits = limits.clamped();
        if alternate_count > i64::from(limits.max_alternates) {
            return Err(ParamError::TooManyAlternates {
                count: alternate_count,
                max: limits.max_alternates,
            });
        }
        if signal_count > i64::from(limits.max_signals) {
            return Err(ParamError::TooManySignals {
                count: signal_count,
                max: limits.max_signals,
            });
        }
        if signal_count < 1 {
            return Err(ParamError::InvalidSignalCount {
                count: signal_count,
            });
        }
        if alternate_count < 1 {
            return Err(ParamError::InvalidAlternateCount {
                count: alternate_count,
            });
        }
        Ok(Params {
            signal_count: signal_count as u32,
            alternate_count: alternate_count as u32,
        })
    }

    pub fn signal_count(&self) -> u32 {
        self.signal_count
    }

    pub fn alternate_count(&self) -> u32 {
        self.alternate_count
    }

    /// Number of endpoint slots per channel: one per alternate plus the reserved direct slot.
    pub fn slot_count(&self) -> u32 {
        self.alternate_count + 1
    }

    pub fn select_width(&self) -> u32 {
        select_width(self.alternate_count)
    }
}

/// `ceil(log2(value))`, with `clog2(0) == clog2(1) == 0`.
pub fn clog2(value: u32) -> u32 {
    if value <= 1 {
        0
    } else {
        32 - (value - 1).leading_zeros()
    }
}

/// Width of a channel's source-select field.
///
/// This is `ceil(log2(alternate_count))`, but never narrower than 1 bit, so a single-alternate channel can still choose between slot 0 and the direct slot.
pub fn select_width(alternate_count: u32) -> u32 {
    clog2(alternate_count).max(1)
}
