//! The software-visible control register map.
//!
//! Every channel owns one 32-bit control register at byte address `4 * channel`:
//!
//! | bits              | field                            |
//! |-------------------|----------------------------------|
//! | `[0, select_width)` | source select (`srcsel<c>`)    |
//! | `4`               | reserved                         |
//! | `5`               | short circuit (`shortsel<c>`)    |
//! | `6`               | direction enable (`diren<c>`)    |
//! | `7`               | direction override (`dirctl<c>`) |
//!
//! A read-only module-info register at [`MODULE_INFO_ADDRESS`] exposes the elaborated signal and alternate counts.

use crate::error::ConstructionError;
use crate::fabric::SelectRole;
use crate::params::{BusConfig, Params};

use tracing::trace;

/// Byte stride between consecutive channel control registers.
pub const CONTROL_REGISTER_STRIDE: u32 = 4;
/// Byte address of the read-only module-info register.
pub const MODULE_INFO_ADDRESS: u32 = 0x80;
pub const MODULE_INFO_NAME: &str = "MUXINFO";

/// Bits reserved for the source-select field at the bottom of each control register.
pub const SOURCE_SELECT_FIELD_WIDTH: u32 = 4;
pub const SHORT_CIRCUIT_BIT: u32 = 5;
pub const DIRECTION_ENABLE_BIT: u32 = 6;
pub const DIRECTION_OVERRIDE_BIT: u32 = 7;

pub const MODULE_INFO_SIGNAL_COUNT_OFFSET: u32 = 0;
pub const MODULE_INFO_ALTERNATE_COUNT_OFFSET: u32 = 8;
pub const MODULE_INFO_FIELD_WIDTH: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

impl Access {
    pub fn abbreviation(self) -> &'static str {
        match self {
            Access::ReadOnly => "RO",
            Access::ReadWrite => "RW",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Drives the selection signal of `role` for `channel`.
    Control { channel: u32, role: SelectRole },
    /// The packed `(signal_count, alternate_count)` word.
    ModuleInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegisterField {
    name: String,
    kind: FieldKind,
    address: u32,
    bit_offset: u32,
    bit_width: u32,
    access: Access,
    /// Hardwired contents, for read-only fields.
    value: Option<u32>,
}

impl RegisterField {
    fn control(channel: u32, role: SelectRole, bit_offset: u32, bit_width: u32) -> RegisterField {
        RegisterField {
            name: role.signal_name(channel),
            kind: FieldKind::Control { channel, role },
            address: channel * CONTROL_REGISTER_STRIDE,
            bit_offset,
            bit_width,
            access: Access::ReadWrite,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn bit_offset(&self) -> u32 {
        self.bit_offset
    }

    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn value(&self) -> Option<u32> {
        self.value
    }

    /// The field's bits within its register word.
    pub fn mask(&self) -> u64 {
        ((1u64 << self.bit_width) - 1) << self.bit_offset
    }

    /// Name of the internal selection signal this field drives, if any.
    pub fn signal_name(&self) -> Option<String> {
        match self.kind {
            FieldKind::Control { channel, role } => Some(role.signal_name(channel)),
            FieldKind::ModuleInfo => None,
        }
    }

    fn overlaps(&self, other: &RegisterField) -> bool {
        self.address == other.address && self.mask() & other.mask() != 0
    }
}

/// The complete, deterministic register map for one `(signal_count, alternate_count)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegisterMap {
    fields: Vec<RegisterField>,
    data_width: u32,
}

impl RegisterMap {
    /// Derives the register map for `params` on a bus shaped like `bus`.
    ///
    /// Fields are ordered by address, then by bit offset; the module-info field comes last.
    ///
    /// # Examples
    ///
    /// ```
    /// use muxgen::*;
    ///
    /// let params = Params::new(8, 4).unwrap();
    /// let map = RegisterMap::build(&params, &BusConfig::default()).unwrap();
    ///
    /// assert_eq!(map.fields().len(), 8 * 4 + 1);
    /// assert_eq!(map.field("shortsel3").unwrap().address(), 0x0c);
    /// assert_eq!(decode_module_info(map.module_info_word()), (8, 4));
    /// ```
    pub fn build(params: &Params, bus: &BusConfig) -> Result<RegisterMap, ConstructionError> {
        let select_width = params.select_width();
        if select_width > SOURCE_SELECT_FIELD_WIDTH {
            return Err(ConstructionError::SelectWidth {
                alternate_count: params.alternate_count(),
                bit_width: select_width,
                available: SOURCE_SELECT_FIELD_WIDTH,
            });
        }

        let channel_limit = MODULE_INFO_ADDRESS / CONTROL_REGISTER_STRIDE;
        if params.signal_count() > channel_limit {
            return Err(ConstructionError::FieldOverlap {
                name: SelectRole::SourceSelect.signal_name(channel_limit),
                other: MODULE_INFO_NAME.into(),
                address: MODULE_INFO_ADDRESS,
            });
        }

        let mut fields = Vec::with_capacity(4 * params.signal_count() as usize + 1);
        for channel in 0..params.signal_count() {
            fields.push(RegisterField::control(
                channel,
                SelectRole::SourceSelect,
                0,
                select_width,
            ));
            fields.push(RegisterField::control(
                channel,
                SelectRole::ShortCircuit,
                SHORT_CIRCUIT_BIT,
                1,
            ));
            fields.push(RegisterField::control(
                channel,
                SelectRole::DirectionEnable,
                DIRECTION_ENABLE_BIT,
                1,
            ));
            fields.push(RegisterField::control(
                channel,
                SelectRole::DirectionOverride,
                DIRECTION_OVERRIDE_BIT,
                1,
            ));
        }
        fields.push(RegisterField {
            name: MODULE_INFO_NAME.into(),
            kind: FieldKind::ModuleInfo,
            address: MODULE_INFO_ADDRESS,
            bit_offset: MODULE_INFO_SIGNAL_COUNT_OFFSET,
            bit_width: MODULE_INFO_ALTERNATE_COUNT_OFFSET + MODULE_INFO_FIELD_WIDTH,
            access: Access::ReadOnly,
            value: Some(encode_module_info(
                params.signal_count(),
                params.alternate_count(),
            )),
        });

        let map = RegisterMap {
            fields,
            data_width: bus.data_width,
        };
        map.check(bus)?;

        for field in map.fields.iter() {
            trace!(
                name = field.name(),
                address = field.address(),
                bit_offset = field.bit_offset(),
                bit_width = field.bit_width(),
                access = field.access().abbreviation(),
                "register field"
            );
        }

        Ok(map)
    }

    fn check(&self, bus: &BusConfig) -> Result<(), ConstructionError> {
        let bytes_per_word = bus.data_width / 8;
        for (i, field) in self.fields.iter().enumerate() {
            if field.bit_offset + field.bit_width > bus.data_width {
                return Err(ConstructionError::FieldTooWide {
                    name: field.name.clone(),
                    data_width: bus.data_width,
                });
            }
            let last_byte = u64::from(field.address) + u64::from(bytes_per_word.max(1)) - 1;
            if bus.addr_width < 64 && last_byte >= 1u64 << bus.addr_width {
                return Err(ConstructionError::AddressOutOfRange {
                    address: field.address,
                    addr_width: bus.addr_width,
                });
            }
            if let Some(other) = self.fields[..i].iter().find(|other| other.overlaps(field)) {
                return Err(ConstructionError::FieldOverlap {
                    name: field.name.clone(),
                    other: other.name.clone(),
                    address: field.address,
                });
            }
        }
        Ok(())
    }

    pub fn fields(&self) -> &[RegisterField] {
        &self.fields
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    pub fn field(&self, name: &str) -> Option<&RegisterField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The fields mapped to selection signals, excluding the module-info field.
    pub fn control_fields(&self) -> impl Iterator<Item = &RegisterField> + '_ {
        self.fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Control { .. }))
    }

    pub fn module_info(&self) -> Option<&RegisterField> {
        self.fields.iter().find(|f| f.kind == FieldKind::ModuleInfo)
    }

    /// The word a host reads back from the module-info register.
    pub fn module_info_word(&self) -> u32 {
        self.module_info().and_then(|f| f.value).unwrap_or(0)
    }

    /// Byte addresses of every register in the map, ascending and without duplicates.
    pub fn addresses(&self) -> Vec<u32> {
        let mut addresses: Vec<_> = self.fields.iter().map(|f| f.address).collect();
        addresses.sort_unstable();
        addresses.dedup();
        addresses
    }
}

/// Packs `(signal_count, alternate_count)` the way the module-info register presents it.
pub fn encode_module_info(signal_count: u32, alternate_count: u32) -> u32 {
    let field_mask = (1 << MODULE_INFO_FIELD_WIDTH) - 1;
    ((signal_count & field_mask) << MODULE_INFO_SIGNAL_COUNT_OFFSET)
        | ((alternate_count & field_mask) << MODULE_INFO_ALTERNATE_COUNT_OFFSET)
}

/// Splits a word read from the module-info register into `(signal_count, alternate_count)`.
pub fn decode_module_info(word: u32) -> (u32, u32) {
    let field_mask = (1 << MODULE_INFO_FIELD_WIDTH) - 1;
    (
        (word >> MODULE_INFO_SIGNAL_COUNT_OFFSET) & field_mask,
        (word >> MODULE_INFO_ALTERNATE_COUNT_OFFSET) & field_mask,
    )
}
