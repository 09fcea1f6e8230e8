use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Externally asserted trust tier. Ordering matters: feature access and reward
/// multipliers are both keyed on it.
#[repr(u8)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum VerificationLevel {
    #[default]
    None = 0,
    Device = 1,
    Document = 2,
    SecureDocument = 3,
    Orb = 4,
    OrbPlus = 5,
}

impl VerificationLevel {
    /// Whether this level grants at least the access of `min`.
    pub fn meets(&self, min: VerificationLevel) -> bool {
        *self >= min
    }
}

impl TryFrom<u8> for VerificationLevel {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Device),
            2 => Ok(Self::Document),
            3 => Ok(Self::SecureDocument),
            4 => Ok(Self::Orb),
            5 => Ok(Self::OrbPlus),
            _ => Err(()),
        }
    }
}

impl Write for VerificationLevel {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for VerificationLevel {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        VerificationLevel::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl EncodeSize for VerificationLevel {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum MultiplierTableError {
    #[error("multiplier hierarchy violated: requires orb_plus >= orb >= secure_document >= document")]
    HierarchyViolation,
}

/// Reward multiplier percentages per trust tier.
///
/// Invariant: `orb_plus >= orb >= secure_document >= document`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierTable {
    pub orb_plus: u16,
    pub orb: u16,
    pub secure_document: u16,
    pub document: u16,
}

impl Default for MultiplierTable {
    fn default() -> Self {
        Self {
            orb_plus: 140,
            orb: 120,
            secure_document: 110,
            document: 100,
        }
    }
}

impl MultiplierTable {
    pub fn validate(&self) -> Result<(), MultiplierTableError> {
        if self.orb_plus >= self.orb
            && self.orb >= self.secure_document
            && self.secure_document >= self.document
        {
            Ok(())
        } else {
            Err(MultiplierTableError::HierarchyViolation)
        }
    }

    /// Percentage applied to a reward for the given tier.
    ///
    /// Levels below Document fall back to the Document percentage; play is
    /// gated on Document or above, so this branch only matters for reads.
    pub fn multiplier_for(&self, level: VerificationLevel) -> u16 {
        match level {
            VerificationLevel::OrbPlus => self.orb_plus,
            VerificationLevel::Orb => self.orb,
            VerificationLevel::SecureDocument => self.secure_document,
            VerificationLevel::Document
            | VerificationLevel::Device
            | VerificationLevel::None => self.document,
        }
    }
}

impl Write for MultiplierTable {
    fn write(&self, writer: &mut impl BufMut) {
        self.orb_plus.write(writer);
        self.orb.write(writer);
        self.secure_document.write(writer);
        self.document.write(writer);
    }
}

impl Read for MultiplierTable {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let table = Self {
            orb_plus: u16::read(reader)?,
            orb: u16::read(reader)?,
            secure_document: u16::read(reader)?,
            document: u16::read(reader)?,
        };
        if table.validate().is_err() {
            return Err(Error::Invalid("MultiplierTable", "hierarchy violated"));
        }
        Ok(table)
    }
}

impl EncodeSize for MultiplierTable {
    fn encode_size(&self) -> usize {
        self.orb_plus.encode_size()
            + self.orb.encode_size()
            + self.secure_document.encode_size()
            + self.document.encode_size()
    }
}
