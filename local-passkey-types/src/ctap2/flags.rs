use bitflags::bitflags;

use super::CodecError;

bitflags! {
    /// Flags for authenticator Data
    ///
    /// Bits 1 and 5 are reserved and never set.
    ///
    /// <https://w3c.github.io/webauthn/#authdata-flags>
    #[repr(transparent)]
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct Flags: u8 {
        /// User Present, bit 0
        const UP = 1 << 0;
        /// User Verified, bit 2
        const UV = 1 << 2;
        /// Backup Eligibility, bit 3
        const BE = 1 << 3;
        /// Backup state, bit 4
        const BS = 1 << 4;
        /// Attested Credential Data, bit 6
        const AT = 1 << 6;
        /// Extension Data Included, bit 7
        const ED = 1 << 7;
    }
}

impl Flags {
    /// The pair of backup bits, eligibility and state.
    pub const fn backup() -> Self {
        Flags::BE.union(Flags::BS)
    }
}

/// Every operation of this authenticator requires a biometric or passcode check from the
/// platform, so presence and verification are always asserted.
impl Default for Flags {
    fn default() -> Self {
        Flags::UP | Flags::UV
    }
}

impl From<Flags> for u8 {
    fn from(src: Flags) -> Self {
        src.bits()
    }
}

impl TryFrom<u8> for Flags {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Flags::from_bits(value).ok_or(CodecError::UnknownFlags(value))
    }
}
