//! Checksums derived from trust store passwords
//!
//! The checksum is stored next to the password on the `Bundle` so the
//! controller can notice password changes without comparing secrets.

use clap::ValueEnum;
use crc::{Algorithm, CRC_32_ISO_HDLC, Crc};

/// CRC-32 parameters with the reflected polynomial `0x00000020`
///
/// Existing trust-manager installations derived every stored hash with a
/// table built from this polynomial, so it stays the default even though it
/// is not a recognised CRC-32 polynomial. `poly` is given in normal form,
/// which is `0x20` bit-reversed.
pub const CRC_32_LEGACY: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x0400_0000,
    init: 0xffff_ffff,
    refin: true,
    refout: true,
    xorout: 0xffff_ffff,
    check: 0xffff_ffc1,
    residue: 0x0000_000f,
};

static LEGACY: Crc<u32> = Crc::<u32>::new(&CRC_32_LEGACY);
static IEEE: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Polynomial used to build the CRC-32 table
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum HashPolynomial {
    /// Bit-compatible with hashes written by earlier releases
    #[default]
    Legacy,
    /// Standard IEEE 802.3 CRC-32
    Ieee,
}

/// Derives password hashes; cheap to copy and safe to share across requests
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PasswordHasher {
    polynomial: HashPolynomial,
}

impl PasswordHasher {
    pub const fn new(polynomial: HashPolynomial) -> Self {
        Self { polynomial }
    }

    pub const fn polynomial(&self) -> HashPolynomial {
        self.polynomial
    }

    /// Checksum over the raw bytes of `password`
    ///
    /// Every call starts from a fresh digest.
    pub fn hash(&self, password: &str) -> u32 {
        let crc = match self.polynomial {
            HashPolynomial::Legacy => &LEGACY,
            HashPolynomial::Ieee => &IEEE,
        };

        let mut digest = crc.digest();
        digest.update(password.as_bytes());
        digest.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_check_value() {
        assert_eq!(LEGACY.checksum(b"123456789"), CRC_32_LEGACY.check);
    }

    #[test]
    fn test_legacy_hashes() {
        let hasher = PasswordHasher::default();
        assert_eq!(hasher.polynomial(), HashPolynomial::Legacy);
        assert_eq!(hasher.hash("hunter2"), 4_294_967_290);
        assert_eq!(hasher.hash("changeit"), 0xffff_fff0);
        assert_eq!(hasher.hash("x"), 0xff00_0011);
    }

    #[test]
    fn test_ieee_hashes() {
        let hasher = PasswordHasher::new(HashPolynomial::Ieee);
        assert_eq!(hasher.hash("123456789"), 0xcbf4_3926);
        assert_eq!(hasher.hash("hunter2"), 659_029_078);
        assert_eq!(hasher.hash("changeit"), 0x6d0f_ccda);
    }

    #[test]
    fn test_empty_password_hashes_to_zero() {
        for polynomial in [HashPolynomial::Legacy, HashPolynomial::Ieee] {
            assert_eq!(PasswordHasher::new(polynomial).hash(""), 0);
        }
    }

    #[test]
    fn test_hash_does_not_carry_state() {
        let hasher = PasswordHasher::default();
        let first = hasher.hash("s3cr3t");
        hasher.hash("something else entirely");
        assert_eq!(hasher.hash("s3cr3t"), first);
        assert_eq!(first, 0xffff_fff7);
    }
}
