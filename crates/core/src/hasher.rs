//! Hasher collaborator: maps bytes onto the ring.

use std::sync::Arc;

use sha2::Digest;
use sha2::Sha256;
use sha2::Sha512;

use crate::dht::did::check_bits;
use crate::dht::Did;
use crate::error::Error;
use crate::error::Result;

/// Maps keys and addresses onto a ring of `width()` bits.
pub trait Hasher {
    /// Position of `data` on the ring.
    fn hash(&self, data: &[u8]) -> Did;

    /// Identifier width in bits.
    fn width(&self) -> u16;
}

/// Hasher shared by the ring node, its client and the message constructors.
pub type SharedHasher = Arc<dyn Hasher + Send + Sync>;

/// SHA-256 truncated to its leading `bits` bits.
#[derive(Clone, Debug)]
pub struct Sha256Hasher {
    bits: u16,
}

/// SHA-512 truncated to its leading `bits` bits.
#[derive(Clone, Debug)]
pub struct Sha512Hasher {
    bits: u16,
}

fn truncate(digest: &[u8], bits: u16) -> Did {
    let full = digest.len() * 8;
    let value = num_bigint::BigUint::from_bytes_be(digest) >> (full - bits as usize);
    Did::new(bits, value)
}

fn checked_width(bits: u16, digest_bits: u16) -> Result<u16> {
    check_bits(bits)?;
    if bits > digest_bits {
        return Err(Error::InvalidDidWidth(bits, digest_bits));
    }
    Ok(bits)
}

impl Sha256Hasher {
    /// Create a hasher producing `bits`-wide dids, at most 256.
    pub fn new(bits: u16) -> Result<Self> {
        Ok(Self {
            bits: checked_width(bits, 256)?,
        })
    }
}

impl Sha512Hasher {
    /// Create a hasher producing `bits`-wide dids, at most 512.
    pub fn new(bits: u16) -> Result<Self> {
        Ok(Self {
            bits: checked_width(bits, 512)?,
        })
    }
}

impl Hasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> Did {
        truncate(&Sha256::digest(data), self.bits)
    }

    fn width(&self) -> u16 {
        self.bits
    }
}

impl Hasher for Sha512Hasher {
    fn hash(&self, data: &[u8]) -> Did {
        truncate(&Sha512::digest(data), self.bits)
    }

    fn width(&self) -> u16 {
        self.bits
    }
}

/// Pick the narrowest SHA-2 digest covering `bits`.
pub fn sha2_hasher(bits: u16) -> Result<SharedHasher> {
    if bits <= 256 {
        Ok(Arc::new(Sha256Hasher::new(bits)?))
    } else {
        Ok(Arc::new(Sha512Hasher::new(bits)?))
    }
}
