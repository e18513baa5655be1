#![warn(missing_docs)]

//! This module defines the ring identifier of chordkv.
//! A [Did] is an element of the finite ring `Z / 2^bits`, where `bits` is the width of the
//! hasher the ring was configured with.
//!
//! ## Algebraic Did
//!
//! * Addition is closed: for any two elements a and b, a + b wraps back into the ring.
//!
//! * Existence of an additive identity: zero.
//!
//! * Existence of additive inverses: for every a there is -a with a + (-a) = 0.
//!
//! ## Order
//!
//! [Did] derives a plain integer order, which is what the ring positions look like when the ring
//! is cut open at zero. Deciding whether a node owns an identifier never uses that order directly:
//! it goes through [Did::in_range], which measures clockwise distance with modular subtraction.
//! For "which of these is closer" questions the [BiasId] struct observes dids from a chosen
//! zero point.

use std::cmp::Ordering;
use std::ops::Add;
use std::ops::Neg;
use std::ops::Sub;

use num_bigint::BigUint;
use serde::Deserialize;
use serde::Serialize;

use crate::consts::MAX_DID_BITS;
use crate::error::Error;
use crate::error::Result;

/// Did is a finite Ring R(P) where P = 2^bits.
#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Did {
    bits: u16,
    value: BigUint,
}

/// Bias Did is a special Did which set origin Did's identity to bias.
/// While two dids on a ring have no meaningful order, their clockwise distances from a
/// reference did do. [BiasId] keeps that distance and orders by it.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct BiasId {
    /// the zero point for determine order of Did.
    bias: Did,
    /// did data without bias.
    did: Did,
}

fn modulus(bits: u16) -> BigUint {
    BigUint::from(1u8) << bits as usize
}

impl Did {
    /// Create a did of `bits` width, reducing `value` into the ring.
    pub fn new(bits: u16, value: BigUint) -> Self {
        let value = value % modulus(bits);
        Self { bits, value }
    }

    /// Create a did from a small integer.
    pub fn from_u64(bits: u16, value: u64) -> Self {
        Self::new(bits, BigUint::from(value))
    }

    /// Create a did from big-endian bytes.
    pub fn from_bytes(bits: u16, bytes: &[u8]) -> Self {
        Self::new(bits, BigUint::from_bytes_be(bytes))
    }

    /// Parse a hexadecimal did, `0x` prefix optional.
    pub fn from_hex(bits: u16, s: &str) -> Result<Self> {
        check_bits(bits)?;
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let value = BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| Error::InvalidDid(s.to_string()))?;
        if value >= modulus(bits) {
            return Err(Error::InvalidDid(s.to_string()));
        }
        Ok(Self { bits, value })
    }

    /// Zero of a ring with the given width.
    pub fn zero(bits: u16) -> Self {
        Self {
            bits,
            value: BigUint::from(0u8),
        }
    }

    /// Width of the ring in bits.
    pub fn bits(&self) -> u16 {
        self.bits
    }

    /// Integer value of the did.
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// `self + 2^k` on the ring.
    pub fn add_pow2(&self, k: u32) -> Self {
        Self::new(self.bits, &self.value + (BigUint::from(1u8) << k as usize))
    }

    /// Plain integer `<`.
    pub fn lt(&self, other: &Self) -> bool {
        self < other
    }

    /// Plain integer `>`.
    pub fn gt(&self, other: &Self) -> bool {
        self > other
    }

    /// Plain integer `<=`.
    pub fn le(&self, other: &Self) -> bool {
        self <= other
    }

    /// Plain integer `>=`.
    pub fn ge(&self, other: &Self) -> bool {
        self >= other
    }

    /// Test x <- (lower, upper), or x <- (lower, upper] when `inclusive_upper` is set, walking
    /// clockwise from `lower`.
    /// With `lower == upper` the open arc is the whole ring except `lower`, and the half open arc
    /// is the whole ring.
    pub fn in_range(&self, lower: &Did, upper: &Did, inclusive_upper: bool) -> bool {
        let span = upper - lower;
        let dist = self - lower;
        if lower == upper {
            return inclusive_upper || dist.value != BigUint::from(0u8);
        }
        let zero = BigUint::from(0u8);
        dist.value > zero && (dist.value < span.value || (inclusive_upper && dist == span))
    }

    /// Transform Did to BiasDid
    pub fn bias(&self, did: &Did) -> BiasId {
        BiasId::new(did, self)
    }
}

pub(crate) fn check_bits(bits: u16) -> Result<()> {
    if bits == 0 || bits > MAX_DID_BITS {
        return Err(Error::InvalidDidWidth(bits, MAX_DID_BITS));
    }
    Ok(())
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let width = (self.bits as usize + 3) / 4;
        write!(f, "0x{:0width$x}", self.value, width = width)
    }
}

impl std::fmt::Debug for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Did({})", self)
    }
}

impl PartialOrd for Did {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Did {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then(self.bits.cmp(&other.bits))
    }
}

impl BiasId {
    /// Wrap a Did into BiasDid with given bias.
    pub fn new(bias: &Did, did: &Did) -> BiasId {
        BiasId {
            bias: bias.clone(),
            did: did - bias,
        }
    }

    /// Get wrapped biased value from did
    pub fn to_did(&self) -> Did {
        &self.did + &self.bias
    }
}

impl PartialOrd for BiasId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BiasId {
    fn cmp(&self, other: &Self) -> Ordering {
        if other.bias != self.bias {
            let bid = BiasId::new(&self.bias, &other.to_did());
            self.did.cmp(&bid.did)
        } else {
            self.did.cmp(&other.did)
        }
    }
}

impl From<BiasId> for Did {
    fn from(id: BiasId) -> Did {
        id.to_did()
    }
}

/// Ordering with a did reference
/// This trait defines necessary method for sorting based on did.
pub trait SortRing {
    /// Sort clockwise starting at `did`.
    fn sort(&mut self, did: &Did);
}

impl SortRing for Vec<Did> {
    fn sort(&mut self, did: &Did) {
        self.sort_by_key(|a| a.bias(did));
    }
}

// impl Finite Ring For Did
impl<'a> Neg for &'a Did {
    type Output = Did;

    fn neg(self) -> Did {
        Did::new(self.bits, modulus(self.bits) - &self.value)
    }
}

impl Neg for Did {
    type Output = Did;

    fn neg(self) -> Did {
        -&self
    }
}

// Operands of different width are reduced into the width of the left one.
impl<'a, 'b> Add<&'b Did> for &'a Did {
    type Output = Did;

    fn add(self, rhs: &'b Did) -> Did {
        Did::new(self.bits, &self.value + &rhs.value)
    }
}

impl Add for Did {
    type Output = Did;

    fn add(self, rhs: Did) -> Did {
        &self + &rhs
    }
}

impl<'a, 'b> Sub<&'b Did> for &'a Did {
    type Output = Did;

    fn sub(self, rhs: &'b Did) -> Did {
        let m = modulus(self.bits);
        let rhs = &rhs.value % &m;
        Did::new(self.bits, &self.value + (m - rhs))
    }
}

impl Sub for Did {
    type Output = Did;

    fn sub(self, rhs: Did) -> Did {
        &self - &rhs
    }
}
