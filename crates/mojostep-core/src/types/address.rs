//! Memory address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed memory address
///
/// This wrapper around `u64` provides type safety when working with debuggee
/// addresses. It prevents accidentally mixing addresses with other `u64`
/// values (sizes, step counts, offsets) in the patch builder, where such a mix
/// would silently corrupt the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value (usable in const contexts).
    #[must_use]
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address.
    #[must_use]
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Add an offset to this address, checking for overflow.
    #[must_use]
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Displace this address by a signed offset (wrapping two's complement).
    ///
    /// Used to resolve rip-relative displacements, which are signed 32-bit
    /// values relative to the address of the next instruction.
    #[must_use]
    pub fn offset(self, displacement: i64) -> Self
    {
        Address(self.0.wrapping_add(displacement as u64))
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
