//! Party identifiers
//!
//! Every party is identified by a non-zero 16-bit integer. On the wire it occupies 2 bytes
//! big-endian, in the scalar field it's mapped via [`scalar_from_u32`](crate::ciphersuite::scalar_from_u32).

use core::{fmt, num::NonZeroU16};

use generic_ec::{NonZero, Scalar};

use crate::ciphersuite::{scalar_from_u32, Curve};

/// Identifier of a party
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct PartyId(NonZeroU16);

impl PartyId {
    /// Constructs an identifier, returns `None` if `id` is zero
    pub const fn new(id: u16) -> Option<Self> {
        match NonZeroU16::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns identifier as integer
    pub const fn get(self) -> u16 {
        self.0.get()
    }

    /// Big-endian bytes representation
    pub fn to_bytes(self) -> [u8; 2] {
        self.get().to_be_bytes()
    }

    /// Parses identifier from its big-endian representation
    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        Self::new(u16::from_be_bytes(bytes))
    }

    /// Maps identifier into the scalar field
    pub fn to_scalar(self) -> Scalar<Curve> {
        scalar_from_u32(self.get().into())
    }
}

impl TryFrom<u16> for PartyId {
    type Error = InvalidPartyId;
    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::new(id).ok_or(InvalidPartyId)
    }
}

impl From<PartyId> for u16 {
    fn from(id: PartyId) -> Self {
        id.get()
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Party identifier must be non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("party identifier must be non-zero")]
pub struct InvalidPartyId;

/// Sorted list of distinct party identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<PartyId>", into = "Vec<PartyId>")
)]
pub struct PartyIdList(Vec<PartyId>);

impl PartyIdList {
    /// Constructs a list from identifiers given in any order
    ///
    /// Returns an error if the same identifier appears more than once, or if the list is empty.
    pub fn new(ids: impl IntoIterator<Item = PartyId>) -> Result<Self, InvalidPartyIdList> {
        let mut ids = ids.into_iter().collect::<Vec<_>>();
        if ids.is_empty() {
            return Err(InvalidPartyIdList::Empty);
        }
        ids.sort_unstable();
        if let Some(win) = ids.windows(2).find(|win| win[0] == win[1]) {
            return Err(InvalidPartyIdList::Duplicate(win[0]));
        }
        Ok(Self(ids))
    }

    /// Constructs a list from integers, rejects zero
    pub fn from_u16s(ids: &[u16]) -> Result<Self, InvalidPartyIdList> {
        let ids = ids
            .iter()
            .map(|&id| PartyId::new(id).ok_or(InvalidPartyIdList::Zero))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(ids)
    }

    /// Number of parties in the list
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always returns `false`: list is never empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether `id` belongs to the list
    pub fn contains(&self, id: PartyId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Iterates over identifiers in ascending order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = PartyId> + '_ {
        self.0.iter().copied()
    }

    /// Iterates over all identifiers except `id`
    pub fn others(&self, id: PartyId) -> impl Iterator<Item = PartyId> + '_ {
        self.iter().filter(move |j| *j != id)
    }

    /// Checks that every identifier of `self` is present in `other`
    pub fn is_subset_of(&self, other: &PartyIdList) -> bool {
        self.iter().all(|id| other.contains(id))
    }

    /// Identifiers as a slice
    pub fn as_slice(&self) -> &[PartyId] {
        &self.0
    }

    /// Computes the Lagrange coefficient at zero for party `id`
    ///
    /// $$\lambda_j = \prod_{m \in S, m \ne j} \frac{x_m}{x_m - x_j}$$
    ///
    /// Interpolating evaluations of a polynomial at the points of the list with these weights
    /// yields the polynomial's constant term.
    pub fn lagrange_coefficient(&self, id: PartyId) -> Result<Scalar<Curve>, LagrangeError> {
        if !self.contains(id) {
            return Err(LagrangeError::NotInList(id));
        }
        let x_j = id.to_scalar();

        let mut num = Scalar::<Curve>::one();
        let mut denom = NonZero::<Scalar<Curve>>::one();
        for m in self.others(id) {
            let x_m = m.to_scalar();
            // Distinct identifiers always map to distinct scalars
            let diff = NonZero::from_scalar(x_m - x_j).ok_or(LagrangeError::ZeroDenominator)?;
            num *= &x_m;
            denom = denom * diff;
        }

        Ok(num * denom.invert().as_ref())
    }
}

impl TryFrom<Vec<PartyId>> for PartyIdList {
    type Error = InvalidPartyIdList;
    fn try_from(ids: Vec<PartyId>) -> Result<Self, Self::Error> {
        Self::new(ids)
    }
}

impl From<PartyIdList> for Vec<PartyId> {
    fn from(list: PartyIdList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a PartyIdList {
    type Item = PartyId;
    type IntoIter = core::iter::Copied<core::slice::Iter<'a, PartyId>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

/// List of parties is invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPartyIdList {
    /// List is empty
    #[error("list of parties is empty")]
    Empty,
    /// Zero identifier
    #[error("party identifier must be non-zero")]
    Zero,
    /// Identifier appears more than once
    #[error("party {0} appears more than once")]
    Duplicate(PartyId),
}

/// Lagrange coefficient can't be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LagrangeError {
    /// Party is not in the interpolation set
    #[error("party {0} is not in the interpolation set")]
    NotInList(PartyId),
    /// Denominator is zero, which only happens with duplicated identifiers
    #[error("bug: zero denominator in lagrange coefficient")]
    ZeroDenominator,
}
