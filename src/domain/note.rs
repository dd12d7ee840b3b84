use std::sync::OnceLock;

use alloy::primitives::{
    B256,
    U256,
};
use rand::Rng;
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    commitment::Commitment,
    nullifier::Nullifier,
};
use crate::crypto::poseidon::{
    poseidon1,
    poseidon2,
};

/// A note represents a private balance inside the shielded pool.
/// Notes are the UTXO primitive: created as a transaction output,
/// consumed by publishing their nullifier as a transaction input.
///
/// `amount` and `blinding` are fixed at creation; only `index` is
/// assigned later, when the note is located in the pool's commitment
/// tree. The derived commitment and nullifier are cached on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Note amount (raw units, bounded to fit the proving field)
    pub amount: U256,
    /// Random blinding factor for hiding
    pub blinding: B256,
    /// Leaf position once located in the pool's commitment tree
    pub index: Option<u64>,
    #[serde(skip)]
    commitment: OnceLock<Commitment>,
    #[serde(skip)]
    nullifier: OnceLock<Nullifier>,
}

impl Note {
    /// Create a new note with a random blinding factor.
    pub fn new(amount: U256, rng: &mut impl Rng) -> Self {
        let mut blinding_bytes = [0u8; 32];
        rng.fill(&mut blinding_bytes[1..]); // keep within the field

        Self::with_blinding(amount, B256::from(blinding_bytes))
    }

    /// Create a note with a specific blinding factor (for reconstruction
    /// from recorded witness data, or for testing).
    pub fn with_blinding(amount: U256, blinding: B256) -> Self {
        Self {
            amount,
            blinding,
            index: None,
            commitment: OnceLock::new(),
            nullifier: OnceLock::new(),
        }
    }

    /// Create a zero-amount note (used for padding the fixed-size
    /// input/output vectors the circuit expects).
    pub fn zero(rng: &mut impl Rng) -> Self {
        Self::new(U256::ZERO, rng)
    }

    /// The commitment for this note, computed on first access.
    /// commitment = poseidon2(amount, blinding)
    pub fn commitment(&self) -> Commitment {
        *self
            .commitment
            .get_or_init(|| Commitment(poseidon2(self.amount.into(), self.blinding)))
    }

    /// The nullifier for this note, computed on first access.
    /// nullifier = poseidon1(blinding)
    pub fn nullifier(&self) -> Nullifier {
        *self
            .nullifier
            .get_or_init(|| Nullifier(poseidon1(self.blinding)))
    }

    /// Check if this is a zero-amount (padding) note.
    pub fn is_zero(&self) -> bool {
        self.amount == U256::ZERO
    }
}

/// Notes with equal amount and blinding are interchangeable; the cached
/// derived values never enter the comparison.
impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.amount == other.amount
            && self.blinding == other.blinding
            && self.index == other.index
    }
}

impl Eq for Note {}
