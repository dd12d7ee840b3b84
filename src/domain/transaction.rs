use alloy::primitives::{
    Address,
    B256,
    Bytes,
    I256,
    U256,
    keccak256,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    ext_amount::FIELD_SIZE,
    witness::TransactionWitness,
};
use crate::crypto::poseidon::poseidon;

/// Compliance fingerprint of one transaction: a Poseidon digest of its
/// input nullifiers, output commitments and field-encoded public amount.
/// The message-hash tree and the allow-list both hold these digests.
pub fn message_hash(
    input_nullifiers: &[B256],
    output_commitments: &[B256],
    public_amount: U256,
) -> B256 {
    let mut inputs: Vec<B256> =
        Vec::with_capacity(input_nullifiers.len() + output_commitments.len() + 1);
    inputs.extend_from_slice(input_nullifiers);
    inputs.extend_from_slice(output_commitments);
    inputs.push(public_amount.into());
    poseidon(&inputs)
}

/// External side effects bound to a transaction: who receives withdrawn
/// funds and the signed net amount entering (positive) or leaving
/// (negative) the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtData {
    pub recipient: Address,
    pub ext_amount: I256,
}

impl ExtData {
    /// Hash binding the external data to the proof, so the recipient and
    /// amount cannot be altered after proof generation.
    ///
    /// keccak256(pad32(recipient) ‖ int256(ext_amount)) reduced into the
    /// proving field.
    pub fn hash(&self) -> B256 {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(
            B256::left_padding_from(self.recipient.as_slice()).as_slice(),
        );
        buf[32..].copy_from_slice(&self.ext_amount.to_be_bytes::<32>());
        let digest = U256::from_be_bytes(keccak256(buf).0);
        B256::from(digest % FIELD_SIZE)
    }
}

/// Public arguments of a completed shielded transaction, exactly as
/// submitted to the pool contract alongside its [`ExtData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionArgs {
    /// The serialized proof bytes
    pub proof: Bytes,
    /// Commitment tree root the proof was built against
    pub root: B256,
    /// Nullifiers of the spent input notes
    pub input_nullifiers: Vec<B256>,
    /// Commitments of the created output notes
    pub output_commitments: Vec<B256>,
    /// Field-encoded signed external amount
    pub public_amount: U256,
    /// Binding hash over the external data
    pub ext_data_hash: B256,
}

impl TransactionArgs {
    /// Compliance fingerprint of this transaction.
    pub fn message_hash(&self) -> B256 {
        message_hash(
            &self.input_nullifiers,
            &self.output_commitments,
            self.public_amount,
        )
    }
}

/// A completed shielded transaction as consumed by innocence chaining:
/// the full circuit witness plus the public arguments. Immutable once
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub proof_inputs: TransactionWitness,
    pub args: TransactionArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_hash_matches_direct_poseidon() {
        let n1 = B256::repeat_byte(0x01);
        let n2 = B256::repeat_byte(0x02);
        let c = B256::repeat_byte(0x03);
        let amount = U256::from(77u64);

        let expected = poseidon(&[n1, n2, c, amount.into()]);
        assert_eq!(message_hash(&[n1, n2], &[c], amount), expected);
    }

    #[test]
    fn test_ext_data_hash_deterministic() {
        let ext = ExtData {
            recipient: Address::repeat_byte(0xbd),
            ext_amount: I256::try_from(1_000_000u64).unwrap(),
        };
        assert_eq!(ext.hash(), ext.hash());
    }

    #[test]
    fn test_ext_data_hash_binds_both_fields() {
        let ext = ExtData {
            recipient: Address::repeat_byte(0xbd),
            ext_amount: I256::try_from(1_000_000u64).unwrap(),
        };
        let other_recipient = ExtData {
            recipient: Address::repeat_byte(0xbe),
            ..ext
        };
        let other_amount = ExtData {
            ext_amount: -I256::try_from(1_000_000u64).unwrap(),
            ..ext
        };

        assert_ne!(ext.hash(), other_recipient.hash());
        assert_ne!(ext.hash(), other_amount.hash());
    }

    #[test]
    fn test_ext_data_hash_fits_field() {
        let ext = ExtData {
            recipient: Address::repeat_byte(0xff),
            ext_amount: -I256::ONE,
        };
        assert!(U256::from_be_bytes(ext.hash().0) < FIELD_SIZE);
    }
}
