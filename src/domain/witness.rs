use alloy::primitives::{
    B256,
    U256,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Witness (public + private inputs) for the base shielded-transfer
/// circuit. Input and output vectors are padded to the circuit's fixed
/// shape before this is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionWitness {
    // === Public Inputs ===
    /// Commitment tree root the inclusion paths recombine to
    pub root: B256,
    /// Nullifiers of the input notes
    pub input_nullifiers: Vec<B256>,
    /// Commitments of the output notes
    pub output_commitments: Vec<B256>,
    /// Field-encoded signed external amount
    pub public_amount: U256,
    /// Binding hash over the external data
    pub ext_data_hash: B256,

    // === Private Inputs ===
    /// Input note amounts
    pub in_amounts: Vec<U256>,
    /// Input note blinding factors
    pub in_blindings: Vec<B256>,
    /// Leaf index per input (0 for zero-amount padding)
    pub in_path_indices: Vec<u64>,
    /// Sibling hashes per input (all-zero for padding)
    pub in_path_elements: Vec<Vec<B256>>,
    /// Output note amounts
    pub out_amounts: Vec<U256>,
    /// Output note blinding factors
    pub out_blindings: Vec<B256>,
}

/// Witness for one step of the recursive innocence circuit. All fields
/// are always present; sentinel zeros stand in wherever a check is not
/// asserted for this step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnocenceStepWitness {
    /// Running state in: allowed-commitments root, message-hash root,
    /// allow-list root, prior output digest.
    pub step_in: [B256; 4],
    /// Leaf index of this transaction's message hash
    pub message_hash_path_index: u64,
    /// Inclusion path of the message hash in the message-hash tree
    pub message_hash_path_elements: Vec<B256>,
    /// Leaf index in the allow-list tree (0 when not asserted)
    pub allow_list_path_index: u64,
    /// Allow-list inclusion path (all-zero when not asserted)
    pub allow_list_path_elements: Vec<B256>,
    /// Input note amounts, straight from the transaction witness
    pub in_amounts: Vec<U256>,
    /// Input note blinding factors
    pub in_blindings: Vec<B256>,
    /// The transaction's single output commitment
    pub out_commitments: [B256; 1],
    /// Field-encoded public amount
    pub public_amount: U256,
    /// Per-input leaf index in the allowed-commitments tree
    pub allowed_path_indices: Vec<u64>,
    /// Per-input inclusion path in the allowed-commitments tree
    pub allowed_path_elements: Vec<Vec<B256>>,
    /// The message hash on the final step, zero otherwise
    pub output_message_hash: B256,
    /// Index the output commitment was inserted at
    pub update_path_index: u64,
    /// Inclusion path of the freshly inserted output commitment
    pub update_path_elements: Vec<B256>,
    /// Accumulator root after the insert (zero on the final step)
    pub allowed_commitments_new_root: B256,
}
