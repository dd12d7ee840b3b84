//! Builds the per-step witnesses of the recursive innocence circuit and
//! drives a batch of transactions through it.
//!
//! Running state threads through the chain as
//! `(allowed-commitments root, message-hash root, allow-list root,
//! prior output digest)`. Each step proves its transaction is recorded
//! on-chain, that a net-positive (deposit) transaction's fingerprint is
//! on the allow-list, and that every spent note traces back to an output
//! approved by an earlier step; it then approves the step's own output
//! by inserting it into the allowed-commitments accumulator.

use std::time::Duration;

use alloy::primitives::{
    B256,
    Bytes,
    U256,
};
use thiserror::Error;
use tracing::{
    debug,
    info,
};

use crate::{
    domain::{
        ext_amount::field_decode,
        merkle::{
            MERKLE_TREE_HEIGHT,
            MerklePath,
            MerkleTree,
            MerkleTreeError,
        },
        note::Note,
        transaction::TransactionRecord,
        witness::InnocenceStepWitness,
    },
    ports::{
        pool::{
            PoolError,
            ShieldedPool,
        },
        prover::{
            Prover,
            ProverError,
        },
    },
};

/// Errors from innocence chaining. The domain-consistency variants are
/// the point of the check: they mean the batch is out of sync with the
/// ledger or genuinely non-compliant, and are surfaced verbatim.
#[derive(Debug, Error)]
pub enum InnocenceError {
    #[error("message hash {0} is not recorded in the pool's message tree")]
    MessageHashNotFound(B256),

    #[error("deposit message hash {0} is not on the allow-list")]
    NotAllowListed(B256),

    #[error("spent commitment {0} does not trace back to an approved output")]
    SpentCommitmentNotApproved(B256),

    #[error("final step published digest {actual}, expected {expected}")]
    FinalDigestMismatch { expected: B256, actual: B256 },

    #[error(transparent)]
    Merkle(#[from] MerkleTreeError),

    #[error(transparent)]
    Prover(#[from] ProverError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// One proven step of the chain.
#[derive(Debug, Clone)]
pub struct InnocenceStep {
    pub witness: InnocenceStepWitness,
    pub proof: Bytes,
    /// The message hash this step validated. Only the final step also
    /// publishes it as its output digest.
    pub message_hash: B256,
}

/// The completed chain over one batch, in step order.
#[derive(Debug, Clone)]
pub struct InnocenceRun {
    pub steps: Vec<InnocenceStep>,
    /// Message hash of the batch's final transaction (zero for an empty
    /// batch). This is the digest the final step publishes.
    pub final_message_hash: B256,
    /// Root of the allowed-commitments accumulator after the last step.
    pub allowed_commitments_root: B256,
}

impl InnocenceRun {
    /// Check the digest published by the final step against an externally
    /// known expected value.
    pub fn verify_output_digest(&self, expected: B256) -> Result<(), InnocenceError> {
        if self.final_message_hash == expected {
            Ok(())
        } else {
            Err(InnocenceError::FinalDigestMismatch {
                expected,
                actual: self.final_message_hash,
            })
        }
    }
}

/// Rebuild the message-hash tree from the pool's full event log, ordered
/// by emission index.
pub async fn build_message_hash_tree(
    pool: &impl ShieldedPool,
) -> Result<MerkleTree, InnocenceError> {
    let mut events = pool.message_events().await?;
    events.sort_by_key(|e| e.index);
    let leaves: Vec<B256> = events.iter().map(|e| e.message_hash()).collect();
    debug!(leaves = leaves.len(), "rebuilt message hash tree from pool events");
    Ok(MerkleTree::new(MERKLE_TREE_HEIGHT, &leaves)?)
}

/// Build the tree over the externally supplied allow-list, in order.
pub fn build_allow_list_tree(
    allow_list: &[B256],
) -> Result<MerkleTree, MerkleTreeError> {
    MerkleTree::new(MERKLE_TREE_HEIGHT, allow_list)
}

/// Assemble the witness for one innocence step.
///
/// Mutates `allowed_commitments_tree`: the transaction's output
/// commitment is inserted so later steps can spend it. Re-running a step
/// without resetting the tree therefore visibly diverges (the running
/// roots no longer match) rather than silently reproducing stale state.
pub fn build_step_witness(
    message_hash_tree: &MerkleTree,
    allow_list_tree: &MerkleTree,
    allowed_commitments_tree: &mut MerkleTree,
    transaction: &TransactionRecord,
    is_last: bool,
) -> Result<InnocenceStepWitness, InnocenceError> {
    let message_hash = transaction.args.message_hash();
    let proof_inputs = &transaction.proof_inputs;

    let step_in = [
        allowed_commitments_tree.root(),
        message_hash_tree.root(),
        allow_list_tree.root(),
        B256::ZERO,
    ];

    // Every processed transaction must already be recorded on-chain.
    let message_hash_path_index = message_hash_tree
        .index_of(message_hash)
        .ok_or(InnocenceError::MessageHashNotFound(message_hash))?;
    let message_hash_path_elements =
        message_hash_tree.path(message_hash_path_index)?.elements;

    // Deposits (net-positive) must originate from an approved source.
    // The circuit only asserts this membership when the amount is
    // positive, so other steps carry a zero-padded path.
    let signed_amount = field_decode(proof_inputs.public_amount);
    let (allow_list_path_index, allow_list_path_elements) =
        if signed_amount.is_positive() {
            let index = allow_list_tree
                .index_of(message_hash)
                .ok_or(InnocenceError::NotAllowListed(message_hash))?;
            (index, allow_list_tree.path(index)?.elements)
        } else {
            let padding = MerklePath::zero(allow_list_tree.height());
            (padding.index, padding.elements)
        };

    // Every spent note with a positive recorded amount must itself be
    // the approved output of an earlier step.
    let mut allowed_path_indices = Vec::with_capacity(proof_inputs.in_amounts.len());
    let mut allowed_path_elements = Vec::with_capacity(proof_inputs.in_amounts.len());
    for (amount, blinding) in proof_inputs
        .in_amounts
        .iter()
        .zip(proof_inputs.in_blindings.iter())
    {
        if *amount > U256::ZERO {
            let commitment: B256 =
                Note::with_blinding(*amount, *blinding).commitment().into();
            let index = allowed_commitments_tree
                .index_of(commitment)
                .ok_or(InnocenceError::SpentCommitmentNotApproved(commitment))?;
            allowed_path_indices.push(index);
            allowed_path_elements.push(allowed_commitments_tree.path(index)?.elements);
        } else {
            let padding = MerklePath::zero(allowed_commitments_tree.height());
            allowed_path_indices.push(padding.index);
            allowed_path_elements.push(padding.elements);
        }
    }

    // Approve this step's output for the steps that follow.
    let output_commitment = transaction.args.output_commitments[0];
    let update_path_index = allowed_commitments_tree.insert(output_commitment)?;
    let update_path_elements =
        allowed_commitments_tree.path(update_path_index)?.elements;

    Ok(InnocenceStepWitness {
        step_in,
        message_hash_path_index,
        message_hash_path_elements,
        allow_list_path_index,
        allow_list_path_elements,
        in_amounts: proof_inputs.in_amounts.clone(),
        in_blindings: proof_inputs.in_blindings.clone(),
        out_commitments: [output_commitment],
        public_amount: proof_inputs.public_amount,
        allowed_path_indices,
        allowed_path_elements,
        // Intermediate steps keep their digest private; only the final
        // step exposes which message hash it validated.
        output_message_hash: if is_last { message_hash } else { B256::ZERO },
        update_path_index,
        update_path_elements,
        allowed_commitments_new_root: if is_last {
            B256::ZERO
        } else {
            allowed_commitments_tree.root()
        },
    })
}

/// Fold an ordered batch of transactions into a chain of recursive
/// innocence proofs.
///
/// Batch order must equal chronological transaction order: the
/// allowed-commitments accumulator is threaded statefully from step to
/// step, so a spend can only follow the step that approved its
/// commitment. Any step failure aborts the whole run; the accumulator is
/// already mutated by then, so callers restart from a fresh run rather
/// than retrying a single step.
pub async fn generate_proof_of_innocence(
    pool: &impl ShieldedPool,
    prover: &impl Prover,
    allow_list: &[B256],
    transactions: &[TransactionRecord],
    step_timeout: Option<Duration>,
) -> Result<InnocenceRun, InnocenceError> {
    let message_hash_tree = build_message_hash_tree(pool).await?;
    let allow_list_tree = build_allow_list_tree(allow_list)?;
    let mut allowed_commitments_tree = MerkleTree::empty(MERKLE_TREE_HEIGHT);

    let mut steps = Vec::with_capacity(transactions.len());
    for (i, transaction) in transactions.iter().enumerate() {
        let is_last = i + 1 == transactions.len();
        let message_hash = transaction.args.message_hash();
        info!(
            step = i,
            total = transactions.len(),
            %message_hash,
            "building innocence step witness"
        );

        let witness = build_step_witness(
            &message_hash_tree,
            &allow_list_tree,
            &mut allowed_commitments_tree,
            transaction,
            is_last,
        )?;

        let proof = match step_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, prover.prove_innocence_step(&witness))
                    .await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(InnocenceError::Prover(ProverError::Timeout));
                    }
                }
            }
            None => prover.prove_innocence_step(&witness).await?,
        };

        steps.push(InnocenceStep {
            witness,
            proof,
            message_hash,
        });
    }

    Ok(InnocenceRun {
        final_message_hash: steps.last().map(|s| s.message_hash).unwrap_or(B256::ZERO),
        allowed_commitments_root: allowed_commitments_tree.root(),
        steps,
    })
}
