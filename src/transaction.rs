//! Assembles the witness and public arguments for one shielded
//! transaction: padding to the circuit's fixed shape, inclusion paths
//! against the commitment tree rebuilt from the pool's event log, and
//! the external-data binding hash.

use alloy::primitives::{
    Address,
    B256,
    I256,
    U256,
};
use rand::{
    Rng,
    seq::SliceRandom,
};
use thiserror::Error;
use tracing::{
    debug,
    info,
};

use crate::{
    domain::{
        ext_amount::field_encode,
        merkle::{
            MERKLE_TREE_HEIGHT,
            MerklePath,
            MerkleTree,
            MerkleTreeError,
        },
        note::Note,
        transaction::{
            ExtData,
            TransactionArgs,
            TransactionRecord,
        },
        witness::TransactionWitness,
    },
    ports::{
        pool::{
            PoolError,
            ShieldedPool,
            TxReceipt,
        },
        prover::{
            Circuit,
            Prover,
            ProverError,
        },
    },
};

/// Largest supported input-note count (the widest circuit tier).
pub const MAX_INPUTS: usize = 16;

/// Largest accepted output-note count before padding.
pub const MAX_OUTPUTS: usize = 2;

/// Errors from transaction preparation.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("incorrect transaction shape: {0}")]
    InvalidShape(String),

    #[error("input commitment {0} was not found in the pool")]
    CommitmentNotFound(B256),

    #[error(transparent)]
    Merkle(#[from] MerkleTreeError),

    #[error(transparent)]
    Prover(#[from] ProverError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// A fully prepared transaction: everything needed to submit on-chain
/// and, later, to chain into an innocence proof.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub args: TransactionArgs,
    pub ext_data: ExtData,
    pub ext_amount: I256,
    pub proof_inputs: TransactionWitness,
}

/// Rebuild the commitment tree from the pool's full event log, ordered
/// by emission index.
pub async fn build_commitment_tree(
    pool: &impl ShieldedPool,
) -> Result<MerkleTree, TransactionError> {
    let mut events = pool.commitment_events().await?;
    events.sort_by_key(|e| e.index);
    let leaves: Vec<B256> = events.iter().map(|e| e.commitment).collect();
    debug!(leaves = leaves.len(), "rebuilt commitment tree from pool events");
    Ok(MerkleTree::new(MERKLE_TREE_HEIGHT, &leaves)?)
}

/// Prepare a shielded transaction without submitting it.
///
/// Inputs are padded to the circuit's fixed shape with fresh zero-amount
/// notes and shuffled so slot position carries no information. Each
/// positive-amount input must already be committed in the pool.
pub async fn prepare_transaction(
    pool: &impl ShieldedPool,
    prover: &impl Prover,
    mut inputs: Vec<Note>,
    mut outputs: Vec<Note>,
    recipient: Address,
    rng: &mut impl Rng,
) -> Result<PreparedTransaction, TransactionError> {
    if inputs.len() > MAX_INPUTS || outputs.len() > MAX_OUTPUTS {
        return Err(TransactionError::InvalidShape(format!(
            "incorrect inputs/outputs count: {}/{}",
            inputs.len(),
            outputs.len()
        )));
    }
    while inputs.len() != 2 && inputs.len() < MAX_INPUTS {
        inputs.push(Note::zero(rng));
    }
    while outputs.is_empty() {
        outputs.push(Note::zero(rng));
    }
    if outputs.len() > 1 {
        return Err(TransactionError::InvalidShape(format!(
            "incorrect outputs count: {}",
            outputs.len()
        )));
    }

    let in_sum: U256 = inputs.iter().map(|x| x.amount).sum();
    let out_sum: U256 = outputs.iter().map(|x| x.amount).sum();
    let ext_amount = if out_sum >= in_sum {
        I256::from_raw(out_sum - in_sum)
    } else {
        -I256::from_raw(in_sum - out_sum)
    };

    let tree = build_commitment_tree(pool).await?;

    build_proof(prover, &tree, inputs, outputs, ext_amount, recipient, rng).await
}

/// Build inclusion paths, the binding hash and the circuit witness, then
/// invoke the prover for the input-count tier.
async fn build_proof(
    prover: &impl Prover,
    tree: &MerkleTree,
    mut inputs: Vec<Note>,
    mut outputs: Vec<Note>,
    ext_amount: I256,
    recipient: Address,
    rng: &mut impl Rng,
) -> Result<PreparedTransaction, TransactionError> {
    inputs.shuffle(rng);
    outputs.shuffle(rng);

    let mut in_path_indices = Vec::with_capacity(inputs.len());
    let mut in_path_elements = Vec::with_capacity(inputs.len());

    for input in inputs.iter_mut() {
        if input.amount > U256::ZERO {
            let commitment: B256 = input.commitment().into();
            let index = tree
                .index_of(commitment)
                .ok_or(TransactionError::CommitmentNotFound(commitment))?;
            input.index = Some(index);
            in_path_indices.push(index);
            in_path_elements.push(tree.path(index)?.elements);
        } else {
            let padding = MerklePath::zero(tree.height());
            in_path_indices.push(padding.index);
            in_path_elements.push(padding.elements);
        }
    }

    let ext_data = ExtData {
        recipient,
        ext_amount,
    };
    let ext_data_hash = ext_data.hash();
    let public_amount = field_encode(ext_amount);

    let witness = TransactionWitness {
        root: tree.root(),
        input_nullifiers: inputs.iter().map(|x| x.nullifier().into()).collect(),
        output_commitments: outputs.iter().map(|x| x.commitment().into()).collect(),
        public_amount,
        ext_data_hash,
        in_amounts: inputs.iter().map(|x| x.amount).collect(),
        in_blindings: inputs.iter().map(|x| x.blinding).collect(),
        in_path_indices,
        in_path_elements,
        out_amounts: outputs.iter().map(|x| x.amount).collect(),
        out_blindings: outputs.iter().map(|x| x.blinding).collect(),
    };

    let circuit = Circuit::for_input_count(inputs.len());
    let proof = prover.prove_transaction(&witness, circuit).await?;

    let args = TransactionArgs {
        proof,
        root: witness.root,
        input_nullifiers: witness.input_nullifiers.clone(),
        output_commitments: witness.output_commitments.clone(),
        public_amount,
        ext_data_hash,
    };

    Ok(PreparedTransaction {
        args,
        ext_data,
        ext_amount,
        proof_inputs: witness,
    })
}

/// Prepare a transaction and submit it to the pool. Returns the receipt
/// together with the record consumed by innocence chaining.
pub async fn transact(
    pool: &impl ShieldedPool,
    prover: &impl Prover,
    inputs: Vec<Note>,
    outputs: Vec<Note>,
    recipient: Address,
    rng: &mut impl Rng,
) -> Result<(TxReceipt, TransactionRecord), TransactionError> {
    let prepared =
        prepare_transaction(pool, prover, inputs, outputs, recipient, rng).await?;

    info!(ext_amount = %prepared.ext_amount, "submitting shielded transaction");
    let receipt = pool.submit(&prepared.args, &prepared.ext_data).await?;

    Ok((
        receipt,
        TransactionRecord {
            proof_inputs: prepared.proof_inputs,
            args: prepared.args,
        },
    ))
}
