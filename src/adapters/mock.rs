//! In-memory stand-ins for the pool and prover ports, used by the
//! integration tests and demos so the full
//! deposit → deposit → withdraw → innocence flow runs without a chain or
//! a proving backend.

use std::collections::HashSet;

use alloy::primitives::{
    B256,
    Bytes,
    keccak256,
};
use tokio::sync::Mutex;

use crate::{
    domain::{
        transaction::{
            ExtData,
            TransactionArgs,
        },
        witness::{
            InnocenceStepWitness,
            TransactionWitness,
        },
    },
    ports::{
        pool::{
            CommitmentEvent,
            MessageEvent,
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

#[derive(Default)]
struct MockPoolState {
    commitments: Vec<CommitmentEvent>,
    messages: Vec<MessageEvent>,
    spent: HashSet<B256>,
    last_root: B256,
}

/// Minimal mock of [`ShieldedPool`] keeping the event log in memory.
///
/// Submission mirrors the deployed contract: only the 2-input circuit
/// tier is accepted, double spends revert, and each settled transaction
/// appends one `NewCommitment` and one `NewMessage` event.
#[derive(Default)]
pub struct MockShieldedPool {
    state: Mutex<MockPoolState>,
}

impl MockShieldedPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a commitment event directly (simulates history predating the
    /// client, e.g. other users' deposits).
    pub async fn insert_commitment(&self, commitment: B256) {
        let mut state = self.state.lock().await;
        let index = state.commitments.len() as u64;
        state.commitments.push(CommitmentEvent { index, commitment });
    }
}

impl ShieldedPool for MockShieldedPool {
    async fn commitment_events(&self) -> Result<Vec<CommitmentEvent>, PoolError> {
        Ok(self.state.lock().await.commitments.clone())
    }

    async fn message_events(&self) -> Result<Vec<MessageEvent>, PoolError> {
        Ok(self.state.lock().await.messages.clone())
    }

    async fn submit(
        &self,
        args: &TransactionArgs,
        ext_data: &ExtData,
    ) -> Result<TxReceipt, PoolError> {
        if args.input_nullifiers.len() != 2 || args.output_commitments.len() != 1 {
            return Err(PoolError::Contract(
                "only the 2-input, 1-output verifier is deployed".into(),
            ));
        }
        if args.ext_data_hash != ext_data.hash() {
            return Err(PoolError::TransactionReverted(
                "ext data hash mismatch".into(),
            ));
        }

        let mut state = self.state.lock().await;

        for nullifier in &args.input_nullifiers {
            if state.spent.contains(nullifier) {
                return Err(PoolError::TransactionReverted(
                    "input nullifier already spent".into(),
                ));
            }
        }
        for nullifier in &args.input_nullifiers {
            state.spent.insert(*nullifier);
        }

        let commitment = args.output_commitments[0];
        let commitment_index = state.commitments.len() as u64;
        state.commitments.push(CommitmentEvent {
            index: commitment_index,
            commitment,
        });

        let message_index = state.messages.len() as u64;
        state.messages.push(MessageEvent {
            index: message_index,
            nullifiers: [args.input_nullifiers[0], args.input_nullifiers[1]],
            commitment,
            public_amount: args.public_amount,
        });

        state.last_root = args.root;

        let mut preimage = [0u8; 64];
        preimage[..32].copy_from_slice(args.root.as_slice());
        preimage[32..].copy_from_slice(args.ext_data_hash.as_slice());

        Ok(TxReceipt {
            tx_hash: keccak256(preimage),
            block_number: message_index,
            gas_used: 0,
            success: true,
        })
    }

    async fn last_root(&self) -> Result<B256, PoolError> {
        Ok(self.state.lock().await.last_root)
    }

    async fn is_spent(&self, nullifier: B256) -> Result<bool, PoolError> {
        Ok(self.state.lock().await.spent.contains(&nullifier))
    }
}

/// Deterministic mock of [`Prover`]: the "proof" is a digest of the
/// serialized witness and circuit name.
pub struct MockProver;

impl MockProver {
    fn digest<T: serde::Serialize>(
        witness: &T,
        circuit: Circuit,
    ) -> Result<Bytes, ProverError> {
        let mut bytes = serde_json::to_vec(witness)
            .map_err(|e| ProverError::Serialization(e.to_string()))?;
        bytes.extend_from_slice(circuit.artifact_name().as_bytes());
        Ok(Bytes::copy_from_slice(keccak256(&bytes).as_slice()))
    }
}

impl Prover for MockProver {
    async fn prove_transaction(
        &self,
        witness: &TransactionWitness,
        circuit: Circuit,
    ) -> Result<Bytes, ProverError> {
        Self::digest(witness, circuit)
    }

    async fn prove_innocence_step(
        &self,
        witness: &InnocenceStepWitness,
    ) -> Result<Bytes, ProverError> {
        Self::digest(witness, Circuit::InnocenceStep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{
        Address,
        I256,
        U256,
    };

    use crate::domain::ext_amount::field_encode;

    fn sample_args(nullifier_seed: u8) -> (TransactionArgs, ExtData) {
        let ext_data = ExtData {
            recipient: Address::ZERO,
            ext_amount: I256::try_from(100u64).unwrap(),
        };
        let args = TransactionArgs {
            proof: Bytes::from(vec![0xaa]),
            root: B256::repeat_byte(0x01),
            input_nullifiers: vec![
                B256::repeat_byte(nullifier_seed),
                B256::repeat_byte(nullifier_seed + 1),
            ],
            output_commitments: vec![B256::repeat_byte(0x10 + nullifier_seed)],
            public_amount: field_encode(ext_data.ext_amount),
            ext_data_hash: ext_data.hash(),
        };
        (args, ext_data)
    }

    #[tokio::test]
    async fn test_submit_appends_events() {
        let pool = MockShieldedPool::new();
        let (args, ext_data) = sample_args(0x02);

        let receipt = pool.submit(&args, &ext_data).await.unwrap();
        assert!(receipt.success);

        let commitments = pool.commitment_events().await.unwrap();
        let messages = pool.message_events().await.unwrap();
        assert_eq!(commitments.len(), 1);
        assert_eq!(commitments[0].index, 0);
        assert_eq!(commitments[0].commitment, args.output_commitments[0]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_hash(), args.message_hash());

        assert!(pool.is_spent(args.input_nullifiers[0]).await.unwrap());
        assert!(!pool.is_spent(B256::repeat_byte(0x77)).await.unwrap());
        assert_eq!(pool.last_root().await.unwrap(), args.root);
    }

    #[tokio::test]
    async fn test_double_spend_reverts() {
        let pool = MockShieldedPool::new();
        let (args, ext_data) = sample_args(0x02);

        pool.submit(&args, &ext_data).await.unwrap();
        let err = pool.submit(&args, &ext_data).await.unwrap_err();
        assert!(matches!(err, PoolError::TransactionReverted(_)));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_shape() {
        let pool = MockShieldedPool::new();
        let (mut args, ext_data) = sample_args(0x02);
        args.input_nullifiers.push(B256::repeat_byte(0x09));

        let err = pool.submit(&args, &ext_data).await.unwrap_err();
        assert!(matches!(err, PoolError::Contract(_)));
    }
}
