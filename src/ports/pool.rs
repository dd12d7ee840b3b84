use alloy::primitives::{
    B256,
    U256,
};
use thiserror::Error;

use crate::domain::transaction::{
    ExtData,
    TransactionArgs,
    message_hash,
};

/// One `NewCommitment` event from the pool's log: a note commitment and
/// its on-chain emission index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitmentEvent {
    /// Emission index (leaf order in the commitment tree)
    pub index: u64,
    /// The note commitment
    pub commitment: B256,
}

/// One `NewMessage` event from the pool's log: the public fields of a
/// settled transaction, from which its compliance fingerprint is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageEvent {
    /// Emission index (leaf order in the message-hash tree)
    pub index: u64,
    /// The two input nullifiers
    pub nullifiers: [B256; 2],
    /// The output commitment
    pub commitment: B256,
    /// Field-encoded external amount
    pub public_amount: U256,
}

impl MessageEvent {
    /// The message hash recorded for this transaction.
    pub fn message_hash(&self) -> B256 {
        message_hash(&self.nullifiers, &[self.commitment], self.public_amount)
    }
}

/// Transaction receipt information.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: B256,
    /// Block number
    pub block_number: u64,
    /// Gas used
    pub gas_used: u64,
    /// Whether the transaction succeeded
    pub success: bool,
}

/// Errors that can occur while talking to the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("contract error: {0}")]
    Contract(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("signer error: {0}")]
    Signer(String),
}

/// Port onto the shielded pool contract: the read-only event streams the
/// transaction-layer trees are rebuilt from, and transaction submission.
///
/// Implementations must return events queryable from genesis, in emission
/// order or sortable by `index`.
pub trait ShieldedPool: Send + Sync {
    /// Every `NewCommitment` event ever emitted by the pool.
    fn commitment_events(
        &self,
    ) -> impl core::future::Future<Output = Result<Vec<CommitmentEvent>, PoolError>>;

    /// Every `NewMessage` event ever emitted by the pool.
    fn message_events(
        &self,
    ) -> impl core::future::Future<Output = Result<Vec<MessageEvent>, PoolError>>;

    /// Submit a transaction's public args and external data on-chain.
    /// Net-positive external amounts are attached as call value.
    fn submit(
        &self,
        args: &TransactionArgs,
        ext_data: &ExtData,
    ) -> impl core::future::Future<Output = Result<TxReceipt, PoolError>>;

    /// The pool's current commitment tree root.
    fn last_root(
        &self,
    ) -> impl core::future::Future<Output = Result<B256, PoolError>>;

    /// Check if a nullifier has been spent.
    fn is_spent(
        &self,
        nullifier: B256,
    ) -> impl core::future::Future<Output = Result<bool, PoolError>>;
}
