//! Ethereum RPC adapter for the shielded pool contract.
//!
//! The contract keeps its own incremental commitment tree on-chain
//! (height 23) and verifies proofs; clients never query that tree
//! directly. Instead they replay the `NewCommitment` / `NewMessage`
//! event streams from genesis and rebuild the transaction-layer trees
//! locally.

use alloy::{
    eips::BlockNumberOrTag,
    network::EthereumWallet,
    primitives::{
        Address,
        B256,
    },
    providers::{
        DynProvider,
        ProviderBuilder,
    },
    signers::local::PrivateKeySigner,
    sol,
};

use crate::{
    domain::transaction::{
        ExtData,
        TransactionArgs,
    },
    ports::pool::{
        CommitmentEvent,
        MessageEvent,
        PoolError,
        ShieldedPool,
        TxReceipt,
    },
};

// Generate contract bindings using Alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IPrivacyPool {
        struct TransactArgs {
            bytes proof;
            bytes32 root;
            bytes32[] inputNullifiers;
            bytes32[] outputCommitments;
            uint256 publicAmount;
            bytes32 extDataHash;
        }

        struct TransactExtData {
            address recipient;
            int256 extAmount;
        }

        event NewCommitment(bytes32 commitment, uint256 index, bytes encryptedOutput);
        event NewMessage(bytes32 nullifier1, bytes32 nullifier2, bytes32 commitment, uint256 extAmount, uint256 index);
        event NewNullifier(bytes32 nullifier);

        function getLastRoot() external view returns (bytes32);
        function isSpent(bytes32 nullifier) external view returns (bool);

        function transact(TransactArgs calldata args, TransactExtData calldata extData) external payable;
    }
}

/// RPC adapter implementing the [`ShieldedPool`] port against a deployed
/// pool contract.
pub struct EthereumRpc {
    provider: DynProvider,
    pool: Address,
    signer_address: Address,
}

impl EthereumRpc {
    /// Create a new EthereumRpc instance.
    ///
    /// # Arguments
    /// * `rpc_url` - The HTTP RPC endpoint URL
    /// * `private_key` - The private key for signing transactions
    /// * `pool` - The pool contract address
    pub async fn new(
        rpc_url: &str,
        private_key: &str,
        pool: Address,
    ) -> Result<Self, PoolError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| PoolError::Signer(format!("invalid private key: {}", e)))?;

        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider =
            DynProvider::new(ProviderBuilder::new().wallet(wallet).connect_http(
                rpc_url
                    .parse()
                    .map_err(|e| PoolError::Rpc(format!("invalid RPC URL: {}", e)))?,
            ));

        Ok(Self {
            provider,
            pool,
            signer_address,
        })
    }

    /// Get the signer's address.
    pub fn signer_address(&self) -> Address {
        self.signer_address
    }

    /// Get the pool contract address.
    pub fn pool_address(&self) -> Address {
        self.pool
    }

    /// Helper to convert an alloy transaction receipt to our TxReceipt type.
    fn convert_receipt(receipt: &alloy::rpc::types::TransactionReceipt) -> TxReceipt {
        TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or(0),
            gas_used: receipt.gas_used,
            success: receipt.status(),
        }
    }
}

impl ShieldedPool for EthereumRpc {
    async fn commitment_events(&self) -> Result<Vec<CommitmentEvent>, PoolError> {
        let pool = IPrivacyPool::new(self.pool, &self.provider);
        let logs = pool
            .NewCommitment_filter()
            .from_block(BlockNumberOrTag::Earliest)
            .query()
            .await
            .map_err(|e| PoolError::Rpc(e.to_string()))?;

        let mut events: Vec<CommitmentEvent> = logs
            .into_iter()
            .map(|(event, _log)| CommitmentEvent {
                index: event.index.try_into().unwrap_or(u64::MAX),
                commitment: event.commitment,
            })
            .collect();
        events.sort_by_key(|e| e.index);

        Ok(events)
    }

    async fn message_events(&self) -> Result<Vec<MessageEvent>, PoolError> {
        let pool = IPrivacyPool::new(self.pool, &self.provider);
        let logs = pool
            .NewMessage_filter()
            .from_block(BlockNumberOrTag::Earliest)
            .query()
            .await
            .map_err(|e| PoolError::Rpc(e.to_string()))?;

        let mut events: Vec<MessageEvent> = logs
            .into_iter()
            .map(|(event, _log)| MessageEvent {
                index: event.index.try_into().unwrap_or(u64::MAX),
                nullifiers: [event.nullifier1, event.nullifier2],
                commitment: event.commitment,
                public_amount: event.extAmount,
            })
            .collect();
        events.sort_by_key(|e| e.index);

        Ok(events)
    }

    async fn submit(
        &self,
        args: &TransactionArgs,
        ext_data: &ExtData,
    ) -> Result<TxReceipt, PoolError> {
        let pool = IPrivacyPool::new(self.pool, &self.provider);

        let call_args = IPrivacyPool::TransactArgs {
            proof: args.proof.clone(),
            root: args.root,
            inputNullifiers: args.input_nullifiers.clone(),
            outputCommitments: args.output_commitments.clone(),
            publicAmount: args.public_amount,
            extDataHash: args.ext_data_hash,
        };
        let call_ext_data = IPrivacyPool::TransactExtData {
            recipient: ext_data.recipient,
            extAmount: ext_data.ext_amount,
        };

        let mut call = pool.transact(call_args, call_ext_data);
        if ext_data.ext_amount.is_positive() {
            // Net deposits carry the external amount as native value.
            call = call.value(ext_data.ext_amount.unsigned_abs());
        }

        let receipt = call
            .send()
            .await
            .map_err(|e| PoolError::TransactionFailed(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| PoolError::TransactionFailed(e.to_string()))?;

        if !receipt.status() {
            return Err(PoolError::TransactionReverted("transact reverted".into()));
        }

        Ok(Self::convert_receipt(&receipt))
    }

    async fn last_root(&self) -> Result<B256, PoolError> {
        let pool = IPrivacyPool::new(self.pool, &self.provider);
        let result = pool
            .getLastRoot()
            .call()
            .await
            .map_err(|e| PoolError::Contract(e.to_string()))?;
        Ok(result)
    }

    async fn is_spent(&self, nullifier: B256) -> Result<bool, PoolError> {
        let pool = IPrivacyPool::new(self.pool, &self.provider);
        let result = pool
            .isSpent(nullifier)
            .call()
            .await
            .map_err(|e| PoolError::Contract(e.to_string()))?;
        Ok(result)
    }
}
