pub mod circom_prover;
pub mod ethereum_rpc;
pub mod mock;
