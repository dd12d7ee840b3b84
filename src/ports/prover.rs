use alloy::primitives::Bytes;
use thiserror::Error;

use crate::domain::witness::{
    InnocenceStepWitness,
    TransactionWitness,
};

/// Identifier of the circuit a witness is proven against. Distinct base
/// circuits exist per input-count tier; the innocence step has its own
/// recursive circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Circuit {
    Transaction2,
    Transaction16,
    InnocenceStep,
}

impl Circuit {
    /// The base-transaction circuit tier for a padded input count.
    pub fn for_input_count(inputs: usize) -> Self {
        if inputs > 2 {
            Self::Transaction16
        } else {
            Self::Transaction2
        }
    }

    /// Artifact directory name for this circuit.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Self::Transaction2 => "transaction2",
            Self::Transaction16 => "transaction16",
            Self::InnocenceStep => "proofOfInnocence",
        }
    }
}

/// Errors that can occur during proof generation.
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("witness generation failed: {0}")]
    Witness(String),

    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for proof generation")]
    Timeout,
}

/// Trait for generating ZK proofs over assembled witnesses.
///
/// Implementations may shell out to external provers or use in-process
/// proving libraries. Proving is the dominant latency source; callers
/// issue at most one call at a time per chain run.
pub trait Prover: Send + Sync {
    /// Prove a base shielded transfer against the given circuit tier.
    fn prove_transaction(
        &self,
        witness: &TransactionWitness,
        circuit: Circuit,
    ) -> impl core::future::Future<Output = Result<Bytes, ProverError>>;

    /// Prove one recursive innocence step.
    fn prove_innocence_step(
        &self,
        witness: &InnocenceStepWitness,
    ) -> impl core::future::Future<Output = Result<Bytes, ProverError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_tier_selection() {
        assert_eq!(Circuit::for_input_count(0), Circuit::Transaction2);
        assert_eq!(Circuit::for_input_count(2), Circuit::Transaction2);
        assert_eq!(Circuit::for_input_count(3), Circuit::Transaction16);
        assert_eq!(Circuit::for_input_count(16), Circuit::Transaction16);
    }
}
