//! Prover adapter shelling out to the snarkjs CLI.
//!
//! Per circuit the artifacts directory holds `<name>/<name>.wasm` (the
//! witness calculator) and `<name>/<name>.zkey` (the proving key). This
//! adapter:
//! 1. Writes the witness values to `input.json` in the circuit directory
//! 2. Runs `snarkjs wtns calculate` to generate the witness
//! 3. Runs `snarkjs groth16 prove` to generate the proof
//! 4. Reads the proof bytes from the output file

use std::path::PathBuf;

use alloy::primitives::{
    B256,
    Bytes,
    U256,
};
use serde::Serialize;
use tokio::process::Command;

use crate::{
    domain::witness::{
        InnocenceStepWitness,
        TransactionWitness,
    },
    ports::prover::{
        Circuit,
        Prover,
        ProverError,
    },
};

/// Format a B256 as a fixed-width hex string for the circuit input file.
fn format_field(value: &B256) -> String {
    format!("{}", value)
}

/// Format a U256 as a decimal string.
fn format_u256(value: &U256) -> String {
    value.to_string()
}

fn format_fields(values: &[B256]) -> Vec<String> {
    values.iter().map(format_field).collect()
}

fn format_paths(paths: &[Vec<B256>]) -> Vec<Vec<String>> {
    paths.iter().map(|p| format_fields(p)).collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionCircuitInput {
    root: String,
    input_nullifier: Vec<String>,
    output_commitment: Vec<String>,
    public_amount: String,
    ext_data_hash: String,
    in_amount: Vec<String>,
    in_blinding: Vec<String>,
    in_path_indices: Vec<u64>,
    in_path_elements: Vec<Vec<String>>,
    out_amount: Vec<String>,
    out_blinding: Vec<String>,
}

impl From<&TransactionWitness> for TransactionCircuitInput {
    fn from(w: &TransactionWitness) -> Self {
        Self {
            root: format_field(&w.root),
            input_nullifier: format_fields(&w.input_nullifiers),
            output_commitment: format_fields(&w.output_commitments),
            public_amount: format_u256(&w.public_amount),
            ext_data_hash: format_field(&w.ext_data_hash),
            in_amount: w.in_amounts.iter().map(format_u256).collect(),
            in_blinding: format_fields(&w.in_blindings),
            in_path_indices: w.in_path_indices.clone(),
            in_path_elements: format_paths(&w.in_path_elements),
            out_amount: w.out_amounts.iter().map(format_u256).collect(),
            out_blinding: format_fields(&w.out_blindings),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InnocenceStepCircuitInput {
    #[serde(rename = "step_in")]
    step_in: Vec<String>,
    message_hash_path_indices: u64,
    message_hash_path_elements: Vec<String>,
    allowed_message_hash_path_indices: u64,
    allowed_message_hash_path_elements: Vec<String>,
    in_amount: Vec<String>,
    in_blinding: Vec<String>,
    out_commitments: Vec<String>,
    amount: String,
    allowed_path_indices: Vec<u64>,
    allowed_path_elements: Vec<Vec<String>>,
    output_message_hash: String,
    update_path_indices: u64,
    update_path_elements: Vec<String>,
    allowed_commitments_new_root: String,
}

impl From<&InnocenceStepWitness> for InnocenceStepCircuitInput {
    fn from(w: &InnocenceStepWitness) -> Self {
        Self {
            step_in: format_fields(&w.step_in),
            message_hash_path_indices: w.message_hash_path_index,
            message_hash_path_elements: format_fields(&w.message_hash_path_elements),
            allowed_message_hash_path_indices: w.allow_list_path_index,
            allowed_message_hash_path_elements: format_fields(
                &w.allow_list_path_elements,
            ),
            in_amount: w.in_amounts.iter().map(format_u256).collect(),
            in_blinding: format_fields(&w.in_blindings),
            out_commitments: format_fields(&w.out_commitments),
            amount: format_u256(&w.public_amount),
            allowed_path_indices: w.allowed_path_indices.clone(),
            allowed_path_elements: format_paths(&w.allowed_path_elements),
            output_message_hash: format_field(&w.output_message_hash),
            update_path_indices: w.update_path_index,
            update_path_elements: format_fields(&w.update_path_elements),
            allowed_commitments_new_root: format_field(&w.allowed_commitments_new_root),
        }
    }
}

/// Prover backed by circom artifacts and the snarkjs CLI.
pub struct CircomProver {
    /// Path to the circuit artifacts directory (containing
    /// `transaction2/`, `transaction16/`, `proofOfInnocence/`)
    artifacts_dir: PathBuf,
}

impl CircomProver {
    /// Create a new CircomProver with the given artifacts directory.
    pub fn new(artifacts_dir: PathBuf) -> Self {
        Self { artifacts_dir }
    }

    /// Generate the input.json content for a transaction witness.
    fn format_transaction_input(witness: &TransactionWitness) -> Result<String, ProverError> {
        serde_json::to_string(&TransactionCircuitInput::from(witness))
            .map_err(|e| ProverError::Serialization(e.to_string()))
    }

    /// Generate the input.json content for an innocence step witness.
    fn format_step_input(witness: &InnocenceStepWitness) -> Result<String, ProverError> {
        serde_json::to_string(&InnocenceStepCircuitInput::from(witness))
            .map_err(|e| ProverError::Serialization(e.to_string()))
    }

    /// Execute a circuit and generate a proof.
    async fn prove_circuit(
        &self,
        circuit: Circuit,
        input_json: &str,
    ) -> Result<Bytes, ProverError> {
        let circuit_dir = self.artifacts_dir.join(circuit.artifact_name());

        if !circuit_dir.exists() {
            return Err(ProverError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("circuit directory not found: {}", circuit_dir.display()),
            )));
        }

        // 1. Write input.json with witness values
        let input_path = circuit_dir.join("input.json");
        std::fs::write(&input_path, input_json)?;

        // 2. Run snarkjs wtns calculate to generate the witness
        let wasm_path = circuit_dir.join(format!("{}.wasm", circuit.artifact_name()));
        let witness_path = circuit_dir.join("witness.wtns");
        let wtns_status = Command::new("snarkjs")
            .args(["wtns", "calculate"])
            .arg(&wasm_path)
            .arg(&input_path)
            .arg(&witness_path)
            .output()
            .await?;

        if !wtns_status.status.success() {
            let stderr = String::from_utf8_lossy(&wtns_status.stderr);
            return Err(ProverError::Witness(format!(
                "snarkjs wtns calculate failed: {}",
                stderr
            )));
        }

        // 3. Run snarkjs groth16 prove
        let zkey_path = circuit_dir.join(format!("{}.zkey", circuit.artifact_name()));
        let proof_path = circuit_dir.join("proof.json");
        let public_path = circuit_dir.join("public.json");
        let prove_status = Command::new("snarkjs")
            .args(["groth16", "prove"])
            .arg(&zkey_path)
            .arg(&witness_path)
            .arg(&proof_path)
            .arg(&public_path)
            .output()
            .await?;

        if !prove_status.status.success() {
            let stderr = String::from_utf8_lossy(&prove_status.stderr);
            return Err(ProverError::ProofGeneration(format!(
                "snarkjs groth16 prove failed: {}",
                stderr
            )));
        }

        // 4. Read proof file
        let proof = std::fs::read(&proof_path)?;

        Ok(Bytes::from(proof))
    }
}

impl Prover for CircomProver {
    async fn prove_transaction(
        &self,
        witness: &TransactionWitness,
        circuit: Circuit,
    ) -> Result<Bytes, ProverError> {
        let input_json = Self::format_transaction_input(witness)?;
        self.prove_circuit(circuit, &input_json).await
    }

    async fn prove_innocence_step(
        &self,
        witness: &InnocenceStepWitness,
    ) -> Result<Bytes, ProverError> {
        let input_json = Self::format_step_input(witness)?;
        self.prove_circuit(Circuit::InnocenceStep, &input_json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction_witness() -> TransactionWitness {
        TransactionWitness {
            root: B256::repeat_byte(0x01),
            input_nullifiers: vec![B256::repeat_byte(0x02), B256::repeat_byte(0x03)],
            output_commitments: vec![B256::repeat_byte(0x04)],
            public_amount: U256::from(1000u64),
            ext_data_hash: B256::repeat_byte(0x05),
            in_amounts: vec![U256::from(1000u64), U256::ZERO],
            in_blindings: vec![B256::repeat_byte(0x06), B256::repeat_byte(0x07)],
            in_path_indices: vec![3, 0],
            in_path_elements: vec![vec![B256::repeat_byte(0x08); 5], vec![B256::ZERO; 5]],
            out_amounts: vec![U256::from(1000u64)],
            out_blindings: vec![B256::repeat_byte(0x09)],
        }
    }

    #[test]
    fn test_format_transaction_input() {
        let json = CircomProver::format_transaction_input(&transaction_witness()).unwrap();

        assert!(json.contains("\"root\""));
        assert!(json.contains("\"inputNullifier\""));
        assert!(json.contains("\"outputCommitment\""));
        assert!(json.contains("\"publicAmount\":\"1000\""));
        assert!(json.contains("\"extDataHash\""));
        assert!(json.contains("\"inAmount\""));
        assert!(json.contains("\"inBlinding\""));
        assert!(json.contains("\"inPathIndices\":[3,0]"));
        assert!(json.contains("\"inPathElements\""));
        assert!(json.contains("\"outAmount\""));
        assert!(json.contains("\"outBlinding\""));
    }

    #[test]
    fn test_format_step_input() {
        let witness = InnocenceStepWitness {
            step_in: [B256::repeat_byte(0x01); 4],
            message_hash_path_index: 1,
            message_hash_path_elements: vec![B256::repeat_byte(0x02); 5],
            allow_list_path_index: 0,
            allow_list_path_elements: vec![B256::ZERO; 5],
            in_amounts: vec![U256::from(10u64), U256::ZERO],
            in_blindings: vec![B256::repeat_byte(0x03), B256::repeat_byte(0x04)],
            out_commitments: [B256::repeat_byte(0x05)],
            public_amount: U256::from(10u64),
            allowed_path_indices: vec![0, 0],
            allowed_path_elements: vec![vec![B256::ZERO; 5]; 2],
            output_message_hash: B256::ZERO,
            update_path_index: 2,
            update_path_elements: vec![B256::repeat_byte(0x06); 5],
            allowed_commitments_new_root: B256::repeat_byte(0x07),
        };

        let json = CircomProver::format_step_input(&witness).unwrap();

        assert!(json.contains("\"step_in\""));
        assert!(json.contains("\"messageHashPathIndices\":1"));
        assert!(json.contains("\"messageHashPathElements\""));
        assert!(json.contains("\"allowedMessageHashPathIndices\":0"));
        assert!(json.contains("\"allowedMessageHashPathElements\""));
        assert!(json.contains("\"outCommitments\""));
        assert!(json.contains("\"amount\":\"10\""));
        assert!(json.contains("\"allowedPathIndices\""));
        assert!(json.contains("\"allowedPathElements\""));
        assert!(json.contains("\"outputMessageHash\""));
        assert!(json.contains("\"updatePathIndices\":2"));
        assert!(json.contains("\"updatePathElements\""));
        assert!(json.contains("\"allowedCommitmentsNewRoot\""));
    }
}
