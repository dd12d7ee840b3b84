pub mod pool;
pub mod prover;
