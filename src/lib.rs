//! Client-side witness preparation and recursive proof-of-innocence
//! chaining for a shielded UTXO pool.
//!
//! The pool contract stores note commitments and verifies proofs; this
//! crate rebuilds the transaction-layer Merkle trees from the contract's
//! event log, assembles witnesses for the base shielded-transfer circuit,
//! and folds batches of completed transactions into a chain of recursive
//! innocence-proof steps.

pub mod adapters;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod innocence;
pub mod ports;
pub mod transaction;
