pub mod commitment;
pub mod ext_amount;
pub mod merkle;
pub mod note;
pub mod nullifier;
pub mod transaction;
pub mod witness;
