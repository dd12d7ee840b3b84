use alloy::primitives::B256;
use ark_bn254::Fr;
use ark_ff::{
    BigInteger,
    PrimeField,
};
use light_poseidon::{
    Poseidon,
    PoseidonHasher,
};

/// Convert B256 to BN254 field element.
fn b256_to_fr(value: B256) -> Fr {
    Fr::from_be_bytes_mod_order(value.as_ref())
}

/// Convert BN254 field element to B256.
fn fr_to_b256(value: Fr) -> B256 {
    let big_int = value.into_bigint();
    let bytes = big_int.to_bytes_be();
    B256::from_slice(&bytes)
}

/// Poseidon hash with 1 input.
/// Used for: nullifier = poseidon1(blinding)
pub fn poseidon1(a: B256) -> B256 {
    let mut hasher =
        Poseidon::<Fr>::new_circom(1).expect("Failed to create Poseidon hasher");
    let result = hasher
        .hash(&[b256_to_fr(a)])
        .expect("Failed to compute Poseidon hash");
    fr_to_b256(result)
}

/// Poseidon hash with 2 inputs.
/// Used for:
/// - commitment = poseidon2(amount, blinding)
/// - merkle_node = poseidon2(left, right)
pub fn poseidon2(a: B256, b: B256) -> B256 {
    let mut hasher =
        Poseidon::<Fr>::new_circom(2).expect("Failed to create Poseidon hasher");
    let inputs = [b256_to_fr(a), b256_to_fr(b)];
    let result = hasher
        .hash(&inputs)
        .expect("Failed to compute Poseidon hash");
    fr_to_b256(result)
}

/// Poseidon hash over an arbitrary-width input vector.
/// Used for: message_hash = poseidon(nullifiers ‖ commitments ‖ publicAmount)
///
/// Widths follow the Circom parameter set (1 to 12 inputs).
pub fn poseidon(inputs: &[B256]) -> B256 {
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())
        .expect("Failed to create Poseidon hasher");
    let elements: Vec<Fr> = inputs.iter().map(|v| b256_to_fr(*v)).collect();
    let result = hasher
        .hash(&elements)
        .expect("Failed to compute Poseidon hash");
    fr_to_b256(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poseidon1_deterministic() {
        let input = B256::repeat_byte(0x42);
        let hash1 = poseidon1(input);
        let hash2 = poseidon1(input);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_poseidon2_deterministic() {
        let a = B256::repeat_byte(0x01);
        let b = B256::repeat_byte(0x02);
        let hash1 = poseidon2(a, b);
        let hash2 = poseidon2(a, b);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_poseidon2_order_matters() {
        let a = B256::repeat_byte(0x01);
        let b = B256::repeat_byte(0x02);
        let hash1 = poseidon2(a, b);
        let hash2 = poseidon2(b, a);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_poseidon_matches_fixed_width() {
        let a = B256::repeat_byte(0x01);
        let b = B256::repeat_byte(0x02);
        assert_eq!(poseidon(&[a, b]), poseidon2(a, b));
        assert_eq!(poseidon(&[a]), poseidon1(a));
    }

    #[test]
    fn test_poseidon_width_four() {
        let inputs = [
            B256::repeat_byte(0x01),
            B256::repeat_byte(0x02),
            B256::repeat_byte(0x03),
            B256::repeat_byte(0x04),
        ];
        let hash1 = poseidon(&inputs);
        let hash2 = poseidon(&inputs);
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, B256::ZERO);
    }
}
