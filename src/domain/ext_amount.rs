use alloy::primitives::{
    I256,
    U256,
};

/// BN254 scalar-field modulus. Public amounts live in this field.
pub const FIELD_SIZE: U256 = U256::from_limbs([
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
]);

/// Ceiling for external-amount magnitudes (2^248). The circuit recovers
/// the sign of a public amount by comparing against this constant, so it
/// must not be changed independently of the circuit.
pub const MAX_EXT_AMOUNT: U256 = U256::from_limbs([0, 0, 0, 0x0100_0000_0000_0000]);

/// Encode a signed external amount into the field: the value itself when
/// non-negative, `FIELD_SIZE - |value|` when negative.
///
/// The caller keeps magnitudes at or below [`MAX_EXT_AMOUNT`]; larger
/// values make the sign ambiguous on decode.
pub fn field_encode(value: I256) -> U256 {
    if value.is_negative() {
        FIELD_SIZE - value.unsigned_abs()
    } else {
        value.unsigned_abs()
    }
}

/// Decode a field-encoded public amount back into a signed value by
/// comparing against the external-amount ceiling.
pub fn field_decode(public_amount: U256) -> I256 {
    if public_amount > MAX_EXT_AMOUNT {
        -I256::from_raw(FIELD_SIZE - public_amount)
    } else {
        I256::from_raw(public_amount)
    }
}
