//! Proptest strategies for payloads, identities, and whole expressions.

use proptest::prelude::*;

use agora_core::{
    derive_address, envelope_bytes, verify_expression, Address, AgentSigner, Author,
    Ed25519PublicKey, ExpressionBuilder, Keypair, Number, SignedExpression, Signer, Timestamp,
    Value,
};

/// Seeded keypairs, so shrunk failures replay exactly.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Verifying keys drawn from [`keypair`].
pub fn public_key() -> impl Strategy<Value = Ed25519PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a random address, not derived from any expression.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(Address::from_bytes)
}

/// Generate an author id in did:key form.
pub fn author_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,31}".prop_map(|s| format!("did:key:{s}"))
}

/// Generate an author identity.
pub fn author() -> impl Strategy<Value = Author> {
    author_id().prop_map(Author::new)
}

/// Timestamps between the epoch and late 2023, millisecond-aligned.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    (0i64..=1_700_000_000_000i64)
        .prop_map(|ms| Timestamp::from_millis(ms).expect("generated millis are representable"))
}

/// Generate a payload number: i64, u64, or finite f64.
pub fn number() -> impl Strategy<Value = Number> {
    prop_oneof![
        any::<i64>().prop_map(Number::from),
        any::<u64>().prop_map(Number::from),
        prop::num::f64::NORMAL.prop_filter_map("finite floats only", Number::from_f64),
    ]
}

/// Generate payload text, including non-ASCII and control characters.
pub fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 0..16).prop_map(|chars| chars.into_iter().collect())
}

/// Generate a mapping key.
pub fn key() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,7}".prop_map(String::from)
}

/// Generate an arbitrary payload value, nested up to a few levels deep.
///
/// Mapping keys are unique, so every generated value canonicalizes.
pub fn value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        number().prop_map(Value::Number),
        text().prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
            mapping_entries(inner).prop_map(Value::Mapping),
        ]
    })
}

// Entries come out sorted or reverse-sorted, so canonicalization has
// reordering to do about half the time.
fn mapping_entries(
    inner: impl Strategy<Value = Value> + 'static,
) -> impl Strategy<Value = Vec<(String, Value)>> {
    (prop::collection::btree_map(key(), inner, 0..4), any::<bool>()).prop_map(|(map, reverse)| {
        let mut entries: Vec<(String, Value)> = map.into_iter().collect();
        if reverse {
            entries.reverse();
        }
        entries
    })
}

/// Parameters for generating a signed expression.
#[derive(Debug, Clone)]
pub struct ExpressionParams {
    pub author_id: String,
    pub seed: [u8; 32],
    pub timestamp_ms: i64,
    pub data: Value,
}

impl Arbitrary for ExpressionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            author_id(),
            any::<[u8; 32]>(),
            0i64..=1_700_000_000_000i64, // timestamp
            value(),
        )
            .prop_map(|(author_id, seed, timestamp_ms, data)| ExpressionParams {
                author_id,
                seed,
                timestamp_ms,
                data,
            })
            .boxed()
    }
}

/// Generate a signed expression from parameters.
pub fn expression_from_params(params: &ExpressionParams) -> SignedExpression {
    let signer = AgentSigner::from_seed(Author::new(params.author_id.clone()), &params.seed);
    let data = params
        .data
        .clone()
        .canonicalize()
        .expect("generated mappings have unique keys");
    let timestamp =
        Timestamp::from_millis(params.timestamp_ms).expect("generated millis are representable");

    ExpressionBuilder::new(signer.author().clone(), data)
        .timestamp(timestamp)
        .sign(&signer)
}
