//! Ready-made identities and backends for tests.
//!
//! Everything here is deterministic when seeded, so failures replay.

use std::sync::Arc;

use agora::Exchange;
use agora_core::{
    AgentSigner, Author, Ed25519PublicKey, ExpressionBuilder, SignedExpression, Signer, Timestamp,
    Value,
};
use agora_store::MemoryBackend;

/// A test fixture with a signing identity and a memory backend.
pub struct TestFixture {
    pub signer: AgentSigner,
    pub backend: MemoryBackend,
}

impl TestFixture {
    /// Create a new test fixture with a random identity.
    pub fn new() -> Self {
        let id = format!("did:key:test-{:08x}", rand::random::<u32>());
        Self::named(id)
    }

    /// Create with a given author id and a random keypair.
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            signer: AgentSigner::generate(Author::new(id)),
            backend: MemoryBackend::new(),
        }
    }

    /// Create with a seeded keypair, for reproducible identities.
    pub fn with_seed(id: impl Into<String>, seed: [u8; 32]) -> Self {
        Self {
            signer: AgentSigner::from_seed(Author::new(id), &seed),
            backend: MemoryBackend::new(),
        }
    }

    /// The fixture's author identity.
    pub fn author(&self) -> &Author {
        self.signer.author()
    }

    /// The fixture's verifying key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        self.signer.public_key()
    }

    /// Sign a `{"body": …}` payload, stamped now.
    pub fn make_expression(&self, body: &str) -> SignedExpression {
        self.make_expression_from(Value::from(serde_json::json!({ "body": body })))
    }

    /// Sign an arbitrary payload, stamped now.
    pub fn make_expression_from(&self, data: Value) -> SignedExpression {
        ExpressionBuilder::new(
            self.author().clone(),
            data.canonicalize().expect("fixture payload is canonical"),
        )
        .sign(&self.signer)
    }

    /// Sign an arbitrary payload at a fixed instant.
    pub fn make_expression_at(&self, data: Value, timestamp: &str) -> SignedExpression {
        ExpressionBuilder::new(
            self.author().clone(),
            data.canonicalize().expect("fixture payload is canonical"),
        )
        .timestamp(Timestamp::from_rfc3339(timestamp).expect("fixture timestamp is valid"))
        .sign(&self.signer)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-agent tests.
///
/// Each fixture gets a distinct deterministic seed and author id.
pub fn multi_agent_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[1] = 0xA5;
            TestFixture::with_seed(format!("did:key:agent-{}", i), seed)
        })
        .collect()
}

/// Two exchanges bound to distinct identities over one shared backend.
///
/// The common setup for conversation tests: whatever one agent publishes
/// or delivers, the other can see through the same backend.
pub fn exchange_pair() -> (
    Exchange<AgentSigner, Arc<MemoryBackend>>,
    Exchange<AgentSigner, Arc<MemoryBackend>>,
) {
    let backend = Arc::new(MemoryBackend::new());
    let left = Exchange::new(
        AgentSigner::from_seed(Author::new("did:key:left"), &[0x11; 32]),
        Arc::clone(&backend),
    );
    let right = Exchange::new(
        AgentSigner::from_seed(Author::new("did:key:right"), &[0x22; 32]),
        Arc::clone(&backend),
    );
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{derive_address, verify_expression, Page};
    use agora_store::Backend;

    #[tokio::test]
    async fn test_fixture_expressions_verify_and_store() {
        let fixture = TestFixture::with_seed("did:key:fixture", [0x42; 32]);
        let expression = fixture.make_expression("hello");

        assert_eq!(expression.author, *fixture.author());
        verify_expression(&expression).unwrap();

        let address = fixture
            .backend
            .create_public_expression(&expression)
            .await
            .unwrap();
        assert_eq!(address, derive_address(&expression));
    }

    #[tokio::test]
    async fn test_multi_agent_identities_are_distinct() {
        let agents = multi_agent_fixtures(3);

        let keys: Vec<_> = agents.iter().map(|a| a.public_key()).collect();
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);

        let ids: Vec<_> = agents.iter().map(|a| a.author().id()).collect();
        assert_eq!(ids, vec!["did:key:agent-0", "did:key:agent-1", "did:key:agent-2"]);
    }

    #[tokio::test]
    async fn test_exchange_pair_shares_a_backend() {
        let (left, right) = exchange_pair();

        let address = left
            .publish(Value::from(serde_json::json!({ "body": "visible" })))
            .await
            .unwrap();
        assert!(right.fetch_by_address(&address).await.unwrap().is_some());

        left.send_private(
            right.author(),
            Value::from(serde_json::json!({ "body": "direct" })),
        )
        .await
        .unwrap();
        assert_eq!(right.read_inbox(None, Page::first(10)).await.unwrap().len(), 1);
    }
}
