//! The Exchange: unified API for agent-to-agent expression exchange.
//!
//! The Exchange binds one agent identity to a storage backend and exposes
//! the full publish, fetch, and private delivery surface behind it.

use agora_core::{
    verify_expression, Address, Author, DeliveryReceipt, ExpressionBuilder, InboxEntry, Page,
    SignedExpression, Signer, TimeRange, Value,
};
use agora_store::Backend;

use crate::error::Result;

/// Configuration for the Exchange.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Whether fetched envelopes are verified before being returned.
    ///
    /// Covers address lookups, author listings, and inbox reads. Off, the
    /// exchange trusts whatever the backend hands back.
    pub verify_on_fetch: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            verify_on_fetch: true,
        }
    }
}

/// One agent's view of the exchange.
///
/// Everything flowing out is canonicalized and signed as the bound
/// identity; everything flowing in can be verified before it is handed
/// back. One backend is commonly shared by several exchanges, one per
/// agent; pass an `Arc<B>` as the backend to share it.
pub struct Exchange<S: Signer, B: Backend> {
    /// The identity that authors and signs everything this exchange emits.
    signer: S,
    backend: B,
    config: ExchangeConfig,
}

impl<S: Signer, B: Backend> Exchange<S, B> {
    /// Create a new exchange with default configuration.
    pub fn new(signer: S, backend: B) -> Self {
        Self::with_config(signer, backend, ExchangeConfig::default())
    }

    /// Create a new exchange with explicit configuration.
    pub fn with_config(signer: S, backend: B, config: ExchangeConfig) -> Self {
        Self {
            signer,
            backend,
            config,
        }
    }

    /// The identity bound to this exchange.
    pub fn author(&self) -> &Author {
        self.signer.author()
    }

    /// Get the backend reference.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publishing
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish a payload as a signed public expression.
    ///
    /// The payload is canonicalized, stamped with the current UTC time, and
    /// signed with the bound identity. Returns the content address, which
    /// any agent on the same backend can fetch by.
    pub async fn publish(&self, data: Value) -> Result<Address> {
        let expression = self.compose(data)?;
        let address = self.backend.create_public_expression(&expression).await?;
        tracing::debug!("published {} as {}", address, self.signer.author());
        Ok(address)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fetching
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch an expression by content address.
    ///
    /// Unknown addresses are `None`.
    pub async fn fetch_by_address(&self, address: &Address) -> Result<Option<SignedExpression>> {
        match self.backend.get_expression_by_address(address).await? {
            Some(expression) => {
                self.check_fetched(&expression)?;
                Ok(Some(expression))
            }
            None => Ok(None),
        }
    }

    /// List an author's public expressions, newest first.
    ///
    /// `range` is half-open; `page.size == 0` asks for the backend default.
    pub async fn fetch_by_author(
        &self,
        author: &Author,
        page: Page,
        range: TimeRange,
    ) -> Result<Vec<SignedExpression>> {
        let expressions = self.backend.get_by_author(author, page, range).await?;
        for expression in &expressions {
            self.check_fetched(expression)?;
        }
        Ok(expressions)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private Delivery
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a payload privately to one recipient.
    ///
    /// Canonicalized and signed exactly as in [`Exchange::publish`], but
    /// delivered to the recipient's inbox instead of the public store.
    pub async fn send_private(
        &self,
        recipient: &Author,
        data: Value,
    ) -> Result<DeliveryReceipt> {
        let expression = self.compose(data)?;
        let receipt = self.backend.send_private(recipient, &expression).await?;
        tracing::debug!("delivered {} to {}", receipt.address, recipient);
        Ok(receipt)
    }

    /// Read this agent's own inbox, newest first by receipt time.
    ///
    /// `sender` restricts the listing to one sender. Reading another
    /// agent's inbox is not an exchange operation; that goes through the
    /// backend contract directly.
    pub async fn read_inbox(
        &self,
        sender: Option<&Author>,
        page: Page,
    ) -> Result<Vec<InboxEntry>> {
        let entries = self
            .backend
            .get_inbox(self.signer.author(), sender, page)
            .await?;
        for entry in &entries {
            self.check_fetched(&entry.expression)?;
        }
        Ok(entries)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Canonicalize and sign a payload under the bound identity.
    fn compose(&self, data: Value) -> Result<SignedExpression> {
        let data = data.canonicalize()?;
        Ok(ExpressionBuilder::new(self.signer.author().clone(), data).sign(&self.signer))
    }

    fn check_fetched(&self, expression: &SignedExpression) -> Result<()> {
        if self.config.verify_on_fetch {
            verify_expression(expression)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agora_core::{AgentSigner, CoreError};
    use agora_store::MemoryBackend;

    use crate::error::ExchangeError;

    fn make_exchange(id: &str, seed: u8) -> Exchange<AgentSigner, MemoryBackend> {
        let signer = AgentSigner::from_seed(Author::new(id), &[seed; 32]);
        Exchange::new(signer, MemoryBackend::new())
    }

    #[tokio::test]
    async fn test_publish_and_fetch_roundtrip() {
        let exchange = make_exchange("did:key:alice", 0x01);

        let address = exchange
            .publish(Value::from(serde_json::json!({ "body": "hello" })))
            .await
            .unwrap();

        let fetched = exchange.fetch_by_address(&address).await.unwrap().unwrap();
        assert_eq!(fetched.author, *exchange.author());
        assert_eq!(
            fetched.data.get("body").and_then(|v| v.as_str()),
            Some("hello")
        );
    }

    #[tokio::test]
    async fn test_publish_canonicalizes_payload() {
        let exchange = make_exchange("did:key:alice", 0x01);

        // Keys deliberately out of order.
        let data = Value::Mapping(vec![
            ("zeta".to_string(), Value::from(1i64)),
            ("alpha".to_string(), Value::from(2i64)),
        ]);
        let address = exchange.publish(data).await.unwrap();

        let fetched = exchange.fetch_by_address(&address).await.unwrap().unwrap();
        let keys: Vec<&str> = fetched
            .data
            .as_value()
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_publish_rejects_duplicate_keys() {
        let exchange = make_exchange("did:key:alice", 0x01);

        let data = Value::Mapping(vec![
            ("body".to_string(), Value::from("a")),
            ("body".to_string(), Value::from("b")),
        ]);
        let err = exchange.publish(data).await.unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Core(CoreError::DuplicateKey(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_address_is_none() {
        let exchange = make_exchange("did:key:alice", 0x01);
        let missing = Address::from_bytes([0x99; 32]);
        assert!(exchange.fetch_by_address(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shared_backend_private_flow() {
        let backend = Arc::new(MemoryBackend::new());

        let alice = Exchange::new(
            AgentSigner::from_seed(Author::new("did:key:alice"), &[0x01; 32]),
            Arc::clone(&backend),
        );
        let bob = Exchange::new(
            AgentSigner::from_seed(Author::new("did:key:bob"), &[0x02; 32]),
            Arc::clone(&backend),
        );

        let receipt = alice
            .send_private(
                bob.author(),
                Value::from(serde_json::json!({ "body": "psst" })),
            )
            .await
            .unwrap();
        assert_eq!(receipt.recipient, *bob.author());

        // Bob sees it; Alice's own inbox stays empty.
        let inbox = bob.read_inbox(None, Page::first(10)).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender, *alice.author());
        assert_eq!(
            inbox[0].expression.data.get("body").and_then(|v| v.as_str()),
            Some("psst")
        );

        assert!(alice.read_inbox(None, Page::first(10)).await.unwrap().is_empty());

        // Private delivery is invisible to public fetches.
        assert!(bob
            .fetch_by_address(&receipt.address)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_fetch_by_author_across_exchanges() {
        let backend = Arc::new(MemoryBackend::new());

        let alice = Exchange::new(
            AgentSigner::from_seed(Author::new("did:key:alice"), &[0x01; 32]),
            Arc::clone(&backend),
        );
        let bob = Exchange::new(
            AgentSigner::from_seed(Author::new("did:key:bob"), &[0x02; 32]),
            Arc::clone(&backend),
        );

        alice
            .publish(Value::from(serde_json::json!({ "body": "thought one" })))
            .await
            .unwrap();
        alice
            .publish(Value::from(serde_json::json!({ "body": "thought two" })))
            .await
            .unwrap();

        let listed = bob
            .fetch_by_author(alice.author(), Page::first(10), TimeRange::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        for expression in &listed {
            assert_eq!(expression.author, *alice.author());
        }
    }
}
