//! In-memory implementation of the Backend trait.
//!
//! Behaves exactly like the SQLite backend minus the persistence, which
//! makes it the natural backend for tests and short-lived processes.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use agora_core::{
    derive_address, Address, Author, DeliveryReceipt, InboxEntry, Page, SignedExpression,
    TimeRange, Timestamp,
};

use crate::error::Result;
use crate::traits::{check_envelope, page_bounds, Backend};

/// In-memory backend implementation.
///
/// All data is lost when the backend is dropped. Thread-safe via RwLock.
pub struct MemoryBackend {
    inner: RwLock<MemoryBackendInner>,
}

struct MemoryBackendInner {
    /// Public envelopes, deduplicated by content address.
    expressions: HashMap<Address, SignedExpression>,

    /// Author listing: one entry per publish call, in publish order.
    author_index: Vec<IndexEntry>,

    /// Inboxes keyed by owner, in receipt order.
    inboxes: HashMap<Author, Vec<InboxEntry>>,
}

struct IndexEntry {
    author: Author,
    address: Address,
    timestamp: Timestamp,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryBackendInner {
                expressions: HashMap::new(),
                author_index: Vec::new(),
                inboxes: HashMap::new(),
            }),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn create_public_expression(&self, expression: &SignedExpression) -> Result<Address> {
        check_envelope(expression)?;
        let address = derive_address(expression);

        let mut inner = self.inner.write().unwrap();

        inner
            .expressions
            .entry(address)
            .or_insert_with(|| expression.clone());

        // The listing records every publish, including re-publishes of an
        // envelope already stored.
        inner.author_index.push(IndexEntry {
            author: expression.author.clone(),
            address,
            timestamp: expression.timestamp,
        });

        Ok(address)
    }

    async fn get_expression_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<SignedExpression>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.expressions.get(address).cloned())
    }

    async fn get_by_author(
        &self,
        author: &Author,
        page: Page,
        range: TimeRange,
    ) -> Result<Vec<SignedExpression>> {
        let inner = self.inner.read().unwrap();

        let mut matches: Vec<(usize, &IndexEntry)> = inner
            .author_index
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.author == author && range.contains(&e.timestamp))
            .collect();

        // Envelope timestamp descending, publish order breaking ties.
        matches
            .sort_by(|(a_seq, a), (b_seq, b)| b.timestamp.cmp(&a.timestamp).then(b_seq.cmp(a_seq)));

        let (skip, take) = page_bounds(page);
        Ok(matches
            .into_iter()
            .skip(skip)
            .take(take)
            .filter_map(|(_, e)| inner.expressions.get(&e.address).cloned())
            .collect())
    }

    async fn send_private(
        &self,
        recipient: &Author,
        expression: &SignedExpression,
    ) -> Result<DeliveryReceipt> {
        check_envelope(expression)?;
        let address = derive_address(expression);
        let received_at = Timestamp::now();

        let mut inner = self.inner.write().unwrap();
        inner
            .inboxes
            .entry(recipient.clone())
            .or_default()
            .push(InboxEntry {
                sender: expression.author.clone(),
                expression: expression.clone(),
                received_at,
            });

        Ok(DeliveryReceipt {
            recipient: recipient.clone(),
            address,
            delivered_at: received_at,
        })
    }

    async fn get_inbox(
        &self,
        owner: &Author,
        sender: Option<&Author>,
        page: Page,
    ) -> Result<Vec<InboxEntry>> {
        let inner = self.inner.read().unwrap();

        let entries = match inner.inboxes.get(owner) {
            Some(entries) => entries,
            None => return Ok(Vec::new()),
        };

        let mut matches: Vec<(usize, &InboxEntry)> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| sender.map_or(true, |s| &e.sender == s))
            .collect();

        // Receipt time descending, delivery order breaking ties.
        matches.sort_by(|(a_seq, a), (b_seq, b)| {
            b.received_at.cmp(&a.received_at).then(b_seq.cmp(a_seq))
        });

        let (skip, take) = page_bounds(page);
        Ok(matches
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(_, e)| e.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{AgentSigner, ExpressionBuilder, Signer, Value};

    fn make_signer(id: &str, seed: u8) -> AgentSigner {
        AgentSigner::from_seed(Author::new(id), &[seed; 32])
    }

    fn make_expression(signer: &AgentSigner, body: &str, ts: &str) -> SignedExpression {
        ExpressionBuilder::new(
            signer.author().clone(),
            Value::from(serde_json::json!({ "body": body }))
                .canonicalize()
                .unwrap(),
        )
        .timestamp(Timestamp::from_rfc3339(ts).unwrap())
        .sign(signer)
    }

    #[tokio::test]
    async fn test_publish_then_fetch() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let expr = make_expression(&alice, "hello", "2024-03-01T12:00:00Z");

        let address = backend.create_public_expression(&expr).await.unwrap();
        assert_eq!(address, derive_address(&expr));

        let fetched = backend
            .get_expression_by_address(&address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, expr);

        let missing = Address::from_bytes([0xee; 32]);
        assert!(backend
            .get_expression_by_address(&missing)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_republish_appends_listing_entry() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let expr = make_expression(&alice, "again", "2024-03-01T12:00:00Z");

        let a1 = backend.create_public_expression(&expr).await.unwrap();
        let a2 = backend.create_public_expression(&expr).await.unwrap();
        assert_eq!(a1, a2);

        let listed = backend
            .get_by_author(alice.author(), Page::first(10), TimeRange::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], expr);
        assert_eq!(listed[1], expr);
    }

    #[tokio::test]
    async fn test_author_listing_newest_first_and_paginated() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let bob = make_signer("did:key:bob", 0x02);

        let e1 = make_expression(&alice, "one", "2024-03-01T09:00:00Z");
        let e2 = make_expression(&alice, "two", "2024-03-01T10:00:00Z");
        let e3 = make_expression(&alice, "three", "2024-03-01T11:00:00Z");
        let other = make_expression(&bob, "noise", "2024-03-01T10:30:00Z");

        for e in [&e1, &e2, &e3, &other] {
            backend.create_public_expression(e).await.unwrap();
        }

        let page0 = backend
            .get_by_author(alice.author(), Page::new(2, 0), TimeRange::default())
            .await
            .unwrap();
        assert_eq!(page0, vec![e3.clone(), e2.clone()]);

        let page1 = backend
            .get_by_author(alice.author(), Page::new(2, 1), TimeRange::default())
            .await
            .unwrap();
        assert_eq!(page1, vec![e1.clone()]);

        let page2 = backend
            .get_by_author(alice.author(), Page::new(2, 2), TimeRange::default())
            .await
            .unwrap();
        assert!(page2.is_empty());
    }

    #[tokio::test]
    async fn test_author_listing_equal_timestamps_latest_publish_first() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);

        let e1 = make_expression(&alice, "first", "2024-03-01T12:00:00Z");
        let e2 = make_expression(&alice, "second", "2024-03-01T12:00:00Z");
        backend.create_public_expression(&e1).await.unwrap();
        backend.create_public_expression(&e2).await.unwrap();

        let listed = backend
            .get_by_author(alice.author(), Page::first(10), TimeRange::default())
            .await
            .unwrap();
        assert_eq!(listed, vec![e2, e1]);
    }

    #[tokio::test]
    async fn test_author_listing_time_range() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);

        let old = make_expression(&alice, "old", "2024-02-01T00:00:00Z");
        let cutoff = make_expression(&alice, "cutoff", "2024-03-01T00:00:00Z");
        let new = make_expression(&alice, "new", "2024-04-01T00:00:00Z");
        for e in [&old, &cutoff, &new] {
            backend.create_public_expression(e).await.unwrap();
        }

        let since = Timestamp::from_rfc3339("2024-03-01T00:00:00Z").unwrap();
        let listed = backend
            .get_by_author(alice.author(), Page::first(10), TimeRange::since(since))
            .await
            .unwrap();
        // Half-open range: the lower bound is included.
        assert_eq!(listed, vec![new.clone(), cutoff.clone()]);

        let until = Timestamp::from_rfc3339("2024-03-01T00:00:00Z").unwrap();
        let listed = backend
            .get_by_author(alice.author(), Page::first(10), TimeRange::before(until))
            .await
            .unwrap();
        assert_eq!(listed, vec![old]);
    }

    #[tokio::test]
    async fn test_private_delivery_flow() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let bob = Author::new("did:key:bob");
        let note = make_expression(&alice, "psst", "2024-03-01T12:00:00Z");

        let receipt = backend.send_private(&bob, &note).await.unwrap();
        assert_eq!(receipt.recipient, bob);
        assert_eq!(receipt.address, derive_address(&note));

        let inbox = backend.get_inbox(&bob, None, Page::first(10)).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender, *alice.author());
        assert_eq!(inbox[0].expression, note);
        assert_eq!(inbox[0].received_at, receipt.delivered_at);

        // Delivery does not publish.
        assert!(backend
            .get_expression_by_address(&receipt.address)
            .await
            .unwrap()
            .is_none());
        assert!(backend
            .get_by_author(alice.author(), Page::first(10), TimeRange::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_inbox_isolated_per_owner() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let bob = Author::new("did:key:bob");
        let carol = Author::new("did:key:carol");
        let note = make_expression(&alice, "for bob", "2024-03-01T12:00:00Z");

        backend.send_private(&bob, &note).await.unwrap();

        assert_eq!(
            backend
                .get_inbox(&bob, None, Page::first(10))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(backend
            .get_inbox(&carol, None, Page::first(10))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_inbox_sender_filter() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let bob = make_signer("did:key:bob", 0x02);
        let carol = Author::new("did:key:carol");

        let from_alice = make_expression(&alice, "hi from alice", "2024-03-01T12:00:00Z");
        let from_bob = make_expression(&bob, "hi from bob", "2024-03-01T12:01:00Z");
        backend.send_private(&carol, &from_alice).await.unwrap();
        backend.send_private(&carol, &from_bob).await.unwrap();

        let all = backend
            .get_inbox(&carol, None, Page::first(10))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let only_alice = backend
            .get_inbox(&carol, Some(alice.author()), Page::first(10))
            .await
            .unwrap();
        assert_eq!(only_alice.len(), 1);
        assert_eq!(only_alice[0].expression, from_alice);

        let nobody = backend
            .get_inbox(
                &carol,
                Some(&Author::new("did:key:mallory")),
                Page::first(10),
            )
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn test_inbox_newest_first() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let bob = Author::new("did:key:bob");

        let first = make_expression(&alice, "first", "2024-03-01T12:00:00Z");
        let second = make_expression(&alice, "second", "2024-01-01T12:00:00Z");
        backend.send_private(&bob, &first).await.unwrap();
        backend.send_private(&bob, &second).await.unwrap();

        // Receipt order wins even though the second envelope carries an
        // older author timestamp.
        let inbox = backend.get_inbox(&bob, None, Page::first(10)).await.unwrap();
        assert_eq!(inbox[0].expression, second);
        assert_eq!(inbox[1].expression, first);
    }

    #[tokio::test]
    async fn test_duplicate_sends_land_twice() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let bob = Author::new("did:key:bob");
        let note = make_expression(&alice, "again", "2024-03-01T12:00:00Z");

        backend.send_private(&bob, &note).await.unwrap();
        backend.send_private(&bob, &note).await.unwrap();

        // No retry or dedup below the caller: two sends, two entries.
        let inbox = backend.get_inbox(&bob, None, Page::first(10)).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].expression, note);
        assert_eq!(inbox[1].expression, note);
    }

    #[tokio::test]
    async fn test_rejects_structurally_invalid() {
        let backend = MemoryBackend::new();
        let alice = make_signer("did:key:alice", 0x01);
        let mut expr = make_expression(&alice, "hello", "2024-03-01T12:00:00Z");
        expr.author = Author::new("");

        let err = backend.create_public_expression(&expr).await.unwrap_err();
        assert!(matches!(err, crate::error::BackendError::InvalidData(_)));

        let err = backend
            .send_private(&Author::new("did:key:bob"), &expr)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::BackendError::InvalidData(_)));
    }
}
