//! Backend trait: the abstract interface for expression storage and
//! private delivery.
//!
//! This trait keeps the exchange storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use agora_core::{
    verify_expression_structure, Address, Author, DeliveryReceipt, InboxEntry, Page,
    SignedExpression, TimeRange,
};
use async_trait::async_trait;

use crate::error::{BackendError, Result};

/// Page size used when a request asks for `Page.size == 0`.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Resolve a page request to `(skip, take)` element bounds.
pub(crate) fn page_bounds(page: Page) -> (usize, usize) {
    let size = if page.size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page.size
    } as usize;
    (size * page.number as usize, size)
}

/// Reject envelopes that are structurally unusable before they reach
/// storage.
pub(crate) fn check_envelope(expression: &SignedExpression) -> Result<()> {
    verify_expression_structure(expression).map_err(|e| BackendError::InvalidData(e.to_string()))
}

/// The Backend trait: async interface for expression storage and private
/// delivery.
///
/// All methods are async to support both sync (SQLite) and remote backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the
/// runtime.
///
/// # Design Notes
///
/// - **Content addressing**: `create_public_expression` derives the address
///   from the canonical envelope bytes; storing the same envelope twice
///   yields the same address.
/// - **One index entry per publish**: every publish call appends to the
///   author listing, so deliberate re-publishes stay visible.
/// - **Absence is not an error**: unknown addresses return `None`; empty or
///   out-of-range pages return empty vectors.
/// - **No retries**: a failed delivery is reported once. Retrying is the
///   caller's decision, since a duplicate send creates a duplicate inbox
///   entry.
#[async_trait]
pub trait Backend: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Public Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Store an envelope publicly and return its content address.
    ///
    /// Appends one entry to the author listing per call, even when the
    /// envelope itself is already stored.
    async fn create_public_expression(&self, expression: &SignedExpression) -> Result<Address>;

    /// Fetch an envelope by address.
    ///
    /// Unknown addresses are `None`. Never returns privately delivered
    /// envelopes.
    async fn get_expression_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<SignedExpression>>;

    /// List an author's public expressions, newest first.
    ///
    /// Ordered by envelope timestamp with publish order breaking ties
    /// (newest first), filtered to the half-open `range`, then paginated.
    /// A partial final page and an empty out-of-range page are normal
    /// outcomes.
    async fn get_by_author(
        &self,
        author: &Author,
        page: Page,
        range: TimeRange,
    ) -> Result<Vec<SignedExpression>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Private Delivery
    // ─────────────────────────────────────────────────────────────────────────

    /// Deliver an envelope to the recipient's inbox.
    ///
    /// Touches neither the public store nor the author listing.
    async fn send_private(
        &self,
        recipient: &Author,
        expression: &SignedExpression,
    ) -> Result<DeliveryReceipt>;

    /// Read an inbox, newest first by receipt time.
    ///
    /// `sender` restricts the listing to a single sender. Pagination works
    /// as in [`Backend::get_by_author`].
    async fn get_inbox(
        &self,
        owner: &Author,
        sender: Option<&Author>,
        page: Page,
    ) -> Result<Vec<InboxEntry>>;
}

// One backend instance is commonly shared by several exchanges (one per
// agent), so Arc delegates.
#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    async fn create_public_expression(&self, expression: &SignedExpression) -> Result<Address> {
        (**self).create_public_expression(expression).await
    }

    async fn get_expression_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<SignedExpression>> {
        (**self).get_expression_by_address(address).await
    }

    async fn get_by_author(
        &self,
        author: &Author,
        page: Page,
        range: TimeRange,
    ) -> Result<Vec<SignedExpression>> {
        (**self).get_by_author(author, page, range).await
    }

    async fn send_private(
        &self,
        recipient: &Author,
        expression: &SignedExpression,
    ) -> Result<DeliveryReceipt> {
        (**self).send_private(recipient, expression).await
    }

    async fn get_inbox(
        &self,
        owner: &Author,
        sender: Option<&Author>,
        page: Page,
    ) -> Result<Vec<InboxEntry>> {
        (**self).get_inbox(owner, sender, page).await
    }
}
