//! Private delivery data model: delivery receipts and inbox entries.

use serde::{Deserialize, Serialize};

use crate::expression::SignedExpression;
use crate::types::{Address, Author, Timestamp};

/// Acknowledgement returned by a successful private delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Who the envelope was delivered to.
    pub recipient: Author,

    /// Content address of the delivered envelope.
    pub address: Address,

    /// When the backend accepted the delivery.
    pub delivered_at: Timestamp,
}

/// A privately delivered expression as it sits in an inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntry {
    /// Who sent it: the envelope author at delivery time.
    pub sender: Author,

    /// The delivered envelope.
    pub expression: SignedExpression,

    /// When the backend received it. Inbox ordering uses this, not the
    /// author-claimed envelope timestamp.
    pub received_at: Timestamp,
}
