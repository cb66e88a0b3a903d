//! Core types for the dual store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single transaction row.
///
/// Every field is always defined: numeric fields that could not be read are
/// stored as `0.0`, never left unset. `transaction_id` identifies the record
/// but is not required to be unique.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub transaction_id: String,

    /// Opaque, never parsed as a date.
    pub timestamp: String,

    pub sender_account: String,
    pub receiver_account: String,
    pub amount: f64,

    /// Compared case-insensitively by sorts and searches.
    pub transaction_type: String,

    pub merchant_category: String,

    /// Sort key for the location sorts (byte-wise lexicographic).
    pub location: String,

    pub device_used: String,
    pub is_fraud: bool,

    /// Empty when the row is not flagged.
    pub fraud_type: String,

    pub time_since_last_transaction: f64,
    pub spending_deviation_score: f64,
    pub velocity_score: f64,
    pub geo_anomaly_score: f64,
    pub payment_channel: String,
    pub ip_address: String,
    pub device_hash: String,
}

impl Record {
    /// Normalized transaction type used by every type comparison.
    pub fn type_key(&self) -> TypeKey {
        TypeKey::new(&self.transaction_type)
    }

    /// Channel sub-chain this record belongs to, if any.
    pub fn channel(&self) -> Option<PaymentChannel> {
        self.payment_channel.parse().ok()
    }

    /// One-line listing used by store previews.
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} | {} | {} | {} | {} | {} | {}",
            self.transaction_id,
            self.transaction_type,
            self.timestamp,
            self.sender_account,
            self.receiver_account,
            self.amount,
            self.payment_channel,
            self.location
        )
    }
}

/// Lower-cased transaction type.
///
/// Computed once per record at insertion so sorts and searches compare
/// plain strings instead of re-lowercasing on every comparison.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn new(raw: &str) -> Self {
        TypeKey(raw.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment channels that get their own sub-chain during ingestion.
///
/// Matching is exact and case-sensitive; any other channel value only lands
/// in the full chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentChannel {
    Card,
    Ach,
    Upi,
    WireTransfer,
}

impl PaymentChannel {
    pub const ALL: [PaymentChannel; 4] = [
        PaymentChannel::Card,
        PaymentChannel::Ach,
        PaymentChannel::Upi,
        PaymentChannel::WireTransfer,
    ];

    /// Channel value as it appears in the input.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentChannel::Card => "card",
            PaymentChannel::Ach => "ACH",
            PaymentChannel::Upi => "UPI",
            PaymentChannel::WireTransfer => "wire_transfer",
        }
    }
}

impl FromStr for PaymentChannel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentChannel::Card),
            "ACH" => Ok(PaymentChannel::Ach),
            "UPI" => Ok(PaymentChannel::Upi),
            "wire_transfer" => Ok(PaymentChannel::WireTransfer),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two representations an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    /// Contiguous, index-addressable store.
    Sequence,
    /// Singly linked store.
    Chain,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Sequence => f.write_str("sequence"),
            StoreKind::Chain => f.write_str("chain"),
        }
    }
}

/// Snapshot of store sizes after ingestion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub sequence_len: usize,
    pub chain_len: usize,
    pub channel_lens: Vec<(PaymentChannel, usize)>,
    pub sequence_bytes: usize,
    pub chain_bytes: usize,
}
