//! Transactions
//!
//! Payments and requests between users. Amounts travel as integer cents and
//! are only turned into decimal strings for display.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::data::DataMachine;
use crate::http::HttpResource;
use crate::resource::Resource;
use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Payment,
    Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    #[default]
    Public,
    Private,
    Contacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Incomplete,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub uuid: Option<String>,
    /// Bank account the money is drawn from, when not paid from balance
    #[serde(default)]
    pub source: Option<String>,
    /// Cents
    pub amount: i64,
    pub description: String,
    #[serde(default)]
    pub privacy_level: PrivacyLevel,
    pub receiver_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn display_amount(&self) -> String {
        format_cents(self.amount)
    }
}

/// New payment or request form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub transaction_type: TransactionKind,
    /// Cents
    pub amount: i64,
    pub description: String,
    pub sender_id: String,
    pub receiver_id: String,
    #[serde(default)]
    pub privacy_level: PrivacyLevel,
}

impl TransactionDraft {
    pub fn payment(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            transaction_type: TransactionKind::Payment,
            amount,
            description: description.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            privacy_level: PrivacyLevel::default(),
        }
    }

    pub fn request(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            transaction_type: TransactionKind::Request,
            ..Self::payment(sender_id, receiver_id, amount, description)
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount <= 0 {
            return Err(ValidationError::NotPositive { field: "amount" });
        }
        validation::required("description", &self.description)?;
        validation::required("senderId", &self.sender_id)?;
        validation::required("receiverId", &self.receiver_id)?;
        if self.sender_id == self.receiver_id {
            return Err(ValidationError::Same {
                field: "receiverId",
                other: "senderId",
            });
        }
        Ok(())
    }
}

impl Resource for Transaction {
    type Id = String;
    type Draft = TransactionDraft;

    const LABEL: &'static str = "Transaction";

    fn id(&self) -> &String {
        &self.id
    }

    fn validate_draft(draft: &TransactionDraft) -> Result<(), ValidationError> {
        draft.validate()
    }
}

impl HttpResource for Transaction {
    const PATH: &'static str = "transactions";
    const ITEM_KEY: &'static str = "transaction";
}

/// Which transaction list a machine shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionFeed {
    /// Everyone's public transactions
    #[default]
    Public,
    /// Transactions of the user's contacts
    Contacts,
    /// The user's own transactions
    Personal,
}

impl TransactionFeed {
    pub fn path(&self) -> &'static str {
        match self {
            TransactionFeed::Public => "transactions/public",
            TransactionFeed::Contacts => "transactions/contacts",
            TransactionFeed::Personal => "transactions",
        }
    }
}

impl fmt::Display for TransactionFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionFeed::Public => "public",
            TransactionFeed::Contacts => "contacts",
            TransactionFeed::Personal => "personal",
        };
        write!(f, "{}", name)
    }
}

pub type TransactionsMachine = DataMachine<Transaction>;

// ============================================================================
// Amounts
// ============================================================================

/// Render cents as a dollar string: `1250` → `$12.50`, `-5` → `-$0.05`
pub fn format_cents(cents: i64) -> String {
    let value = Decimal::new(cents, 2);
    if value.is_sign_negative() {
        format!("-${}", value.abs())
    } else {
        format!("${}", value)
    }
}

/// Parse a dollar amount typed by the user ("12.5", "$12.50") into cents
pub fn parse_amount(input: &str) -> Result<i64, ValidationError> {
    let invalid = ValidationError::InvalidFormat {
        field: "amount",
        expected: "dollars with at most two decimals",
    };
    let trimmed = validation::required("amount", input)?;
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);

    let value = Decimal::from_str(trimmed).map_err(|_| invalid.clone())?;
    if value.scale() > 2 {
        return Err(invalid);
    }
    let cents = (value * Decimal::ONE_HUNDRED).to_i64().ok_or(invalid)?;
    if cents <= 0 {
        return Err(ValidationError::NotPositive { field: "amount" });
    }
    Ok(cents)
}
