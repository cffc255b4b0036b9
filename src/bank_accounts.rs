//! Bank Accounts
//!
//! Bank-account record, its draft form and validation rules, bound to the
//! generic Data Machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::DataMachine;
use crate::http::HttpResource;
use crate::resource::{Resource, active_first};
use crate::validation::{self, ValidationError};

pub const BANK_NAME_MIN: usize = 5;
pub const BANK_NAME_MAX: usize = 100;
pub const ROUTING_NUMBER_LEN: usize = 9;
pub const ACCOUNT_NUMBER_MIN: usize = 9;
pub const ACCOUNT_NUMBER_MAX: usize = 12;

/// Bank account as stored by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub bank_name: String,
    pub routing_number: String,
    pub account_number: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl BankAccount {
    pub fn new(
        id: impl Into<String>,
        bank_name: impl Into<String>,
        routing_number: impl Into<String>,
        account_number: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            uuid: None,
            user_id: None,
            bank_name: bank_name.into(),
            routing_number: routing_number.into(),
            account_number: account_number.into(),
            is_deleted: false,
            created_at: None,
            modified_at: None,
        }
    }

    /// Account number with all but the last four digits hidden
    pub fn masked_account_number(&self) -> String {
        let digits: Vec<char> = self.account_number.chars().collect();
        let visible = digits.len().saturating_sub(4);
        digits
            .iter()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { *c })
            .collect()
    }
}

/// New bank account form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountDraft {
    pub bank_name: String,
    pub routing_number: String,
    pub account_number: String,
}

impl BankAccountDraft {
    pub fn new(
        bank_name: impl Into<String>,
        routing_number: impl Into<String>,
        account_number: impl Into<String>,
    ) -> Self {
        Self {
            bank_name: bank_name.into(),
            routing_number: routing_number.into(),
            account_number: account_number.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_fields(&self.bank_name, &self.routing_number, &self.account_number)
    }
}

fn check_fields(bank_name: &str, routing: &str, account: &str) -> Result<(), ValidationError> {
    validation::length("bankName", bank_name, BANK_NAME_MIN, BANK_NAME_MAX)?;
    validation::digits(
        "routingNumber",
        routing,
        ROUTING_NUMBER_LEN,
        ROUTING_NUMBER_LEN,
    )?;
    validation::digits(
        "accountNumber",
        account,
        ACCOUNT_NUMBER_MIN,
        ACCOUNT_NUMBER_MAX,
    )
}

impl Resource for BankAccount {
    type Id = String;
    type Draft = BankAccountDraft;

    const LABEL: &'static str = "Bank Account";

    fn id(&self) -> &String {
        &self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn validate_draft(draft: &BankAccountDraft) -> Result<(), ValidationError> {
        draft.validate()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_fields(&self.bank_name, &self.routing_number, &self.account_number)
    }
}

impl HttpResource for BankAccount {
    const PATH: &'static str = "bankAccounts";
    const ITEM_KEY: &'static str = "account";
}

pub type BankAccountsMachine = DataMachine<BankAccount>;

/// Rendering order: active accounts first, soft-deleted ones last.
///
/// There is no persisted ordering field; this is a stable sort over the
/// server order and does not change the machine's `records`.
pub fn display_order(accounts: &[BankAccount]) -> Vec<&BankAccount> {
    active_first(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(id: &str) -> BankAccount {
        let mut account = BankAccount::new(id, "Closed Bank", "123456789", "987654321");
        account.is_deleted = true;
        account
    }

    #[test]
    fn test_draft_rules() {
        assert!(BankAccountDraft::new("The Best Bank", "987654321", "123456789").validate().is_ok());
        assert!(BankAccountDraft::new("Bank", "987654321", "123456789").validate().is_err());

        let err = BankAccountDraft::new("The Best Bank", "98765432", "123456789")
            .validate()
            .unwrap_err();
        assert_eq!(err.field(), "routingNumber");

        let err = BankAccountDraft::new("The Best Bank", "98765432a", "123456789")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));

        assert!(BankAccountDraft::new("The Best Bank", "987654321", "123456789012").validate().is_ok());
        let err = BankAccountDraft::new("The Best Bank", "987654321", "1234567890123")
            .validate()
            .unwrap_err();
        assert_eq!(err.field(), "accountNumber");
    }

    #[test]
    fn test_display_order_is_stable() {
        let accounts = vec![
            deleted("d1"),
            BankAccount::new("a1", "First Bank", "123456789", "987654321"),
            deleted("d2"),
            BankAccount::new("a2", "Second Bank", "123456789", "987654321"),
        ];

        let ids: Vec<&str> = display_order(&accounts).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "d1", "d2"]);
        // Machine order untouched
        assert_eq!(accounts[0].id, "d1");
    }

    #[test]
    fn test_deserialize_api_record() {
        let json = r#"{
            "id": "RskoB7r4Bic",
            "uuid": "1f2c0f50-a5b3-4c2d-9b3a-0a1f9cd0c6a5",
            "userId": "t45AiwidW",
            "bankName": "O'Hara - Labadie Bank",
            "accountNumber": "6123387981",
            "routingNumber": "851823229",
            "isDeleted": false,
            "createdAt": "2019-08-16T23:11:30.153Z",
            "modifiedAt": "2020-05-06T06:37:48.421Z"
        }"#;

        let account: BankAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.id, "RskoB7r4Bic");
        assert_eq!(account.user_id.as_deref(), Some("t45AiwidW"));
        assert!(!account.is_deleted);
        assert!(account.created_at.is_some());
        assert!(Resource::validate(&account).is_ok());
    }

    #[test]
    fn test_draft_serializes_camel_case() {
        let body = serde_json::to_value(BankAccountDraft::new("Acme Bank", "123456789", "987654321"))
            .unwrap();
        assert_eq!(body["bankName"], "Acme Bank");
        assert_eq!(body["routingNumber"], "123456789");
        assert_eq!(body["accountNumber"], "987654321");
    }

    #[test]
    fn test_masked_account_number() {
        let account = BankAccount::new("a1", "First Bank", "123456789", "6123387981");
        assert_eq!(account.masked_account_number(), "******7981");
    }
}
