//! bank_fsm - Banking Client State Machines
//!
//! Table-driven state machines for a banking client: a generic collection
//! machine bound to bank accounts, users and transactions, plus the session
//! machine that gates them.
//!
//! # Modules
//!
//! - [`machine`] - `Machine` trait, tickets and the async interpreter
//! - [`data`] - Generic Data Machine (fetch/create/update/delete)
//! - [`auth`] - Auth Machine and silent session refresh
//! - [`resource`] - Binding a record type to the Data Machine
//! - [`bank_accounts`] / [`users`] / [`transactions`] - Resource specializations
//! - [`http`] - reqwest adapters for the REST backend
//! - [`failure`] - Classified adapter failures
//! - [`validation`] - Draft validation errors
//! - [`notice`] - User-visible notices
//! - [`config`] / [`logging`] - YAML configuration and tracing setup

// Machine core - must be first!
pub mod failure;
pub mod machine;
pub mod notice;
pub mod validation;

// Collections
pub mod data;
pub mod resource;

pub mod bank_accounts;
pub mod transactions;
pub mod users;

// Session
pub mod auth;

// Adapters and runtime
pub mod config;
pub mod http;
pub mod logging;

// Convenient re-exports at crate root
pub use auth::{AuthEvent, AuthMachine, AuthSnapshot, AuthState};
pub use bank_accounts::{BankAccount, BankAccountDraft, BankAccountsMachine};
pub use data::{DataEvent, DataMachine, DataSnapshot, DataState, FetchQuery, SuccessState};
pub use failure::{Failure, FailureKind};
pub use http::HttpResource;
pub use machine::{Interpreter, Machine, MachineError, MachineHandle, Ticket, TransitionRecord};
pub use notice::{Notice, NoticeSink, Severity};
pub use resource::Resource;
pub use transactions::{Transaction, TransactionDraft, TransactionFeed, TransactionsMachine};
pub use users::{NewUser, ProfilePatch, User, UsersMachine};
pub use validation::ValidationError;
