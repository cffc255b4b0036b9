//! Auth Machine
//!
//! Session lifecycle: restore, login, signup, silent refresh, profile update
//! and logout. The machine is the only owner of the session handle.
//! [`spawn_auth_machine`] and [`start_auth_machine`] queue CHECK_SESSION
//! ahead of any caller event, so a running machine starts in LOADING.
//!
//! # State Machine
//!
//! ```text
//!                 CHECK_SESSION / LOGIN            Session
//!   UNAUTHORIZED ───────────────────▶ LOADING ─────────────▶ AUTHORIZED ◀──┐
//!     │    ▲  ▲                          │                   │   │   ▲     │
//!     │    │  └──────── Rejected ────────┘           REFRESH │   │   │     │ Profile /
//!     │    │                                                 ▼   │   │     │ Rejected
//!     │    ├──── Rejected (session cleared) ────────── REFRESHING │   │     │
//!     │    │                                                     │   │     │
//!     │    │                                          UPDATE     ▼   │     │
//!     │    │                                               UPDATING ─┴─────┘
//!     │    │
//!     │    └──── LOGOUT from AUTHORIZED / REFRESHING / UPDATING (via LOGOUT)
//!     │
//!     └── SIGNUP ──▶ SIGNUP ── Session ──▶ AUTHORIZED, Rejected ──▶ UNAUTHORIZED
//! ```
//!
//! # Invariants
//!
//! - `currentUser` is set in and only in AUTHORIZED, REFRESHING and UPDATING
//! - `currentUser` and the session handle are always cleared together
//! - Credentials travel inside the login effect and are never kept in context

pub mod context;
pub mod event;
pub mod machine;
pub mod refresh;
pub mod runner;
pub mod service;
pub mod session;
pub mod state;


pub use context::{AuthSnapshot, SessionContext};
pub use event::{AuthEffect, AuthEvent, AuthReply};
pub use machine::AuthMachine;
pub use refresh::RefreshScheduler;
pub use runner::{AuthRunner, spawn_auth_machine, start_auth_machine};
pub use service::AuthService;
pub use session::{Credentials, SessionGrant, SessionToken};
pub use state::AuthState;
