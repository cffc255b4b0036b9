//! Generic Data Machine
//!
//! Fetch/create/update/delete lifecycle for any collection [`Resource`](crate::resource::Resource).
//!
//! # State Machine
//!
//! ```text
//!            FETCH                 Listed(n>0)
//!   IDLE ───────────▶ LOADING ─────────────────▶ SUCCESS.withData ──┐
//!                      │  ▲  │  Listed(0)                           │ CREATE / UPDATE / DELETE
//!             Rejected │  │  └──────────────▶ SUCCESS.withoutData ──┤
//!                      ▼  │ FETCH                   ▲               ▼
//!                    FAILURE ◀── Rejected ── DELETING │   CREATING / UPDATING
//!                                   │                 │      │           │
//!                                   │ Deleted         └──────┼─ Rejected─┘
//!                                   ▼                        │ Created / Updated
//!                                LOADING ◀───────────────────┘
//! ```
//!
//! `RESET` returns any state to `IDLE`. In-flight states accept only the
//! completion of their own call; anything else is ignored.
//!
//! # Invariants
//!
//! - At most one adapter call outstanding per machine
//! - A rejected create/update/delete never touches `records`
//! - A confirmed mutation always re-fetches before re-entering `success`
//! - `lastError` is cleared before a new request is issued

pub mod context;
pub mod event;
pub mod machine;
pub mod query;
pub mod runner;
pub mod service;
pub mod state;


pub use context::{DataContext, DataSnapshot, Pending};
pub use event::{DataEffect, DataEvent, DataReply};
pub use machine::DataMachine;
pub use query::FetchQuery;
pub use runner::{DataRunner, spawn_data_machine};
pub use service::ResourceService;
pub use state::{DataState, SuccessState};
