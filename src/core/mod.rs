//! # Core Application Logic
//!
//! This module contains staybook's booking logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Selection + marks    │
//!                    │  • Pricing              │
//!                    │  • Submitter            │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No UI. I/O only via    │
//!                    │  injected collaborators │
//!                    └───────────┬─────────────┘
//!                                │
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//!          ┌────────────┐                ┌────────────┐
//!          │    TUI     │                │    CLI     │
//!          │  Adapter   │                │ subcommands│
//!          │ (ratatui)  │                │  (clap)    │
//!          └────────────┘                └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`selection`]: check-in / check-out tap rules and the guest counter
//! - [`marks`]: per-day highlight descriptors for the calendar
//! - [`pricing`]: nights, subtotal, fee and total
//! - [`submit`]: the reservation submitter state machine
//! - [`card`]: card entry, payment options, review summary
//! - [`state`]: the `App` struct
//! - [`action`]: the `Action` enum and `update()`
//! - [`config`]: TOML config and override resolution
//! - [`session`]: the on-disk auth session

pub mod action;
pub mod card;
pub mod config;
pub mod marks;
pub mod pricing;
pub mod selection;
pub mod session;
pub mod state;
pub mod submit;
