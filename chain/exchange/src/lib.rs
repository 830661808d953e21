//! Escrow-Based Order Placement & Settlement Core
//!
//! This crate implements the exchange engine behind the external
//! `place_order` / `buy` / `cancel` / `deposits` operation surface: escrow
//! accounting, order lifecycle, settlement, and the committed event log.
//!
//! Requests arrive one at a time from an external ordering layer, already
//! authenticated, each carrying its attached value. Every request is atomic:
//! all preconditions are checked before the first mutation, and any failure
//! aborts with zero state change.
//!
//! # Modules
//! - `errors`: Engine error taxonomy
//! - `events`: Committed events and the append-only event log
//! - `ledger`: Per-account free/escrowed balances
//! - `orders`: Order records and state transitions
//! - `placement`: Order placement (escrow lock + open order)
//! - `settlement`: Direct-fill buy, cancellation, and escrow settlement
//! - `engine`: The single-writer request boundary with replay protection

pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod orders;
pub mod placement;
pub mod settlement;

/// External operation surface version - frozen after release
pub const ABI_VERSION: &str = "1.0.0";
