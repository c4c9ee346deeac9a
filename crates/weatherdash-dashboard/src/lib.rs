//! Weather dashboard state
//!
//! Reconciles remote candidate cities with local favorites and the
//! removed/restored lists, collects weather into a board as lookups finish,
//! and carries out the user's actions against the local stores.

pub mod board;
pub mod dashboard;
pub mod display;
pub mod notify;
pub mod reconcile;

pub use board::{Board, BoardView, FetchFailure};
pub use dashboard::{CityDetail, Dashboard, DashboardOptions};
pub use display::{render_table, DisplayRow};
pub use notify::{Notifier, Severity, TracingNotifier};
pub use reconcile::{candidate_query, reconcile, sort_rows, CitySelection};
