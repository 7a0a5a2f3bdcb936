//! State module for tracking scrape progress
//!
//! `ScrapeState` is the lifecycle of one source: seed fetch, planning, fan-out,
//! collection and the terminal `Done` / `Failed` states.

mod scrape_state;

pub use scrape_state::ScrapeState;
