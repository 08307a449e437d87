//! Whole-video beat analysis.
//!
//! Reduces a finished PSD map to the figures reported per recording:
//! ciliary beat frequency (CBF) and fraction of functional ciliated
//! area (FFCA).

mod resolve;

pub use resolve::{mean_psd, resolve, BeatSummary, SummaryError};
