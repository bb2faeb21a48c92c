//! warpgrid-autoscale — decider result aggregation.
//!
//! Each autoscaling decider reports either the capacity it requires or that
//! it cannot tell ("undetermined"). `DeciderResults` collects those verdicts
//! together with the current capacity of the pool and folds them into the
//! single capacity the policy requires.
//!
//! # Aggregation Algorithm
//!
//! ```text
//! if any decider is undetermined:
//!     required = none                      // never act on partial data
//! else:
//!     required = fold(upper_bound)         // dimension-wise max
//! ```
//!
//! Results render as a JSON document and encode to a compact binary wire
//! form; both list deciders in name order.

pub mod capacity;
pub mod decider;
pub mod error;
pub mod evaluation;
pub mod reason;
pub mod results;
pub mod wire;

pub use capacity::{Capacity, Resources};
pub use decider::DeciderResult;
pub use error::{AutoscaleError, AutoscaleResult};
pub use evaluation::{DeciderEntry, EvaluationFile};
pub use reason::{Reason, ReasonReader, ReasonRegistry, SimpleReason};
pub use results::DeciderResults;
pub use wire::{WireReader, WireWriter};
