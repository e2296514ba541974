//! Exact stack-height minimization for rectangular items.
//!
//! Given a container `[A, B, C]` and items with unordered edge lengths
//! `(m, n, l)`, [`plan_packing`] chooses a position and an axis-aligned
//! orientation for every item so that no two items overlap, every item lies
//! inside the container and the stack height is minimal. The problem is
//! stated as a mixed-integer linear program and handed to an external MILP
//! engine (see [`solver`]).
//!
//! Item sizes typically come from an external vision process that measures
//! object footprints on a camera feed; that process is not part of this
//! crate.
//!
//! ```no_run
//! use stack_planner::{PackingConfig, plan_packing};
//!
//! let config = PackingConfig::builder().margin(5.0).build();
//! let item_size = [vec![2.0, 2.0, 2.0], vec![2.0, 1.0, 1.0], vec![1.0, 1.0, 2.0]];
//! let outcome = plan_packing([10.0, 10.0, 100.0], &item_size, &config)?;
//! if let Some(plan) = outcome.plan() {
//!     for placement in &plan.placements {
//!         println!("{} at z={}", placement.index, placement.bottom_z);
//!     }
//! }
//! # Ok::<(), stack_planner::PackingError>(())
//! ```

pub mod api;
pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod milp;
pub mod model;
pub mod normalizer;
pub mod optimizer;
pub mod solver;
pub mod sorter;
pub mod types;

pub use error::{ConfigError, DecodeError, PackingError, SolverError};
pub use model::{Orientation, Placement};
pub use optimizer::{PackingConfig, PackingOutcome, PackingPlan, plan_packing, plan_packing_with};
