//! Snapshot handling
//!
//! - `store`: discovers existing snapshots of a backup set
//! - `retention`: decides which snapshots a tiered policy discards
//! - `transfer`: creates snapshots and streams them to the backup device

pub mod retention;
pub mod store;
pub mod transfer;

pub use retention::{outdated, outdated_with_rng};
pub use store::{latest, list};
pub use transfer::{backup, create_snapshot, delete_subvolume};
