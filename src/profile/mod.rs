//! The aggregation stages applied to candidate profiles.
//!
//! - **Merge** (`merge`): unique-by-name collection in source precedence order
//! - **Hierarchy** (`hierarchy`): login parents and the profiles depending on them
//! - **Augment** (`augment`): triggers, keyboard chords, smart selection
//! - **Reconcile** (`reconcile`): write, print, or diff against the persisted document
//! - **Storage** (`storage`): the profiles document and the instance cache on disk

pub mod augment;
pub mod hierarchy;
pub mod merge;
pub mod reconcile;
pub mod storage;

pub use hierarchy::{Hierarchy, HierarchyGroup, derive_hierarchy};
pub use merge::{MergeReport, merge_profiles};
pub use reconcile::{DiffEntry, OutputMode, ReconcileOutcome, diff_profiles, reconcile};
