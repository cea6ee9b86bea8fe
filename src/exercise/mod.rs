//! Exercise lookup: the remote catalogue search and the curated static
//! resource map used by the coaching layer.

pub mod db;
pub mod resources;

pub use db::{DbError, Exercise, ExerciseDb, ExerciseMatch, ExerciseSummary};
pub use resources::{
    all_resources, get_resource, list_resource_ids, search_resources, ExerciseResource,
};
