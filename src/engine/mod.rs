//! Engine module containing the matcher, the executor, the statement run
//! controller, manual overrides, and the query surface

pub mod core;
pub mod executor;
pub mod manual;
pub mod matcher;
pub mod query;
pub mod run;

pub use self::core::*;
pub use executor::*;
pub use manual::*;
pub use matcher::*;
pub use query::*;
pub use run::*;
