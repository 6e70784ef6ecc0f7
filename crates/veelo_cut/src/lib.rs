pub mod cut;
pub mod error;
pub mod probe;

pub use cut::{CutPlan, CutProgress, CutRequest};
pub use error::{CutError, Result};
