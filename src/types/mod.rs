mod models;
mod operation;

pub use models::*;
pub use operation::*;
