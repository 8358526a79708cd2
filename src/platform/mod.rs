mod model;
pub mod traits;

pub mod instagram;

pub use model::*;
pub use traits::{MediaSource, SessionFactory};
