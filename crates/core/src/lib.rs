pub mod counter;
pub mod format;
pub mod logger;
pub mod models;
pub mod traits;

pub use counter::*;
pub use format::*;
pub use logger::*;
pub use models::*;
pub use traits::*;
