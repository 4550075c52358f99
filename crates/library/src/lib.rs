pub mod capture;
pub mod config;
mod keywords;
pub mod library;
pub mod native;
pub mod protocol;
pub mod registry;

/// Call-site timeout meaning "use the configured default".
pub const TIMEOUT_UNSET: i64 = -1;

pub use config::{ConfigError, LibraryConfig};
pub use library::{KeywordLibrary, LibraryBuilder, LIBRARY_NAME};
pub use protocol::{handle_request, serve, Request, Response, Status};
pub use registry::{KeywordRegistry, CATALOG_ACCESSOR, WITHHELD_ENGINE_OPERATION};
