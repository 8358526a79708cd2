mod cookies;
mod fetch;
pub mod http;
mod result;

pub use cookies::CredentialSet;
pub use fetch::{FetchMode, PostFetcher};
pub use result::{OperationResult, PayloadKind};
