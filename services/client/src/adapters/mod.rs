pub mod http_api;
pub mod local_file;
pub mod token_store;

pub use http_api::HttpDocumentApi;
pub use token_store::{FileTokenStore, InMemoryTokenStore};
