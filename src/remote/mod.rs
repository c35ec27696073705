mod http;
#[cfg(test)]
pub mod memory;
mod store;

pub use http::HttpRemoteStore;
pub use store::{CollectionSnapshot, RawDocument, RemoteStore};
