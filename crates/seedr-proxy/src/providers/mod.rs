//! Remote storage provider abstraction
//!
//! The proxy talks to the storage account only through [`RemoteStorage`],
//! so routes and the upload worker can run against any implementation.

pub mod remote_storage;
pub mod seedr;

pub use remote_storage::RemoteStorage;
pub use seedr::SeedrClient;
