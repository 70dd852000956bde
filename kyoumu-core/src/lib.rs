pub mod account;
pub mod enrollment;
pub mod error;
pub mod grading;
pub mod identity;
pub mod model;
pub mod store;

pub use error::Error;
pub use identity::Identity;
pub use store::{Store, StoreError, StoreTx};
