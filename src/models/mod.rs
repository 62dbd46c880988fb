pub mod request;
pub mod user;

pub use request::{AccessRequest, Dataset, FieldChange, RequestStatus, Update};
pub use user::{Role, User};
