mod campaign;
mod errors;
mod member;
mod rol;
mod user;

pub use campaign::Campaign;
pub use errors::DomainError;
pub use member::{Estado, Membership};
pub use rol::Rol;
pub use user::UserRecord;
