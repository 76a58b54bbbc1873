pub mod policy;
pub mod session;
pub mod user;

pub use policy::UsernamePolicy;
pub use session::Session;
pub use user::{User, UserRole};
