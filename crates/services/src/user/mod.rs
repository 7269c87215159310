pub mod ports;
pub mod service;

pub use ports::{User, UserError, UserRepository, UserService};
pub use service::UserServiceImpl;
