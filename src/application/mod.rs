pub mod dto;
pub mod ports;
pub mod users;

pub use users::UserService;
