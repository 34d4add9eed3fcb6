pub mod booking;
pub mod flight;
pub mod user;

pub use booking::*;
pub use flight::*;
pub use user::*;
