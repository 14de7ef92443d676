//! Shape contracts for every payload exchanged with the backend

mod activity;
mod checkin;
mod envelope;
mod registration;
mod statistics;
mod user;

pub use activity::*;
pub use checkin::*;
pub use envelope::*;
pub use registration::*;
pub use statistics::*;
pub use user::*;
