pub mod fallback;
pub mod me;
pub mod users;
