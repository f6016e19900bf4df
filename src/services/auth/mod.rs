pub mod factory;
pub mod gate;
pub mod token;

pub use factory::build_auth_gate;
pub use gate::{Admission, AuthGate, BypassList};
