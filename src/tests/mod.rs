mod session;
pub mod support;
