pub mod scope;
pub mod session;
