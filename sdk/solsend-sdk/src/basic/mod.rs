pub mod discovery;
pub mod flow;
pub mod session;
pub mod transfer;
