pub mod bank;
pub mod vc;
