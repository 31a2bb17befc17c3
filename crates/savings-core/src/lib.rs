pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "vc")]
pub mod vc;

#[cfg(feature = "bank")]
pub mod bank;

pub use config::SavingsConfig;
pub use error::SavingsError;
pub use types::*;

#[cfg(feature = "vc")]
pub use vc::calculator::{calculate_savings, SavingsCalculator};

#[cfg(feature = "bank")]
pub use bank::analyzer::BankSavingsAnalyzer;

pub type SavingsResult<T> = Result<T, SavingsError>;
