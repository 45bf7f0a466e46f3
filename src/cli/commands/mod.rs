pub mod benefit;
pub mod filter;
pub mod token;
