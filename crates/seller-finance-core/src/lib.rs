pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "optimizer")]
pub mod optimizer;

pub use error::SellerFinanceError;
pub use types::*;

/// Standard result type for all seller-finance operations
pub type SellerFinanceResult<T> = Result<T, SellerFinanceError>;
