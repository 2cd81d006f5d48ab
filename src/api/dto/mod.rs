//! Data Transfer Objects for REST request/response serialization.
//!
//! All monetary amounts are `rust_decimal::Decimal` values and appear in
//! JSON as decimal strings, never as floats.

pub mod accrual_dto;
pub mod common_dto;
pub mod funding_dto;
pub mod wallet_dto;

pub use accrual_dto::*;
pub use common_dto::*;
pub use funding_dto::*;
pub use wallet_dto::*;
