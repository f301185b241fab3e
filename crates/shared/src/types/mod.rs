//! Common types used across the application.

pub mod id;
pub mod precision;


pub use id::*;
pub use precision::{
    AMOUNT_LIMIT, BALANCE_TOLERANCE, COST_SCALE, MONEY_SCALE, QUANTITY_SCALE, fits_scale,
    round_cost, round_quantity, within_storage, within_tolerance,
};
