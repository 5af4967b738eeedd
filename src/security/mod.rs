//! Request guards applied to the whole router.

pub mod rate_limit;
pub mod timeout;
