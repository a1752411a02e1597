//! Validator pipeline
//!
//! One validation runs these steps, stopping at the first failure:
//!
//! 1. merge the request sources by precedence ([`MergeOrder`])
//! 2. derive the idempotency key and return a cached result if one is live
//! 3. run the endpoint's pre-validators in order
//! 4. run the schema under the endpoint's [`ValidationMode`](crate::ValidationMode)
//! 5. run the post-validators in order on the validated object
//! 6. store the result under the key
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

pub mod core;
pub mod merge;

#[cfg(test)]
mod tests;

pub use self::core::ValidatorPipeline;
pub use self::merge::MergeOrder;
