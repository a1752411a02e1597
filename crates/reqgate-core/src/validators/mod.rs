//! Pre- and post-validators
//!
//! Pre-validators transform the merged raw field map before the schema runs;
//! post-validators check or transform the validated object afterwards. Both
//! are named function values executed strictly in declaration order.
//!
//! - `types`: the validator values and their error types
//! - `built_in`: stock normalization pre-validators
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

pub mod built_in;
pub mod types;

#[cfg(test)]
mod tests;

pub use types::{
    PostValidator, PostValidatorError, PreValidator, PreValidatorError, POST_VALIDATION_ERROR_LABEL,
    PRE_VALIDATION_ERROR_LABEL,
};
