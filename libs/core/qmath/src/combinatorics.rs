//! Stateless combinatorial helpers used by the chain-rule expansion.
//!
//! All functions are total over unsigned integers.
//! Results are exact as long as they fit in `u64`, which covers derivative orders
//! far beyond the ones used in practice.
mod binomial;
mod multinomial;
mod partition;
mod pascal;

pub use binomial::{binomial_coefficient, factorial, pascal_row};
pub use multinomial::{bounded_weak_compositions, multinomial_coefficient, weak_compositions};
pub use partition::{integer_partitions, integer_partitions_with_parts, partition_function};
pub use pascal::next_pascal;
