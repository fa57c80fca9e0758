//! Aggregation results
//!
//! Typed results for bucket and metric aggregations, and the assembler that
//! fills them from the rows of an executed plan node.

mod assembler;
mod types;

pub use assembler::assemble;
pub use types::{
    AggregationResult, Bucket, BucketAggregation, MetricMultipleAggregation,
    MetricSingleAggregation, SubAggregateValue, VALUE_AS_STRING_PLACEHOLDER,
};
