//! DynamoDB storage backend.
//!
//! Implements the `TableStore` contract with `aws-sdk-dynamodb`. Predicates
//! are rendered as condition expressions so the service evaluates them
//! atomically with the write.

mod conversions;
mod error;
mod expressions;
mod store;

pub use store::DynamoDbStore;
