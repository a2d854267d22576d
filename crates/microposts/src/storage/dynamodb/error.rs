//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `microposts_core::storage`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::CancellationReason;
use microposts_core::storage::StoreError;

const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";

fn unavailable(msg: &str) -> StoreError {
    StoreError::Unavailable(msg.to_string())
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => unavailable("Table not found"),
        GetItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        GetItemError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        GetItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => StoreError::Unavailable(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        PutItemError::ResourceNotFoundException(_) => unavailable("Table not found"),
        PutItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        PutItemError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        PutItemError::TransactionConflictException(_) => {
            unavailable("Transaction conflict, please retry")
        }
        PutItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => StoreError::Unavailable(format!("PutItem failed: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        DeleteItemError::ResourceNotFoundException(_) => unavailable("Table not found"),
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            unavailable("Request limit exceeded, please retry")
        }
        DeleteItemError::TransactionConflictException(_) => {
            unavailable("Transaction conflict, please retry")
        }
        DeleteItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => StoreError::Unavailable(format!("DeleteItem failed: {:?}", err)),
    }
}

/// Map an UpdateItem SDK error to StoreError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        UpdateItemError::ResourceNotFoundException(_) => unavailable("Table not found"),
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            unavailable("Request limit exceeded, please retry")
        }
        UpdateItemError::TransactionConflictException(_) => {
            unavailable("Transaction conflict, please retry")
        }
        UpdateItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => StoreError::Unavailable(format!("UpdateItem failed: {:?}", err)),
    }
}

/// Map a Scan SDK error to StoreError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(err: SdkError<ScanError, R>) -> StoreError {
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => unavailable("Table not found"),
        ScanError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        ScanError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        ScanError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => StoreError::Unavailable(format!("Scan failed: {:?}", err)),
    }
}

/// Map a TransactWriteItems SDK error to StoreError.
///
/// Cancellations caused by failed conditions report the failing positions.
/// Cancellations for any other reason (conflicts with concurrent
/// transactions, throttling) are transient.
pub fn map_transact_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
) -> StoreError {
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(e) => {
            cancellation_to_error(e.cancellation_reasons())
        }
        TransactWriteItemsError::TransactionInProgressException(_) => {
            unavailable("Transaction in progress, please retry")
        }
        TransactWriteItemsError::ResourceNotFoundException(_) => unavailable("Table not found"),
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => {
            unavailable("Request limit exceeded, please retry")
        }
        TransactWriteItemsError::InternalServerError(_) => {
            unavailable("DynamoDB internal server error")
        }
        err => StoreError::Unavailable(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Positions whose condition failed, or a transient error if none did.
pub fn cancellation_to_error(reasons: &[CancellationReason]) -> StoreError {
    let failed: Vec<usize> = reasons
        .iter()
        .enumerate()
        .filter(|(_, reason)| reason.code() == Some(CONDITIONAL_CHECK_FAILED))
        .map(|(position, _)| position)
        .collect();

    if failed.is_empty() {
        let codes: Vec<&str> = reasons
            .iter()
            .filter_map(|reason| reason.code())
            .filter(|code| *code != "None")
            .collect();
        StoreError::Unavailable(format!(
            "Transaction canceled ({}), please retry",
            codes.join(", ")
        ))
    } else {
        StoreError::TransactionCanceled { failed }
    }
}
