use crate::utils::errors::FetchError;
use futures_util::future::join_all;
use std::fmt::Display;
use tokio::task::JoinHandle;

/// Joins all keyed handles and keeps the order in which they were spawned.
/// Failed handles are logged and dropped, an error is only returned if every handle failed.
pub async fn join_handle_results_lenient<K, T>(
    handles: Vec<(K, JoinHandle<Result<T, FetchError>>)>,
) -> Result<Vec<(K, T)>, FetchError>
where
    K: Display,
{
    let (keys, handles): (Vec<K>, Vec<_>) = handles.into_iter().unzip();
    let results = join_all(handles).await;

    let mut successes = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (key, result) in keys.into_iter().zip(results) {
        let result = result
            .map_err(|e| FetchError::UnexpectedError(anyhow::Error::from(e)))
            .and_then(|r| r);
        match result {
            Ok(value) => successes.push((key, value)),
            Err(error) => {
                tracing::error!("Failed to collect {}: {}", key, error);
                first_error.get_or_insert(error);
            }
        }
    }

    match first_error {
        Some(error) if successes.is_empty() => Err(error),
        _ => Ok(successes),
    }
}
