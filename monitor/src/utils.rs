// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleeps for `d` unless the token fires first. Returns `false` on
/// cancellation so worker loops can unwind without logging an error.
pub async fn context_sleep(cancel: &CancellationToken, d: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(d) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_sleep_completes() {
        let cancel = CancellationToken::new();
        assert!(context_sleep(&cancel, Duration::from_millis(1)).await);
    }

    #[tokio::test]
    async fn test_context_sleep_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!context_sleep(&cancel, Duration::from_secs(3600)).await);
    }
}
