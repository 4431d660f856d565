//! Feeding asynchronous results into signals.
//!
//! Evaluation itself never suspends. Async sources complete elsewhere and
//! write their results into a signal; [`pipe_channel`] does that for a tokio
//! channel while guarding against writes into a disposed scope.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use super::{Runtime, Scope, Signal};
use crate::error::ReactiveError;
use crate::value::Value;

/// Write every value received on `rx` into `signal` until the channel closes
/// or `scope` is disposed.
///
/// Returns the number of values written. Values arriving after the scope was
/// disposed are dropped.
pub async fn pipe_channel(
    rt: &Runtime,
    scope: Scope,
    signal: Signal,
    mut rx: UnboundedReceiver<Value>,
) -> Result<usize, ReactiveError> {
    let mut written = 0;
    while let Some(value) = rx.recv().await {
        if scope.is_disposed(rt) {
            debug!(?scope, "scope disposed, closing feed");
            rx.close();
            break;
        }
        signal.set(rt, value)?;
        written += 1;
    }
    Ok(written)
}
