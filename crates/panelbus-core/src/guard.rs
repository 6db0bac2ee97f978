//! Run component callbacks without letting their failures escape

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Invoke `f`, turning an `Err` or (when `catch_panics`) a panic into a message
pub(crate) fn run_guarded<T>(
    catch_panics: bool,
    f: impl FnOnce() -> anyhow::Result<T>,
) -> Result<T, String> {
    if !catch_panics {
        return f().map_err(|e| format!("{e:#}"));
    }

    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
