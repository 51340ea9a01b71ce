//! Tracing setup for the dashboard binary.

use std::any::Any;
use std::panic;
use tracing_subscriber::EnvFilter;

/// Initialize a fmt subscriber filtered by `RUST_LOG` (default `info`), and
/// route panics through `tracing` ahead of the default hook.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_default();
        tracing::error!(%location, message = panic_message(info.payload()), "dashboard panicked");
        default_hook(info);
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_reads_str_and_string_payloads() {
        let borrowed: Box<dyn Any + Send> = Box::new("fetch thread died");
        assert_eq!(panic_message(borrowed.as_ref()), "fetch thread died");

        let owned: Box<dyn Any + Send> = Box::new(format!("row {}", 7));
        assert_eq!(panic_message(owned.as_ref()), "row 7");

        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
