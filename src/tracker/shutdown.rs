use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Detects signals sent to the process and turns them into a cancellation, so the tracker can
/// leave through its regular save path.
///
/// While the terminal is in raw mode Ctrl+C arrives as a key instead. This covers `kill -INT`,
/// `kill -TERM` and consoles that still deliver the signal.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received interrupt"),
                Err(e) => {
                    error!("Can't listen for interrupts {e:?}");
                    terminate().await;
                }
            }
            cancelation.cancel();
        },
        _ = terminate() => {
            info!("Received termination signal");
            cancelation.cancel();
        },
    };
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Can't listen for SIGTERM {e:?}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
