use tokio::{
    io,
    signal::unix::{signal, SignalKind},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

// Cancels `cancellation_token` on the first SIGTERM, SIGINT, SIGHUP or SIGQUIT.
// The collector loop and the metrics server both watch the same token.
pub fn trigger_cancellation_on_signal(
    cancellation_token: CancellationToken,
) -> io::Result<JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let signal_handle = tokio::spawn(async move {
        let received = tokio::select! {
            _ = sigterm.recv() => "termination",
            _ = sigint.recv() => "interrupt",
            _ = sighup.recv() => "hangup",
            _ = sigquit.recv() => "quit",
        };
        log::info!("Received {received} signal, shutting down exporter");
        cancellation_token.cancel();
    });

    Ok(signal_handle)
}
