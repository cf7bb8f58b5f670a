//! Driving a job future while reporting its events.
//!
//! Jobs push progress events into an unbounded channel; frontends pass the
//! receiving end here together with the job future and a callback (progress
//! bar, console line) to run for each event.

use std::future::Future;

use tokio::sync::mpsc;

/// Run `job` to completion, calling `on_event` for every event it sends.
///
/// Events still buffered when the job finishes are delivered before the
/// result is returned, so the callback sees every event the job sent.
pub async fn run_with_events<F, E, R>(
    job: F,
    mut events: mpsc::UnboundedReceiver<E>,
    mut on_event: impl FnMut(E),
) -> R
where
    F: Future<Output = R>,
{
    tokio::pin!(job);
    let mut delivered: u64 = 0;
    let mut channel_open = true;

    let result = loop {
        tokio::select! {
            r = &mut job => break r,
            event = events.recv(), if channel_open => match event {
                Some(e) => {
                    delivered += 1;
                    on_event(e);
                }
                None => channel_open = false,
            },
        }
    };

    while let Ok(e) = events.try_recv() {
        delivered += 1;
        on_event(e);
    }
    log::debug!("Job finished after {} events", delivered);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_event_is_delivered() {
        let (tx, rx) = mpsc::unbounded_channel();
        let job = async move {
            for i in 0..5u32 {
                let _ = tx.send(i);
                tokio::task::yield_now().await;
            }
            // Events sent right before returning are still delivered
            let _ = tx.send(99);
            "done"
        };

        let mut seen = Vec::new();
        let result = run_with_events(job, rx, |e| seen.push(e)).await;
        assert_eq!(result, "done");
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 99]);
    }

    #[tokio::test]
    async fn closed_channel_still_awaits_job() {
        let (tx, rx) = mpsc::unbounded_channel::<u32>();
        drop(tx);
        let job = async {
            tokio::task::yield_now().await;
            7
        };
        let result = run_with_events(job, rx, |_| {}).await;
        assert_eq!(result, 7);
    }
}
