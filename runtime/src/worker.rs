use tokio::{
    sync::{
        mpsc,
        oneshot,
    },
    task::JoinHandle,
};

use message::{
    Message,
    Packet,
    UnitAddress,
};

use crate::{
    Channel,
    Error,
    Transport,
};

#[derive(Debug)]
struct Request {
    unit:    UnitAddress,
    message: Message,
    reply:   oneshot::Sender<Result<Packet, Error>>,
}

/// Owns the transport on a dedicated task and runs queued exchanges one at a time.
pub struct Worker<C> {
    transport: Transport<C>,
    requests:  mpsc::Receiver<Request>,
}

impl<C> Worker<C>
where
    C: Channel + 'static,
{
    /// Start the worker. It stops once every [`Handle`] is dropped, returning the transport.
    ///
    /// At least one request can always be queued, whatever `queue_depth` says.
    pub fn spawn(transport: Transport<C>, queue_depth: usize) -> (Handle, JoinHandle<Transport<C>>) {
        let (tx, requests) = mpsc::channel(queue_depth.max(1));

        let worker = Self {
            transport,
            requests,
        };

        (Handle {
            tx,
        }, tokio::spawn(worker.run()))
    }

    async fn run(mut self) -> Transport<C> {
        tracing::debug!("transport worker started");

        while let Some(Request {
            unit,
            message,
            mut reply,
        }) = self.requests.recv().await
        {
            if reply.is_closed() {
                tracing::debug!(%unit, %message, "dropping abandoned request");
                continue;
            }

            // a caller that stops waiting cancels the retry loop
            let result = tokio::select! {
                result = self.transport.exchange(unit, &message) => Some(result),
                _ = reply.closed() => None,
            };

            match result {
                Some(result) => {
                    if reply.send(result).is_err() {
                        tracing::warn!(%unit, "exchange finished after caller left");
                    }
                },
                None => {
                    tracing::info!(%unit, %message, "caller abandoned exchange");
                    self.transport.reset();
                },
            }
        }

        tracing::debug!("transport worker stopped");
        self.transport
    }
}

/// Cloneable entry point to a [`Worker`]'s queue.
#[derive(Debug, Clone)]
pub struct Handle {
    tx: mpsc::Sender<Request>,
}

impl Handle {
    pub async fn exchange(&self, unit: UnitAddress, message: Message) -> Result<Packet, Error> {
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(Request {
                unit,
                message,
                reply,
            })
            .await
            .map_err(|_| Error::WorkerGone)?;

        rx.await.map_err(|_| Error::WorkerGone)?
    }
}
