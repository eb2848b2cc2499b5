use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::services::Services;
use super::shutdown::ShutdownGuard;
use super::worker::ChannelWorker;
use crate::io::InboundLine;

/// Inbound queue depth, shared by the router and each worker.
const QUEUE_DEPTH: usize = 256;

/// Routes inbound lines to one worker per channel, spawning workers on demand.
pub struct Runtime {
    services: Arc<Services>,
    shutdown: ShutdownGuard,
    inbound_rx: mpsc::Receiver<InboundLine>,
    workers: HashMap<String, mpsc::Sender<InboundLine>>,
    tasks: JoinSet<()>,
}

impl Runtime {
    /// Create a runtime. Push chat lines into the returned sender.
    pub fn new(services: Services) -> (Self, mpsc::Sender<InboundLine>) {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH); // bounded, backpressure at 256
        let runtime = Self {
            services: Arc::new(services),
            shutdown: ShutdownGuard::new(),
            inbound_rx: rx,
            workers: HashMap::new(),
            tasks: JoinSet::new(),
        };
        (runtime, tx)
    }

    /// Cancellation token shared with every worker.
    pub fn token(&self) -> CancellationToken {
        self.shutdown.token()
    }

    pub fn services(&self) -> Arc<Services> {
        Arc::clone(&self.services)
    }

    /// Start configured channels and route until shutdown or the inbound
    /// sender is dropped. Waits for every worker before returning.
    pub async fn run(&mut self) {
        self.shutdown.spawn_signal_listener();
        let token = self.shutdown.token();

        tracing::info!(
            nick = %self.services.identity.nick,
            channels = ?self.services.identity.channels,
            "lurker runtime started"
        );
        for channel in self.services.identity.channels.clone() {
            self.worker(&channel);
        }

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("shutdown signal received, stopping router");
                    break;
                }
                line = self.inbound_rx.recv() => {
                    let Some(line) = line else {
                        tracing::info!("inbound closed, stopping router");
                        break;
                    };
                    self.route(line).await;
                }
            }
        }

        // closing the queues lets workers drain and exit on their own
        self.workers.clear();
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "channel worker panicked");
            }
        }
        tracing::info!("lurker runtime stopped");
    }

    async fn route(&mut self, line: InboundLine) {
        let channel = line.channel.clone();
        let tx = self.worker(&channel);
        if tx.send(line).await.is_err() {
            tracing::warn!(channel = %channel, "channel worker gone, dropping line");
            self.workers.remove(&channel);
        }
    }

    /// Queue for `channel`, spawning its worker on first use.
    fn worker(&mut self, channel: &str) -> mpsc::Sender<InboundLine> {
        if let Some(tx) = self.workers.get(channel) {
            return tx.clone();
        }
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let worker = ChannelWorker::new(Arc::clone(&self.services), channel, self.shutdown.token());
        self.tasks.spawn(worker.run(rx));
        self.workers.insert(channel.to_owned(), tx.clone());
        tracing::debug!(channel = %channel, "channel worker spawned");
        tx
    }
}
