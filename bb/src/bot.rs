//! Bot - owns the coordination mechanisms for the bot's lifetime
//!
//! The command router holds one `Bot` and calls into it. The rendezvous, the
//! update queue and the reconnect supervisor never call each other; `Bot` only
//! wires them to the same outbox and configuration.

use std::sync::{Arc, Mutex, PoisonError};

use eyre::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dice::{DiceError, DiceTable, DiceVariant, Roll};
use crate::outbox::{Outbox, OutboxReceiver, create_outbox};
use crate::palette::Category;
use crate::queue::{CompanionNotifier, Locator, QueueMetrics, Renderer, UpdateQueue, UpdateTask, stage_fresh};
use crate::reconnect::ReconnectSupervisor;
use crate::rendezvous::Rendezvous;
use crate::transport::Transport;

/// Coordinator instance; construction starts the update worker
pub struct Bot {
    config: Config,
    outbox: Outbox,
    rendezvous: Rendezvous,
    updates: UpdateQueue,
    reconnect: ReconnectSupervisor,
    dice: Mutex<DiceTable>,
    worker: JoinHandle<QueueMetrics>,
}

impl Bot {
    /// Validate the config and bring up all mechanisms
    ///
    /// Returns the bot and the outbox receiver the transport owner drains.
    /// Must be called inside a tokio runtime.
    pub fn start(
        config: Config,
        transport: Arc<dyn Transport>,
        renderer: Arc<dyn Renderer>,
    ) -> Result<(Self, OutboxReceiver)> {
        config.validate().context("Invalid configuration")?;
        debug!(channel = %config.irc.channel, "Bot::start: called");

        let (outbox, rx) = create_outbox();
        let notifier = Arc::new(CompanionNotifier::from_config(
            &config.artifact,
            transport.clone(),
            outbox.clone(),
        ));
        let (updates, worker) = UpdateQueue::spawn(config.artifact.path.clone(), renderer, notifier);
        let rendezvous = Rendezvous::new(config.rendezvous.clone(), outbox.clone());
        let reconnect = ReconnectSupervisor::from_config(&config, transport);
        let dice = Mutex::new(DiceTable::new(config.dice.num_players));

        info!(nickname = %config.irc.nickname, channel = %config.irc.channel, "Bot started");
        Ok((
            Self {
                config,
                outbox,
                rendezvous,
                updates,
                reconnect,
                dice,
                worker,
            },
            rx,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn rendezvous(&self) -> &Rendezvous {
        &self.rendezvous
    }

    pub fn updates(&self) -> &UpdateQueue {
        &self.updates
    }

    pub fn reconnect(&self) -> &ReconnectSupervisor {
        &self.reconnect
    }

    /// Queue a marker for `owner` at `target`, coloured by category
    pub fn mark(&self, target: Locator, category: Category, owner: &str) {
        let attribute = self.config.palette.attribute_for(category, owner);
        debug!(%target, ?category, %owner, %attribute, "Bot::mark: called");
        self.updates.enqueue(UpdateTask::draw(target, attribute));
    }

    /// Stage a blank map from the template and queue the swap
    ///
    /// Reports the outcome to the channel either way.
    pub async fn refresh(&self) -> Result<()> {
        let artifact = &self.config.artifact;
        match stage_fresh(&artifact.template, &artifact.staging).await {
            Ok(task) => {
                self.updates.enqueue(task);
                self.outbox.broadcast(format!(
                    "Fresh map queued from {}.",
                    artifact.template.display()
                ));
                Ok(())
            }
            Err(e) => {
                self.outbox.broadcast(format!("Error queuing fresh map: {}", e));
                Err(e).context("Failed to stage fresh map")
            }
        }
    }

    /// Roll dice for a player and announce the result
    pub fn roll(&self, variant: DiceVariant, player: u8) -> Result<Roll, DiceError> {
        let result = self
            .dice
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .roll(variant, player);
        match &result {
            Ok(roll) => self.outbox.broadcast(roll.to_string()),
            Err(e) => self.outbox.broadcast(e.to_string()),
        }
        result
    }

    /// Most recent roll by a player
    pub fn last_roll(&self, player: u8) -> Option<Roll> {
        self.dice
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_roll(player)
            .copied()
    }

    /// Stop accepting updates and wait for queued ones to be applied
    ///
    /// Returns the final queue metrics.
    pub async fn shutdown(self) -> QueueMetrics {
        info!("Bot shutting down");
        let _ = self.rendezvous.stop();
        let fallback = self.updates.metrics();
        drop(self.updates);
        let metrics = match self.worker.await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(error = %e, "Update worker did not finish cleanly");
                fallback
            }
        };
        info!(?metrics, "Bot stopped");
        metrics
    }
}
