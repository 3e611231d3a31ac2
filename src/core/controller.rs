//! Generation controller.
//!
//! Owns the current input (text, color, logo) and turns it into a published
//! [`GenerationStatus`]. Mutations are debounced: every mutation resets a
//! single deadline, and a render cycle only starts once input has been quiet
//! for the whole debounce interval. Each cycle carries the sequence number of
//! the mutation it was started for; a result whose sequence is no longer the
//! latest is dropped on arrival, so a slow earlier cycle can never overwrite
//! newer output.
//!
//! Empty (trimmed) text bypasses the debounce and clears the image at once.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::core::config::RenderConfig;
use crate::core::error::{AppError, AppResult};
use crate::core::models::{
    GenerationRequest, GenerationState, GenerationStatus, LogoImage, RenderedImage, StrokeColor,
};
use crate::render::{render, QrCodeEncoder, QrEncoder, RenderOutcome, RenderSettings};

#[derive(Debug)]
enum Command {
    SetText(String),
    SetColor(StrokeColor),
    SetLogo(Option<LogoImage>),
    Shutdown,
}

/// Handle to the controller task. Dropping it tears the task down.
pub struct GenerationController {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<GenerationStatus>,
    task: Option<JoinHandle<()>>,
    /// Mutations sent so far; the task numbers them identically.
    sent: AtomicU64,
}

impl GenerationController {
    /// Spawns the controller on the current tokio runtime.
    pub fn spawn(encoder: Arc<dyn QrEncoder>, settings: RenderSettings, debounce: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(GenerationStatus::default());

        let actor = Actor {
            encoder,
            settings,
            debounce,
            text: String::new(),
            color: StrokeColor::default(),
            logo: None,
            sequence: 0,
            cycles: 0,
            deadline: None,
            last_started: 0,
            in_flight: JoinSet::new(),
            cycle_sequences: HashMap::new(),
            status: status_tx,
        };
        let task = tokio::spawn(actor.run(receiver));

        Self {
            commands,
            status,
            task: Some(task),
            sent: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::spawn(
            Arc::new(QrCodeEncoder),
            RenderSettings {
                size: config.size,
                margin: config.margin,
            },
            config.debounce(),
        )
    }

    pub fn set_text(&self, text: impl Into<String>) -> AppResult<()> {
        self.send(Command::SetText(text.into()))
    }

    pub fn set_color(&self, color: StrokeColor) -> AppResult<()> {
        self.send(Command::SetColor(color))
    }

    pub fn set_logo(&self, logo: LogoImage) -> AppResult<()> {
        self.send(Command::SetLogo(Some(logo)))
    }

    pub fn clear_logo(&self) -> AppResult<()> {
        self.send(Command::SetLogo(None))
    }

    /// Reads a logo file and makes it the current logo.
    ///
    /// The bytes are not decoded here; a broken image surfaces as a logo load
    /// error on the next render, which then falls back to a logo-less code.
    pub async fn load_logo(&self, path: &Path) -> AppResult<()> {
        let logo = LogoImage::from_path(path).await?;
        info!("Loaded logo {} ({} bytes)", logo.name, logo.bytes.len());
        self.set_logo(logo)
    }

    pub fn status(&self) -> GenerationStatus {
        self.status.borrow().clone()
    }

    pub fn current_image(&self) -> Option<Arc<RenderedImage>> {
        self.status.borrow().image.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationStatus> {
        self.status.clone()
    }

    /// Waits until the published status satisfies `predicate`.
    pub async fn wait_for<F>(&self, predicate: F) -> AppResult<GenerationStatus>
    where
        F: FnMut(&GenerationStatus) -> bool,
    {
        let mut status = self.status.clone();
        let found = status
            .wait_for(predicate)
            .await
            .map_err(|_| AppError::ControllerClosed)?;
        Ok((*found).clone())
    }

    /// Waits until every mutation sent so far has been processed and no cycle
    /// is pending or rendering.
    pub async fn settled(&self) -> AppResult<GenerationStatus> {
        let sent = self.sent.load(Ordering::SeqCst);
        self.wait_for(move |s| {
            s.sequence >= sent
                && !matches!(s.state, GenerationState::Pending | GenerationState::Rendering)
        })
        .await
    }

    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Generation controller task ended abnormally: {}", e);
            }
        }
    }

    fn send(&self, command: Command) -> AppResult<()> {
        self.commands
            .send(command)
            .map_err(|_| AppError::ControllerClosed)?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for GenerationController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Actor {
    encoder: Arc<dyn QrEncoder>,
    settings: RenderSettings,
    debounce: Duration,
    text: String,
    color: StrokeColor,
    logo: Option<LogoImage>,
    /// Bumped on every input mutation.
    sequence: u64,
    cycles: u64,
    deadline: Option<Instant>,
    /// Sequence of the most recently started cycle.
    last_started: u64,
    in_flight: JoinSet<AppResult<RenderOutcome>>,
    /// Sequence each in-flight cycle was started for, by task id.
    cycle_sequences: HashMap<task::Id, u64>,
    status: watch::Sender<GenerationStatus>,
}

impl Actor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!("Generation controller started");
        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.deadline = None;
                    self.start_cycle();
                }
                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    self.finish_cycle(joined);
                }
            }
        }
        self.in_flight.abort_all();
        debug!("Generation controller stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetText(text) => self.text = text,
            Command::SetColor(color) => self.color = color,
            Command::SetLogo(logo) => self.logo = logo,
            Command::Shutdown => return,
        }
        self.sequence += 1;
        let sequence = self.sequence;

        if self.text.trim().is_empty() {
            self.deadline = None;
            self.status.send_modify(|s| {
                s.state = GenerationState::Idle;
                s.image = None;
                s.last_error = None;
                s.sequence = sequence;
            });
            return;
        }

        self.deadline = Some(Instant::now() + self.debounce);
        self.status.send_modify(|s| {
            s.state = GenerationState::Pending;
            s.sequence = sequence;
        });
    }

    fn start_cycle(&mut self) {
        let Some(request) = GenerationRequest::new(&self.text, self.color, self.logo.clone()) else {
            return;
        };
        let sequence = self.sequence;
        self.cycles += 1;
        self.last_started = sequence;
        debug!(sequence, color = %request.color, logo = request.logo.is_some(), "Starting generation cycle");

        let encoder = Arc::clone(&self.encoder);
        let settings = self.settings;
        let handle = self
            .in_flight
            .spawn_blocking(move || render(encoder.as_ref(), &request, settings));
        self.cycle_sequences.insert(handle.id(), sequence);

        let cycles = self.cycles;
        self.status.send_modify(|s| {
            s.state = GenerationState::Rendering;
            s.cycles = cycles;
        });
    }

    fn finish_cycle(&mut self, joined: Result<(task::Id, AppResult<RenderOutcome>), JoinError>) {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, outcome.map_err(|e| e.to_string())),
            Err(e) => (e.id(), Err(format!("generation cycle aborted: {}", e))),
        };
        let Some(sequence) = self.cycle_sequences.remove(&id) else {
            return;
        };

        if sequence != self.sequence {
            debug!(
                stale = sequence,
                latest = self.sequence,
                "Discarding superseded generation result"
            );
            // Normally the debounce timer covers the latest input; restart only
            // if nothing has been started for it.
            let latest_started = self.last_started == self.sequence;
            if self.deadline.is_none() && !latest_started && !self.text.trim().is_empty() {
                self.start_cycle();
            }
            return;
        }

        match outcome {
            Ok(outcome) => {
                let last_error = outcome.logo_error.map(|e| e.to_string());
                if let Some(err) = &last_error {
                    warn!("Generated without logo: {}", err);
                }
                let image = Arc::new(outcome.image);
                self.status.send_modify(|s| {
                    s.state = GenerationState::Ready;
                    s.image = Some(image);
                    s.last_error = last_error;
                });
            }
            Err(message) => {
                error!("QR generation failed: {}", message);
                self.status.send_modify(|s| {
                    s.state = GenerationState::Failed;
                    s.last_error = Some(message);
                });
            }
        }
    }
}
