//! Round-robin conversation driver.
//!
//! Participants speak in a fixed order, one turn each, until the turn budget
//! is spent. The exchange is exposed as a stream of frames fed by a spawned
//! task, so a caller can render each frame as soon as it exists.

use crate::agent::AssistantAgent;
use crate::error::{LitrevError, Result};
use crate::models::Frame;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Frames buffered between the driver task and the consumer.
const FRAME_BUFFER: usize = 16;

#[derive(Clone)]
pub struct RoundRobinTeam {
    participants: Vec<Arc<AssistantAgent>>,
    max_turns: usize,
}

impl RoundRobinTeam {
    pub fn new(participants: Vec<Arc<AssistantAgent>>, max_turns: usize) -> Result<Self> {
        if participants.is_empty() {
            return Err(LitrevError::InvalidArgument(
                "A team needs at least one participant".to_string(),
            ));
        }
        if max_turns == 0 {
            return Err(LitrevError::InvalidArgument(
                "max_turns must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            participants,
            max_turns,
        })
    }

    pub fn participant_names(&self) -> Vec<&str> {
        self.participants.iter().map(|a| a.name()).collect()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Run the conversation for `task`.
    ///
    /// The first item is the task frame from `user`. Each later item is one
    /// agent turn. A failed turn is yielded as `Err` and ends the stream.
    /// Must be called from within a Tokio runtime.
    pub fn run_stream(&self, task: impl Into<String>) -> ReceiverStream<Result<Frame>> {
        self.run_stream_holding(task, ())
    }

    /// Like [`run_stream`](Self::run_stream), but keeps `held` alive until
    /// the conversation has finished, whether or not anyone is still reading.
    ///
    /// Dropping the stream does not cancel the conversation.
    pub fn run_stream_holding<H>(
        &self,
        task: impl Into<String>,
        held: H,
    ) -> ReceiverStream<Result<Frame>>
    where
        H: Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Result<Frame>>(FRAME_BUFFER);
        let team = self.clone();
        let task = task.into();

        tokio::spawn(async move {
            let _held = held;
            let mut transcript = vec![Frame::task(task)];
            let mut consumer_gone = tx.send(Ok(transcript[0].clone())).await.is_err();

            for turn in 0..team.max_turns {
                let agent = &team.participants[turn % team.participants.len()];
                debug!("Turn {} taken by {}", turn + 1, agent.name());

                match agent.on_turn(&transcript).await {
                    Ok(frame) => {
                        transcript.push(frame.clone());
                        if !consumer_gone && tx.send(Ok(frame)).await.is_err() {
                            debug!("Frame consumer went away, finishing without it");
                            consumer_gone = true;
                        }
                    }
                    Err(e) => {
                        warn!("Turn {} by {} failed: {}", turn + 1, agent.name(), e);
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }

            info!("Conversation finished after {} turns", team.max_turns);
        });

        ReceiverStream::new(rx)
    }
}
