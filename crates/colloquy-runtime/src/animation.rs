//! Timer-driven layout animation
//!
//! [`spawn_layout_driver`] moves a [`ForceSimulation`] onto a tokio task that
//! ticks it on an interval and publishes every frame on a watch channel.
//! Drag commands reach the simulation through the returned [`LayoutDriver`].
//! Dropping the driver cancels the simulation and stops the task, so a stale
//! layout can never keep publishing after the stage or debate changes.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use colloquy_core::ArgumentId;
use colloquy_layout::{CancelHandle, ForceSimulation, LayoutFrame, SimulationStatus};

#[derive(Debug, Clone, PartialEq)]
enum DragCommand {
    Pin { id: ArgumentId, x: f64, y: f64 },
    Release { id: ArgumentId },
}

/// Handle to a running layout animation
#[derive(Debug)]
pub struct LayoutDriver {
    frames: watch::Receiver<LayoutFrame>,
    commands: mpsc::UnboundedSender<DragCommand>,
    cancel: CancelHandle,
    task: Option<JoinHandle<LayoutFrame>>,
}

impl LayoutDriver {
    /// Receiver of live frames; the latest frame is always available
    pub fn frames(&self) -> watch::Receiver<LayoutFrame> {
        self.frames.clone()
    }

    pub fn latest(&self) -> LayoutFrame {
        self.frames.borrow().clone()
    }

    /// Pin a node under the pointer; repeated calls move it
    pub fn drag(&self, id: &str, x: f64, y: f64) {
        let _ = self.commands.send(DragCommand::Pin {
            id: id.to_string(),
            x,
            y,
        });
    }

    /// Let go of a dragged node
    pub fn release(&self, id: &str) {
        let _ = self.commands.send(DragCommand::Release { id: id.to_string() });
    }

    /// Stop the animation immediately
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the simulation to stop and return its last frame
    pub async fn finish(mut self) -> LayoutFrame {
        let last = self.latest();
        match self.task.take() {
            Some(task) => task.await.unwrap_or(last),
            None => last,
        }
    }
}

impl Drop for LayoutDriver {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Animate `simulation` on a tokio interval.
///
/// The task ends when the layout settles, exhausts its tick budget or is
/// cancelled. A drag restarts a settled layout only while the task is alive,
/// so drags arriving after the end are ignored.
pub fn spawn_layout_driver(mut simulation: ForceSimulation, tick_interval: Duration) -> LayoutDriver {
    let cancel = simulation.cancel_handle();
    let (frame_tx, frames) = watch::channel(simulation.frame());
    let (commands, mut command_rx) = mpsc::unbounded_channel();
    let period = tick_interval.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                Some(command) = command_rx.recv() => {
                    match command {
                        DragCommand::Pin { id, x, y } => simulation.pin(&id, x, y),
                        DragCommand::Release { id } => simulation.release(&id),
                    };
                    continue;
                }
            }

            let status = simulation.tick();
            let frame = simulation.frame();
            if frame_tx.send(frame).is_err() {
                tracing::debug!("Layout frame receivers dropped");
                break;
            }
            if status != SimulationStatus::Running {
                tracing::debug!(?status, ticks = simulation.ticks(), "Layout animation stopped");
                break;
            }
        }
        simulation.frame()
    });

    LayoutDriver {
        frames,
        commands,
        cancel,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_layout::{ArgumentGraph, ForceConfig};

    #[tokio::test]
    async fn test_empty_graph_finishes_immediately() {
        let sim = ForceSimulation::new(&ArgumentGraph::default(), ForceConfig::default());
        let driver = spawn_layout_driver(sim, Duration::from_millis(1));
        let frame = driver.finish().await;
        assert!(frame.nodes.is_empty());
        assert_eq!(frame.status, SimulationStatus::Settled);
    }
}
