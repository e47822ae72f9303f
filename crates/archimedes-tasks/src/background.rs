//! Running a slow handler off the frame thread.

use archimedes_commands::{CommandHandler, HandlerError};
use image::RgbImage;
use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};

#[derive(Debug)]
enum WorkerMessage {
    Region(RgbImage),
    Exit,
}

/// Hands regions to a worker thread that owns the wrapped handler.
///
/// [`CommandHandler::handle`] only queues a copy of the region, so the
/// dispatcher's bookkeeping stays in frame order while the handler catches
/// up. Failures on the worker are logged. Dropping the handler processes
/// the queued regions and joins the worker.
pub struct BackgroundHandler {
    name: String,
    tx: Sender<WorkerMessage>,
    thread_handle: Option<JoinHandle<u64>>,
}

impl BackgroundHandler {
    pub fn spawn<H>(name: impl Into<String>, mut handler: H) -> Result<Self, HandlerError>
    where
        H: CommandHandler + 'static,
    {
        let name = name.into();
        let (tx, rx) = channel::<WorkerMessage>();
        let worker_name = name.clone();
        let thread_handle = thread::Builder::new()
            .name(format!("archimedes-{name}"))
            .spawn(move || {
                let mut handled = 0;
                while let Ok(WorkerMessage::Region(region)) = rx.recv() {
                    if let Err(e) = handler.handle(&region) {
                        log::warn!("{worker_name}: background handler failed: {e}");
                    }
                    handled += 1;
                }
                handled
            })?;

        Ok(Self {
            name,
            tx,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Process the queued regions and stop the worker. Returns how many
    /// regions the worker handled.
    pub fn finish(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        let Some(handle) = self.thread_handle.take() else {
            return 0;
        };
        // a failed send means the worker is already gone
        let _ = self.tx.send(WorkerMessage::Exit);
        match handle.join() {
            Ok(handled) => handled,
            Err(_) => {
                log::error!("{}: background worker panicked", self.name);
                0
            }
        }
    }
}

impl CommandHandler for BackgroundHandler {
    fn handle(&mut self, region: &RgbImage) -> Result<(), HandlerError> {
        self.tx
            .send(WorkerMessage::Region(region.clone()))
            .map_err(|_| HandlerError::Other(format!("{}: background worker stopped", self.name)))
    }
}

impl Drop for BackgroundHandler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
