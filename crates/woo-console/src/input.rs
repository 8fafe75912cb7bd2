//! Stdin reader thread
//!
//! Stdin blocks, so it is read on its own thread. Every line is queued on the
//! dispatcher as a [`ConsoleAction`] and handled on the main thread.

use crate::console::ConsoleAction;
use std::io::BufRead;
use std::thread;
use woo_dispatch::ActionSender;

/// Spawn a thread feeding lines of `input` to `sender`
///
/// Sends [`ConsoleAction::InputClosed`] once `input` is exhausted.
pub fn spawn_reader<R>(input: R, sender: ActionSender) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        log::info!("Input reader started");
        for line in input.lines() {
            match line {
                Ok(line) => sender.send(ConsoleAction::Line(line)),
                Err(e) => {
                    log::error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
        sender.send(ConsoleAction::InputClosed);
        log::info!("Input reader stopped");
    })
}
