//! Line input on a dedicated OS thread.
//!
//! A blocking read cannot be cancelled. Keeping it off the tokio blocking
//! pool means runtime shutdown never waits on it, so the process exits
//! after Ctrl-C without another line being entered.

use std::io::{self, BufRead};
use std::thread;
use tokio::sync::mpsc;

/// Lines buffered between the reader thread and the console.
const LINE_BUFFER: usize = 16;

/// Start reading lines from `reader` on a new thread.
///
/// The receiver yields each line (or read error) in order and returns `None`
/// at end of input. The thread stops once the receiver is dropped and the
/// next line arrives.
pub fn spawn_line_reader<R>(reader: R) -> io::Result<mpsc::Receiver<io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    thread::Builder::new()
        .name("bioscan-input".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}
