use super::{CommandSink, Signal};
use log::warn;
use tokio::sync::mpsc::UnboundedSender;

/// A [`CommandSink`] forwarding every signal to a tokio channel.
///
/// The channel is unbounded so a slow consumer never stalls the control loops.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: UnboundedSender<Signal>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Signal>) -> Self {
        Self { tx }
    }
}

impl CommandSink for ChannelSink {
    fn send(&mut self, signal: Signal) {
        if let Err(error) = self.tx.send(signal) {
            warn!("Dropped {:?}: receiver closed", error.0);
        }
    }
}
