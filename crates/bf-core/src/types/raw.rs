//! Raw feed messages — the unit of hand-off between the transports and the
//! message dispatcher.

/// Identity of the connection a raw message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnOrigin {
    /// The multiplexed combined-stream WebSocket connection.
    Stream,
    /// The open-interest REST polling connection.
    Poll,
}

/// One decoded-but-unparsed message plus its receipt timestamp.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub origin: ConnOrigin,
    pub text: String,
    pub recv_ts_us: u64,
}

impl RawMessage {
    /// Stamp a freshly received message with the current time.
    pub fn now(origin: ConnOrigin, text: String) -> Self {
        Self { origin, text, recv_ts_us: crate::time_util::now_us() }
    }
}
