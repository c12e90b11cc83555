use bytes::{BufMut, Bytes, BytesMut};

/// Event name carried by every frame the relay emits.
pub const EVENT_TYPE: &str = "chat";

/// Payload of the acknowledgment frame sent to a receiver when it attaches.
pub const CONNECTED_DATA: &str = "Connected";

/// Event-stream comment used to keep idle connections open.
pub const KEEP_ALIVE_FRAME: &[u8] = b":\n\n";

/// A single chat event, alive only for the duration of one broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatEvent<'a> {
    data: &'a str,
}

impl<'a> ChatEvent<'a> {
    pub fn new(data: &'a str) -> Self {
        Self { data }
    }

    /// Encode as a `text/event-stream` frame:
    ///
    /// ```text
    /// event: chat
    /// data: <line 1>
    /// data: <line 2>
    ///
    /// ```
    ///
    /// Every line of the payload gets its own `data: ` prefix so multi-line
    /// messages arrive as one event.
    pub fn to_frame(&self) -> Bytes {
        let mut frame = BytesMut::with_capacity(
            "event: \n".len() + EVENT_TYPE.len() + self.data.len() + 16,
        );
        frame.put_slice(b"event: ");
        frame.put_slice(EVENT_TYPE.as_bytes());
        frame.put_u8(b'\n');

        for line in lines(self.data) {
            frame.put_slice(b"data: ");
            frame.put_slice(line.as_bytes());
            frame.put_u8(b'\n');
        }

        frame.put_u8(b'\n');
        frame.freeze()
    }
}

impl ChatEvent<'static> {
    pub fn connected() -> Self {
        Self::new(CONNECTED_DATA)
    }
}

/// Split on `\r\n`, `\r` and `\n`, the three terminators an event-stream parser
/// recognises. Always yields at least one (possibly empty) line.
fn lines(text: &str) -> Lines<'_> {
    Lines { rest: Some(text) }
}

struct Lines<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(idx) => {
                let terminator = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
                self.rest = Some(&rest[idx + terminator..]);
                Some(&rest[..idx])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}
