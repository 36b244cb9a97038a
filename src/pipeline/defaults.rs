use crossbeam_channel::{Receiver, Sender};

use crate::alignment::tokenization::tokenize_words;
use crate::error::AlignError;
use crate::pipeline::traits::{Tokenizer, VerdictSink};
use crate::types::VerdictEvent;

/// Default tokenizer: splits on Unicode whitespace, keeps case and
/// punctuation.
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize_words(text)
    }
}

/// Sink that forwards committed verdicts over a crossbeam channel so a
/// consumer thread can render them without touching session state.
pub struct ChannelSink {
    sender: Sender<VerdictEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<VerdictEvent>) -> Self {
        Self { sender }
    }

    /// Convenience pair: an unbounded sink plus its receiving end.
    pub fn unbounded() -> (Self, Receiver<VerdictEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }
}

impl VerdictSink for ChannelSink {
    fn publish(&self, event: VerdictEvent) -> Result<(), AlignError> {
        self.sender
            .send(event)
            .map_err(|err| AlignError::runtime("publishing committed verdict", err))
    }
}

/// Sink that drops every event. Used when the caller only wants snapshots
/// and metrics.
pub struct NullSink;

impl VerdictSink for NullSink {
    fn publish(&self, _event: VerdictEvent) -> Result<(), AlignError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PositionKind, Verdict};

    fn sample_event() -> VerdictEvent {
        VerdictEvent {
            kind: PositionKind::Reference,
            index: 0,
            verdict: Verdict::Hit,
            token: "the".to_string(),
        }
    }

    #[test]
    fn whitespace_tokenizer_delegates_to_tokenize_words() {
        let tokens = WhitespaceTokenizer.tokenize("the cat\tsat");
        assert_eq!(tokens, tokenize_words("the cat\tsat"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn channel_sink_delivers_events_in_order() {
        let (sink, receiver) = ChannelSink::unbounded();
        sink.publish(sample_event()).expect("publish succeeds");
        let mut second = sample_event();
        second.index = 1;
        sink.publish(second.clone()).expect("publish succeeds");

        assert_eq!(receiver.recv().expect("first event"), sample_event());
        assert_eq!(receiver.recv().expect("second event"), second);
    }

    #[test]
    fn channel_sink_errors_once_the_receiver_is_gone() {
        let (sink, receiver) = ChannelSink::unbounded();
        drop(receiver);
        let err = sink
            .publish(sample_event())
            .expect_err("disconnected channel must fail");
        assert!(matches!(err, AlignError::Runtime { .. }));
    }

    #[test]
    fn null_sink_swallows_everything() {
        assert!(NullSink.publish(sample_event()).is_ok());
    }
}
