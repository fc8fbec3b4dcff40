//! Scripted controller shared by the session tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use plclogger_core::source::{SourceError, TagSource};
use plclogger_core::tag::TagValue;

/// One scripted answer to a read
#[derive(Debug, Clone)]
pub enum Reply {
    Value(TagValue),
    Null,
    Timeout,
    Lost,
    /// Socket reset surfaced as an I/O error
    Reset,
    /// Answer with `value` after an extra `delay`
    Slow(TagValue, Duration),
}

impl From<bool> for Reply {
    fn from(v: bool) -> Self {
        Reply::Value(TagValue::Bool(v))
    }
}

impl From<f64> for Reply {
    fn from(v: f64) -> Self {
        Reply::Value(TagValue::Real(v))
    }
}

/// Controller answering each tag from its own script.
///
/// Every read takes `read_delay` of (tokio) time. Once a script runs out the
/// last answer repeats. The first answer of every script is consumed by the
/// validation pass.
pub struct ScriptedSource {
    scripts: HashMap<String, VecDeque<Reply>>,
    last: HashMap<String, Reply>,
    read_delay: Duration,
    pub reads: usize,
}

impl ScriptedSource {
    pub fn new(read_delay: Duration) -> Self {
        Self {
            scripts: HashMap::new(),
            last: HashMap::new(),
            read_delay,
            reads: 0,
        }
    }

    pub fn script<R: Into<Reply>>(
        mut self,
        tag: &str,
        replies: impl IntoIterator<Item = R>,
    ) -> Self {
        self.scripts
            .insert(tag.to_string(), replies.into_iter().map(Into::into).collect());
        self
    }
}

impl TagSource for ScriptedSource {
    async fn read(&mut self, tag_name: &str) -> Result<Option<TagValue>, SourceError> {
        self.reads += 1;
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }

        let next = self
            .scripts
            .get_mut(tag_name)
            .and_then(|script| script.pop_front());
        let reply = match next {
            Some(reply) => {
                self.last.insert(tag_name.to_string(), reply.clone());
                reply
            }
            None => match self.last.get(tag_name) {
                Some(reply) => reply.clone(),
                None => return Err(SourceError::UnknownTag(tag_name.to_string())),
            },
        };

        match reply {
            Reply::Value(v) => Ok(Some(v)),
            Reply::Null => Ok(None),
            Reply::Timeout => Err(SourceError::Timeout),
            Reply::Lost => Err(SourceError::ConnectionLost("connection reset".into())),
            Reply::Reset => Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset).into()),
            Reply::Slow(v, delay) => {
                tokio::time::sleep(delay).await;
                Ok(Some(v))
            }
        }
    }
}

/// Cycle-start offsets of the recorded rows
pub fn offsets(records: &[plclogger_core::datalog::SampleRecord]) -> Vec<Duration> {
    records.iter().map(|r| r.offset).collect()
}

pub fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}
