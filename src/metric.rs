use std::{collections::BTreeMap, sync::mpsc};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use tracing::warn;

use crate::result::CollectorError;

pub type Fields = BTreeMap<CompactString, FieldValue>;
pub type Tags = BTreeMap<CompactString, CompactString>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Bool(bool),
    Str(CompactString),
    Time(DateTime<Utc>),
}

/// One timestamped, tagged record handed to the metrics pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: &'static str,
    pub fields: Fields,
    pub tags: Tags,
    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    pub fn new(name: &'static str, timestamp: DateTime<Utc>) -> Self {
        Self { name, fields: Fields::new(), tags: Tags::new(), timestamp }
    }

    pub fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn tag(mut self, key: &str, value: impl Into<CompactString>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(CompactString::as_str)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self { FieldValue::Int(v) }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self { FieldValue::Bool(v) }
}

impl From<CompactString> for FieldValue {
    fn from(v: CompactString) -> Self { FieldValue::Str(v) }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self { FieldValue::Str(v.into()) }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self { FieldValue::Time(v) }
}

/// Destination for collected measurements and for errors raised while
/// collecting them. Shared by every stream, so it must accept concurrent calls.
pub trait Accumulator: Send + Sync {
    fn emit(&self, measurement: Measurement);

    fn report_error(&self, error: CollectorError);
}

#[derive(Debug)]
pub enum CollectorEvent {
    Metric(Measurement),
    Error(CollectorError),
}

impl Accumulator for mpsc::Sender<CollectorEvent> {
    fn emit(&self, measurement: Measurement) {
        if self.send(CollectorEvent::Metric(measurement)).is_err() {
            warn!("measurement dropped, receiver has hung up");
        }
    }

    fn report_error(&self, error: CollectorError) {
        if let Err(mpsc::SendError(event)) = self.send(CollectorEvent::Error(error)) {
            warn!(?event, "error dropped, receiver has hung up");
        }
    }
}
