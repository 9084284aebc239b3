use std::collections::VecDeque;

use super::exception::TargetException;
use super::types::TargetType;
use super::value::TargetValue;
use crate::BuiltinKind;

/// The target runtime's iterator protocol. Generators also accept `send`
/// and `throw_value`; plain iterators use the defaults.
pub trait TargetIterator {
    fn has_next(&mut self) -> Result<bool, TargetValue>;

    fn next(&mut self) -> Result<TargetValue, TargetValue>;

    fn send(&mut self, value: TargetValue) -> Result<TargetValue, TargetValue> {
        let _ = value;
        self.next()
    }

    fn throw_value(&mut self, exception: TargetValue) -> Result<TargetValue, TargetValue> {
        Err(exception)
    }
}

/// Iterates over a fixed sequence of values.
pub struct SequenceIterator {
    items: VecDeque<TargetValue>,
}

impl SequenceIterator {
    pub fn new(items: impl IntoIterator<Item = TargetValue>) -> Self {
        SequenceIterator { items: items.into_iter().collect() }
    }
}

impl TargetIterator for SequenceIterator {
    fn has_next(&mut self) -> Result<bool, TargetValue> {
        Ok(!self.items.is_empty())
    }

    fn next(&mut self) -> Result<TargetValue, TargetValue> {
        self.items.pop_front().ok_or_else(|| {
            TargetValue::exception(TargetException::new(TargetType::builtin(BuiltinKind::StopIteration), None))
        })
    }
}
