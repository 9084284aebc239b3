use std::rc::Weak;

use crossbridge_object::source::SourceIterator;
use crossbridge_object::target::{TargetIterator, TargetType};
use crossbridge_object::{BuiltinKind, SourceValue, TargetKind, TargetValue};

use crate::context::{Bridge, BridgeContext};
use crate::error::BridgeError;
use crate::identity::CloneMap;

/// A target iterator or generator seen from the source runtime.
///
/// Yielded values are marshaled inward through the clone map of the
/// conversion that produced the adapter; `send` and `throw` marshal their
/// argument outward first.
pub struct ForeignIterator {
    bridge: Weak<BridgeContext>,
    iterator: TargetValue,
    clones: CloneMap,
    default: Option<SourceValue>,
}

impl ForeignIterator {
    pub(crate) fn new(
        bridge: Weak<BridgeContext>,
        iterator: TargetValue,
        clones: CloneMap,
        default: Option<SourceValue>,
    ) -> Self {
        ForeignIterator { bridge, iterator, clones, default }
    }

    fn bridge(&self) -> Result<Bridge, SourceValue> {
        self.bridge.upgrade().ok_or_else(|| {
            SourceValue::new_exception(BuiltinKind::SystemError, "the bridge behind this iterator no longer exists")
        })
    }

    /// Runs `step` on the target iterator. The borrow ends before anything
    /// is marshaled.
    fn step<R>(&self, step: impl FnOnce(&mut dyn TargetIterator) -> R) -> Result<R, SourceValue> {
        let TargetKind::Iterator(iterator) = self.iterator.kind() else {
            return Err(SourceValue::new_exception(
                BuiltinKind::TypeError,
                format!("'{}' object is not an iterator", self.iterator.type_name()),
            ));
        };
        let mut iterator = iterator
            .try_borrow_mut()
            .map_err(|_| SourceValue::new_exception(BuiltinKind::ValueError, "generator already executing"))?;
        Ok(step(&mut **iterator))
    }

    fn receive(&self, bridge: &Bridge, outcome: Result<TargetValue, TargetValue>) -> Result<SourceValue, SourceValue> {
        match outcome {
            Ok(value) => bridge
                .to_source_with(&value, &self.clones, self.default.as_ref())
                .map_err(BridgeError::into_source_exception),
            Err(thrown) => Err(bridge.thrown_to_source(&thrown, &self.clones)),
        }
    }
}

impl SourceIterator for ForeignIterator {
    fn next(&self) -> Result<Option<SourceValue>, SourceValue> {
        let bridge = self.bridge()?;
        let outcome = self.step(|iterator| match iterator.has_next() {
            Ok(true) => iterator.next().map(Some),
            Ok(false) => Ok(None),
            Err(thrown) => Err(thrown),
        })?;
        match outcome {
            Ok(Some(value)) => self.receive(&bridge, Ok(value)).map(Some),
            Ok(None) => Ok(None),
            Err(thrown) if is_stop_iteration(&thrown) => Ok(None),
            Err(thrown) => Err(bridge.thrown_to_source(&thrown, &self.clones)),
        }
    }

    fn send(&self, value: SourceValue) -> Result<SourceValue, SourceValue> {
        let bridge = self.bridge()?;
        let value = bridge.to_target(&value).map_err(BridgeError::into_source_exception)?;
        let outcome = self.step(|iterator| iterator.send(value))?;
        self.receive(&bridge, outcome)
    }

    fn throw(&self, exception: SourceValue) -> Result<SourceValue, SourceValue> {
        let bridge = self.bridge()?;
        let exception = bridge.exception_to_target(&exception);
        let outcome = self.step(|iterator| iterator.throw_value(exception))?;
        self.receive(&bridge, outcome)
    }
}

fn is_stop_iteration(thrown: &TargetValue) -> bool {
    thrown
        .as_exception()
        .and_then(|exception| exception.python_type())
        .is_some_and(|ty| ty.is_subtype_of(&TargetType::builtin(BuiltinKind::StopIteration)))
}
