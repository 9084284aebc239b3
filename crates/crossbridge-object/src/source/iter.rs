use super::value::SourceValue;

/// The source runtime's iterator protocol, including generator `send` and
/// `throw`. The error side of every result is the raised exception.
pub trait SourceIterator {
    /// `Ok(None)` signals exhaustion.
    fn next(&self) -> Result<Option<SourceValue>, SourceValue>;

    fn send(&self, value: SourceValue) -> Result<SourceValue, SourceValue>;

    fn throw(&self, exception: SourceValue) -> Result<SourceValue, SourceValue>;
}
