use std::fmt;
use std::rc::Rc;

/// Identity of a live object: the address of its shared allocation.
///
/// Two handles have the same `ObjectId` exactly when they point at the same
/// object, regardless of value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        ObjectId(Rc::as_ptr(rc) as *const () as usize)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
