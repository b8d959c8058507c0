use crate::error::Result;

/// An approximate membership query: answers "might be present" or
/// "definitely absent".
///
/// `contains` never returns `false` for an element that was added, but may
/// return `true` for one that was not.
pub trait ApproxMemQuery<T: ?Sized> {
    fn add(&mut self, x: &T) -> Result<()>;

    fn contains(&self, x: &T) -> bool;
}
