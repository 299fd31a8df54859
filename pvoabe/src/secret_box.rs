use alloc::boxed::Box;
use core::fmt;

use zeroize::Zeroize;

/// A marker trait for types that can be wrapped in a [`SecretBox`].
///
/// The contents are wiped when the box is dropped.
pub trait CanBeZeroizedOnDrop {
    /// Wipes the secret contents.
    fn ensure_zeroized_on_drop(&mut self);
}

impl<T: Zeroize> CanBeZeroizedOnDrop for T {
    fn ensure_zeroized_on_drop(&mut self) {
        self.zeroize()
    }
}

/// A container for secret data.
/// Makes the secret contents inaccessible to `Debug` and `Display`,
/// allocates them on the heap so that moves do not leave copies behind,
/// and wipes them on drop.
#[derive(Clone)]
pub struct SecretBox<T>(Box<T>)
where
    T: CanBeZeroizedOnDrop + Clone;

impl<T> PartialEq<SecretBox<T>> for SecretBox<T>
where
    T: CanBeZeroizedOnDrop + Clone + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> SecretBox<T>
where
    T: CanBeZeroizedOnDrop + Clone,
{
    /// Wraps a secret value.
    pub fn new(val: T) -> Self {
        Self(Box::new(val))
    }

    /// Returns an immutable reference to the secret value.
    pub fn as_secret(&self) -> &T {
        self.0.as_ref()
    }

    /// Returns a mutable reference to the secret value.
    pub fn as_mut_secret(&mut self) -> &mut T {
        self.0.as_mut()
    }
}

impl<T> Drop for SecretBox<T>
where
    T: CanBeZeroizedOnDrop + Clone,
{
    fn drop(&mut self) {
        self.0.ensure_zeroized_on_drop()
    }
}

impl<T> fmt::Debug for SecretBox<T>
where
    T: CanBeZeroizedOnDrop + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBox(...)")
    }
}
