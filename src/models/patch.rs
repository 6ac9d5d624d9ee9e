//! Tri-state field patch distinguishing "leave unchanged" from "clear".

use serde::{Deserialize, Deserializer};

/// A partial update for one optional field.
///
/// Inbound JSON maps onto the three states naturally: an absent field
/// deserializes to [`Patch::Keep`] (via `#[serde(default)]`), an explicit
/// `null` to [`Patch::Clear`], and a value to [`Patch::Set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the current value untouched.
    #[default]
    Keep,
    /// Clear the current value.
    Clear,
    /// Replace the current value.
    Set(T),
}

impl<T> Patch<T> {
    /// Whether this patch leaves the field unchanged.
    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Apply the patch to an optional slot.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Clear => *slot = None,
            Self::Set(value) => *slot = Some(value),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A present-but-null field arrives here as `None`.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Set(value),
            None => Self::Clear,
        })
    }
}
