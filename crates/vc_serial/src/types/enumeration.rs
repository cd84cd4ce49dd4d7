use alloc::string::String;
use alloc::vec::Vec;

use crate::ReflectId;
use crate::types::ReflectionType;

// -----------------------------------------------------------------------------
// ReflectedEnum

/// A fieldless enum archived by the integer value of its enumerators.
///
/// # Examples
///
/// ```
/// use vc_serial::types::ReflectedEnum;
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum WeekEnd {
///     Sunday = 1,
///     Saturday = 7,
/// }
///
/// impl ReflectedEnum for WeekEnd {
///     const TYPE_NAME: &'static str = "WeekEnd";
///     const ENUMERATORS: &'static [(&'static str, Self)] =
///         &[("Sunday", Self::Sunday), ("Saturday", Self::Saturday)];
///
///     fn value(self) -> i32 {
///         self as i32
///     }
/// }
///
/// assert_eq!(WeekEnd::from_value(7), Some(WeekEnd::Saturday));
/// assert_eq!(WeekEnd::from_name("Sunday"), Some(WeekEnd::Sunday));
/// assert_eq!(WeekEnd::Saturday.name(), Some("Saturday"));
/// assert_eq!(WeekEnd::from_value(2), None);
/// ```
pub trait ReflectedEnum: Copy + PartialEq + Send + Sync + 'static {
    /// The registered name, its hash is the type id.
    const TYPE_NAME: &'static str;

    /// Every enumerator with its name, in declaration order.
    const ENUMERATORS: &'static [(&'static str, Self)];

    /// The archived value of the enumerator.
    fn value(self) -> i32;

    fn from_value(value: i32) -> Option<Self> {
        Self::ENUMERATORS
            .iter()
            .find(|(_, e)| e.value() == value)
            .map(|(_, e)| *e)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ENUMERATORS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, e)| *e)
    }

    fn name(self) -> Option<&'static str> {
        Self::ENUMERATORS
            .iter()
            .find(|(_, e)| *e == self)
            .map(|(n, _)| *n)
    }
}

// -----------------------------------------------------------------------------
// EnumReflectionType

/// A registered enum: its type and the name and value of every enumerator.
///
/// Every enum type is a [`GENERIC_NAME`](Self::GENERIC_NAME), the generic
/// enum type is not any particular enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumReflectionType {
    ty: ReflectionType,
    enumerators: Vec<(String, i32)>,
}

impl EnumReflectionType {
    /// The name of the type every enum derives from.
    pub const GENERIC_NAME: &'static str = "ReflectionEnum";

    pub fn new<N: Into<String>>(name: impl Into<String>, enumerators: impl IntoIterator<Item = (N, i32)>) -> Self {
        Self {
            ty: ReflectionType::new(name, 0),
            enumerators: enumerators.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    pub fn of<E: ReflectedEnum>() -> Self {
        Self::new(
            E::TYPE_NAME,
            E::ENUMERATORS.iter().map(|(name, e)| (*name, e.value())),
        )
    }

    #[inline]
    pub fn generic_id() -> ReflectId {
        ReflectId::of(Self::GENERIC_NAME)
    }

    #[inline]
    pub fn ty(&self) -> &ReflectionType {
        &self.ty
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    #[inline]
    pub fn id(&self) -> ReflectId {
        self.ty.id()
    }

    /// Enumerator names in registration order.
    pub fn enumerators(&self) -> impl Iterator<Item = &str> {
        self.enumerators.iter().map(|(name, _)| name.as_str())
    }

    /// Position of the enumerator holding `value`.
    pub fn index_of(&self, value: i32) -> Option<usize> {
        self.enumerators.iter().position(|(_, v)| *v == value)
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.enumerators
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.index_of(value).map(|index| self.enumerators[index].0.as_str())
    }

    pub fn is_a(&self, id: ReflectId) -> bool {
        id == self.id() || id == Self::generic_id()
    }

    #[inline]
    pub fn is_exactly_a(&self, id: ReflectId) -> bool {
        id == self.id()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_types::{WeekDays, WeekEnd};

    #[test]
    fn enumerators_keep_registration_order() {
        let days = EnumReflectionType::of::<WeekDays>();
        assert_eq!(
            days.enumerators().collect::<Vec<_>>(),
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
        );

        let weekend = EnumReflectionType::of::<WeekEnd>();
        assert_eq!(weekend.enumerators().collect::<Vec<_>>(), ["Sunday", "Saturday"]);
        assert_eq!(weekend.index_of(7), Some(1));
        assert_eq!(weekend.index_of(2), None);
        assert_eq!(weekend.value_of("Sunday"), Some(1));
        assert_eq!(weekend.value_of("Monday"), None);
        assert_eq!(weekend.name_of(7), Some("Saturday"));
    }

    #[test]
    fn enums_derive_from_the_generic_enum_only() {
        let days = EnumReflectionType::of::<WeekDays>();
        let weekend = EnumReflectionType::of::<WeekEnd>();

        assert!(days.is_a(EnumReflectionType::generic_id()));
        assert!(!days.is_exactly_a(EnumReflectionType::generic_id()));
        assert!(days.is_exactly_a(days.id()));
        assert!(!days.is_a(weekend.id()));
        assert!(!weekend.is_a(days.id()));
    }

    #[test]
    fn typed_conversions() {
        assert_eq!(WeekDays::from_value(2), Some(WeekDays::Wednesday));
        assert_eq!(WeekDays::from_name("Friday"), Some(WeekDays::Friday));
        assert_eq!(WeekDays::Tuesday.name(), Some("Tuesday"));
        assert_eq!(WeekEnd::from_value(0), None);
    }
}
