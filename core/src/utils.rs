use std::fmt;
use std::ops::RangeInclusive;

use num_enum::TryFromPrimitive;

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

#[inline]
pub fn in_range<T: PartialOrd>(value: T, range: &RangeInclusive<T>) -> bool {
    range.contains(&value)
}
