//! Object model constants shared by the type registry and the layout engine.
//!
//! Every heap object starts with a header holding its type reference, and
//! every inline array is preceded by its element count. Both are one
//! pointer-sized word on the host.

/// Host pointer width in bytes.
pub const POINTER_SIZE: usize = std::mem::size_of::<usize>();

/// Bytes reserved in front of every object payload.
pub const OBJECT_HEADER_SIZE: usize = POINTER_SIZE;

/// Bookkeeping bytes in front of inline array storage.
pub const ARRAY_HEADER_SIZE: usize = POINTER_SIZE;

/// Granularity of logical object sizes.
pub const OBJECT_ALIGNMENT: usize = POINTER_SIZE;

/// Round `value` up to the next multiple of `align`.
///
/// Returns `None` on overflow. An alignment of 0 is treated as 1.
#[inline]
pub const fn round_up(value: usize, align: usize) -> Option<usize> {
    let align = if align == 0 { 1 } else { align };
    let rem = value % align;
    if rem == 0 {
        Some(value)
    } else {
        value.checked_add(align - rem)
    }
}

/// Logical (header-inclusive) size of an object whose payload is `raw_size`.
#[inline]
pub const fn object_size(raw_size: usize) -> Option<usize> {
    match raw_size.checked_add(OBJECT_HEADER_SIZE) {
        Some(total) => round_up(total, OBJECT_ALIGNMENT),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_exact_and_inexact() {
        assert_eq!(round_up(8, 4), Some(8));
        assert_eq!(round_up(9, 4), Some(12));
        assert_eq!(round_up(0, 8), Some(0));
        assert_eq!(round_up(5, 0), Some(5));
    }

    #[test]
    fn round_up_overflow_is_reported() {
        assert_eq!(round_up(usize::MAX, 8), None);
    }

    #[test]
    fn object_size_adds_header() {
        assert_eq!(object_size(0), Some(OBJECT_HEADER_SIZE));
        assert_eq!(object_size(4), round_up(OBJECT_HEADER_SIZE + 4, POINTER_SIZE));
        assert_eq!(object_size(usize::MAX), None);
    }
}
