//! Kiln IR - shared leaf types.
//!
//! - [`Span`]: byte range into a unit's source buffer
//! - [`Name`] and [`StringInterner`]: interned identifiers
//!
//! Spans index the *current* source buffer of a unit. Construction-time
//! injection splices text into that buffer, so a span taken after an
//! injection may point past text that was never in the file on disk.
//! Injected fragments never contain newlines in precise mode, which keeps
//! line numbers stable.

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod interner;
mod name;
mod span;

pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;
