// Not every helper is needed by every feature combination
#![cfg_attr(not(feature = "full"), allow(dead_code))]

use std::{ffi::OsStr, os::windows::ffi::OsStrExt, ptr};

use windows_sys::core::PCWSTR;

/// Define a `repr` enum mirroring a set of native constants, with conversions to and from the
/// raw value. Converting an unknown raw value returns it unchanged as the error.
#[doc(hidden)]
#[macro_export]
macro_rules! define_int_enum {
    ($enum_doc:expr, $repr_type:ty, $enum_name:ident { $($variant:ident = $value:expr, $doc:expr;)* }) => {
        #[doc = $enum_doc]
        #[repr($repr_type)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $(
                #[doc = $doc]
                $variant = $value,
            )*
        }

        impl From<$enum_name> for $repr_type {
            fn from(value: $enum_name) -> $repr_type {
                value as $repr_type
            }
        }

        impl TryFrom<$repr_type> for $enum_name {
            type Error = $repr_type;

            fn try_from(value: $repr_type) -> Result<Self, $repr_type> {
                match value {
                    $(x if x == $value => Ok($enum_name::$variant),)*
                    unknown => Err(unknown),
                }
            }
        }
    };
}

/// Convert `s` into a null-terminated wide string.
pub fn wide_null(s: impl AsRef<OsStr>) -> Vec<u16> {
    s.as_ref()
        .encode_wide()
        .chain(std::iter::once(0u16))
        .collect()
}

/// Convert `s`, if any, into a null-terminated wide string.
pub fn wide_null_opt<S: AsRef<OsStr>>(s: Option<S>) -> Option<Vec<u16>> {
    s.map(wide_null)
}

/// Return a pointer to `s`, or null if there is no string.
///
/// The pointer is only valid while `s` is borrowed.
pub fn opt_pcwstr(s: Option<&[u16]>) -> PCWSTR {
    s.map_or(ptr::null(), <[u16]>::as_ptr)
}

/// Clamp a buffer length to what a `DWORD` length parameter can express.
pub fn dword_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_null() {
        assert_eq!(wide_null("AB"), [0x41, 0x42, 0]);
        assert_eq!(wide_null(""), [0]);
        assert_eq!(wide_null_opt(None::<&str>), None);
    }

    #[test]
    fn test_opt_pcwstr() {
        assert!(opt_pcwstr(None).is_null());
        let name = wide_null("x");
        assert_eq!(opt_pcwstr(Some(name.as_slice())), name.as_ptr());
    }

    #[test]
    fn test_dword_len() {
        assert_eq!(dword_len(5), 5);
        assert_eq!(dword_len(usize::MAX), u32::MAX);
    }
}
