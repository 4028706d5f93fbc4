// SPDX-License-Identifier: MIT

/// Wires the error hierarchy together.
///
/// - `top`: sub-errors converted into the matching `FsError` variant
/// - `str_into`: `&'static str` converted into `Other(msg)` of each listed type (and of the top type)
/// - `sub`: conversions between layers (`S => [D::Variant, ..]`)
/// - `display`: `Display` impls that print `msg()` followed by the `caused by` chain
#[macro_export]
macro_rules! fs_error_wiring {
    (
        top => $top:ty {
            $($top_src:ty : $top_variant:ident),+ $(,)?
        },
        str_into => [ $($str_tgt:ty),* $(,)? ],
        sub => {
            $($src_sub:ty => [ $($dst_sub:ident::$dst_variant:ident),+ ] ),* $(,)?
        },
        display => [ $($disp:ty),* $(,)? ] $(,)?
    ) => {
        $crate::__impl_into_fserror!{ $top; $( $top_src => $top_variant ),+ }

        $crate::__impl_str_into_errors!{ $top; $( $str_tgt ),* }

        $crate::__impl_sub_into_error!{ $( $src_sub => [ $( $dst_sub :: $dst_variant ),+ ] ),* }

        $crate::__impl_chain_display!{ $( $disp ),* }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __impl_into_fserror {
    ($top:ty; $($t:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$t> for $top {
                #[inline]
                fn from(e: $t) -> Self { <$top>::$variant(e) }
            }
        )+
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __impl_str_into_errors {
    ($top:ty; $($t:ty),* $(,)?) => {
        $(
            impl From<&'static str> for $t {
                #[inline]
                fn from(msg: &'static str) -> Self { <$t>::Other(msg) }
            }
        )*
        impl From<&'static str> for $top {
            #[inline]
            fn from(msg: &'static str) -> Self { <$top>::Other(msg) }
        }
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __impl_sub_into_error {
    ($($src:ty => [ $( $dst:ident::$variant:ident ),+ ] ),* $(,)?) => {
        $(
            $(
                impl From<$src> for $dst {
                    #[inline]
                    fn from(e: $src) -> Self { <$dst>::$variant(e) }
                }
            )+
        )*
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __impl_chain_display {
    ($($t:ty),* $(,)?) => {
        $(
            impl ::core::fmt::Display for $t {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    write!(f, "{}", self.msg())?;
                    let mut current = self.source();
                    while let Some(src) = current {
                        write!(f, "\n  caused by: {}", src.msg())?;
                        current = src.source();
                    }
                    Ok(())
                }
            }

            #[cfg(feature = "std")]
            impl ::std::error::Error for $t {}
        )*
    }
}

/// Returns early with `$err.into()` when `$cond` is false.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// Returns early with `$err.into()`.
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
}
