// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Typed bit sets for the renderer's flag types.

/// Declares a `Copy` set of named bits.
///
/// The set supports membership tests through `contains`, accumulation through
/// `|` and `|=`, and a `Debug` that names the bits it holds.
#[macro_export]
#[doc(hidden)]
macro_rules! quartz_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag:ident = $value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name($ty);

        impl $name {
            /// No bit set.
            pub const EMPTY: Self = Self(0);

            $(
                $(#[$flag_attr])*
                pub const $flag: Self = Self($value);
            )*

            /// Whether no bit is set.
            pub const fn is_empty(&self) -> bool {
                self.0 == 0
            }

            /// Whether every bit of `other` is also set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let names: &[&str] = &[
                    $( if self.contains(Self::$flag) { stringify!($flag) } else { "" }, )*
                ];
                let mut set = f.debug_set();
                for name in names.iter().filter(|name| !name.is_empty()) {
                    set.entry(&format_args!("{name}"));
                }
                set.finish()
            }
        }
    };
}
