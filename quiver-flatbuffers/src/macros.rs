//! Boilerplate shared by the hand-maintained Arrow bindings.
//!
//! Enums are transparent newtypes over their wire integer so that unknown values from newer
//! writers survive a read. Tables wrap a [`flatbuffers::Table`] and expose typed accessors.

macro_rules! flatbuffer_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub $repr);

        #[allow(non_upper_case_globals)]
        impl $name {
            $($(#[$vmeta])* pub const $variant: Self = Self($value);)*

            /// Every value this binding knows about.
            pub const ENUM_VALUES: &'static [Self] = &[$(Self::$variant),*];

            /// The schema name of this value, if it is a known one.
            pub fn variant_name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some(stringify!($variant)),)*
                    _ => None,
                }
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self.variant_name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "<UNKNOWN {}>", self.0),
                }
            }
        }

        impl<'a> flatbuffers::Follow<'a> for $name {
            type Inner = Self;

            #[inline]
            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                Self(unsafe { flatbuffers::read_scalar_at::<$repr>(buf, loc) })
            }
        }

        impl flatbuffers::Push for $name {
            type Output = $name;

            #[inline]
            unsafe fn push(&self, dst: &mut [u8], _written_len: usize) {
                unsafe { flatbuffers::emplace_scalar::<$repr>(dst, self.0) };
            }
        }

        impl flatbuffers::EndianScalar for $name {
            type Scalar = $repr;

            #[inline]
            fn to_little_endian(self) -> $repr {
                self.0.to_le()
            }

            #[inline]
            fn from_little_endian(v: $repr) -> Self {
                Self(<$repr>::from_le(v))
            }
        }

        impl flatbuffers::Verifiable for $name {
            #[inline]
            fn run_verifier(
                v: &mut flatbuffers::Verifier,
                pos: usize,
            ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
                <$repr as flatbuffers::Verifiable>::run_verifier(v, pos)
            }
        }

        impl flatbuffers::SimpleToVerifyInSlice for $name {}
    };
}

macro_rules! flatbuffer_table {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq)]
        pub struct $name<'a> {
            pub _tab: flatbuffers::Table<'a>,
        }

        impl<'a> flatbuffers::Follow<'a> for $name<'a> {
            type Inner = $name<'a>;

            #[inline]
            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                Self {
                    _tab: unsafe { flatbuffers::Table::new(buf, loc) },
                }
            }
        }
    };
}

/// A table without fields, used for parameterless Arrow types.
macro_rules! empty_table {
    ($(#[$meta:meta])* $name:ident) => {
        flatbuffer_table!($(#[$meta])* $name);

        impl<'a> $name<'a> {
            /// Serialize an instance of this table.
            pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
                fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
            ) -> flatbuffers::WIPOffset<$name<'bldr>> {
                let start = fbb.start_table();
                let o = fbb.end_table(start);
                flatbuffers::WIPOffset::new(o.value())
            }
        }

        impl flatbuffers::Verifiable for $name<'_> {
            #[inline]
            fn run_verifier(
                v: &mut flatbuffers::Verifier,
                pos: usize,
            ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
                v.visit_table(pos)?.finish();
                Ok(())
            }
        }
    };
}
