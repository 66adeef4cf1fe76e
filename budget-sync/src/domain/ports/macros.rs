//! `define_port_error!`: thiserror enums for ports and adapters.
//!
//! Each variant gets a snake_case constructor. Struct-variant fields are
//! taken as `impl Into<FieldType>`, so `&str` fills `String` fields and a
//! bare error fills a `Box<Error>` field.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    define_port_error! {
        /// Failures of a made-up upload sink.
        pub enum UploadError {
            Offline { endpoint: String } => "{endpoint} is offline",
            Throttled { attempts: u32, wait: Duration } => "throttled after {attempts} attempts ({wait:?})",
            Wrapped { inner: Box<UploadError> } => "wrapped: {inner}",
            Closed => "sink closed",
        }
    }

    #[test]
    fn string_fields_accept_str() {
        let err = UploadError::offline("api.example.test");
        assert_eq!(err.to_string(), "api.example.test is offline");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = UploadError::throttled(3_u32, Duration::from_secs(2));
        assert_eq!(err, UploadError::Throttled { attempts: 3, wait: Duration::from_secs(2) });
    }

    #[test]
    fn boxed_fields_accept_the_unboxed_value() {
        let err = UploadError::wrapped(UploadError::closed());
        assert_eq!(err.to_string(), "wrapped: sink closed");
    }
}
