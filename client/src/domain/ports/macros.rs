//! Defines helper macros for generating domain port error enums.
//!
//! Each variant gets a snake-case constructor taking `impl Into<_>` for its
//! fields, so adapters can write `CategoryRepositoryError::transport(msg)`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
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
    //! Regression coverage for this module.
    define_port_error! {
        pub enum ExamplePortError {
            Offline => "service offline",
            Rejected { message: String } => "rejected: {message}",
            Throttled { retry_after_secs: u64 } => "throttled for {retry_after_secs}s",
            Status { message: String, status: u16 } => "status {status}: {message}",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(ExamplePortError::offline(), ExamplePortError::Offline);
        assert_eq!(ExamplePortError::offline().to_string(), "service offline");
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExamplePortError::rejected("duplicate name");
        assert_eq!(err.to_string(), "rejected: duplicate name");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = ExamplePortError::throttled(30_u64);
        assert_eq!(err.to_string(), "throttled for 30s");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ExamplePortError::status("conflict", 409_u16);
        assert_eq!(err.to_string(), "status 409: conflict");
    }
}
