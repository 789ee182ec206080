//! Newtype IDs for the service's entities.
//!
//! Every table in the pizza schema uses a `SERIAL` (i32) primary key. The
//! `define_id!` macro wraps that key so a `StoreId` can never be passed where
//! a `FranchiseId` is expected.

/// Define a type-safe wrapper around an `i32` primary key.
///
/// The generated type is `Copy`, ordered, hashable, serializes as a bare
/// number, parses from a string (path segments, CLI arguments) and, with the
/// `postgres` feature, binds and decodes as `INTEGER`.
///
/// # Example
///
/// ```rust
/// # use pizza_core::define_id;
/// define_id!(ToppingId);
///
/// let id: ToppingId = "7".parse().unwrap();
/// assert_eq!(id.as_i32(), 7);
/// assert_eq!(serde_json::to_string(&id).unwrap(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw key value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw key value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(MenuItemId);
define_id!(FranchiseId);
define_id!(StoreId);
define_id!(OrderId);
define_id!(OrderItemId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_path_segment() {
        assert_eq!("42".parse::<UserId>().unwrap(), UserId::new(42));
        assert_eq!(" 3 ".parse::<StoreId>().unwrap(), StoreId::new(3));
        assert!("abc".parse::<FranchiseId>().is_err());
    }

    #[test]
    fn test_serde_is_bare_number() {
        let id = OrderId::new(5);
        assert_eq!(serde_json::to_string(&id).unwrap(), "5");
        assert_eq!(serde_json::from_str::<OrderId>("5").unwrap(), id);
    }

    #[test]
    fn test_ordering() {
        let mut ids = vec![MenuItemId::new(3), MenuItemId::new(1), MenuItemId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![MenuItemId::new(1), MenuItemId::new(2), MenuItemId::new(3)]);
    }
}
