use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use mongodb::bson::Bson;
use serde::{de::Error, Deserialize, Serialize};
use uuid::Uuid;

/// Marks a type as owning a family of prefixed identifiers, e.g. `CPN-<uuid>`.
pub trait IdTag {
    const TAG: &'static str;
}

pub struct TypedId<T: IdTag>(Uuid, PhantomData<fn() -> T>);

impl<T: IdTag> TypedId<T> {
    pub fn new() -> TypedId<T> {
        TypedId(Uuid::new_v4(), PhantomData)
    }
}

impl<T: IdTag> Copy for TypedId<T> {}

impl<T: IdTag> Clone for TypedId<T> {
    fn clone(&self) -> TypedId<T> {
        *self
    }
}

impl<T: IdTag> PartialEq for TypedId<T> {
    fn eq(&self, other: &TypedId<T>) -> bool {
        self.0 == other.0
    }
}

impl<T: IdTag> Eq for TypedId<T> {}

impl<T: IdTag> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T: IdTag> Display for TypedId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}-{:X}", T::TAG, self.0)
    }
}

impl<T: IdTag> Debug for TypedId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl<T: IdTag> FromStr for TypedId<T> {
    type Err = TypedIdParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, id) = s
            .split_once('-')
            .ok_or(TypedIdParseError::InvalidFormat)?;

        if tag != T::TAG {
            return Err(TypedIdParseError::InvalidTag);
        }

        let uuid = Uuid::from_str(id).map_err(|_| TypedIdParseError::InvalidUuid)?;

        Ok(TypedId(uuid, PhantomData))
    }
}

impl<T: IdTag> Serialize for TypedId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de, T: IdTag> Deserialize<'de> for TypedId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TypedId::from_str(&s).map_err(D::Error::custom)
    }
}

impl<T: IdTag> From<TypedId<T>> for Bson {
    fn from(id: TypedId<T>) -> Bson {
        Bson::String(id.to_string())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypedIdParseError {
    InvalidFormat,
    InvalidTag,
    InvalidUuid,
}

impl Display for TypedIdParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Debug::fmt(self, f)
    }
}

impl std::error::Error for TypedIdParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    impl IdTag for Widget {
        const TAG: &'static str = "WDG";
    }

    type WidgetId = TypedId<Widget>;

    #[test]
    fn parses_its_own_display() {
        let id = WidgetId::new();

        let parsed: WidgetId = id.to_string().parse().unwrap();

        assert_eq!(parsed, id);
        assert!(id.to_string().starts_with("WDG-"));
    }

    #[test]
    fn rejects_foreign_tags_and_garbage() {
        assert_eq!(
            "CPN-16E77539-8873-4C8A-BCA3-2036010474AD".parse::<WidgetId>(),
            Err(TypedIdParseError::InvalidTag)
        );
        assert_eq!(
            "WDG-not-a-uuid".parse::<WidgetId>(),
            Err(TypedIdParseError::InvalidUuid)
        );
        assert_eq!(
            "16E77539".parse::<WidgetId>(),
            Err(TypedIdParseError::InvalidFormat)
        );
    }
}
