use std::fmt::{Debug, Display};
use std::io::Error as IoError;

use mongodb::bson::de::Error as BsonDeError;
use mongodb::bson::document::ValueAccessError;
use mongodb::bson::ser::Error as BsonError;
use mongodb::error::Error as DatabaseError;

use crate::campaign_type::CampaignTypeId;
use crate::field_layout::FieldLayoutId;

#[derive(Debug, Derivative)]
#[derivative(PartialEq)]
pub enum Error {
    // 400
    InvalidConfiguration {
        key: String,
        value: String,
    },

    // 404
    CampaignTypeNotFound {
        campaign_type_id: CampaignTypeId,
    },
    FieldLayoutNotFound {
        field_layout_id: FieldLayoutId,
    },

    // 409
    HandleAlreadyExists {
        handle: String,
    },

    // 500
    ExistentialState(String),
    FailedDatabaseCall(#[derivative(PartialEq = "ignore")] DatabaseError),
    FailedToSerializeToBson(#[derivative(PartialEq = "ignore")] BsonError),
    FailedToDeserializeBson(#[derivative(PartialEq = "ignore")] BsonDeError),
    IoError(#[derivative(PartialEq = "ignore")] IoError),
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidConfiguration { .. } => "E4001000",
            Error::CampaignTypeNotFound { .. } => "E4041000",
            Error::FieldLayoutNotFound { .. } => "E4041001",
            Error::HandleAlreadyExists { .. } => "E4091000",
            Error::ExistentialState(_) => "E5001000",
            Error::FailedDatabaseCall(_) => "E5001001",
            Error::FailedToSerializeToBson(_) => "E5001002",
            Error::FailedToDeserializeBson(_) => "E5001003",
            Error::IoError(_) => "E5001004",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Error::InvalidConfiguration { .. } => "A configuration value could not be parsed",
            Error::CampaignTypeNotFound { .. } => "The requested campaign type was not found",
            Error::FieldLayoutNotFound { .. } => "The requested field layout was not found",
            Error::HandleAlreadyExists { .. } => {
                "Another campaign type already uses the requested handle"
            }
            Error::ExistentialState(_) => "The server detected an invalid state",
            Error::FailedDatabaseCall(_) => {
                "An error occurred when communicating with the database"
            }
            Error::FailedToSerializeToBson(_) => {
                "An error occurred when serializing an object to bson"
            }
            Error::FailedToDeserializeBson(_) => {
                "An error occurred when deserializing an object from bson"
            }
            Error::IoError(_) => "An error occurred during an I/O operation",
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{} {}: ", self.error_code(), self.error_message())?;
        Debug::fmt(self, f)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Error {
        Error::FailedDatabaseCall(error)
    }
}

impl From<BsonError> for Error {
    fn from(error: BsonError) -> Error {
        Error::FailedToSerializeToBson(error)
    }
}

impl From<BsonDeError> for Error {
    fn from(error: BsonDeError) -> Error {
        Error::FailedToDeserializeBson(error)
    }
}

impl From<ValueAccessError> for Error {
    fn from(error: ValueAccessError) -> Error {
        Error::ExistentialState(format!("malformed document: {}", error))
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FailedDatabaseCall(err) => Some(err),
            Error::FailedToSerializeToBson(err) => Some(err),
            Error::FailedToDeserializeBson(err) => Some(err),
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_compare_by_variant_and_identifiers() {
        assert_eq!(
            Error::CampaignTypeNotFound {
                campaign_type_id: CampaignTypeId(7)
            },
            Error::CampaignTypeNotFound {
                campaign_type_id: CampaignTypeId(7)
            }
        );
        assert_ne!(
            Error::CampaignTypeNotFound {
                campaign_type_id: CampaignTypeId(7)
            },
            Error::CampaignTypeNotFound {
                campaign_type_id: CampaignTypeId(8)
            }
        );
    }

    #[test]
    fn display_includes_error_code() {
        let error = Error::HandleAlreadyExists {
            handle: "newsletter".to_string(),
        };

        let message = error.to_string();

        assert!(message.starts_with("E4091000"));
        assert!(message.contains("newsletter"));
    }
}
