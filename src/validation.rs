//! Input validation for shop commands and user identifiers.

/// Longest accepted item name, in characters.
pub const MAX_ITEM_NAME: usize = 50;
/// Longest accepted item description, in characters.
pub const MAX_DESCRIPTION: usize = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Item name cannot be empty")]
    EmptyName,

    #[error("Item name is too long (maximum {max} characters)")]
    NameTooLong { max: usize },

    #[error("Price must be a positive whole number, got '{0}'")]
    InvalidPrice(String),

    #[error("Description cannot be empty")]
    EmptyDescription,

    #[error("Description is too long (maximum {max} characters)")]
    DescriptionTooLong { max: usize },
}

/// Normalize a user name to the id chat servers key users by: lowercase
/// ASCII letters and digits only.
pub fn to_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Trim and check an item name. Case is preserved; names are case-sensitive keys.
pub fn validate_item_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_ITEM_NAME {
        return Err(ValidationError::NameTooLong { max: MAX_ITEM_NAME });
    }
    Ok(name.to_string())
}

/// Parse a price: a whole number greater than zero.
pub fn parse_price(raw: &str) -> Result<u64, ValidationError> {
    let raw = raw.trim();
    match raw.parse::<u64>() {
        Ok(price) if price > 0 => Ok(price),
        _ => Err(ValidationError::InvalidPrice(raw.to_string())),
    }
}

pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if description.chars().count() > MAX_DESCRIPTION {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION,
        });
    }
    Ok(description.to_string())
}
