//! Utility functions for the movies ETL repository.

/// Validate an SQL identifier that is interpolated into queries.
///
/// Identifiers (such as the catalog schema name) must be non-empty and contain
/// only ASCII alphanumeric characters and underscores, and must not start with
/// a digit.
///
/// # Example
///
/// ```
/// use movies_etl_repository::validate_identifier;
///
/// assert!(validate_identifier("content").is_ok());
/// assert!(validate_identifier("content; DROP TABLE film_work").is_err());
/// ```
pub fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if identifier.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(format!("Identifier '{}' cannot start with a digit", identifier));
    }

    if !identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(format!(
            "Identifier '{}' contains invalid characters. Only alphanumeric characters and underscores are allowed",
            identifier
        ));
    }

    Ok(())
}
