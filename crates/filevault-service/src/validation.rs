//! Input checks shared by the services.

use filevault_core::error::AppError;

/// Longest accepted folder, file or category name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Trim a user-supplied name and check it is present and not too long.
pub fn normalize_name(kind: &str, raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::validation(format!("{kind} name is required")));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "{kind} name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filevault_core::error::ErrorKind;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Folder", "  Photos ").unwrap(), "Photos");

        let err = normalize_name("Folder", "   ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        assert!(normalize_name("Folder", &"a".repeat(255)).is_ok());
        assert!(normalize_name("Folder", &"a".repeat(256)).is_err());
        assert!(normalize_name("Folder", &"é".repeat(255)).is_ok());
    }
}
