use crate::utils::error::ConfigError;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<(), ConfigError> {
    if url_str.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigError::InvalidValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// CORS 來源：`*` 或 http(s) 的 origin（不可帶路徑）
pub fn validate_origin(field_name: &str, origin: &str) -> Result<(), ConfigError> {
    if origin == "*" {
        return Ok(());
    }

    validate_url(field_name, origin)?;

    let invalid = |reason: &str| ConfigError::InvalidValue {
        field: field_name.to_string(),
        value: origin.to_string(),
        reason: reason.to_string(),
    };

    if origin.ends_with('/') {
        return Err(invalid("Origin must not end with a slash"));
    }

    // 瀏覽器送出的 Origin 只有 scheme://host[:port]
    let url = Url::parse(origin).map_err(|e| invalid(&e.to_string()))?;
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("Origin must not contain a path, query or fragment"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("Origin must not contain credentials"));
    }

    Ok(())
}

pub fn validate_positive_number(
    field_name: &str,
    value: usize,
    min_value: usize,
) -> Result<(), ConfigError> {
    if value < min_value {
        return Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(
    field_name: &str,
    value: &'a Option<T>,
) -> Result<&'a T, ConfigError> {
    value.as_ref().ok_or_else(|| ConfigError::Missing {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
