//! Translation of any error into the client-facing wire shape.
//!
//! The mapper is total: every input yields a wire code from the standard or
//! custom band, a fixed non-empty message, and `data` that is either `None`
//! or non-empty. Internal context never crosses; only fields from the
//! [`SafeField`](super::SafeField) bag are copied.

use std::error::Error as StdError;

use serde::Serialize;
use serde_json::{Map, Value};

use super::codes::ErrorCode;
use super::domain::DomainError;

pub const AUTH_WIRE_CODE: i32 = -32010;
pub const RESOURCE_NOT_FOUND_WIRE_CODE: i32 = -32000;
pub const RESOURCE_INVALID_WIRE_CODE: i32 = -32003;
pub const RESOURCE_FORBIDDEN_WIRE_CODE: i32 = -32004;
pub const PROTOCOL_INVALID_WIRE_CODE: i32 = -32020;
pub const PROTOCOL_UNSUPPORTED_WIRE_CODE: i32 = -32021;

/// Message used for errors that are not domain errors.
pub const FOREIGN_ERROR_MESSAGE: &str = "An internal server error occurred.";

/// Minimal, wire-safe error triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl MappedError {
    /// Look up a key in `data`.
    pub fn data_value(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

struct WireMapping {
    code: ErrorCode,
    message: &'static str,
    expose_internal_code: bool,
}

impl WireMapping {
    const fn new(code: i32, message: &'static str) -> Self {
        Self {
            code: ErrorCode::new(code),
            message,
            expose_internal_code: false,
        }
    }

    const fn with_internal_code(mut self) -> Self {
        self.expose_internal_code = true;
        self
    }
}

fn wire_mapping(code: ErrorCode) -> WireMapping {
    match code {
        ErrorCode::PARSE_ERROR => WireMapping::new(
            code.as_i32(),
            "Parse error. The JSON received is not a valid JSON.",
        ),
        ErrorCode::INVALID_REQUEST => WireMapping::new(
            code.as_i32(),
            "Invalid Request. The JSON sent is not a valid Request object.",
        ),
        ErrorCode::METHOD_NOT_FOUND => WireMapping::new(
            code.as_i32(),
            "Method not found. The method does not exist / is not available.",
        ),
        ErrorCode::INVALID_PARAMS => WireMapping::new(
            code.as_i32(),
            "Invalid params. Invalid method parameter(s).",
        ),
        ErrorCode::INTERNAL_ERROR => WireMapping::new(
            code.as_i32(),
            "Internal error. Internal JSON-RPC error.",
        ),
        ErrorCode::SERVICE_NOT_FOUND => WireMapping::new(
            code.as_i32(),
            "Service unavailable. A required internal component or service was not found.",
        ),
        ErrorCode::REQUEST_SEQUENCE => WireMapping::new(
            code.as_i32(),
            "Invalid Request Sequence. The request is out of order or invalid for the current state.",
        ),
        ErrorCode::RESOURCE_NOT_FOUND => WireMapping::new(
            RESOURCE_NOT_FOUND_WIRE_CODE,
            "Resource not found. The requested resource does not exist.",
        ),
        ErrorCode::RESOURCE_INVALID => WireMapping::new(
            RESOURCE_INVALID_WIRE_CODE,
            "Invalid resource identifier or format.",
        ),
        ErrorCode::RESOURCE_FORBIDDEN => WireMapping::new(
            RESOURCE_FORBIDDEN_WIRE_CODE,
            "Access to the resource is forbidden.",
        ),
        // Shared message: the client learns nothing about which check failed.
        ErrorCode::AUTH_FAILURE
        | ErrorCode::AUTH_EXPIRED
        | ErrorCode::AUTH_INVALID
        | ErrorCode::AUTH_MISSING => {
            WireMapping::new(AUTH_WIRE_CODE, "Authentication required or failed.")
        }
        ErrorCode::PROTOCOL_INVALID => WireMapping::new(
            PROTOCOL_INVALID_WIRE_CODE,
            "Invalid Request (API Protocol Error).",
        )
        .with_internal_code(),
        ErrorCode::PROTOCOL_UNSUPPORTED => WireMapping::new(
            PROTOCOL_UNSUPPORTED_WIRE_CODE,
            "Unsupported Operation (API Protocol Error).",
        )
        .with_internal_code(),
        _ => WireMapping::new(
            ErrorCode::INTERNAL_ERROR.as_i32(),
            "An unspecified internal application error occurred.",
        )
        .with_internal_code(),
    }
}

/// Map an error of a concrete type.
///
/// Foreign errors report `std::any::type_name::<E>()` as `data.errorType`.
pub fn map_error<E>(err: &E) -> MappedError
where
    E: StdError + 'static,
{
    map_dyn_error(err, std::any::type_name::<E>())
}

fn map_dyn_error(err: &(dyn StdError + 'static), type_name: &str) -> MappedError {
    match DomainError::find(err) {
        Some(domain) => map_domain_error(domain),
        None => {
            let mut data = Map::new();
            data.insert("errorType".to_owned(), Value::from(type_name));
            data.insert("detail".to_owned(), Value::from(err.to_string()));
            MappedError {
                code: ErrorCode::INTERNAL_ERROR.as_i32(),
                message: FOREIGN_ERROR_MESSAGE.to_owned(),
                data: Some(data),
            }
        }
    }
}

fn map_domain_error(err: &DomainError) -> MappedError {
    let mapping = wire_mapping(err.code());

    let mut data = Map::new();
    data.insert("detail".to_owned(), Value::from(err.message()));
    if mapping.expose_internal_code {
        data.insert("internalCode".to_owned(), Value::from(err.code().as_i32()));
    }
    for (field, value) in err.context().safe() {
        data.entry(field.as_str()).or_insert_with(|| value.clone());
    }

    MappedError {
        code: mapping.code.as_i32(),
        message: mapping.message.to_owned(),
        data: if data.is_empty() { None } else { Some(data) },
    }
}

impl DomainError {
    /// Shorthand for [`map_error`] on a domain error.
    pub fn to_wire(&self) -> MappedError {
        map_domain_error(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorContext, SafeField};
    use serde_json::json;
    use std::fmt;
    use std::io;

    #[test]
    fn foreign_error_maps_to_internal() {
        let err = io::Error::other("boom");
        let mapped = map_error(&err);
        assert_eq!(mapped.code, -32603);
        assert_eq!(mapped.message, FOREIGN_ERROR_MESSAGE);
        assert_eq!(mapped.data_value("detail"), Some(&json!("boom")));
        assert_eq!(
            mapped.data_value("errorType"),
            Some(&json!("std::io::error::Error"))
        );
    }

    #[test]
    fn standard_codes_map_one_to_one_with_detail() {
        let err = DomainError::invalid_params("missing name", None, ErrorContext::new());
        let mapped = map_error(&err);
        assert_eq!(mapped.code, -32602);
        assert_eq!(mapped.message, "Invalid params. Invalid method parameter(s).");
        assert_eq!(mapped.data_value("detail"), Some(&json!("missing name")));
        assert!(mapped.data_value("internalCode").is_none());
    }

    #[test]
    fn auth_sub_kinds_share_code_and_message() {
        let expired = DomainError::auth(ErrorCode::AUTH_EXPIRED, "token expired", None, ErrorContext::new());
        let missing = DomainError::auth(ErrorCode::AUTH_MISSING, "no header", None, ErrorContext::new());
        let (a, b) = (map_error(&expired), map_error(&missing));
        assert_eq!(a.code, AUTH_WIRE_CODE);
        assert_eq!(a.code, b.code);
        assert_eq!(a.message, b.message);
    }

    #[test]
    fn resource_codes_use_custom_band() {
        let cases = [
            (ErrorCode::RESOURCE_NOT_FOUND, RESOURCE_NOT_FOUND_WIRE_CODE),
            (ErrorCode::RESOURCE_INVALID, RESOURCE_INVALID_WIRE_CODE),
            (ErrorCode::RESOURCE_FORBIDDEN, RESOURCE_FORBIDDEN_WIRE_CODE),
        ];
        for (code, wire) in cases {
            let err = DomainError::resource(code, "x", None, ErrorContext::new());
            assert_eq!(map_error(&err).code, wire);
        }
    }

    #[test]
    fn protocol_codes_carry_internal_code() {
        let err = DomainError::protocol(ErrorCode::PROTOCOL_UNSUPPORTED, "v3 frames", None, ErrorContext::new());
        let mapped = map_error(&err);
        assert_eq!(mapped.code, PROTOCOL_UNSUPPORTED_WIRE_CODE);
        assert_eq!(mapped.data_value("internalCode"), Some(&json!(4001)));
    }

    #[test]
    fn unrecognized_category_code_falls_back_to_internal() {
        let err = DomainError::auth(ErrorCode::new(1500), "odd", None, ErrorContext::new());
        let mapped = map_error(&err);
        assert_eq!(mapped.code, ErrorCode::INTERNAL_ERROR.as_i32());
        assert_eq!(mapped.data_value("internalCode"), Some(&json!(1500)));
        assert_eq!(mapped.data_value("detail"), Some(&json!("odd")));
    }

    #[test]
    fn only_safe_context_reaches_the_wire() {
        let context = ErrorContext::new()
            .with("db_password", "hunter2")
            .with("uri", "/internal/only")
            .with_safe(SafeField::ParameterName, "name")
            .with_safe(SafeField::Method, "GET");
        let err = DomainError::invalid_params("missing", None, context);
        let data = map_error(&err).data.expect("data");

        assert!(!data.contains_key("db_password"));
        assert!(!data.contains_key("uri"));
        assert_eq!(data.get("parameter_name"), Some(&json!("name")));
        assert_eq!(data.get("method"), Some(&json!("GET")));
    }

    #[test]
    fn doubly_wrapped_domain_error_is_found() {
        #[derive(Debug)]
        struct Layer(Box<dyn StdError + Send + Sync>);
        impl fmt::Display for Layer {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "layer: {}", self.0)
            }
        }
        impl StdError for Layer {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(self.0.as_ref())
            }
        }

        let domain = DomainError::resource(ErrorCode::RESOURCE_FORBIDDEN, "nope", None, ErrorContext::new());
        let wrapped = Layer(Box::new(Layer(Box::new(domain))));
        let mapped = map_error(&wrapped);
        assert_eq!(mapped.code, RESOURCE_FORBIDDEN_WIRE_CODE);
        assert_eq!(mapped.data_value("detail"), Some(&json!("nope")));
    }

    #[test]
    fn error_type_names_the_outer_concrete_type() {
        #[derive(Debug)]
        struct Wrapped(Box<dyn StdError + Send + Sync>);
        impl fmt::Display for Wrapped {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "wrapped: {}", self.0)
            }
        }
        impl StdError for Wrapped {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(self.0.as_ref())
            }
        }

        let mapped = map_error(&Wrapped(Box::new(io::Error::other("boom"))));
        assert_eq!(mapped.code, -32603);
        let error_type = mapped.data_value("errorType").and_then(Value::as_str).unwrap();
        assert!(!error_type.starts_with("dyn "), "{error_type}");
        assert!(error_type.ends_with("Wrapped"), "{error_type}");
        assert_eq!(mapped.data_value("detail"), Some(&json!("wrapped: boom")));

        let io_type = map_error(&io::Error::other("boom"))
            .data_value("errorType")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap();
        assert!(io_type.contains("io::error::Error"), "{io_type}");
    }

    #[test]
    fn serialized_shape_omits_absent_data() {
        let mapped = MappedError {
            code: -32603,
            message: "x".to_owned(),
            data: None,
        };
        assert_eq!(
            serde_json::to_value(&mapped).unwrap(),
            json!({"code": -32603, "message": "x"})
        );
    }
}
