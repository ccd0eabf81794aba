//! Claim signature parsing: turns a typed function-signature description
//! like `addClaim(uint256 topic, bytes data)` into a typed field list, so a
//! caller can shape claim data entry without guessing at types.
//!
//! Unsupported constructs are rejected explicitly; there is no silent
//! fallback to strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from [`parse_signature`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("malformed signature: {reason}")]
    Malformed { reason: String },

    #[error("unsupported parameter type: {ty}")]
    UnsupportedType { ty: String },

    #[error("duplicate parameter name: {name}")]
    DuplicateField { name: String },
}

/// Types a claim field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Uint,
    Int,
    Bool,
    Address,
    Bytes,
    Str,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uint => "uint",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Address => "address",
            Self::Bytes => "bytes",
            Self::Str => "string",
        };
        f.write_str(name)
    }
}

/// One parameter of a claim signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimField {
    pub name: String,
    pub ty: FieldType,
}

/// A parsed claim signature: function name plus its typed parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSignature {
    pub name: String,
    pub fields: Vec<ClaimField>,
}

/// Parse a function-signature description into a typed field list.
///
/// Accepts `name(type [param], …)`; parameter names are optional and default
/// to `arg0`, `arg1`, … in declaration order. Width suffixes on integer
/// types (`uint256`, `int64`) and on `bytes` (`bytes32`) are accepted;
/// arrays, tuples, and anything else are unsupported.
pub fn parse_signature(signature: &str) -> Result<ClaimSignature, SignatureError> {
    let signature = signature.trim();
    let open = signature.find('(').ok_or_else(|| malformed("missing '('"))?;
    if !signature.ends_with(')') {
        return Err(malformed("missing closing ')'"));
    }
    let name = signature[..open].trim();
    if name.is_empty() {
        return Err(malformed("missing function name"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        || name.starts_with(|c: char| c.is_ascii_digit())
    {
        return Err(malformed(format!("invalid function name: {}", name)));
    }

    let params = &signature[open + 1..signature.len() - 1];
    let mut fields: Vec<ClaimField> = Vec::new();
    if !params.trim().is_empty() {
        for (index, param) in params.split(',').enumerate() {
            let field = parse_param(param, index)?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(SignatureError::DuplicateField { name: field.name });
            }
            fields.push(field);
        }
    }

    Ok(ClaimSignature {
        name: name.to_string(),
        fields,
    })
}

fn parse_param(param: &str, index: usize) -> Result<ClaimField, SignatureError> {
    let mut parts = param.split_whitespace();
    let ty = parts
        .next()
        .ok_or_else(|| malformed(format!("empty parameter at position {}", index)))?;
    let name = parts.next();
    if parts.next().is_some() {
        return Err(malformed(format!("too many tokens in parameter: {}", param.trim())));
    }
    Ok(ClaimField {
        name: name
            .map(str::to_string)
            .unwrap_or_else(|| format!("arg{}", index)),
        ty: parse_type(ty)?,
    })
}

fn parse_type(ty: &str) -> Result<FieldType, SignatureError> {
    if ty.ends_with(']') {
        // Arrays would need a repeated entry UI; reject until one exists.
        return Err(SignatureError::UnsupportedType { ty: ty.to_string() });
    }
    match ty {
        "bool" => return Ok(FieldType::Bool),
        "address" => return Ok(FieldType::Address),
        "string" => return Ok(FieldType::Str),
        "bytes" => return Ok(FieldType::Bytes),
        _ => {}
    }
    if let Some(width) = ty.strip_prefix("uint") {
        return integer_width(ty, width).map(|_| FieldType::Uint);
    }
    if let Some(width) = ty.strip_prefix("int") {
        return integer_width(ty, width).map(|_| FieldType::Int);
    }
    if let Some(width) = ty.strip_prefix("bytes") {
        let bytes: u16 = width
            .parse()
            .map_err(|_| SignatureError::UnsupportedType { ty: ty.to_string() })?;
        if bytes == 0 || bytes > 32 {
            return Err(malformed(format!("invalid bytes width: {}", ty)));
        }
        return Ok(FieldType::Bytes);
    }
    Err(SignatureError::UnsupportedType { ty: ty.to_string() })
}

/// Empty width means the bare `uint`/`int` alias; otherwise it must be a
/// multiple of 8 in 8..=256.
fn integer_width(ty: &str, width: &str) -> Result<(), SignatureError> {
    if width.is_empty() {
        return Ok(());
    }
    let bits: u16 = width
        .parse()
        .map_err(|_| SignatureError::UnsupportedType { ty: ty.to_string() })?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(malformed(format!("invalid integer width: {}", ty)));
    }
    Ok(())
}

fn malformed(reason: impl Into<String>) -> SignatureError {
    SignatureError::Malformed {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_parameters() {
        let sig = parse_signature("addClaim(uint256 topic, bytes data)").unwrap();
        assert_eq!(sig.name, "addClaim");
        assert_eq!(
            sig.fields,
            vec![
                ClaimField {
                    name: "topic".into(),
                    ty: FieldType::Uint
                },
                ClaimField {
                    name: "data".into(),
                    ty: FieldType::Bytes
                },
            ]
        );
    }

    #[test]
    fn unnamed_parameters_get_positional_names() {
        let sig = parse_signature("claim(uint256,address,string)").unwrap();
        assert_eq!(
            sig.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["arg0", "arg1", "arg2"]
        );
        assert_eq!(sig.fields[1].ty, FieldType::Address);
    }

    #[test]
    fn empty_parameter_list_is_fine() {
        let sig = parse_signature("refresh()").unwrap();
        assert!(sig.fields.is_empty());
    }

    #[test]
    fn arrays_and_tuples_are_rejected_not_stringified() {
        assert_eq!(
            parse_signature("setIssuers(address[] issuers)"),
            Err(SignatureError::UnsupportedType {
                ty: "address[]".into()
            })
        );
        assert!(matches!(
            parse_signature("setPair((uint256,uint256) pair)"),
            Err(SignatureError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn invalid_widths_are_malformed() {
        assert!(matches!(
            parse_signature("f(uint7 x)"),
            Err(SignatureError::Malformed { .. })
        ));
        assert!(matches!(
            parse_signature("f(uint512 x)"),
            Err(SignatureError::Malformed { .. })
        ));
        assert!(matches!(
            parse_signature("f(bytes33 x)"),
            Err(SignatureError::Malformed { .. })
        ));
    }

    #[test]
    fn structural_errors_are_malformed() {
        assert!(matches!(
            parse_signature("addClaim"),
            Err(SignatureError::Malformed { .. })
        ));
        assert!(matches!(
            parse_signature("addClaim(uint256 topic"),
            Err(SignatureError::Malformed { .. })
        ));
        assert!(matches!(
            parse_signature("(uint256 topic)"),
            Err(SignatureError::Malformed { .. })
        ));
        assert!(matches!(
            parse_signature("f(uint256 a b)"),
            Err(SignatureError::Malformed { .. })
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert_eq!(
            parse_signature("f(uint256 a, bytes a)"),
            Err(SignatureError::DuplicateField { name: "a".into() })
        );
    }
}
