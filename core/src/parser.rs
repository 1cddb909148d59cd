#![deny(missing_docs)]

//! # Parser Module
//!
//! Scans handler source code with the rust-analyzer syntax library. Extracts
//! structs (fields, docs, serde renames) and the request/response types of
//! handler signatures for the source-scan resource generator.

use crate::error::{AppError, AppResult};
use ra_ap_edition::Edition;
use ra_ap_syntax::ast::{self, HasGenericArgs, HasName, HasVisibility};
use ra_ap_syntax::{AstNode, SourceFile, SyntaxKind, SyntaxNode};
use regex::Regex;
use std::sync::OnceLock;

/// Represents a field extracted from a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedField {
    /// The name of the field.
    pub name: String,
    /// The raw Rust type string.
    pub ty: String,
    /// Extracted doc comments (if any).
    pub description: Option<String>,
    /// The name override from `#[serde(rename = "...")]`.
    pub rename: Option<String>,
    /// Whether the field is skipped in serialization.
    pub is_skipped: bool,
    /// Whether the type is `Option<..>`.
    pub is_optional: bool,
}

impl ParsedField {
    /// The key the field appears under in JSON.
    pub fn json_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

/// Represents a fully parsed struct including field and doc metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStruct {
    /// The struct name.
    pub name: String,
    /// The struct-level description from doc comments.
    pub description: Option<String>,
    /// The struct name override.
    pub rename: Option<String>,
    /// The list of fields.
    pub fields: Vec<ParsedField>,
}

/// Request and response types matched in a handler signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedSignature {
    /// The handler function name.
    pub handler: String,
    /// `T` of a `Json<T>` parameter.
    pub body: Option<String>,
    /// `T` of a `Query<T>` parameter.
    pub query: Option<String>,
    /// `T` of a `Json<T>` or `Result<Json<T>, E>` return type.
    pub response: Option<String>,
}

#[derive(Default)]
struct AttrInfo {
    rename: Option<String>,
    is_skipped: bool,
}

fn parse_source(code: &str) -> SourceFile {
    SourceFile::parse(code, Edition::Edition2021).tree()
}

/// Extracts the names of all structs defined in the provided Rust source code.
pub fn extract_struct_names(code: &str) -> Vec<String> {
    parse_source(code)
        .syntax()
        .descendants()
        .filter_map(ast::Struct::cast)
        .filter_map(|s| s.name().map(|n| n.text().to_string()))
        .collect()
}

/// Names of the `pub` functions in the source, in order.
pub fn extract_public_fns(code: &str) -> Vec<String> {
    parse_source(code)
        .syntax()
        .descendants()
        .filter_map(ast::Fn::cast)
        .filter(|f| f.visibility().is_some())
        .filter_map(|f| f.name().map(|n| n.text().to_string()))
        .collect()
}

/// Extracts a struct definition including documentation and serde attributes.
///
/// # Examples
/// ```
/// use swagbind_core::parser::extract_struct;
///
/// let code = r#"
///     struct EconModel {
///         #[serde(rename = "modelId")]
///         id: String,
///         notes: Option<String>,
///     }
/// "#;
/// let info = extract_struct(code, "EconModel").unwrap();
/// assert_eq!(info.fields[0].json_name(), "modelId");
/// assert!(info.fields[1].is_optional);
/// ```
pub fn extract_struct(code: &str, struct_name: &str) -> AppResult<ParsedStruct> {
    let file = parse_source(code);

    let struct_def = file
        .syntax()
        .descendants()
        .find_map(|node| {
            ast::Struct::cast(node).filter(|s| s.name().is_some_and(|n| n.text() == struct_name))
        })
        .ok_or_else(|| AppError::Scan(format!("Struct '{}' not found", struct_name)))?;

    let struct_attrs = extract_attributes(struct_def.syntax());
    let mut fields = Vec::new();

    if let Some(ast::FieldList::RecordFieldList(list)) = struct_def.field_list() {
        for field in list.fields() {
            if let (Some(name), Some(ty)) = (field.name(), field.ty()) {
                let attrs = extract_attributes(field.syntax());
                fields.push(ParsedField {
                    name: name.text().to_string(),
                    is_optional: wrapper_arg(&ty, "Option").is_some(),
                    ty: ty.syntax().text().to_string(),
                    description: extract_doc_comment(field.syntax()),
                    rename: attrs.rename,
                    is_skipped: attrs.is_skipped,
                });
            }
        }
    }

    Ok(ParsedStruct {
        name: struct_name.to_string(),
        description: extract_doc_comment(struct_def.syntax()),
        rename: struct_attrs.rename,
        fields,
    })
}

/// Matches the parameter and return types of handler `fn_name`.
///
/// Returns `Ok(None)` when the signature uses syntax the scanner does not
/// understand (e.g. `impl Trait` in argument or return position), and
/// `Ok(Some(..))` with empty parts for a plain `fn handler() {}`.
pub fn extract_handler_signature(
    code: &str,
    fn_name: &str,
) -> AppResult<Option<ExtractedSignature>> {
    let file = parse_source(code);
    let fn_def = file
        .syntax()
        .descendants()
        .find_map(|node| {
            ast::Fn::cast(node).filter(|f| f.name().is_some_and(|n| n.text() == fn_name))
        })
        .ok_or_else(|| AppError::Scan(format!("Handler '{}' not found", fn_name)))?;

    let mut signature = ExtractedSignature {
        handler: fn_name.to_string(),
        ..ExtractedSignature::default()
    };

    if let Some(params) = fn_def.param_list() {
        for param in params.params() {
            let Some(ty) = param.ty() else {
                continue;
            };
            if !matches!(ty, ast::Type::PathType(_)) {
                return Ok(None);
            }
            if let Some(inner) = wrapper_arg(&ty, "Json") {
                signature.body = Some(type_text(&inner));
            } else if let Some(inner) = wrapper_arg(&ty, "Query") {
                signature.query = Some(type_text(&inner));
            }
        }
    }

    if let Some(ret) = fn_def.ret_type().and_then(|r| r.ty()) {
        if !matches!(ret, ast::Type::PathType(_)) {
            return Ok(None);
        }
        let json = wrapper_arg(&ret, "Result")
            .and_then(|ok| wrapper_arg(&ok, "Json"))
            .or_else(|| wrapper_arg(&ret, "Json"));
        signature.response = json.map(|inner| type_text(&inner));
    }

    Ok(Some(signature))
}

/// First generic type argument of `ty` when its last path segment is `wrapper`.
fn wrapper_arg(ty: &ast::Type, wrapper: &str) -> Option<ast::Type> {
    let ast::Type::PathType(path_type) = ty else {
        return None;
    };
    let segment = path_type.path()?.segment()?;
    if segment.name_ref()?.text() != wrapper {
        return None;
    }
    segment
        .generic_arg_list()?
        .generic_args()
        .find_map(|arg| match arg {
            ast::GenericArg::TypeArg(t) => t.ty(),
            _ => None,
        })
}

fn type_text(ty: &ast::Type) -> String {
    ty.syntax().text().to_string()
}

/// Helper to extract `///` comments from a syntax node's trivia children.
fn extract_doc_comment(node: &SyntaxNode) -> Option<String> {
    let lines: Vec<String> = node
        .children_with_tokens()
        .filter(|child| child.kind() == SyntaxKind::COMMENT)
        .filter_map(|child| {
            let text = child.to_string();
            text.strip_prefix("///")
                .map(|content| content.strip_prefix(' ').unwrap_or(content).to_string())
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n").trim().to_string())
    }
}

/// Reads `rename` / `skip` out of `#[serde(...)]` attributes.
fn extract_attributes(node: &SyntaxNode) -> AttrInfo {
    let mut info = AttrInfo::default();

    for attr in node.children().filter_map(ast::Attr::cast) {
        let Some(meta) = attr.meta() else {
            continue;
        };
        if meta.path().is_some_and(|p| p.to_string() == "serde") {
            if let Some(tt) = meta.token_tree() {
                parse_attribute_content(&tt.to_string(), &mut info);
            }
        }
    }

    info
}

fn parse_attribute_content(content: &str, info: &mut AttrInfo) {
    static RENAME_RE: OnceLock<Regex> = OnceLock::new();
    let rename_re =
        RENAME_RE.get_or_init(|| Regex::new(r#"rename\s*=\s*"([^"]+)""#).expect("Invalid regex"));

    static SKIP_RE: OnceLock<Regex> = OnceLock::new();
    let skip_re = SKIP_RE.get_or_init(|| Regex::new(r#"\bskip\b"#).expect("Invalid regex"));

    if let Some(val) = rename_re.captures(content).and_then(|caps| caps.get(1)) {
        info.rename = Some(val.as_str().to_string());
    }
    if skip_re.is_match(content) {
        info.is_skipped = true;
    }
}
