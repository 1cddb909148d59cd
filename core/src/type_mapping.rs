#![deny(missing_docs)]

//! # Type Mapping
//!
//! Converts Rust type strings found by the source scanner into Swagger 2.0
//! schemas. Handles primitives, collections (`Vec`, maps), well-known formats
//! and nullability (`Option`).

use crate::error::{AppError, AppResult};
use crate::oas::definitions::OBJECT_ID_PATTERN;
use crate::oas::models::Schema;
// Import HasGenericArgs to access .generic_arg_list() on PathSegments
use ra_ap_edition::Edition;
use ra_ap_syntax::ast::{self, HasGenericArgs};
use ra_ap_syntax::{AstNode, SourceFile};

/// A mapped schema plus whether the Rust type admitted `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedType {
    /// The schema of the value.
    pub schema: Schema,
    /// `Option<T>` at the outermost level.
    pub nullable: bool,
}

impl MappedType {
    fn plain(schema: Schema) -> Self {
        Self {
            schema,
            nullable: false,
        }
    }
}

/// Trait for converting Rust type strings to Swagger schemas.
pub trait TypeMapper {
    /// Maps a Rust type string (e.g. `Option<Vec<Uuid>>`).
    fn map(&self, rust_type: &str) -> AppResult<MappedType>;
}

/// The default mapper. User-defined names become definition references.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwaggerTypeMapper;

impl TypeMapper for SwaggerTypeMapper {
    fn map(&self, rust_type: &str) -> AppResult<MappedType> {
        // Parse the type inside a type alias to get a real syntax node.
        let code = format!("type _Wrapper = {};", rust_type);
        let parse = SourceFile::parse(&code, Edition::Edition2021);
        let file = parse.tree();

        let root_type = file
            .syntax()
            .descendants()
            .find_map(ast::TypeAlias::cast)
            .and_then(|alias| alias.ty())
            .ok_or_else(|| AppError::Scan(format!("Invalid type syntax: {}", rust_type)))?;

        map_ast_type(&root_type)
    }
}

fn map_ast_type(ty: &ast::Type) -> AppResult<MappedType> {
    match ty {
        ast::Type::PathType(path_type) => {
            let segment = path_type
                .path()
                .and_then(|p| p.segment())
                .ok_or_else(|| AppError::Scan("Empty type path".into()))?;
            let name_ref = segment
                .name_ref()
                .ok_or_else(|| AppError::Scan("No type name".into()))?;
            let name = name_ref.text();

            let schema = match name.as_str() {
                "String" | "str" | "char" => Schema::typed("string"),
                "bool" => Schema::typed("boolean"),
                "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => Schema::typed("integer"),
                "i64" | "i128" | "isize" | "u64" | "u128" | "usize" => formatted("integer", "int64"),
                "f32" => formatted("number", "float"),
                "f64" => formatted("number", "double"),
                "Uuid" => formatted("string", "uuid"),
                "NaiveDateTime" | "DateTime" => formatted("string", "date-time"),
                "NaiveDate" => formatted("string", "date"),
                "ObjectId" => {
                    let mut s = Schema::typed("string");
                    s.pattern = Some(OBJECT_ID_PATTERN.to_string());
                    s
                }
                "Value" => Schema::default(),

                "Option" => {
                    let inner = first_type_arg(&segment)?;
                    let mut mapped = map_ast_type(&inner)?;
                    mapped.nullable = true;
                    return Ok(mapped);
                }
                "Vec" | "HashSet" | "BTreeSet" | "IndexSet" => {
                    let inner = map_ast_type(&first_type_arg(&segment)?)?;
                    Schema::array_of(inner.schema)
                }
                "HashMap" | "BTreeMap" | "IndexMap" => {
                    let value_ty = segment
                        .generic_arg_list()
                        .and_then(|list| {
                            list.generic_args().nth(1).and_then(|arg| match arg {
                                ast::GenericArg::TypeArg(t) => t.ty(),
                                _ => None,
                            })
                        })
                        .ok_or_else(|| AppError::Scan("Map type missing value type".into()))?;
                    let values = map_ast_type(&value_ty)?;
                    let mut s = Schema::object();
                    s.extensions.insert(
                        "additionalProperties".to_string(),
                        serde_json::to_value(values.schema)?,
                    );
                    s
                }
                "Box" | "Arc" | "Rc" => return map_ast_type(&first_type_arg(&segment)?),

                other => Schema::reference_to(other),
            };
            Ok(MappedType::plain(schema))
        }
        ast::Type::RefType(ref_type) => {
            let inner = ref_type
                .ty()
                .ok_or_else(|| AppError::Scan("Invalid reference".into()))?;
            map_ast_type(&inner)
        }
        ast::Type::SliceType(slice) => {
            let inner = slice
                .ty()
                .ok_or_else(|| AppError::Scan("Invalid slice".into()))?;
            Ok(MappedType::plain(Schema::array_of(map_ast_type(&inner)?.schema)))
        }
        _ => Err(AppError::Scan(format!(
            "Unsupported type structure: {}",
            ty.syntax().text()
        ))),
    }
}

fn first_type_arg(segment: &ast::PathSegment) -> AppResult<ast::Type> {
    let generic_args = segment
        .generic_arg_list()
        .ok_or_else(|| AppError::Scan("Missing generic arguments for container type".into()))?;

    match generic_args.generic_args().next() {
        Some(ast::GenericArg::TypeArg(type_arg)) => type_arg
            .ty()
            .ok_or_else(|| AppError::Scan("Invalid generic type".into())),
        _ => Err(AppError::Scan("Unsupported generic argument".into())),
    }
}

fn formatted(schema_type: &str, format: &str) -> Schema {
    let mut schema = Schema::typed(schema_type);
    schema.format = Some(format.to_string());
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_mapping() {
        let mapper = SwaggerTypeMapper;
        let cases = vec![
            ("i32", "integer"),
            ("f32", "number"),
            ("bool", "boolean"),
            ("String", "string"),
            ("&str", "string"),
        ];
        for (input, expected) in cases {
            let res = mapper.map(input).expect(input);
            assert_eq!(res.schema.schema_type.as_deref(), Some(expected));
            assert!(!res.nullable);
        }
        assert_eq!(
            mapper.map("u64").unwrap().schema.format.as_deref(),
            Some("int64")
        );
    }

    #[test]
    fn test_options_nullable() {
        let res = SwaggerTypeMapper.map("Option<i32>").unwrap();
        assert!(res.nullable);
        assert_eq!(res.schema.schema_type.as_deref(), Some("integer"));
    }

    #[test]
    fn test_nested_complex() {
        let res = SwaggerTypeMapper.map("Option<Vec<Uuid>>").unwrap();
        assert!(res.nullable);
        let items = res.schema.items.expect("array items");
        assert_eq!(items.schema_type.as_deref(), Some("string"));
        assert_eq!(items.format.as_deref(), Some("uuid"));
    }

    #[test]
    fn test_user_types_are_references() {
        let res = SwaggerTypeMapper.map("Vec<EconModel>").unwrap();
        assert_eq!(
            serde_json::to_value(&res.schema).unwrap(),
            json!({"type": "array", "items": {"$ref": "#/definitions/EconModel"}})
        );
        let boxed = SwaggerTypeMapper.map("Box<Node>").unwrap();
        assert_eq!(boxed.schema.referenced_definition(), Some("Node"));
    }

    #[test]
    fn test_map_values() {
        let res = SwaggerTypeMapper.map("HashMap<String, f64>").unwrap();
        assert_eq!(
            serde_json::to_value(&res.schema).unwrap(),
            json!({"type": "object", "additionalProperties": {"type": "number", "format": "double"}})
        );
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            SwaggerTypeMapper.map("(i32, i32)"),
            Err(AppError::Scan(_))
        ));
    }
}
