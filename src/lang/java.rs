//! Tree-sitter-java node-kind strings mapped onto [`Kind`](super::Kind).
//! Grammar kinds not listed here fall through to `Kind::Other` in
//! [`super::lookup`] and are treated as opaque leaves by the AST builder.

use super::Kind;
use phf::{Map, phf_map};

pub static KINDS: Map<&'static str, Kind> = phf_map! {
    "program"                       => Kind::Program,
    "package_declaration"          => Kind::PackageDecl,
    "import_declaration"           => Kind::ImportDecl,

    "class_declaration"            => Kind::ClassDecl,
    "interface_declaration"        => Kind::InterfaceDecl,
    "enum_declaration"             => Kind::EnumDecl,
    "annotation_type_declaration"  => Kind::InterfaceDecl,

    "field_declaration"            => Kind::FieldDecl,
    "method_declaration"           => Kind::MethodDecl,
    "constructor_declaration"      => Kind::ConstructorDecl,
    "static_initializer"           => Kind::Block,
    "formal_parameter"             => Kind::Param,
    "spread_parameter"             => Kind::Param,

    "block"                         => Kind::Block,

    "if_statement"                  => Kind::If,
    "while_statement"               => Kind::While,
    "do_statement"                  => Kind::DoWhile,
    "for_statement"                 => Kind::For,
    "enhanced_for_statement"        => Kind::ForEach,
    "switch_expression"             => Kind::Switch,
    "switch_statement"              => Kind::Switch,
    "switch_block_statement_group"  => Kind::SwitchGroup,
    "switch_rule"                   => Kind::SwitchGroup,

    "try_statement"                 => Kind::Try,
    "try_with_resources_statement"  => Kind::Try,
    "catch_clause"                  => Kind::Catch,
    "finally_clause"                => Kind::Finally,
    "resource"                      => Kind::Resource,
    "resource_specification"        => Kind::Resource,

    "return_statement"              => Kind::Return,
    "throw_statement"               => Kind::Throw,
    "break_statement"                => Kind::Break,
    "continue_statement"             => Kind::Continue,
    "labeled_statement"              => Kind::Labeled,
    "synchronized_statement"         => Kind::Sync,

    "local_variable_declaration"    => Kind::LocalVarDecl,
    "expression_statement"          => Kind::ExprStmt,

    "assignment_expression"         => Kind::Assignment,
    "binary_expression"             => Kind::BinaryExpr,
    "unary_expression"              => Kind::UnaryExpr,
    "update_expression"             => Kind::UpdateExpr,
    "cast_expression"               => Kind::CastExpr,
    "instanceof_expression"         => Kind::BinaryExpr,

    "method_invocation"             => Kind::MethodCall,
    "object_creation_expression"    => Kind::ObjectCreation,
    "field_access"                  => Kind::FieldAccess,
    "array_access"                  => Kind::ArrayAccess,
    "array_creation_expression"     => Kind::ArrayCreation,
    "array_initializer"             => Kind::ArrayInit,
    "ternary_expression"            => Kind::Ternary,
    "parenthesized_expression"      => Kind::Other,
    "lambda_expression"             => Kind::Other,
    "method_reference"              => Kind::Other,

    "decimal_integer_literal"       => Kind::Literal,
    "hex_integer_literal"           => Kind::Literal,
    "octal_integer_literal"         => Kind::Literal,
    "binary_integer_literal"        => Kind::Literal,
    "decimal_floating_point_literal" => Kind::Literal,
    "hex_floating_point_literal"    => Kind::Literal,
    "true"                          => Kind::Literal,
    "false"                         => Kind::Literal,
    "character_literal"             => Kind::Literal,
    "string_literal"                => Kind::Literal,
    "null_literal"                  => Kind::Literal,

    "identifier"                    => Kind::Identifier,
    "type_identifier"               => Kind::TypeNode,
    "scoped_type_identifier"        => Kind::TypeNode,
    "generic_type"                  => Kind::TypeNode,
    "array_type"                    => Kind::TypeNode,
    "integral_type"                 => Kind::TypeNode,
    "floating_point_type"           => Kind::TypeNode,
    "boolean_type"                  => Kind::TypeNode,
    "void_type"                     => Kind::TypeNode,

    "modifiers"                     => Kind::Modifiers,
    "marker_annotation"             => Kind::Annotation,
    "annotation"                    => Kind::Annotation,

    "line_comment"                  => Kind::Trivia,
    "block_comment"                 => Kind::Trivia,
    ";"                             => Kind::Trivia,
    ","                             => Kind::Trivia,
    "("                             => Kind::Trivia,
    ")"                             => Kind::Trivia,
    "{"                             => Kind::Trivia,
    "}"                             => Kind::Trivia,
};

#[test]
fn classifies_control_flow_kinds() {
    assert_eq!(super::lookup("if_statement"), Kind::If);
    assert_eq!(super::lookup("enhanced_for_statement"), Kind::ForEach);
}

#[test]
fn unknown_kind_falls_back_to_other() {
    assert_eq!(super::lookup("some_future_grammar_node"), Kind::Other);
}
