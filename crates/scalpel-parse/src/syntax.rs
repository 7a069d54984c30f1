//! Per-language grammar node-kind tables, grounded on the teacher's
//! `features::parsing::infrastructure::tree_sitter::languages::python`
//! (`node_kinds` constant module + `is_definition`/`is_statement`
//! classifiers). One table per supported language feeds the single
//! shared lowering pass in `lowering.rs` instead of one bespoke
//! extractor module per language.

/// Grammar node-kind names for one language, as emitted by its
/// tree-sitter grammar.
#[derive(Debug, Clone, Copy)]
pub struct LanguageSyntax {
    pub module: &'static str,
    pub function_def: &'static [&'static str],
    pub class_def: &'static [&'static str],
    pub call: &'static [&'static str],
    pub identifier: &'static [&'static str],
    pub assignment: &'static [&'static str],
    pub if_stmt: &'static [&'static str],
    pub for_stmt: &'static [&'static str],
    pub while_stmt: &'static [&'static str],
    pub try_stmt: &'static [&'static str],
    pub except_clause: &'static [&'static str],
    pub return_stmt: &'static [&'static str],
    pub raise_stmt: &'static [&'static str],
    pub import_stmt: &'static [&'static str],
    pub block: &'static [&'static str],
    pub parameter: &'static [&'static str],
    pub binary_op: &'static [&'static str],
    pub comparison_op: &'static [&'static str],
    pub literal: &'static [&'static str],
    /// Field name used to find the callee expression within a call node.
    pub call_function_field: &'static str,
    /// Field name used to find the name of a function/class definition.
    pub name_field: &'static str,
}

pub const PYTHON: LanguageSyntax = LanguageSyntax {
    module: "module",
    function_def: &["function_definition"],
    class_def: &["class_definition"],
    call: &["call"],
    identifier: &["identifier"],
    assignment: &["assignment", "augmented_assignment"],
    if_stmt: &["if_statement"],
    for_stmt: &["for_statement"],
    while_stmt: &["while_statement"],
    try_stmt: &["try_statement"],
    except_clause: &["except_clause"],
    return_stmt: &["return_statement"],
    raise_stmt: &["raise_statement"],
    import_stmt: &["import_statement", "import_from_statement"],
    block: &["block"],
    parameter: &["parameter", "typed_parameter", "default_parameter"],
    binary_op: &["binary_operator"],
    comparison_op: &["comparison_operator"],
    literal: &["string", "integer", "float", "true", "false", "none"],
    call_function_field: "function",
    name_field: "name",
};

pub const TYPESCRIPT: LanguageSyntax = LanguageSyntax {
    module: "program",
    function_def: &["function_declaration", "method_definition", "arrow_function"],
    class_def: &["class_declaration"],
    call: &["call_expression"],
    identifier: &["identifier", "property_identifier", "shorthand_property_identifier"],
    assignment: &["assignment_expression", "variable_declarator"],
    if_stmt: &["if_statement"],
    for_stmt: &["for_statement", "for_in_statement"],
    while_stmt: &["while_statement"],
    try_stmt: &["try_statement"],
    except_clause: &["catch_clause"],
    return_stmt: &["return_statement"],
    raise_stmt: &["throw_statement"],
    import_stmt: &["import_statement"],
    block: &["statement_block"],
    parameter: &["required_parameter", "optional_parameter", "formal_parameters"],
    binary_op: &["binary_expression"],
    comparison_op: &["binary_expression"],
    literal: &["string", "number", "true", "false", "null", "template_string"],
    call_function_field: "function",
    name_field: "name",
};

pub const JAVA: LanguageSyntax = LanguageSyntax {
    module: "program",
    function_def: &["method_declaration", "constructor_declaration"],
    class_def: &["class_declaration", "interface_declaration"],
    call: &["method_invocation"],
    identifier: &["identifier"],
    assignment: &["assignment_expression", "variable_declarator"],
    if_stmt: &["if_statement"],
    for_stmt: &["for_statement", "enhanced_for_statement"],
    while_stmt: &["while_statement"],
    try_stmt: &["try_statement"],
    except_clause: &["catch_clause"],
    return_stmt: &["return_statement"],
    raise_stmt: &["throw_statement"],
    import_stmt: &["import_declaration"],
    block: &["block"],
    parameter: &["formal_parameter"],
    binary_op: &["binary_expression"],
    comparison_op: &["binary_expression"],
    literal: &["string_literal", "decimal_integer_literal", "true", "false", "null_literal"],
    call_function_field: "name",
    name_field: "name",
};
