//! `LanguagePlugin` (spec.md §4.2-4.3), grounded on
//! `codegraph-ir::features::parsing::ports::language_plugin`. One trait
//! covers both the tree-sitter-backed languages (Python, TypeScript,
//! JavaScript, Java) and the stub-level ones (Go, C++).

use crate::cst::{parse_edit, Cst, Edit};
use crate::error::ParseError;
use crate::lowering;
use crate::stub;
use crate::syntax::{self, LanguageSyntax};
use scalpel_core::uir::UirTree;
use scalpel_core::Language;
use tree_sitter::Parser;

/// The parsed representation handed between `parse`/`lower`/`parse_edit`.
/// Stub-level languages skip tree-sitter entirely (spec.md §1).
pub enum ParsedUnit {
    TreeSitter(Cst),
    Stub { source: Vec<u8> },
}

impl ParsedUnit {
    pub fn source(&self) -> &[u8] {
        match self {
            ParsedUnit::TreeSitter(cst) => &cst.source,
            ParsedUnit::Stub { source } => source,
        }
    }

    pub fn has_errors(&self) -> bool {
        match self {
            ParsedUnit::TreeSitter(cst) => cst.has_errors(),
            ParsedUnit::Stub { .. } => false,
        }
    }
}

pub trait LanguagePlugin: Send + Sync {
    fn language(&self) -> Language;
    fn parse(&self, source: &[u8]) -> Result<ParsedUnit, ParseError>;
    fn lower(&self, unit: &ParsedUnit, module_path: &str) -> UirTree;
    fn parse_edit(&self, unit: &ParsedUnit, edit: &Edit) -> Result<ParsedUnit, ParseError>;
}

/// Construct a fresh `tree_sitter::Parser` configured for `language`.
/// Returns `Err(UnsupportedLanguage)` for stub-level languages, which
/// never touch tree-sitter.
pub fn parser_for(language: Language) -> Result<Parser, ParseError> {
    let ts_language = match language {
        Language::Python => tree_sitter_python::language(),
        Language::TypeScript => tree_sitter_typescript::language_typescript(),
        Language::JavaScript => tree_sitter_typescript::language_tsx(),
        Language::Java => tree_sitter_java::language(),
        Language::Go | Language::Cpp => {
            return Err(ParseError::UnsupportedLanguage(language.as_str().to_string()))
        }
    };
    let mut parser = Parser::new();
    parser
        .set_language(&ts_language)
        .map_err(|_| ParseError::ParserFailure(language.as_str().to_string()))?;
    Ok(parser)
}

fn syntax_for(language: Language) -> &'static LanguageSyntax {
    match language {
        Language::Python => &syntax::PYTHON,
        Language::TypeScript | Language::JavaScript => &syntax::TYPESCRIPT,
        Language::Java => &syntax::JAVA,
        Language::Go | Language::Cpp => unreachable!("stub-level languages never call syntax_for"),
    }
}

pub struct TreeSitterPlugin {
    language: Language,
}

impl TreeSitterPlugin {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl LanguagePlugin for TreeSitterPlugin {
    fn language(&self) -> Language {
        self.language
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedUnit, ParseError> {
        let mut parser = parser_for(self.language)?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParserFailure(self.language.as_str().to_string()))?;
        Ok(ParsedUnit::TreeSitter(Cst {
            language: self.language,
            source: source.to_vec(),
            tree,
        }))
    }

    fn lower(&self, unit: &ParsedUnit, module_path: &str) -> UirTree {
        match unit {
            ParsedUnit::TreeSitter(cst) => {
                lowering::lower(cst, syntax_for(self.language), self.language, module_path)
            }
            ParsedUnit::Stub { .. } => UirTree::new(),
        }
    }

    fn parse_edit(&self, unit: &ParsedUnit, edit: &Edit) -> Result<ParsedUnit, ParseError> {
        match unit {
            ParsedUnit::TreeSitter(cst) => {
                let mut parser = parser_for(self.language)?;
                let new_cst = parse_edit(cst, edit, &mut parser)?;
                Ok(ParsedUnit::TreeSitter(new_cst))
            }
            ParsedUnit::Stub { .. } => Err(ParseError::ParserFailure(self.language.as_str().to_string())),
        }
    }
}

pub struct StubPlugin {
    language: Language,
}

impl StubPlugin {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl LanguagePlugin for StubPlugin {
    fn language(&self) -> Language {
        self.language
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedUnit, ParseError> {
        Ok(ParsedUnit::Stub {
            source: source.to_vec(),
        })
    }

    fn lower(&self, unit: &ParsedUnit, module_path: &str) -> UirTree {
        stub::lower_stub(unit.source(), self.language, module_path)
    }

    fn parse_edit(&self, _unit: &ParsedUnit, edit: &Edit) -> Result<ParsedUnit, ParseError> {
        // Stub-level languages only scan top-level declarations, so a
        // full re-scan of the new source is already sub-millisecond on
        // the files this path is meant for; no incremental state to
        // thread through.
        self.parse(&edit.new_source)
    }
}

/// Build the plugin for a language, choosing the tree-sitter-backed
/// implementation where a grammar is registered and the stub
/// implementation otherwise (spec.md §1).
pub fn plugin_for(language: Language) -> Box<dyn LanguagePlugin> {
    if language.is_stub_level() {
        Box::new(StubPlugin::new(language))
    } else {
        Box::new(TreeSitterPlugin::new(language))
    }
}
