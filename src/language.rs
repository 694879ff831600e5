use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// A language tag handled by the extraction core.
///
/// Uses a plain enum (not trait objects) to avoid `dyn` overhead at dispatch
/// boundaries. Cheap to copy; serializes to the stable lowercase tag the
/// graph layer keys on (`"typescript"`, `"cpp"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    Python,
    Java,
    Go,
    Rust,
    C,
    Cpp,
    Ruby,
}

impl Language {
    /// Map a file extension to its language tag. Comparison is
    /// case-insensitive; the table is exhaustive.
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext.to_ascii_lowercase().as_str() {
            "ts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            "js" | "mjs" | "cjs" => Some(Language::JavaScript),
            "jsx" => Some(Language::Jsx),
            "py" => Some(Language::Python),
            "java" => Some(Language::Java),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" => Some(Language::Cpp),
            "rb" => Some(Language::Ruby),
            _ => None,
        }
    }

    /// Map a logical path to its language tag via the final extension.
    pub fn from_path(path: &str) -> Option<Language> {
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            // Dotfiles like ".bashrc" have no extension in our sense.
            return None;
        }
        Language::from_extension(ext)
    }

    /// The stable lowercase tag, identical to the serde representation.
    pub fn name(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Jsx => "jsx",
            Language::Python => "python",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Ruby => "ruby",
        }
    }

    /// Whether this tag belongs to the TypeScript/JavaScript family — the
    /// only family with explicit export statements.
    pub fn is_ts_js(&self) -> bool {
        matches!(
            self,
            Language::TypeScript | Language::Tsx | Language::JavaScript | Language::Jsx
        )
    }

    /// The tree-sitter grammar for this language, loaded lazily once per
    /// process and shared across threads thereafter.
    ///
    /// # Grammar selection rules
    /// - `.ts`  -> TypeScript grammar (`LANGUAGE_TYPESCRIPT`)
    /// - `.tsx` -> TSX grammar        (`LANGUAGE_TSX`)
    ///   These MUST be different: the TypeScript grammar cannot parse JSX,
    ///   and the TSX grammar breaks angle-bracket type assertions
    ///   (`<T>expr`). Mixing them causes parse errors.
    /// - `.js`/`.jsx`/`.mjs`/`.cjs` -> JavaScript grammar (`LANGUAGE`)
    pub fn grammar(&self) -> &'static tree_sitter::Language {
        static TS: OnceLock<tree_sitter::Language> = OnceLock::new();
        static TSX: OnceLock<tree_sitter::Language> = OnceLock::new();
        static JS: OnceLock<tree_sitter::Language> = OnceLock::new();
        static PY: OnceLock<tree_sitter::Language> = OnceLock::new();
        static JAVA: OnceLock<tree_sitter::Language> = OnceLock::new();
        static GO: OnceLock<tree_sitter::Language> = OnceLock::new();
        static RS: OnceLock<tree_sitter::Language> = OnceLock::new();
        static C: OnceLock<tree_sitter::Language> = OnceLock::new();
        static CPP: OnceLock<tree_sitter::Language> = OnceLock::new();
        static RB: OnceLock<tree_sitter::Language> = OnceLock::new();

        match self {
            Language::TypeScript => TS.get_or_init(|| {
                tracing::debug!(language = "typescript", "loading grammar");
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
            }),
            Language::Tsx => TSX.get_or_init(|| {
                tracing::debug!(language = "tsx", "loading grammar");
                tree_sitter_typescript::LANGUAGE_TSX.into()
            }),
            Language::JavaScript | Language::Jsx => JS.get_or_init(|| {
                tracing::debug!(language = "javascript", "loading grammar");
                tree_sitter_javascript::LANGUAGE.into()
            }),
            Language::Python => PY.get_or_init(|| {
                tracing::debug!(language = "python", "loading grammar");
                tree_sitter_python::LANGUAGE.into()
            }),
            Language::Java => JAVA.get_or_init(|| {
                tracing::debug!(language = "java", "loading grammar");
                tree_sitter_java::LANGUAGE.into()
            }),
            Language::Go => GO.get_or_init(|| {
                tracing::debug!(language = "go", "loading grammar");
                tree_sitter_go::LANGUAGE.into()
            }),
            Language::Rust => RS.get_or_init(|| {
                tracing::debug!(language = "rust", "loading grammar");
                tree_sitter_rust::LANGUAGE.into()
            }),
            Language::C => C.get_or_init(|| {
                tracing::debug!(language = "c", "loading grammar");
                tree_sitter_c::LANGUAGE.into()
            }),
            Language::Cpp => CPP.get_or_init(|| {
                tracing::debug!(language = "cpp", "loading grammar");
                tree_sitter_cpp::LANGUAGE.into()
            }),
            Language::Ruby => RB.get_or_init(|| {
                tracing::debug!(language = "ruby", "loading grammar");
                tree_sitter_ruby::LANGUAGE.into()
            }),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
