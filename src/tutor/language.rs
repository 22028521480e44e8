//! Programming languages understood by the tutor
//!
//! The model reports detected languages as free text ("python", "C++",
//! "js", ...). `Language::normalize` maps those onto the fixed enum.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Python
    Python,
    /// JavaScript
    JavaScript,
    /// TypeScript
    TypeScript,
    /// Java
    Java,
    /// C
    C,
    /// C++
    Cpp,
    /// C#
    CSharp,
    /// Go
    Go,
    /// Rust
    Rust,
    /// Ruby
    Ruby,
    /// PHP
    Php,
    /// Swift
    Swift,
    /// Kotlin
    Kotlin,
    /// SQL
    Sql,
    /// HTML
    Html,
    /// CSS
    Css,
    /// Bash / POSIX shell
    Bash,
    /// Not specified or not recognised
    #[default]
    Unknown,
}

static ALIASES: Lazy<HashMap<&'static str, Language>> = Lazy::new(|| {
    use Language::*;
    let table: &[(&str, Language)] = &[
        ("python", Python),
        ("python3", Python),
        ("py", Python),
        ("javascript", JavaScript),
        ("js", JavaScript),
        ("node", JavaScript),
        ("nodejs", JavaScript),
        ("node.js", JavaScript),
        ("ecmascript", JavaScript),
        ("jsx", JavaScript),
        ("typescript", TypeScript),
        ("ts", TypeScript),
        ("tsx", TypeScript),
        ("java", Java),
        ("c", C),
        ("cpp", Cpp),
        ("c++", Cpp),
        ("cxx", Cpp),
        ("cc", Cpp),
        ("csharp", CSharp),
        ("c#", CSharp),
        ("cs", CSharp),
        ("dotnet", CSharp),
        ("go", Go),
        ("golang", Go),
        ("rust", Rust),
        ("rs", Rust),
        ("ruby", Ruby),
        ("rb", Ruby),
        ("php", Php),
        ("swift", Swift),
        ("kotlin", Kotlin),
        ("kt", Kotlin),
        ("sql", Sql),
        ("mysql", Sql),
        ("postgresql", Sql),
        ("sqlite", Sql),
        ("html", Html),
        ("html5", Html),
        ("css", Css),
        ("css3", Css),
        ("bash", Bash),
        ("sh", Bash),
        ("shell", Bash),
        ("zsh", Bash),
    ];
    table.iter().copied().collect()
});

impl Language {
    /// Map free text onto a language, case-insensitively.
    ///
    /// Unrecognised strings map to `Unknown`.
    pub fn normalize(raw: &str) -> Language {
        let key = raw.trim().to_lowercase();
        ALIASES.get(key.as_str()).copied().unwrap_or(Language::Unknown)
    }

    /// Whether a concrete language is known
    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }

    /// Human-readable name used in prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Java => "Java",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Ruby => "Ruby",
            Language::Php => "PHP",
            Language::Swift => "Swift",
            Language::Kotlin => "Kotlin",
            Language::Sql => "SQL",
            Language::Html => "HTML",
            Language::Css => "CSS",
            Language::Bash => "Bash",
            Language::Unknown => "unknown",
        }
    }

    /// Every concrete language (excludes `Unknown`)
    pub fn all_known() -> &'static [Language] {
        use Language::*;
        &[
            Python, JavaScript, TypeScript, Java, C, Cpp, CSharp, Go, Rust, Ruby, Php, Swift,
            Kotlin, Sql, Html, Css, Bash,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
