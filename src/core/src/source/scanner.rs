//! Declaration scanner for namespace-declaring, class-based source files.
//!
//! This is a lexical scanner, not a parser: it recognizes the handful of
//! constructs needed to discover models and read permission enums
//! (`namespace`, `use` imports, `class`/`interface`/`trait`/`enum` headers and
//! enum `case` members) and ignores everything else.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Trait,
    Enum,
}

impl TypeKind {
    fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "trait" => Some(Self::Trait),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }
}

/// One `case` member of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumCaseDecl {
    pub name: String,
    /// Literal backing value, unquoted. `None` for pure cases.
    pub value: Option<String>,
}

/// A type declaration as written in the file; names are not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub is_abstract: bool,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    /// Backing type of an enum (`string`, `int`), if declared.
    pub backing: Option<String>,
    pub cases: Vec<EnumCaseDecl>,
}

/// Everything the scanner extracted from one file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub namespace: String,
    /// Import alias → fully-qualified name.
    pub imports: HashMap<String, String>,
    pub declarations: Vec<TypeDecl>,
}

impl SourceFile {
    /// The fully-qualified name a file is expected to declare: its namespace
    /// joined with its file stem.
    pub fn expected_type_name(&self, separator: &str) -> String {
        let stem = file_stem(&self.path);
        qualify(&self.namespace, &stem, separator)
    }
}

/// Join a namespace and a simple name.
pub fn qualify(namespace: &str, name: &str, separator: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", namespace, separator, name)
    }
}

/// File name without its extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compiled patterns for one namespace separator.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    separator: String,
    namespace_re: Regex,
    use_re: Regex,
    decl_re: Regex,
    case_re: Regex,
}

impl SourceScanner {
    /// Build a scanner for sources using `separator` between namespace segments.
    pub fn new(separator: &str) -> Result<Self> {
        let sep = regex::escape(separator);
        let qualified = format!(r"[A-Za-z0-9_{}]+", sep);
        let name_list = format!(r"[A-Za-z0-9_{},\s]+?", sep);

        Ok(Self {
            separator: separator.to_string(),
            namespace_re: Regex::new(&format!(r"namespace\s+({})\s*;", qualified))?,
            use_re: Regex::new(&format!(
                r"(?m)^\s*use\s+({})(?:\s+as\s+([A-Za-z_][A-Za-z0-9_]*))?\s*;",
                qualified
            ))?,
            decl_re: Regex::new(&format!(
                concat!(
                    r"(?P<mods>(?:\b(?:abstract|final|readonly)\s+)*)",
                    r"\b(?P<kind>class|interface|trait|enum)\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)",
                    r"(?:\s*:\s*(?P<backing>[A-Za-z_]+))?",
                    r"(?:\s+extends\s+(?P<extends>{list}))?",
                    r"(?:\s+implements\s+(?P<implements>{list}))?",
                    r"\s*\{{"
                ),
                list = name_list
            ))?,
            case_re: Regex::new(concat!(
                r#"\bcase\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*"#,
                r#"(?:=\s*(?P<value>'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|-?\d+))?\s*;"#
            ))?,
        })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Extract the declared namespace: first match wins, scanning line by
    /// line. A file without a declaration yields an empty namespace.
    pub fn extract_namespace(&self, text: &str) -> String {
        text.lines()
            .find_map(|line| self.namespace_re.captures(line))
            .map(|caps| caps[1].to_string())
            .unwrap_or_default()
    }

    /// Scan file content.
    pub fn scan(&self, path: &Path, text: &str) -> SourceFile {
        let namespace = self.extract_namespace(text);
        let code = strip_comments(text);

        let declarations = self.scan_declarations(&code);
        let first_decl = self
            .decl_re
            .find(&code)
            .map(|m| m.start())
            .unwrap_or(code.len());
        let imports = self.scan_imports(&code[..first_decl]);

        SourceFile {
            path: path.to_path_buf(),
            namespace,
            imports,
            declarations,
        }
    }

    fn scan_imports(&self, header: &str) -> HashMap<String, String> {
        let mut imports = HashMap::new();
        for caps in self.use_re.captures_iter(header) {
            let target = caps[1].trim_start_matches(self.separator.as_str()).to_string();
            let alias = match caps.get(2) {
                Some(alias) => alias.as_str().to_string(),
                None => target
                    .rsplit(self.separator.as_str())
                    .next()
                    .unwrap_or(&target)
                    .to_string(),
            };
            imports.insert(alias, target);
        }
        imports
    }

    fn scan_declarations(&self, code: &str) -> Vec<TypeDecl> {
        let mut declarations = Vec::new();

        for caps in self.decl_re.captures_iter(code) {
            let whole = caps.get(0).map(|m| (m.start(), m.end()));
            let Some((start, body_start)) = whole else {
                continue;
            };
            // `Foo::class` and `new class` are expressions, not declarations.
            if code[..start].trim_end().ends_with("::") || code[..start].trim_end().ends_with("new") {
                continue;
            }
            let Some(kind) = TypeKind::parse(&caps["kind"]) else {
                continue;
            };
            let name = caps["name"].to_string();
            if matches!(name.as_str(), "extends" | "implements") {
                continue;
            }

            let list = |group: &str| -> Vec<String> {
                caps.name(group)
                    .map(|m| {
                        m.as_str()
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default()
            };

            let cases = if kind == TypeKind::Enum {
                let body = &code[body_start..matching_brace(code, body_start)];
                self.scan_cases(body)
            } else {
                Vec::new()
            };

            declarations.push(TypeDecl {
                name,
                kind,
                is_abstract: caps["mods"].split_whitespace().any(|m| m == "abstract"),
                extends: list("extends"),
                implements: list("implements"),
                backing: caps.name("backing").map(|m| m.as_str().to_lowercase()),
                cases,
            });
        }

        declarations
    }

    fn scan_cases(&self, body: &str) -> Vec<EnumCaseDecl> {
        self.case_re
            .captures_iter(body)
            .map(|caps| EnumCaseDecl {
                name: caps["name"].to_string(),
                value: caps.name("value").map(|v| unquote(v.as_str())),
            })
            .collect()
    }
}

/// Remove `//`, `#` and `/* */` comments that sit outside string literals.
///
/// `#[` opens an attribute and is kept. Line comments keep their newline so
/// line-anchored patterns still see line starts.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(open) = quote {
            out.push(ch);
            if ch == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if ch == open {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => skip_to_line_end(&mut chars, &mut out),
            '#' if chars.peek() != Some(&'[') => skip_to_line_end(&mut chars, &mut out),
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }
    out
}

fn skip_to_line_end(chars: &mut impl Iterator<Item = char>, out: &mut String) {
    for c in chars.by_ref() {
        if c == '\n' {
            out.push('\n');
            break;
        }
    }
}

/// Offset of the `}` closing the block whose body starts at `open`, or the
/// end of input when unbalanced.
fn matching_brace(code: &str, open: usize) -> usize {
    let mut depth = 1usize;
    for (offset, ch) in code[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return open + offset;
                }
            }
            _ => {}
        }
    }
    code.len()
}

/// Strip quotes from a literal and resolve `\\` and escaped quote sequences.
fn unquote(literal: &str) -> String {
    let Some(quote) = literal.chars().next().filter(|c| *c == '\'' || *c == '"') else {
        return literal.to_string();
    };
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) if next == quote || next == '\\' => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> SourceScanner {
        SourceScanner::new("\\").unwrap()
    }

    #[test]
    fn test_extract_namespace_first_match_wins() {
        let text = "<?php\n\nnamespace App\\Models;\n\nnamespace Other;\n";
        assert_eq!(scanner().extract_namespace(text), "App\\Models");
    }

    #[test]
    fn test_extract_namespace_one_line_file() {
        let text = "<?php namespace App\\Models; class TestModel extends \\Illuminate\\Database\\Eloquent\\Model {}";
        assert_eq!(scanner().extract_namespace(text), "App\\Models");
    }

    #[test]
    fn test_extract_namespace_missing_or_malformed() {
        assert_eq!(scanner().extract_namespace("<?php class Foo {}"), "");
        assert_eq!(scanner().extract_namespace("namespace App-Models;"), "");
    }

    #[test]
    fn test_scan_class_with_imports() {
        let text = r#"<?php

namespace App\Models;

use Illuminate\Database\Eloquent\Model as Eloquent;
use App\Contracts\Auditable;

/**
 * class Ignored extends Nothing {
 */
final class Order extends Eloquent implements Auditable, \JsonSerializable
{
    protected $casts = ['total' => 'decimal:2'];

    public function owner()
    {
        return $this->belongsTo(User::class);
    }
}
"#;
        let file = scanner().scan(Path::new("app/Models/Order.php"), text);
        assert_eq!(file.namespace, "App\\Models");
        assert_eq!(
            file.imports.get("Eloquent").map(String::as_str),
            Some("Illuminate\\Database\\Eloquent\\Model")
        );
        assert_eq!(file.declarations.len(), 1);

        let decl = &file.declarations[0];
        assert_eq!(decl.name, "Order");
        assert_eq!(decl.kind, TypeKind::Class);
        assert!(!decl.is_abstract);
        assert_eq!(decl.extends, vec!["Eloquent"]);
        assert_eq!(decl.implements, vec!["Auditable", "\\JsonSerializable"]);
        assert_eq!(file.expected_type_name("\\"), "App\\Models\\Order");
    }

    #[test]
    fn test_scan_abstract_class() {
        let file = scanner().scan(
            Path::new("BaseModel.php"),
            "<?php namespace App\\Models; abstract class BaseModel extends Model {}",
        );
        assert!(file.declarations[0].is_abstract);
    }

    #[test]
    fn test_scan_string_backed_enum() {
        let text = r#"<?php
namespace App\Permissions;

use Some\Concerns\HasPermissionGroup;

enum OrderPermission: string
{
    use HasPermissionGroup;

    case VIEW_ANY = 'Order.viewAny';
    case VIEW = "Order.view";
    case QUOTED = 'Order\'s.edit'; // trailing note

    public function label(): string
    {
        return match ($this) {
            self::VIEW => 'View',
            default => 'Other',
        };
    }
}
"#;
        let file = scanner().scan(Path::new("OrderPermission.php"), text);
        let decl = &file.declarations[0];
        assert_eq!(decl.kind, TypeKind::Enum);
        assert_eq!(decl.backing.as_deref(), Some("string"));
        let values: Vec<_> = decl.cases.iter().map(|c| c.value.clone().unwrap()).collect();
        assert_eq!(values, vec!["Order.viewAny", "Order.view", "Order's.edit"]);
        assert_eq!(decl.cases[0].name, "VIEW_ANY");
        // only the top-level `use` counts as an import, not the trait use
        assert_eq!(file.imports.len(), 1);
        assert_eq!(
            file.imports.get("HasPermissionGroup").map(String::as_str),
            Some("Some\\Concerns\\HasPermissionGroup")
        );
    }

    #[test]
    fn test_trailing_comment_does_not_add_cases() {
        let text = "<?php\nnamespace App\\Permissions;\n\nenum OrderPermission: string\n{\n    case VIEW = 'Order.view'; // was: case LEGACY = 'Order.legacy';\n    case EDIT = 'Order.edit'; # case OLD = 'Order.old';\n    /* case GONE = 'Order.gone'; */\n    case URL = 'https://example.test/#anchor';\n}\n";
        let file = scanner().scan(Path::new("OrderPermission.php"), text);
        let values: Vec<_> = file.declarations[0]
            .cases
            .iter()
            .map(|c| c.value.clone().unwrap())
            .collect();
        assert_eq!(
            values,
            vec!["Order.view", "Order.edit", "https://example.test/#anchor"]
        );
    }

    #[test]
    fn test_strip_comments_keeps_attributes_and_strings() {
        let code = strip_comments("#[Attr]\n$a = 'x // y'; // gone\n$b = \"#z\";\n");
        assert_eq!(code, "#[Attr]\n$a = 'x // y'; \n$b = \"#z\";\n");
    }

    #[test]
    fn test_scan_pure_enum_and_interface() {
        let file = scanner().scan(
            Path::new("Status.php"),
            "<?php namespace App; enum Status { case Open; case Closed; } interface Shippable extends Countable {}",
        );
        assert_eq!(file.declarations.len(), 2);
        assert_eq!(file.declarations[0].backing, None);
        assert_eq!(file.declarations[0].cases[1].value, None);
        assert_eq!(file.declarations[1].kind, TypeKind::Interface);
        assert_eq!(file.declarations[1].extends, vec!["Countable"]);
    }

    #[test]
    fn test_class_constant_expression_is_not_a_declaration() {
        let file = scanner().scan(
            Path::new("Policy.php"),
            "<?php namespace App; $x = Foo::class; $y = new class extends Bar {};",
        );
        assert!(file.declarations.is_empty());
    }

    #[test]
    fn test_dot_separator() {
        let scanner = SourceScanner::new(".").unwrap();
        let file = scanner.scan(
            Path::new("Order.src"),
            "namespace shop.models;\nclass Order extends shop.base.Model {\n}\n",
        );
        assert_eq!(file.namespace, "shop.models");
        assert_eq!(file.declarations[0].extends, vec!["shop.base.Model"]);
    }
}
