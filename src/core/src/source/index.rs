//! Static type index built from scanned source files.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use super::scanner::{qualify, EnumCaseDecl, SourceFile, TypeKind};

/// A declared type with its supertypes resolved to fully-qualified names.
#[derive(Debug, Clone, Serialize)]
pub struct TypeInfo {
    pub fully_qualified_name: String,
    pub simple_name: String,
    pub namespace: String,
    pub kind: TypeKind,
    pub is_abstract: bool,
    /// Resolved `extends` and `implements` targets, in declaration order.
    pub supertypes: Vec<String>,
    pub backing: Option<String>,
    pub cases: Vec<EnumCaseDecl>,
    pub path: PathBuf,
}

impl TypeInfo {
    /// A class that can be instantiated: not abstract, not an interface,
    /// trait or enum.
    pub fn is_concrete_class(&self) -> bool {
        self.kind == TypeKind::Class && !self.is_abstract
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    /// A string-backed enum, whose cases all carry a literal value.
    pub fn is_string_backed(&self) -> bool {
        self.is_enum() && self.backing.as_deref() == Some("string")
    }
}

/// Index of every type declared in a set of files, keyed by fully-qualified
/// name (without a leading separator).
#[derive(Debug, Clone)]
pub struct TypeIndex {
    separator: String,
    types: HashMap<String, TypeInfo>,
}

impl TypeIndex {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            types: HashMap::new(),
        }
    }

    /// Build an index from already scanned files.
    pub fn build<'a>(separator: &str, files: impl IntoIterator<Item = &'a SourceFile>) -> Self {
        let mut index = Self::new(separator);
        for file in files {
            index.insert_file(file);
        }
        index
    }

    /// Add every declaration of `file`. A later declaration of the same name
    /// replaces an earlier one.
    pub fn insert_file(&mut self, file: &SourceFile) {
        for decl in &file.declarations {
            let fqn = qualify(&file.namespace, &decl.name, &self.separator);
            let supertypes = decl
                .extends
                .iter()
                .chain(decl.implements.iter())
                .map(|name| self.resolve(file, name))
                .collect();

            self.types.insert(
                fqn.clone(),
                TypeInfo {
                    fully_qualified_name: fqn,
                    simple_name: decl.name.clone(),
                    namespace: file.namespace.clone(),
                    kind: decl.kind,
                    is_abstract: decl.is_abstract,
                    supertypes,
                    backing: decl.backing.clone(),
                    cases: decl.cases.clone(),
                    path: file.path.clone(),
                },
            );
        }
    }

    /// Resolve a name as written in `file` to a fully-qualified name.
    ///
    /// A leading separator marks an already-qualified name; otherwise the
    /// first segment is looked up among the file's imports, falling back to
    /// the file's own namespace.
    fn resolve(&self, file: &SourceFile, name: &str) -> String {
        let sep = self.separator.as_str();
        if let Some(absolute) = name.strip_prefix(sep) {
            return absolute.to_string();
        }

        let (head, rest) = match name.split_once(sep) {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };

        match (file.imports.get(head), rest) {
            (Some(target), Some(rest)) => format!("{}{}{}", target, sep, rest),
            (Some(target), None) => target.clone(),
            (None, _) => qualify(&file.namespace, name, sep),
        }
    }

    pub fn get(&self, fully_qualified_name: &str) -> Option<&TypeInfo> {
        self.types
            .get(fully_qualified_name.trim_start_matches(self.separator.as_str()))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether `fqn` extends or implements `base`, directly or through any
    /// chain of indexed supertypes. Types outside the index end the chain but
    /// still match by name. A type is not its own subtype.
    pub fn is_subtype_of(&self, fqn: &str, base: &str) -> bool {
        let sep = self.separator.as_str();
        let base = base.trim_start_matches(sep);

        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        if let Some(info) = self.get(fqn) {
            queue.extend(info.supertypes.iter().map(String::as_str));
        }

        while let Some(current) = queue.pop_front() {
            if current == base {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(info) = self.types.get(current) {
                queue.extend(info.supertypes.iter().map(String::as_str));
            }
        }

        false
    }
}
