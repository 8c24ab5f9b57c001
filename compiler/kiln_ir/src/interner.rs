//! Interning for identifiers, glob paths and string literals.
//!
//! Glob paths such as `at_runtime::dispatch` intern as one name; the
//! lexer never splits them into segments.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::Name;

/// Interned up front so their names are small and stable across sessions.
const PREINTERNED: &[&str] = &[
    "", "begin", "sub", "fn", "let", "if", "else", "while", "return", "true", "false", "nil",
    "main", "print", "at_runtime", "after_runtime", "lex_stuff", "eval", "require", "callers",
    "die", "len", "str",
];

#[derive(Default)]
struct Table {
    ids: FxHashMap<&'static str, Name>,
    texts: Vec<&'static str>,
}

impl Table {
    fn insert(&mut self, text: &str) -> Name {
        if let Some(&name) = self.ids.get(text) {
            return name;
        }
        let Ok(index) = u32::try_from(self.texts.len()) else {
            panic!("more than u32::MAX names interned");
        };
        // Interned text lives as long as the process; sessions intern a
        // bounded vocabulary.
        let text: &'static str = Box::leak(Box::from(text));
        let name = Name::from_index(index);
        self.texts.push(text);
        self.ids.insert(text, name);
        name
    }
}

/// Maps strings to [`Name`]s and back.
pub struct StringInterner {
    table: RwLock<Table>,
}

impl StringInterner {
    pub fn new() -> Self {
        let mut table = Table::default();
        for text in PREINTERNED {
            table.insert(text);
        }
        StringInterner {
            table: RwLock::new(table),
        }
    }

    /// # Panics
    /// When the `u32` name space is exhausted.
    pub fn intern(&self, text: &str) -> Name {
        if let Some(&name) = self.table.read().ids.get(text) {
            return name;
        }
        self.table.write().insert(text)
    }

    /// Text of `name`, or `""` for a name this interner never issued.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table.read().texts.get(name.index()).copied().unwrap_or_default()
    }

    /// Interned strings, counting the empty string.
    pub fn len(&self) -> usize {
        self.table.read().texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheaply clonable handle; the interpreter and every lexer it creates
/// hold one.
#[derive(Clone, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &StringInterner {
        &self.0
    }
}
