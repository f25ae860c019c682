use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;


/// Stable index into one of the registries (templates, upgrades).  Handles are never reused, so a
/// handle to something that has since been reset away simply stops resolving.
pub struct Handle<T>(usize, PhantomData<*const T>);

impl<T> Handle<T> {
    pub fn index(&self) -> usize {
        self.0
    }
}

// Implemented by hand because the derived impls would demand T: Clone etc., but we don't actually
// own a T.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Handle(self.0, PhantomData)
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Handle<T>) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

impl<T> From<usize> for Handle<T> {
    fn from(index: usize) -> Self {
        Handle(index, PhantomData)
    }
}

/// ASCII case-insensitive string comparison, which is how the engine compares every name in its
/// data files.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}


/// A name turned into a small integer, so lookups don't have to hash strings.  Zero is never
/// handed out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey(u32);

impl NameKey {
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Hands out one `NameKey` per distinct name, for as long as it lives
#[derive(Debug, Default)]
pub struct NameKeyGenerator {
    keys: HashMap<String, NameKey>,
    names: Vec<String>,
}

impl NameKeyGenerator {
    pub fn new() -> Self {
        NameKeyGenerator::default()
    }

    pub fn name_to_key(&mut self, name: &str) -> NameKey {
        if let Some(&key) = self.keys.get(name) {
            return key;
        }
        self.names.push(name.to_owned());
        let key = NameKey(self.names.len() as u32);
        self.keys.insert(name.to_owned(), key);
        key
    }

    /// Like `name_to_key`, but never creates a key
    pub fn find_key(&self, name: &str) -> Option<NameKey> {
        self.keys.get(name).cloned()
    }

    pub fn key_to_name(&self, key: NameKey) -> Option<&str> {
        if key.0 == 0 {
            return None;
        }
        self.names.get(key.0 as usize - 1).map(String::as_str)
    }
}
