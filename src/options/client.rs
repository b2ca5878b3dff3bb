use std::fmt;
use std::rc::Rc;

/// Host callbacks the bundler can use to read files outside the file set.
pub trait FileResolver {
    /// Whether `path` names a readable file.
    fn is_file(&self, path: &str) -> bool;

    /// Contents of `path`, or `None` when it cannot be read.
    fn read_file(&self, path: &str) -> Option<String>;
}

/// Adapter options the engine is constructed with and later updated to.
#[derive(Clone, Default)]
pub struct ClientOptions {
    /// Bundler page URL loaded into the hidden frame.
    pub bundler_url: Option<String>,
    /// Transpile without evaluating the result.
    pub skip_eval: bool,
    /// Optional external file resolver.
    pub file_resolver: Option<Rc<dyn FileResolver>>,
}

impl ClientOptions {
    /// Whether a file resolver is attached.
    #[must_use]
    pub fn has_file_resolver(&self) -> bool {
        self.file_resolver.is_some()
    }

    /// Compare two option sets. Resolvers compare by identity.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        let same_resolver = match (&self.file_resolver, &other.file_resolver) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.bundler_url == other.bundler_url
            && self.skip_eval == other.skip_eval
            && same_resolver
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("bundler_url", &self.bundler_url)
            .field("skip_eval", &self.skip_eval)
            .field("file_resolver", &self.has_file_resolver())
            .finish()
    }
}
