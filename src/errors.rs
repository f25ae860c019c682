use std::fmt;
use std::io;

use nom;
use toml;

use module::ModuleKind;


/// Where in the data files an error was found.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceLocation {
    pub filename: String,
    pub line: usize,
    /// Name of the top-level definition being parsed, if any (e.g. `Object AmericaTankCrusader`)
    pub block: Option<String>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)?;
        if let Some(ref block) = self.block {
            write!(f, " (in {})", block)?;
        }
        Ok(())
    }
}

error_chain! {
    foreign_links {
        Io(io::Error);
        Manifest(toml::de::Error);
    }

    errors {
        Located(location: SourceLocation, inner: Box<ErrorKind>) {
            description("error in data file")
            display("{}: {}", location, inner)
        }
        UnexpectedEof(whence: &'static str) {
            description("unexpected end of input")
            display("unexpected end of input while parsing {}", whence)
        }
        MissingToken(whence: &'static str) {
            description("missing token")
            display("expected {} but the line ended", whence)
        }
        InvalidValue(whence: &'static str, token: String) {
            description("malformed value")
            display("malformed {}: '{}'", whence, token)
        }
        UnknownName(whence: &'static str, token: String) {
            description("unrecognized name")
            display("unrecognized {} '{}'", whence, token)
        }
        UnknownField(field: String) {
            description("unknown field")
            display("unknown field '{}'", field)
        }
        UnknownBlock(keyword: String) {
            description("unknown top-level block")
            display("unknown top-level block '{}'", keyword)
        }
        UnknownModule(class: String, kind: ModuleKind) {
            description("unknown module class")
            display("no {} module named '{}' is registered", kind, class)
        }
        UnknownTemplate(name: String) {
            description("unknown template")
            display("no object template named '{}'", name)
        }
        DuplicateModuleTag(tag: String) {
            description("duplicate module tag")
            display("module tag '{}' is already used by this template", tag)
        }
        TagNotFound(tag: String) {
            description("module tag not found")
            display("no module with tag '{}' to remove", tag)
        }
        NestedModuleDirective(directive: &'static str) {
            description("nested module directive")
            display("{} cannot be used inside another AddModule, ReplaceModule, InheritableModule or OverrideableByLikeKind block", directive)
        }
        ReplaceClassMismatch(removed: String, added: String) {
            description("replacement module has a different class")
            display("ReplaceModule removed a {} but the replacement is a {}", removed, added)
        }
        ReplaceKindMismatch(removed: ModuleKind, added: ModuleKind) {
            description("replacement module has a different kind")
            display("ReplaceModule removed a {} module but the replacement is a {} module", removed, added)
        }
        ReplaceTagReused(tag: String) {
            description("replacement module reuses the removed tag")
            display("replacement module must use a new tag, not '{}'", tag)
        }
        NotABodyModule(class: String) {
            description("Body used with a non-body module")
            display("'{}' is not a body module and cannot be declared with Body", class)
        }
        UndeclaredBodyModule(class: String) {
            description("body module declared without Body")
            display("'{}' is a body module and must be declared with Body", class)
        }
        ModuleNeedsAddModule(class: String) {
            description("bare module directive in an override file")
            display("module '{}' must be wrapped in AddModule or ReplaceModule in an override file", class)
        }
        DuplicateSetConditions(set: &'static str, conditions: String) {
            description("duplicate set conditions")
            display("a {} with conditions {} already exists", set, conditions)
        }
        UpgradeCapacityExhausted(name: String) {
            description("too many upgrades")
            display("cannot create upgrade '{}': all upgrade bits are in use", name)
        }
    }
}

impl ErrorKind {
    /// The underlying fault, with any location wrappers peeled off.
    pub fn root(&self) -> &ErrorKind {
        match *self {
            ErrorKind::Located(_, ref inner) => inner.root(),
            ref kind => kind,
        }
    }
}

/// Attach a location to an error, unless it already has one.
pub fn locate(err: Error, location: SourceLocation) -> Error {
    let Error(kind, state) = err;
    match kind {
        ErrorKind::Located(..) => Error(kind, state),
        kind => Error(ErrorKind::Located(location, Box::new(kind)), state),
    }
}

/// Convert the result of a complete nom scan into our own Result.  Anything short of consuming
/// the whole token counts as malformed.
pub fn nom_to_result<O>(whence: &'static str, token: &str, result: nom::IResult<&str, O>) -> Result<O> {
    match result {
        Ok(("", value)) => Ok(value),
        _ => bail!(ErrorKind::InvalidValue(whence, token.to_owned())),
    }
}
