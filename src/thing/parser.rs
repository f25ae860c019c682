//! Reads one template block, including the module directives that add, remove and replace its
//! modules.
use config::{LoadOptions, ValidationLevel};
use errors::{ErrorKind, Result};
use module::{ModuleInterface, ModuleKind, ModuleRegistry};
use parse::{IniReader, LoadType};
use util::eq_ignore_case;
use super::ThingTemplate;


/// Which wrapper directive the parser is inside of.  Wrappers don't nest.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModuleParseMode {
    Normal,
    /// Inside `AddModule` or `ReplaceModule`
    AddRemoveReplace,
    Inheritable,
    OverrideableByLikeKind,
}

/// The directives that declare a single module
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ModuleDirective {
    Behavior,
    Body,
    Draw,
    ClientUpdate,
}

impl ModuleDirective {
    fn from_name(name: &str) -> Option<ModuleDirective> {
        if eq_ignore_case(name, "Behavior") {
            Some(ModuleDirective::Behavior)
        }
        else if eq_ignore_case(name, "Body") {
            Some(ModuleDirective::Body)
        }
        else if eq_ignore_case(name, "Draw") {
            Some(ModuleDirective::Draw)
        }
        else if eq_ignore_case(name, "ClientUpdate") {
            Some(ModuleDirective::ClientUpdate)
        }
        else {
            None
        }
    }

    /// Bodies are behaviors as far as storage goes
    fn kind(self) -> ModuleKind {
        match self {
            ModuleDirective::Behavior | ModuleDirective::Body => ModuleKind::Behavior,
            ModuleDirective::Draw => ModuleKind::Draw,
            ModuleDirective::ClientUpdate => ModuleKind::ClientUpdate,
        }
    }
}

/// The module a `ReplaceModule` took out, which its replacement has to match
struct Replacement {
    tag: String,
    kind: ModuleKind,
    class_name: String,
}


/// Parsing state for one template block.  Owns the module parse mode, so the template itself
/// never carries it.
pub struct TemplateParser<'t, 'r> {
    template: &'t mut ThingTemplate,
    modules: &'r ModuleRegistry,
    load_type: LoadType,
    options: LoadOptions,
    mode: ModuleParseMode,
    replacing: Option<Replacement>,
}

impl<'t, 'r> TemplateParser<'t, 'r> {
    pub fn new(template: &'t mut ThingTemplate, modules: &'r ModuleRegistry, load_type: LoadType, options: LoadOptions) -> Self {
        TemplateParser {
            template,
            modules,
            load_type,
            options,
            mode: ModuleParseMode::Normal,
            replacing: None,
        }
    }

    pub fn mode(&self) -> ModuleParseMode {
        self.mode
    }

    /// Parse fields until the block's `End`.  The reader should be positioned just past the
    /// `Object <Name>` line.
    pub fn parse(&mut self, ini: &mut IniReader) -> Result<()> {
        ini.parse_block_with("object", |ini, field| self.parse_field(ini, field))
    }

    fn parse_field(&mut self, ini: &mut IniReader, field: &str) -> Result<()> {
        if let Some(directive) = ModuleDirective::from_name(field) {
            return self.parse_module(ini, directive);
        }

        if eq_ignore_case(field, "AddModule") {
            self.parse_wrapped_block(ini, "AddModule", ModuleParseMode::AddRemoveReplace)
        }
        else if eq_ignore_case(field, "RemoveModule") {
            self.parse_remove_module(ini)
        }
        else if eq_ignore_case(field, "ReplaceModule") {
            self.parse_replace_module(ini)
        }
        else if eq_ignore_case(field, "InheritableModule") {
            self.parse_wrapped_block(ini, "InheritableModule", ModuleParseMode::Inheritable)
        }
        else if eq_ignore_case(field, "OverrideableByLikeKind") {
            self.parse_wrapped_block(ini, "OverrideableByLikeKind", ModuleParseMode::OverrideableByLikeKind)
        }
        else if self.template.parse_field(ini, field)? {
            Ok(())
        }
        else {
            bail!(ErrorKind::UnknownField(field.to_owned()))
        }
    }

    fn require_normal_mode(&self, directive: &'static str) -> Result<()> {
        if self.mode != ModuleParseMode::Normal {
            bail!(ErrorKind::NestedModuleDirective(directive));
        }
        Ok(())
    }

    /// Run a nested block in `mode`.  The mode goes back to normal however the block ends.
    fn parse_wrapped_block(&mut self, ini: &mut IniReader, directive: &'static str, mode: ModuleParseMode) -> Result<()> {
        self.require_normal_mode(directive)?;
        trace!("{}: entering {:?}", self.template.name(), mode);
        self.mode = mode;
        let result = ini.parse_block_with(directive, |ini, field| self.parse_field(ini, field));
        self.mode = ModuleParseMode::Normal;
        self.replacing = None;
        result
    }

    /// `RemoveModule ModuleTag_Foo`
    fn parse_remove_module(&mut self, ini: &mut IniReader) -> Result<()> {
        self.require_normal_mode("RemoveModule")?;
        let tag = ini.expect_token("a module tag")?;
        match self.template.remove_module_with_tag(tag) {
            Some((kind, class_name)) => {
                debug!("{}: removed {} module {} ({})", self.template.name(), kind, class_name, tag);
                Ok(())
            }
            None => bail!(ErrorKind::TagNotFound(tag.to_owned())),
        }
    }

    /// `ReplaceModule ModuleTag_Foo`, then a block holding exactly the replacement
    fn parse_replace_module(&mut self, ini: &mut IniReader) -> Result<()> {
        self.require_normal_mode("ReplaceModule")?;
        let tag = ini.expect_token("a module tag")?;
        let (kind, class_name) = match self.template.remove_module_with_tag(tag) {
            Some(removed) => removed,
            None => bail!(ErrorKind::TagNotFound(tag.to_owned())),
        };
        debug!("{}: replacing {} module {} ({})", self.template.name(), kind, class_name, tag);
        self.replacing = Some(Replacement { tag: tag.to_owned(), kind, class_name });
        self.parse_wrapped_block(ini, "ReplaceModule", ModuleParseMode::AddRemoveReplace)
    }

    /// `Behavior = <Class> <Tag>` and friends, followed by the module's own data block
    fn parse_module(&mut self, ini: &mut IniReader, directive: ModuleDirective) -> Result<()> {
        let class_name = ini.expect_token("a module class")?;
        let tag = ini.expect_token("a module tag")?;
        let kind = directive.kind();
        if let Some(ref replacement) = self.replacing {
            if replacement.kind != kind {
                bail!(ErrorKind::ReplaceKindMismatch(replacement.kind, kind));
            }
        }

        let interface_mask = self.modules.find_module_interface_mask(class_name, kind)?;
        let is_body = interface_mask.contains(ModuleInterface::BODY);
        if directive == ModuleDirective::Body && !is_body {
            bail!(ErrorKind::NotABodyModule(class_name.to_owned()));
        }
        if directive != ModuleDirective::Body && is_body {
            bail!(ErrorKind::UndeclaredBodyModule(class_name.to_owned()));
        }

        if self.load_type == LoadType::CreateOverrides && self.mode != ModuleParseMode::AddRemoveReplace {
            bail!(ErrorKind::ModuleNeedsAddModule(class_name.to_owned()));
        }

        if let Some(ref replacement) = self.replacing {
            if replacement.class_name != class_name {
                bail!(ErrorKind::ReplaceClassMismatch(replacement.class_name.clone(), class_name.to_owned()));
            }
            if replacement.tag == tag {
                bail!(ErrorKind::ReplaceTagReused(tag.to_owned()));
            }
        }

        let data = self.modules.new_module_data_from_ini(ini, class_name, kind, tag)?;

        if self.load_type != LoadType::CreateOverrides {
            if self.template.clear_copied_from_default_modules(interface_mask, class_name) {
                debug!("{}: {} displaced inherited modules", self.template.name(), class_name);
            }
        }

        if let Some(existing) = self.template.find_module_tag(tag) {
            match self.options.validation {
                ValidationLevel::Strict => bail!(ErrorKind::DuplicateModuleTag(tag.to_owned())),
                ValidationLevel::Lenient => warn!(
                    "{}: module tag {} is already used by a {} module; keeping both",
                    self.template.name(), tag, existing),
            }
        }

        let inheritable = self.mode == ModuleParseMode::Inheritable;
        let overrideable = self.mode == ModuleParseMode::OverrideableByLikeKind;
        self.template.modules_mut(kind).add_module_info(class_name, tag, data, interface_mask, inheritable, overrideable);
        Ok(())
    }
}
