//! Modules are the pieces an object template is built from: behaviors (bodies, AI, death
//! handlers...), draw modules and client updates.  Each module class is registered once, at
//! startup, with the interfaces it implements and a parser for its data block.
pub mod builtin;
pub mod info;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use errors::{ErrorKind, Result};
use parse::{FieldTable, IniReader};


#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Behavior,
    Draw,
    ClientUpdate,
}

pub const MODULE_KINDS: [ModuleKind; 3] = [ModuleKind::Behavior, ModuleKind::Draw, ModuleKind::ClientUpdate];

impl ModuleKind {
    fn index(self) -> usize {
        match self {
            ModuleKind::Behavior => 0,
            ModuleKind::Draw => 1,
            ModuleKind::ClientUpdate => 2,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ModuleKind::Behavior => "behavior",
            ModuleKind::Draw => "draw",
            ModuleKind::ClientUpdate => "client update",
        })
    }
}

bitflags! {
    /// Which runtime interfaces a module class implements
    pub struct ModuleInterface: u32 {
        const UPDATE = 0x0001;
        const DIE = 0x0002;
        const DAMAGE = 0x0004;
        const CREATE = 0x0008;
        const COLLIDE = 0x0010;
        /// Reserved: only `Body` declarations may carry it, and they must
        const BODY = 0x0020;
        const CONTAIN = 0x0040;
        const UPGRADE = 0x0080;
        const SPECIAL_POWER = 0x0100;
        const DESTROY = 0x0200;
        const DRAW = 0x0400;
        const CLIENT_UPDATE = 0x0800;
    }
}


/// Parsed data for one module declaration.  The runtime that instantiates objects downcasts it
/// back to the concrete type through `as_any`.
pub trait ModuleData: ModuleDataBase {
    /// AI modules are exclusive: a template only ever keeps the most recent one
    fn is_ai_module_data(&self) -> bool {
        false
    }
}

/// Plumbing for `ModuleData`, implemented for every cloneable module data type
pub trait ModuleDataBase: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn clone_box(&self) -> Box<dyn ModuleData>;
}

impl<T: ModuleData + Clone + 'static> ModuleDataBase for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn ModuleData> {
        Box::new(self.clone())
    }
}

impl dyn ModuleData {
    pub fn downcast_ref<T: ModuleData + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl Clone for Box<dyn ModuleData> {
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}

/// Module data read entirely through a field table
pub trait IniModuleData: ModuleData + Default + Sized {
    fn field_table() -> &'static FieldTable<Self>;
}

pub fn parse_module_data<D: IniModuleData + Clone + 'static>(ini: &mut IniReader) -> Result<Box<dyn ModuleData>> {
    let mut data = D::default();
    ini.parse_block(&mut data, D::field_table(), "module")?;
    Ok(Box::new(data))
}

pub type ModuleDataParser = fn(&mut IniReader) -> Result<Box<dyn ModuleData>>;

/// Registration for one module class
pub struct ModuleTemplate {
    class_name: String,
    kind: ModuleKind,
    interface_mask: ModuleInterface,
    parser: ModuleDataParser,
}

impl ModuleTemplate {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn interface_mask(&self) -> ModuleInterface {
        self.interface_mask
    }
}

/// Every module class the loader knows about, by kind and class name.  Built once before any data
/// is loaded and only read afterwards.
pub struct ModuleRegistry {
    templates: [HashMap<String, ModuleTemplate>; 3],
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        ModuleRegistry::with_builtin_modules()
    }
}

impl ModuleRegistry {
    /// An empty registry, for callers that supply their own module classes
    pub fn new() -> Self {
        ModuleRegistry {
            templates: [HashMap::new(), HashMap::new(), HashMap::new()],
        }
    }

    pub fn with_builtin_modules() -> Self {
        let mut registry = ModuleRegistry::new();
        builtin::register_builtin_modules(&mut registry);
        registry
    }

    /// Register a module class.  Registering the same name twice for one kind replaces the
    /// earlier registration.
    pub fn register(&mut self, class_name: &str, kind: ModuleKind, interface_mask: ModuleInterface, parser: ModuleDataParser) {
        let template = ModuleTemplate {
            class_name: class_name.to_owned(),
            kind,
            interface_mask,
            parser,
        };
        if self.templates[kind.index()].insert(class_name.to_owned(), template).is_some() {
            warn!("module class {} registered twice as a {} module", class_name, kind);
        }
    }

    pub fn find_module_template(&self, class_name: &str, kind: ModuleKind) -> Option<&ModuleTemplate> {
        self.templates[kind.index()].get(class_name)
    }

    pub fn find_module_interface_mask(&self, class_name: &str, kind: ModuleKind) -> Result<ModuleInterface> {
        match self.find_module_template(class_name, kind) {
            Some(template) => Ok(template.interface_mask),
            None => bail!(ErrorKind::UnknownModule(class_name.to_owned(), kind)),
        }
    }

    /// Parse the data block of a module declaration, with the reader positioned just after the
    /// `<Class> <Tag>` line.
    pub fn new_module_data_from_ini(&self, ini: &mut IniReader, class_name: &str, kind: ModuleKind, tag: &str) -> Result<Box<dyn ModuleData>> {
        let template = match self.find_module_template(class_name, kind) {
            Some(template) => template,
            None => bail!(ErrorKind::UnknownModule(class_name.to_owned(), kind)),
        };
        trace!("parsing {} module {} ({})", kind, class_name, tag);
        (template.parser)(ini)
    }

    /// Registered class names for one kind, sorted
    pub fn class_names(&self, kind: ModuleKind) -> Vec<&str> {
        let mut names: Vec<_> = self.templates[kind.index()].keys().map(String::as_str).collect();
        names.sort();
        names
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::builtin::{ActiveBodyModuleData, AIUpdateModuleData};
    use parse::LoadType;

    #[test]
    fn builtin_masks() {
        let registry = ModuleRegistry::with_builtin_modules();
        assert_eq!(registry.find_module_interface_mask("ActiveBody", ModuleKind::Behavior).unwrap(), ModuleInterface::BODY);
        assert!(registry.find_module_interface_mask("AIUpdateInterface", ModuleKind::Behavior).unwrap().contains(ModuleInterface::UPDATE));
        assert_eq!(registry.find_module_interface_mask("W3DModelDraw", ModuleKind::Draw).unwrap(), ModuleInterface::DRAW);
    }

    #[test]
    fn unknown_class_is_fatal() {
        let registry = ModuleRegistry::with_builtin_modules();
        // Registered, but not as a draw module
        let err = registry.find_module_interface_mask("ActiveBody", ModuleKind::Draw).unwrap_err();
        match *err.kind() {
            ErrorKind::UnknownModule(ref name, ModuleKind::Draw) => assert_eq!(name, "ActiveBody"),
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn parses_and_downcasts() {
        let registry = ModuleRegistry::with_builtin_modules();
        let mut ini = IniReader::new("  MaxHealth = 300.0\n  InitialHealth = 150\nEnd\n", "t.ini", LoadType::Normal);
        let data = registry.new_module_data_from_ini(&mut ini, "ActiveBody", ModuleKind::Behavior, "ModuleTag_Body").unwrap();
        assert!(!data.is_ai_module_data());
        let body = data.downcast_ref::<ActiveBodyModuleData>().unwrap();
        assert_eq!(body.max_health, 300.0);
        assert_eq!(body.initial_health, 150.0);
        assert!(data.downcast_ref::<AIUpdateModuleData>().is_none());

        let copy = data.clone();
        assert_eq!(copy.downcast_ref::<ActiveBodyModuleData>().unwrap().max_health, 300.0);
    }

    #[test]
    fn ai_data_reports_itself() {
        let registry = ModuleRegistry::with_builtin_modules();
        let mut ini = IniReader::new("  AutoAcquireEnemiesWhenIdle = Yes\nEnd\n", "t.ini", LoadType::Normal);
        let data = registry.new_module_data_from_ini(&mut ini, "AIUpdateInterface", ModuleKind::Behavior, "ModuleTag_AI").unwrap();
        assert!(data.is_ai_module_data());
    }
}
