use std::collections::HashMap;

use errors::{ErrorKind, Result};
use parse::LoadType;
use util::Handle;
use super::ThingTemplate;


/// Every object template starts out as a copy of this one, if it exists
pub const DEFAULT_THING_TEMPLATE: &'static str = "DefaultThingTemplate";

struct TemplateEntry {
    base: ThingTemplate,
    /// Later definitions layered on top by override files, oldest first
    overrides: Vec<ThingTemplate>,
    /// The template didn't exist until an override file defined it
    created_by_override: bool,
}

impl TemplateEntry {
    fn current(&self) -> &ThingTemplate {
        self.overrides.last().unwrap_or(&self.base)
    }

    fn current_mut(&mut self) -> &mut ThingTemplate {
        match self.overrides.last_mut() {
            Some(template) => template,
            None => &mut self.base,
        }
    }
}

/// All the object templates, in definition order.
///
/// Templates live in slots that are never reused, so a `Handle` stays valid across override loads;
/// after a `reset()` a handle to a template that only an override created stops resolving.
pub struct ThingFactory {
    entries: Vec<Option<TemplateEntry>>,
    by_name: HashMap<String, Handle<ThingTemplate>>,
    next_id: u32,
}

impl Default for ThingFactory {
    fn default() -> Self {
        ThingFactory::new()
    }
}

impl ThingFactory {
    pub fn new() -> Self {
        ThingFactory {
            entries: Vec::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }

    fn entry(&self, handle: Handle<ThingTemplate>) -> Option<&TemplateEntry> {
        self.entries.get(handle.index()).and_then(Option::as_ref)
    }

    fn entry_mut(&mut self, handle: Handle<ThingTemplate>) -> Option<&mut TemplateEntry> {
        self.entries.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Number of live templates
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn find_handle(&self, name: &str) -> Option<Handle<ThingTemplate>> {
        self.by_name.get(name).cloned()
    }

    /// The final version of a template, with all overrides applied
    pub fn find_template(&self, name: &str) -> Option<&ThingTemplate> {
        self.find_handle(name).and_then(|handle| self.get(handle))
    }

    pub fn get(&self, handle: Handle<ThingTemplate>) -> Option<&ThingTemplate> {
        self.entry(handle).map(TemplateEntry::current)
    }

    pub fn get_mut(&mut self, handle: Handle<ThingTemplate>) -> Option<&mut ThingTemplate> {
        self.entry_mut(handle).map(TemplateEntry::current_mut)
    }

    /// The template as the base data files defined it, ignoring overrides
    pub fn base(&self, handle: Handle<ThingTemplate>) -> Option<&ThingTemplate> {
        self.entry(handle).map(|entry| &entry.base)
    }

    pub fn override_count(&self, handle: Handle<ThingTemplate>) -> usize {
        self.entry(handle).map_or(0, |entry| entry.overrides.len())
    }

    /// Live templates in definition order, each in its final form
    pub fn iter<'a>(&'a self) -> impl Iterator<Item=(Handle<ThingTemplate>, &'a ThingTemplate)> + 'a {
        self.entries.iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entry| (Handle::from(index), entry.current())))
    }

    fn add_entry(&mut self, name: &str, load_type: LoadType) -> Handle<ThingTemplate> {
        let mut template = ThingTemplate::new(name, self.next_id);
        self.next_id += 1;
        if name != DEFAULT_THING_TEMPLATE {
            if let Some(default) = self.find_template(DEFAULT_THING_TEMPLATE) {
                template.copy_from(default);
                template.set_copied_from_default(true);
            }
        }
        debug!("new template {} (id {})", name, template.id());

        let handle = Handle::from(self.entries.len());
        self.entries.push(Some(TemplateEntry {
            base: template,
            overrides: Vec::new(),
            created_by_override: load_type == LoadType::CreateOverrides,
        }));
        self.by_name.insert(name.to_owned(), handle);
        handle
    }

    /// Get a template ready for an `Object <name>` block.  A name not seen before gets a new
    /// template; in an override load, an existing name gets a fresh override layered on top.
    pub fn define_template(&mut self, name: &str, load_type: LoadType) -> Result<&mut ThingTemplate> {
        let handle = match self.find_handle(name) {
            None => self.add_entry(name, load_type),
            Some(handle) => {
                match load_type {
                    LoadType::CreateOverrides => {
                        if let Some(entry) = self.entry_mut(handle) {
                            let layer = entry.current().clone();
                            entry.overrides.push(layer);
                            debug!("override {} of template {}", entry.overrides.len(), name);
                        }
                    }
                    LoadType::Normal => warn!("template {} is defined more than once; later fields win", name),
                }
                handle
            }
        };
        match self.get_mut(handle) {
            Some(template) => Ok(template),
            None => bail!(ErrorKind::UnknownTemplate(name.to_owned())),
        }
    }

    /// `ChildObject <name> <parent>`: a new template that starts as a copy of the parent.  With
    /// `reskin` set, it's an `ObjectReskin` and remembers where it came from.
    pub fn define_child_template(&mut self, name: &str, parent: &str, reskin: bool, load_type: LoadType) -> Result<&mut ThingTemplate> {
        let parent_template = match self.find_template(parent) {
            Some(template) => template.clone(),
            None => bail!(ErrorKind::UnknownTemplate(parent.to_owned())),
        };
        let template = self.define_template(name, load_type)?;
        template.copy_from(&parent_template);
        template.set_copied_from_default(true);
        if reskin {
            template.set_reskinned_from(parent);
        }
        Ok(template)
    }

    /// Forget everything the override files did: overrides are dropped, and templates they
    /// created are removed outright.  Slots aren't reused.
    pub fn reset(&mut self) {
        let mut removed = 0;
        for slot in self.entries.iter_mut() {
            let created_by_override = match *slot {
                Some(ref mut entry) => {
                    entry.overrides.clear();
                    entry.created_by_override
                }
                None => false,
            };
            if created_by_override {
                *slot = None;
                removed += 1;
            }
        }
        let entries = &self.entries;
        self.by_name.retain(|_, handle| entries.get(handle.index()).map_or(false, Option::is_some));
        debug!("template reset removed {} override-only templates", removed);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use config::LoadOptions;
    use module::{ModuleKind, ModuleRegistry};
    use parse::IniReader;
    use thing::TemplateParser;

    fn define(factory: &mut ThingFactory, registry: &ModuleRegistry, name: &str, load_type: LoadType, body: &str) {
        let template = factory.define_template(name, load_type).unwrap();
        let mut ini = IniReader::new(body, "t.ini", load_type);
        TemplateParser::new(template, registry, load_type, LoadOptions::default()).parse(&mut ini).unwrap();
    }

    #[test]
    fn ids_and_order() {
        let registry = ModuleRegistry::with_builtin_modules();
        let mut factory = ThingFactory::new();
        define(&mut factory, &registry, "B", LoadType::Normal, "End\n");
        define(&mut factory, &registry, "A", LoadType::Normal, "End\n");
        let names: Vec<_> = factory.iter().map(|(_, template)| (template.name().to_owned(), template.id())).collect();
        assert_eq!(names, vec![("B".to_owned(), 1), ("A".to_owned(), 2)]);
    }

    #[test]
    fn new_templates_copy_the_default() {
        let registry = ModuleRegistry::with_builtin_modules();
        let mut factory = ThingFactory::new();
        define(&mut factory, &registry, DEFAULT_THING_TEMPLATE, LoadType::Normal, "
            BuildCost = 7
            Behavior = DestroyDie ModuleTag_DefaultDie
            End
          End
        ");
        define(&mut factory, &registry, "Tank", LoadType::Normal, "End\n");

        let tank = factory.find_template("Tank").unwrap();
        assert_eq!(tank.build_cost, 7);
        assert_eq!(tank.id(), 2);
        let nugget = tank.behavior_modules().get(0).unwrap();
        assert_eq!(nugget.tag(), "ModuleTag_DefaultDie");
        assert!(nugget.is_copied_from_default());
        // The default itself doesn't think its own modules were inherited
        assert!(!factory.find_template(DEFAULT_THING_TEMPLATE).unwrap().behavior_modules().is_copied_from_default());
    }

    #[test]
    fn child_and_reskin() {
        let registry = ModuleRegistry::with_builtin_modules();
        let mut factory = ThingFactory::new();
        define(&mut factory, &registry, "Ranger", LoadType::Normal, "
            BuildCost = 225
            Behavior = SquishCollide ModuleTag_Squish
            End
          End
        ");
        factory.define_child_template("Ranger_Elite", "Ranger", false, LoadType::Normal).unwrap();
        let skin = factory.define_child_template("Ranger_Winter", "Ranger", true, LoadType::Normal).unwrap();
        assert_eq!(skin.reskinned_from(), Some("Ranger"));
        assert_eq!(skin.build_cost, 225);

        let child = factory.find_template("Ranger_Elite").unwrap();
        assert_eq!(child.reskinned_from(), None);
        assert!(child.modules(ModuleKind::Behavior).is_copied_from_default());

        let err = factory.define_child_template("Orphan", "Nobody", false, LoadType::Normal).unwrap_err();
        match *err.kind() {
            ErrorKind::UnknownTemplate(ref name) => assert_eq!(name, "Nobody"),
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn overrides_and_reset() {
        let registry = ModuleRegistry::with_builtin_modules();
        let mut factory = ThingFactory::new();
        define(&mut factory, &registry, "Tank", LoadType::Normal, "BuildCost = 900\nEnd\n");
        let handle = factory.find_handle("Tank").unwrap();

        define(&mut factory, &registry, "Tank", LoadType::CreateOverrides, "BuildCost = 1200\nEnd\n");
        define(&mut factory, &registry, "MapOnlyCrate", LoadType::CreateOverrides, "End\n");
        assert_eq!(factory.find_template("Tank").unwrap().build_cost, 1200);
        assert_eq!(factory.base(handle).unwrap().build_cost, 900);
        assert_eq!(factory.override_count(handle), 1);
        assert_eq!(factory.get(handle).unwrap().id(), 1);
        let crate_handle = factory.find_handle("MapOnlyCrate").unwrap();
        assert_eq!(factory.len(), 2);

        factory.reset();
        assert_eq!(factory.find_template("Tank").unwrap().build_cost, 900);
        assert_eq!(factory.override_count(handle), 0);
        assert!(factory.find_template("MapOnlyCrate").is_none());
        assert!(factory.get(crate_handle).is_none());
        assert_eq!(factory.len(), 1);
    }
}
