//! The ordered list of modules of one kind attached to a template, and the rules for how newly
//! declared modules displace the ones a template was copied with.
use std::slice;

use kindof::{KindOf, KindOfMask};
use super::{ModuleData, ModuleInterface};


/// Tag the default object template gives its auto-heal behavior.  Untrainable objects drop it even
/// though it's inheritable.
pub const DEFAULT_AUTOHEAL_TAG: &'static str = "ModuleTag_DefaultAutoHealBehavior";

/// Templates with any of these never keep an overrideable-by-like-kind default
const LIKE_KIND_DISALLOWED: &'static [KindOf] = &[
    KindOf::AIRCRAFT,
    KindOf::SHRUBBERY,
    KindOf::STRUCTURE,
    KindOf::BRIDGE,
    KindOf::BRIDGE_TOWER,
    KindOf::PROJECTILE,
    KindOf::DRONE,
];

/// ...and templates need at least one of these to keep it
const LIKE_KIND_CANDIDATES: &'static [KindOf] = &[
    KindOf::SCORE,
    KindOf::VEHICLE,
    KindOf::INFANTRY,
    KindOf::PORTABLE_STRUCTURE,
];


/// One module declaration attached to a template.
#[derive(Clone, Debug)]
pub struct ModuleNugget {
    class_name: String,
    tag: String,
    data: Box<dyn ModuleData>,
    interface_mask: ModuleInterface,
    inheritable: bool,
    overrideable_by_like_kind: bool,
    copied_from_default: bool,
}

impl ModuleNugget {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn data(&self) -> &dyn ModuleData {
        &*self.data
    }

    pub fn interface_mask(&self) -> ModuleInterface {
        self.interface_mask
    }

    pub fn is_inheritable(&self) -> bool {
        self.inheritable
    }

    pub fn is_overrideable_by_like_kind(&self) -> bool {
        self.overrideable_by_like_kind
    }

    pub fn is_copied_from_default(&self) -> bool {
        self.copied_from_default
    }
}

/// What the default-clearing rules need to know about the template that owns a ledger
#[derive(Copy, Clone, Debug)]
pub struct TemplateProfile<'a> {
    pub kind_of: &'a KindOfMask,
    pub is_trainable: bool,
}


/// All the modules of one kind on one template, in declaration order.  Order matters: it's the
/// order the runtime creates and runs them in.
#[derive(Clone, Debug, Default)]
pub struct ModuleInfo {
    nuggets: Vec<ModuleNugget>,
}

impl ModuleInfo {
    pub fn new() -> Self {
        ModuleInfo { nuggets: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nuggets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nuggets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ModuleNugget> {
        self.nuggets.get(index)
    }

    pub fn iter(&self) -> slice::Iter<ModuleNugget> {
        self.nuggets.iter()
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&ModuleNugget> {
        self.nuggets.iter().find(|nugget| nugget.tag == tag)
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.find_by_tag(tag).is_some()
    }

    /// Append a module.  Tag uniqueness spans all three of a template's ledgers, so the template
    /// checks that before calling this.
    pub fn add_module_info(
        &mut self,
        class_name: &str,
        tag: &str,
        data: Box<dyn ModuleData>,
        interface_mask: ModuleInterface,
        inheritable: bool,
        overrideable_by_like_kind: bool,
    ) {
        debug_assert!(!(inheritable && overrideable_by_like_kind));

        // Only one AI per template, and the newest one wins
        if data.is_ai_module_data() {
            self.clear_ai_module_info();
        }

        trace!("adding module {} ({})", class_name, tag);
        self.nuggets.push(ModuleNugget {
            class_name: class_name.to_owned(),
            tag: tag.to_owned(),
            data,
            interface_mask,
            inheritable,
            overrideable_by_like_kind,
            copied_from_default: false,
        });
    }

    /// Drop the copied-from-default modules that a newly declared module with `interface_mask`
    /// supersedes.  Returns whether anything was dropped.
    pub fn clear_copied_from_default_entries(&mut self, interface_mask: ModuleInterface, new_class_name: &str, template: TemplateProfile) -> bool {
        let before = self.nuggets.len();
        self.nuggets.retain(|nugget| {
            if !nugget.copied_from_default || !nugget.interface_mask.intersects(interface_mask) {
                return true;
            }

            let keep =
                if nugget.inheritable {
                    !(nugget.tag == DEFAULT_AUTOHEAL_TAG && !template.is_trainable)
                }
                else if nugget.overrideable_by_like_kind {
                    !(nugget.class_name == new_class_name
                        || template.kind_of.contains_any(LIKE_KIND_DISALLOWED)
                        || !template.kind_of.contains_any(LIKE_KIND_CANDIDATES))
                }
                else {
                    false
                }
            ;
            if !keep {
                trace!("dropping default module {} ({}) in favor of {}", nugget.class_name, nugget.tag, new_class_name);
            }
            keep
        });
        self.nuggets.len() != before
    }

    /// Remove the module with the given tag, returning its class name.  A miss isn't an error
    /// here; the caller decides whether it should be.
    pub fn clear_module_data_with_tag(&mut self, tag: &str) -> Option<String> {
        let index = self.nuggets.iter().position(|nugget| nugget.tag == tag)?;
        let nugget = self.nuggets.remove(index);
        Some(nugget.class_name)
    }

    /// Remove every AI module.  Returns whether there were any.
    pub fn clear_ai_module_info(&mut self) -> bool {
        let before = self.nuggets.len();
        self.nuggets.retain(|nugget| !nugget.data.is_ai_module_data());
        self.nuggets.len() != before
    }

    /// Mark every module currently present as (not) inherited wholesale from another template
    pub fn set_copied_from_default(&mut self, copied: bool) {
        for nugget in &mut self.nuggets {
            nugget.copied_from_default = copied;
        }
    }

    /// True if anything here still came from a parent or default template
    pub fn is_copied_from_default(&self) -> bool {
        self.nuggets.iter().any(|nugget| nugget.copied_from_default)
    }

    pub fn clear(&mut self) {
        self.nuggets.clear();
    }
}

impl<'a> IntoIterator for &'a ModuleInfo {
    type Item = &'a ModuleNugget;
    type IntoIter = slice::Iter<'a, ModuleNugget>;

    fn into_iter(self) -> Self::IntoIter {
        self.nuggets.iter()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use kindof::{KindOf, KindOfMask};
    use module::builtin::{AIUpdateModuleData, ActiveBodyModuleData, EmptyModuleData};

    fn body() -> Box<dyn ModuleData> {
        Box::new(ActiveBodyModuleData::default())
    }

    fn ai() -> Box<dyn ModuleData> {
        Box::new(AIUpdateModuleData::default())
    }

    fn tags(info: &ModuleInfo) -> Vec<&str> {
        info.iter().map(ModuleNugget::tag).collect()
    }

    fn profile(kind_of: &KindOfMask, is_trainable: bool) -> TemplateProfile {
        TemplateProfile { kind_of, is_trainable }
    }

    #[test]
    fn keeps_declaration_order() {
        let mut info = ModuleInfo::new();
        info.add_module_info("ActiveBody", "Tag_1", body(), ModuleInterface::BODY, false, false);
        info.add_module_info("DestroyDie", "Tag_2", Box::new(EmptyModuleData), ModuleInterface::DIE, false, false);
        info.add_module_info("SquishCollide", "Tag_3", Box::new(EmptyModuleData), ModuleInterface::COLLIDE, false, false);
        assert_eq!(tags(&info), vec!["Tag_1", "Tag_2", "Tag_3"]);
        assert_eq!(info.find_by_tag("Tag_2").unwrap().class_name(), "DestroyDie");
    }

    #[test]
    fn newest_ai_wins() {
        let mut info = ModuleInfo::new();
        info.add_module_info("AIUpdateInterface", "Tag_AI1", ai(), ModuleInterface::UPDATE, false, false);
        info.add_module_info("ActiveBody", "Tag_Body", body(), ModuleInterface::BODY, false, false);
        info.add_module_info("TransportAIUpdate", "Tag_AI2", ai(), ModuleInterface::UPDATE, false, false);
        assert_eq!(tags(&info), vec!["Tag_Body", "Tag_AI2"]);
        assert_eq!(info.iter().filter(|n| n.data().is_ai_module_data()).count(), 1);

        assert!(info.clear_ai_module_info());
        assert!(!info.clear_ai_module_info());
        assert_eq!(tags(&info), vec!["Tag_Body"]);
    }

    #[test]
    fn clear_by_tag() {
        let mut info = ModuleInfo::new();
        info.add_module_info("ActiveBody", "Tag_Body", body(), ModuleInterface::BODY, false, false);
        assert_eq!(info.clear_module_data_with_tag("Tag_Nope"), None);
        assert_eq!(info.clear_module_data_with_tag("Tag_Body"), Some("ActiveBody".to_owned()));
        assert!(info.is_empty());
    }

    #[test]
    fn plain_defaults_are_dropped() {
        let kind_of = KindOfMask::from_kinds(&[KindOf::VEHICLE]);
        let mut info = ModuleInfo::new();
        info.add_module_info("ActiveBody", "Tag_Body", body(), ModuleInterface::BODY, false, false);
        info.add_module_info("DestroyDie", "Tag_Die", Box::new(EmptyModuleData), ModuleInterface::DIE, false, false);
        info.set_copied_from_default(true);
        assert!(info.is_copied_from_default());

        // Doesn't overlap anything
        assert!(!info.clear_copied_from_default_entries(ModuleInterface::COLLIDE, "SquishCollide", profile(&kind_of, true)));
        assert!(info.clear_copied_from_default_entries(ModuleInterface::BODY, "StructureBody", profile(&kind_of, true)));
        assert_eq!(tags(&info), vec!["Tag_Die"]);
    }

    #[test]
    fn explicit_modules_are_never_cleared() {
        let kind_of = KindOfMask::new();
        let mut info = ModuleInfo::new();
        info.add_module_info("ActiveBody", "Tag_Body", body(), ModuleInterface::BODY, false, false);
        assert!(!info.clear_copied_from_default_entries(ModuleInterface::BODY, "ActiveBody", profile(&kind_of, true)));
        assert_eq!(info.len(), 1);
    }

    #[test]
    fn inheritable_defaults_survive() {
        let kind_of = KindOfMask::from_kinds(&[KindOf::INFANTRY]);
        let heal = ModuleInterface::UPDATE | ModuleInterface::DAMAGE;
        let mut info = ModuleInfo::new();
        info.add_module_info("AutoHealBehavior", "Tag_Heal", Box::new(EmptyModuleData), heal, true, false);
        info.add_module_info("AutoHealBehavior", DEFAULT_AUTOHEAL_TAG, Box::new(EmptyModuleData), heal, true, false);
        info.set_copied_from_default(true);

        assert!(!info.clear_copied_from_default_entries(ModuleInterface::UPDATE, "PhysicsBehavior", profile(&kind_of, true)));
        assert_eq!(info.len(), 2);

        // ...except the default auto-heal on something that can't be trained
        assert!(info.clear_copied_from_default_entries(ModuleInterface::UPDATE, "PhysicsBehavior", profile(&kind_of, false)));
        assert_eq!(tags(&info), vec!["Tag_Heal"]);
    }

    #[test]
    fn like_kind_defaults() {
        let vehicle = KindOfMask::from_kinds(&[KindOf::VEHICLE]);
        let aircraft = KindOfMask::from_kinds(&[KindOf::VEHICLE, KindOf::AIRCRAFT]);
        let plain = KindOfMask::from_kinds(&[KindOf::SELECTABLE]);
        let make = || {
            let mut info = ModuleInfo::new();
            info.add_module_info("ExperienceScalarUpgrade", "Tag_XP", Box::new(EmptyModuleData), ModuleInterface::UPGRADE, false, true);
            info.set_copied_from_default(true);
            info
        };

        // Different class on an eligible template: kept
        let mut info = make();
        assert!(!info.clear_copied_from_default_entries(ModuleInterface::UPGRADE, "SomeOtherUpgrade", profile(&vehicle, true)));
        assert_eq!(info.len(), 1);

        // Same class: replaced
        let mut info = make();
        assert!(info.clear_copied_from_default_entries(ModuleInterface::UPGRADE, "ExperienceScalarUpgrade", profile(&vehicle, true)));

        // Disallowed kind
        let mut info = make();
        assert!(info.clear_copied_from_default_entries(ModuleInterface::UPGRADE, "SomeOtherUpgrade", profile(&aircraft, true)));

        // Not a candidate kind at all
        let mut info = make();
        assert!(info.clear_copied_from_default_entries(ModuleInterface::UPGRADE, "SomeOtherUpgrade", profile(&plain, true)));
    }
}
