//! Object templates: everything the game knows about a kind of unit, building or effect before
//! any instance of it exists.
pub mod factory;
pub mod parser;
pub mod sets;

use std::fmt;

use errors::{ErrorKind, Result};
use kindof::{KindOf, KindOfMask};
use module::{ModuleInterface, ModuleKind};
use module::info::{ModuleInfo, TemplateProfile};
use parse::{FieldTable, IniReader, RgbColor};
use util::eq_ignore_case;
use self::sets::{ArmorTemplateSet, ProductionPrerequisite, WeaponTemplateSet, parse_prerequisites};

pub use self::factory::ThingFactory;
pub use self::parser::{ModuleParseMode, TemplateParser};


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditorSorting {
    None,
    MiscManMade,
    MiscNatural,
    Debris,
    Nature,
    Structure,
    Infantry,
    Vehicle,
    Shrubbery,
    Audio,
    Road,
    System,
}

const EDITOR_SORTING_NAMES: &'static [&'static str] = &[
    "NONE", "MISC_MAN_MADE", "MISC_NATURAL", "DEBRIS", "NATURE", "STRUCTURE", "INFANTRY", "VEHICLE",
    "SHRUBBERY", "AUDIO", "ROAD", "SYSTEM",
];

const ALL_EDITOR_SORTINGS: &'static [EditorSorting] = &[
    EditorSorting::None, EditorSorting::MiscManMade, EditorSorting::MiscNatural,
    EditorSorting::Debris, EditorSorting::Nature, EditorSorting::Structure,
    EditorSorting::Infantry, EditorSorting::Vehicle, EditorSorting::Shrubbery,
    EditorSorting::Audio, EditorSorting::Road, EditorSorting::System,
];

impl Default for EditorSorting {
    fn default() -> Self {
        EditorSorting::None
    }
}


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Buildable {
    Yes,
    IgnorePrerequisites,
    No,
    OnlyByAi,
}

const BUILDABLE_NAMES: &'static [&'static str] = &["Yes", "Ignore_Prerequisites", "No", "Only_By_AI"];

impl Default for Buildable {
    fn default() -> Self {
        Buildable::Yes
    }
}


/// How many of this object one player may have at once
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaxSimultaneous {
    /// Zero means no limit
    Count(u32),
    /// Taken from the game's superweapon restriction setting at match start
    DeterminedBySuperweaponRestriction,
}

impl Default for MaxSimultaneous {
    fn default() -> Self {
        MaxSimultaneous::Count(0)
    }
}

impl fmt::Display for MaxSimultaneous {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MaxSimultaneous::Count(0) => f.write_str("unlimited"),
            MaxSimultaneous::Count(n) => write!(f, "{}", n),
            MaxSimultaneous::DeterminedBySuperweaponRestriction => f.write_str("superweapon restriction"),
        }
    }
}


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GeometryType {
    Sphere,
    Cylinder,
    Box,
}

const GEOMETRY_TYPE_NAMES: &'static [&'static str] = &["SPHERE", "CYLINDER", "BOX"];

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeometryInfo {
    pub kind: GeometryType,
    pub is_small: bool,
    pub major_radius: f32,
    pub minor_radius: f32,
    pub height: f32,
}

impl Default for GeometryInfo {
    fn default() -> Self {
        GeometryInfo {
            kind: GeometryType::Sphere,
            is_small: false,
            major_radius: 1.0,
            minor_radius: 1.0,
            height: 1.0,
        }
    }
}

impl GeometryInfo {
    /// Radius of a circle on the ground that contains the whole footprint
    pub fn bounding_circle_radius(&self) -> f32 {
        match self.kind {
            GeometryType::Sphere | GeometryType::Cylinder => self.major_radius,
            GeometryType::Box => self.major_radius.hypot(self.minor_radius),
        }
    }
}


/// Audio events a template refers to by name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateAudio {
    pub voice_select: Option<String>,
    pub voice_move: Option<String>,
    pub voice_attack: Option<String>,
    pub sound_ambient: Option<String>,
    pub sound_die: Option<String>,
}

impl TemplateAudio {
    /// (field name, event name) for each slot that's filled in
    pub fn events(&self) -> Vec<(&'static str, &str)> {
        let slots = [
            ("VoiceSelect", &self.voice_select),
            ("VoiceMove", &self.voice_move),
            ("VoiceAttack", &self.voice_attack),
            ("SoundAmbient", &self.sound_ambient),
            ("SoundDie", &self.sound_die),
        ];
        slots.iter()
            .filter_map(|&(field, event)| event.as_ref().map(|name| (field, name.as_str())))
            .collect()
    }
}


/// Experience levels, indexed by `VeterancyLevel`
pub const VETERANCY_LEVEL_COUNT: usize = 4;


/// Problems with a template that the engine tolerates but are almost certainly mistakes
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    StructureNotImmobile,
    ShrubberyNotImmobile,
    /// Field name and event name
    UnknownAudioEvent(&'static str, String),
    /// How many body modules there are
    MultipleBodyModules(usize),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Diagnostic::StructureNotImmobile => f.write_str("structure is not IMMOBILE"),
            Diagnostic::ShrubberyNotImmobile => f.write_str("shrubbery is not IMMOBILE"),
            Diagnostic::UnknownAudioEvent(field, ref name) => write!(f, "{} refers to unknown audio event '{}'", field, name),
            Diagnostic::MultipleBodyModules(count) => write!(f, "has {} body modules; only one is used", count),
        }
    }
}


#[derive(Clone, Debug)]
pub struct ThingTemplate {
    name: String,
    id: u32,
    reskinned_from: Option<String>,

    behavior_modules: ModuleInfo,
    draw_modules: ModuleInfo,
    client_update_modules: ModuleInfo,

    pub display_name: Option<String>,
    pub side: Option<String>,
    pub editor_sorting: EditorSorting,
    pub kind_of: KindOfMask,
    pub build_cost: u32,
    /// Seconds
    pub build_time: f32,
    pub refund_value: u32,
    pub energy_production: i32,
    pub is_trainable: bool,
    pub is_prerequisite: bool,
    pub is_forbidden: bool,
    pub buildable: Buildable,
    pub vision_range: f32,
    pub shroud_clearing_range: f32,
    pub transport_slot_count: u32,
    pub max_simultaneous: MaxSimultaneous,
    pub command_set: Option<String>,
    pub experience_value: [u32; VETERANCY_LEVEL_COUNT],
    pub experience_required: [u32; VETERANCY_LEVEL_COUNT],
    pub build_variations: Vec<String>,
    pub display_color: Option<RgbColor>,
    pub geometry: GeometryInfo,
    pub audio: TemplateAudio,
    pub prerequisites: Vec<ProductionPrerequisite>,

    armor_sets: Vec<ArmorTemplateSet>,
    weapon_sets: Vec<WeaponTemplateSet>,
    // Inherited sets are thrown away wholesale on the first set declared here
    armor_sets_copied_from_default: bool,
    weapon_sets_copied_from_default: bool,
}

impl ThingTemplate {
    pub fn new<S: Into<String>>(name: S, id: u32) -> Self {
        ThingTemplate {
            name: name.into(),
            id,
            reskinned_from: None,

            behavior_modules: ModuleInfo::new(),
            draw_modules: ModuleInfo::new(),
            client_update_modules: ModuleInfo::new(),

            display_name: None,
            side: None,
            editor_sorting: EditorSorting::default(),
            kind_of: KindOfMask::new(),
            build_cost: 0,
            build_time: 1.0,
            refund_value: 0,
            energy_production: 0,
            is_trainable: false,
            is_prerequisite: false,
            is_forbidden: false,
            buildable: Buildable::default(),
            vision_range: 0.0,
            shroud_clearing_range: -1.0,
            transport_slot_count: 0,
            max_simultaneous: MaxSimultaneous::default(),
            command_set: None,
            experience_value: [0; VETERANCY_LEVEL_COUNT],
            experience_required: [0; VETERANCY_LEVEL_COUNT],
            build_variations: Vec::new(),
            display_color: None,
            geometry: GeometryInfo::default(),
            audio: TemplateAudio::default(),
            prerequisites: Vec::new(),

            armor_sets: Vec::new(),
            weapon_sets: Vec::new(),
            armor_sets_copied_from_default: false,
            weapon_sets_copied_from_default: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// For `ObjectReskin` templates, the template whose definition was reused
    pub fn reskinned_from(&self) -> Option<&str> {
        self.reskinned_from.as_ref().map(String::as_str)
    }

    pub fn set_reskinned_from<S: Into<String>>(&mut self, original: S) {
        self.reskinned_from = Some(original.into());
    }

    /// Take on everything about `other` except for identity: the name and id stay put
    pub fn copy_from(&mut self, other: &ThingTemplate) {
        let name = ::std::mem::replace(&mut self.name, String::new());
        let id = self.id;
        *self = other.clone();
        self.name = name;
        self.id = id;
    }

    /// Mark (or unmark) every module and set as inherited from another template, so that the
    /// first local declaration of the same kind displaces it
    pub fn set_copied_from_default(&mut self, copied: bool) {
        self.behavior_modules.set_copied_from_default(copied);
        self.draw_modules.set_copied_from_default(copied);
        self.client_update_modules.set_copied_from_default(copied);
        self.armor_sets_copied_from_default = copied;
        self.weapon_sets_copied_from_default = copied;
    }

    pub fn modules(&self, kind: ModuleKind) -> &ModuleInfo {
        match kind {
            ModuleKind::Behavior => &self.behavior_modules,
            ModuleKind::Draw => &self.draw_modules,
            ModuleKind::ClientUpdate => &self.client_update_modules,
        }
    }

    pub fn modules_mut(&mut self, kind: ModuleKind) -> &mut ModuleInfo {
        match kind {
            ModuleKind::Behavior => &mut self.behavior_modules,
            ModuleKind::Draw => &mut self.draw_modules,
            ModuleKind::ClientUpdate => &mut self.client_update_modules,
        }
    }

    pub fn behavior_modules(&self) -> &ModuleInfo {
        &self.behavior_modules
    }

    pub fn draw_modules(&self) -> &ModuleInfo {
        &self.draw_modules
    }

    pub fn client_update_modules(&self) -> &ModuleInfo {
        &self.client_update_modules
    }

    /// Which ledger, if any, holds a module with this tag
    pub fn find_module_tag(&self, tag: &str) -> Option<ModuleKind> {
        [ModuleKind::Behavior, ModuleKind::Draw, ModuleKind::ClientUpdate].iter()
            .cloned()
            .find(|&kind| self.modules(kind).contains_tag(tag))
    }

    /// Remove a module by tag from whichever ledger has it, returning its kind and class name
    pub fn remove_module_with_tag(&mut self, tag: &str) -> Option<(ModuleKind, String)> {
        let kind = self.find_module_tag(tag)?;
        self.modules_mut(kind).clear_module_data_with_tag(tag).map(|class_name| (kind, class_name))
    }

    /// Drop the inherited modules, in every ledger, that a newly declared `class_name` module
    /// supersedes.  A class's interfaces can span kinds, so all three ledgers are checked.
    pub fn clear_copied_from_default_modules(&mut self, interface_mask: ModuleInterface, class_name: &str) -> bool {
        let profile = TemplateProfile {
            kind_of: &self.kind_of,
            is_trainable: self.is_trainable,
        };
        let behaviors = self.behavior_modules.clear_copied_from_default_entries(interface_mask, class_name, profile);
        let draws = self.draw_modules.clear_copied_from_default_entries(interface_mask, class_name, profile);
        let client_updates = self.client_update_modules.clear_copied_from_default_entries(interface_mask, class_name, profile);
        behaviors || draws || client_updates
    }

    pub fn is_kind_of(&self, kind: KindOf) -> bool {
        self.kind_of.contains(kind)
    }

    pub fn armor_sets(&self) -> &[ArmorTemplateSet] {
        &self.armor_sets
    }

    pub fn weapon_sets(&self) -> &[WeaponTemplateSet] {
        &self.weapon_sets
    }

    pub fn add_armor_set(&mut self, set: ArmorTemplateSet) -> Result<()> {
        if self.armor_sets_copied_from_default {
            self.armor_sets.clear();
            self.armor_sets_copied_from_default = false;
        }
        if self.armor_sets.iter().any(|existing| existing.conditions == set.conditions) {
            bail!(ErrorKind::DuplicateSetConditions("ArmorSet", format!("{:?}", set.conditions)));
        }
        self.armor_sets.push(set);
        Ok(())
    }

    pub fn add_weapon_set(&mut self, set: WeaponTemplateSet) -> Result<()> {
        if self.weapon_sets_copied_from_default {
            self.weapon_sets.clear();
            self.weapon_sets_copied_from_default = false;
        }
        if self.weapon_sets.iter().any(|existing| existing.conditions == set.conditions) {
            bail!(ErrorKind::DuplicateSetConditions("WeaponSet", format!("{:?}", set.conditions)));
        }
        self.weapon_sets.push(set);
        Ok(())
    }

    /// Build time in logic frames
    pub fn build_time_frames(&self) -> u32 {
        (self.build_time * ::upgrade::LOGIC_FRAMES_PER_SECOND as f32).ceil().max(0.0) as u32
    }

    /// Soft problems with this template.  `is_known_audio` says whether an audio event name
    /// resolves; pass `|_| true` when no audio definitions were loaded.
    pub fn diagnose<F: Fn(&str) -> bool>(&self, is_known_audio: F) -> Vec<Diagnostic> {
        let mut ret = vec![];
        let immobile = self.is_kind_of(KindOf::IMMOBILE);
        if self.is_kind_of(KindOf::STRUCTURE) && !immobile {
            ret.push(Diagnostic::StructureNotImmobile);
        }
        if self.is_kind_of(KindOf::SHRUBBERY) && !immobile {
            ret.push(Diagnostic::ShrubberyNotImmobile);
        }
        for (field, event) in self.audio.events() {
            if !eq_ignore_case(event, "NoSound") && !is_known_audio(event) {
                ret.push(Diagnostic::UnknownAudioEvent(field, event.to_owned()));
            }
        }
        let bodies = self.behavior_modules.iter()
            .filter(|nugget| nugget.interface_mask().contains(ModuleInterface::BODY))
            .count();
        if bodies > 1 {
            ret.push(Diagnostic::MultipleBodyModules(bodies));
        }
        ret
    }

    /// Parse the ordinary (non-module) field named `field`.  Returns false if there's no such field.
    pub fn parse_field(&mut self, ini: &mut IniReader, field: &str) -> Result<bool> {
        match TEMPLATE_FIELDS.iter().find(|&&(name, _)| eq_ignore_case(name, field)) {
            Some(&(_, parser)) => {
                parser(ini, self)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}


// Field parsers

fn parse_display_name(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.display_name = Some(ini.parse_string()?);
    Ok(())
}

fn parse_side(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.side = Some(ini.parse_string()?);
    Ok(())
}

fn parse_editor_sorting(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    let token = ini.expect_token("an editor sorting")?;
    match IniReader::scan_index_of(token, EDITOR_SORTING_NAMES) {
        Ok(index) => template.editor_sorting = ALL_EDITOR_SORTINGS[index],
        Err(_) => bail!(ErrorKind::UnknownName("editor sorting", token.to_owned())),
    }
    Ok(())
}

fn parse_kind_of(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    KindOfMask::parse(ini, &mut template.kind_of)
}

fn parse_build_cost(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.build_cost = ini.parse_unsigned()?;
    Ok(())
}

fn parse_build_time(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.build_time = ini.parse_real()?;
    Ok(())
}

fn parse_refund_value(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.refund_value = ini.parse_unsigned()?;
    Ok(())
}

fn parse_energy_production(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.energy_production = ini.parse_int()?;
    Ok(())
}

fn parse_is_trainable(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.is_trainable = ini.parse_bool()?;
    Ok(())
}

fn parse_is_prerequisite(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.is_prerequisite = ini.parse_bool()?;
    Ok(())
}

fn parse_is_forbidden(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.is_forbidden = ini.parse_bool()?;
    Ok(())
}

/// `Buildable = Yes`, `No`, `Ignore_Prerequisites` or `Only_By_AI`
fn parse_buildable(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    let token = ini.expect_token("a buildable status")?;
    template.buildable = match IniReader::scan_index_of(token, BUILDABLE_NAMES) {
        Ok(0) => Buildable::Yes,
        Ok(1) => Buildable::IgnorePrerequisites,
        Ok(2) => Buildable::No,
        Ok(_) => Buildable::OnlyByAi,
        Err(_) => match IniReader::scan_bool(token) {
            Ok(true) => Buildable::Yes,
            Ok(false) => Buildable::No,
            Err(_) => bail!(ErrorKind::UnknownName("buildable status", token.to_owned())),
        },
    };
    Ok(())
}

fn parse_vision_range(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.vision_range = ini.parse_real()?;
    Ok(())
}

fn parse_shroud_clearing_range(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.shroud_clearing_range = ini.parse_real()?;
    Ok(())
}

fn parse_transport_slot_count(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.transport_slot_count = ini.parse_unsigned()?;
    Ok(())
}

fn parse_max_simultaneous(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    let token = ini.expect_token("a count")?;
    template.max_simultaneous =
        if eq_ignore_case(token, "DeterminedBySuperweaponRestriction") {
            MaxSimultaneous::DeterminedBySuperweaponRestriction
        }
        else {
            MaxSimultaneous::Count(IniReader::scan_unsigned(token)?)
        };
    Ok(())
}

fn parse_command_set(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.command_set = Some(ini.parse_string()?);
    Ok(())
}

/// One value per veterancy level; missing trailing values are left alone
fn parse_veterancy_values(ini: &mut IniReader, values: &mut [u32; VETERANCY_LEVEL_COUNT]) -> Result<()> {
    for value in values.iter_mut() {
        match ini.next_token_or_none() {
            Some(token) => *value = IniReader::scan_unsigned(token)?,
            None => break,
        }
    }
    Ok(())
}

fn parse_experience_value(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    parse_veterancy_values(ini, &mut template.experience_value)
}

fn parse_experience_required(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    parse_veterancy_values(ini, &mut template.experience_required)
}

fn parse_build_variations(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.build_variations = ini.parse_string_list();
    Ok(())
}

fn parse_display_color(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.display_color = Some(ini.parse_rgb_color()?);
    Ok(())
}

fn parse_geometry(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    let token = ini.expect_token("a geometry type")?;
    template.geometry.kind = match IniReader::scan_index_of(token, GEOMETRY_TYPE_NAMES) {
        Ok(0) => GeometryType::Sphere,
        Ok(1) => GeometryType::Cylinder,
        Ok(_) => GeometryType::Box,
        Err(_) => bail!(ErrorKind::UnknownName("geometry type", token.to_owned())),
    };
    Ok(())
}

fn parse_geometry_major_radius(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.geometry.major_radius = ini.parse_real()?;
    Ok(())
}

fn parse_geometry_minor_radius(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.geometry.minor_radius = ini.parse_real()?;
    Ok(())
}

fn parse_geometry_height(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.geometry.height = ini.parse_real()?;
    Ok(())
}

fn parse_geometry_is_small(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.geometry.is_small = ini.parse_bool()?;
    Ok(())
}

fn parse_audio_event(ini: &mut IniReader) -> Result<Option<String>> {
    Ok(Some(ini.parse_string()?))
}

fn parse_voice_select(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.audio.voice_select = parse_audio_event(ini)?;
    Ok(())
}

fn parse_voice_move(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.audio.voice_move = parse_audio_event(ini)?;
    Ok(())
}

fn parse_voice_attack(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.audio.voice_attack = parse_audio_event(ini)?;
    Ok(())
}

fn parse_sound_ambient(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.audio.sound_ambient = parse_audio_event(ini)?;
    Ok(())
}

fn parse_sound_die(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.audio.sound_die = parse_audio_event(ini)?;
    Ok(())
}

fn parse_armor_set(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    let set = ArmorTemplateSet::parse(ini)?;
    template.add_armor_set(set)
}

fn parse_weapon_set(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    let set = WeaponTemplateSet::parse(ini)?;
    template.add_weapon_set(set)
}

fn parse_prerequisites_field(ini: &mut IniReader, template: &mut ThingTemplate) -> Result<()> {
    template.prerequisites = parse_prerequisites(ini)?;
    Ok(())
}

const TEMPLATE_FIELDS: &'static FieldTable<ThingTemplate> = &[
    ("DisplayName", parse_display_name),
    ("Side", parse_side),
    ("EditorSorting", parse_editor_sorting),
    ("KindOf", parse_kind_of),
    ("BuildCost", parse_build_cost),
    ("BuildTime", parse_build_time),
    ("RefundValue", parse_refund_value),
    ("EnergyProduction", parse_energy_production),
    ("IsTrainable", parse_is_trainable),
    ("IsPrerequisite", parse_is_prerequisite),
    ("IsForbidden", parse_is_forbidden),
    ("Buildable", parse_buildable),
    ("VisionRange", parse_vision_range),
    ("ShroudClearingRange", parse_shroud_clearing_range),
    ("TransportSlotCount", parse_transport_slot_count),
    ("MaxSimultaneousOfType", parse_max_simultaneous),
    ("CommandSet", parse_command_set),
    ("ExperienceValue", parse_experience_value),
    ("ExperienceRequired", parse_experience_required),
    ("BuildVariations", parse_build_variations),
    ("DisplayColor", parse_display_color),
    ("Geometry", parse_geometry),
    ("GeometryMajorRadius", parse_geometry_major_radius),
    ("GeometryMinorRadius", parse_geometry_minor_radius),
    ("GeometryHeight", parse_geometry_height),
    ("GeometryIsSmall", parse_geometry_is_small),
    ("VoiceSelect", parse_voice_select),
    ("VoiceMove", parse_voice_move),
    ("VoiceAttack", parse_voice_attack),
    ("SoundAmbient", parse_sound_ambient),
    ("SoundDie", parse_sound_die),
    ("ArmorSet", parse_armor_set),
    ("WeaponSet", parse_weapon_set),
    ("Prerequisites", parse_prerequisites_field),
];


#[cfg(test)]
mod tests {
    use super::*;
    use parse::LoadType;
    use thing::sets::ArmorSetFlags;

    fn parse_fields(template: &mut ThingTemplate, text: &str) {
        let mut ini = IniReader::new(text, "t.ini", LoadType::Normal);
        while ini.read_line() {
            let field = ini.next_token().unwrap();
            assert!(template.parse_field(&mut ini, field).unwrap(), "no field {}", field);
        }
    }

    #[test]
    fn scalar_fields() {
        let mut template = ThingTemplate::new("AmericaTankCrusader", 1);
        parse_fields(&mut template, "
            DisplayName = OBJECT:Crusader
            BuildCost = 900
            BuildTime = 10.0
            EditorSorting = VEHICLE
            Buildable = Only_By_AI
            MaxSimultaneousOfType = DeterminedBySuperweaponRestriction
            ExperienceValue = 50 50 100 150
            Geometry = BOX
            GeometryMajorRadius = 3.0
            GeometryMinorRadius = 4.0
            DisplayColor = R:0 G:0 B:255
        ");
        assert_eq!(template.display_name, Some("OBJECT:Crusader".to_owned()));
        assert_eq!(template.build_cost, 900);
        assert_eq!(template.build_time_frames(), 300);
        assert_eq!(template.editor_sorting, EditorSorting::Vehicle);
        assert_eq!(template.buildable, Buildable::OnlyByAi);
        assert_eq!(template.max_simultaneous, MaxSimultaneous::DeterminedBySuperweaponRestriction);
        assert_eq!(template.experience_value, [50, 50, 100, 150]);
        assert_eq!(template.geometry.kind, GeometryType::Box);
        assert_eq!(template.geometry.bounding_circle_radius(), 5.0);
        assert_eq!(template.display_color, Some(RgbColor{ red: 0, green: 0, blue: 255 }));
    }

    #[test]
    fn copy_keeps_identity() {
        let mut parent = ThingTemplate::new("Parent", 3);
        parent.build_cost = 500;
        parent.kind_of.set(KindOf::VEHICLE);
        let mut child = ThingTemplate::new("Child", 9);
        child.copy_from(&parent);
        assert_eq!(child.name(), "Child");
        assert_eq!(child.id(), 9);
        assert_eq!(child.build_cost, 500);
        assert!(child.is_kind_of(KindOf::VEHICLE));
    }

    #[test]
    fn first_local_armor_set_replaces_inherited_ones() {
        let mut parent = ThingTemplate::new("Parent", 1);
        parent.add_armor_set(ArmorTemplateSet { armor: Some("Old".to_owned()), ..Default::default() }).unwrap();
        parent.add_armor_set(ArmorTemplateSet { conditions: ArmorSetFlags::PLAYER_UPGRADE, ..Default::default() }).unwrap();

        let mut child = ThingTemplate::new("Child", 2);
        child.copy_from(&parent);
        child.set_copied_from_default(true);
        assert_eq!(child.armor_sets().len(), 2);

        child.add_armor_set(ArmorTemplateSet { armor: Some("New".to_owned()), ..Default::default() }).unwrap();
        assert_eq!(child.armor_sets().len(), 1);
        assert_eq!(child.armor_sets()[0].armor, Some("New".to_owned()));

        let err = child.add_armor_set(ArmorTemplateSet::default()).unwrap_err();
        match *err.kind() {
            ErrorKind::DuplicateSetConditions("ArmorSet", _) => {}
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn prerequisites_block_replaces() {
        let mut template = ThingTemplate::new("Thing", 1);
        template.prerequisites.push(ProductionPrerequisite::Science("Stale".to_owned()));
        let mut ini = IniReader::new("Prerequisites\n  Object = AmericaBarracks\nEnd\n", "t.ini", LoadType::Normal);
        assert!(ini.read_line());
        let field = ini.next_token().unwrap();
        assert!(template.parse_field(&mut ini, field).unwrap());
        assert_eq!(template.prerequisites, vec![ProductionPrerequisite::AnyObject(vec!["AmericaBarracks".to_owned()])]);
    }

    #[test]
    fn diagnostics() {
        let mut template = ThingTemplate::new("Bunker", 1);
        template.kind_of.set(KindOf::STRUCTURE);
        template.audio.voice_select = Some("BunkerSelect".to_owned());
        template.audio.sound_die = Some("NoSound".to_owned());
        let diagnostics = template.diagnose(|name| name == "Known");
        assert_eq!(diagnostics, vec![
            Diagnostic::StructureNotImmobile,
            Diagnostic::UnknownAudioEvent("VoiceSelect", "BunkerSelect".to_owned()),
        ]);

        template.kind_of.set(KindOf::IMMOBILE);
        assert!(template.diagnose(|_| true).is_empty());
    }
}
