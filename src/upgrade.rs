//! Upgrades: research a player (or a single object) can buy.  Each upgrade owns one bit, so the set
//! of upgrades something has is just a mask.
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;

use errors::{ErrorKind, Result};
use parse::{FieldTable, IniReader, LoadType};
use util::{Handle, NameKey, NameKeyGenerator, eq_ignore_case};


pub const LOGIC_FRAMES_PER_SECOND: u32 = 30;

/// Bits in an `UpgradeMask`, and so the most upgrades there can ever be
pub const MAX_UPGRADES: usize = 128;

/// Copied into every new upgrade before its own fields are read, if it exists
pub const DEFAULT_UPGRADE: &'static str = "DefaultUpgrade";

/// Upgrades every object can earn through experience, created by `UpgradeCenter::init`
pub const VETERANCY_UPGRADES: &'static [&'static str] = &[
    "Upgrade_Veterancy_VETERAN",
    "Upgrade_Veterancy_ELITE",
    "Upgrade_Veterancy_HEROIC",
];


#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct UpgradeMask(u128);

impl UpgradeMask {
    pub fn new() -> Self {
        UpgradeMask(0)
    }

    pub fn from_bit(bit: usize) -> Self {
        debug_assert!(bit < MAX_UPGRADES);
        UpgradeMask(1 << bit)
    }

    pub fn bits(&self) -> u128 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn set(&mut self, other: UpgradeMask) {
        self.0 |= other.0;
    }

    pub fn clear(&mut self, other: UpgradeMask) {
        self.0 &= !other.0;
    }

    /// True if any bit of `other` is set here
    pub fn test_any(&self, other: UpgradeMask) -> bool {
        self.0 & other.0 != 0
    }

    /// True if every bit of `other` is set here
    pub fn test_all(&self, other: UpgradeMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(&self, other: UpgradeMask) -> UpgradeMask {
        UpgradeMask(self.0 | other.0)
    }
}

impl BitOr for UpgradeMask {
    type Output = UpgradeMask;

    fn bitor(self, other: UpgradeMask) -> UpgradeMask {
        self.union(other)
    }
}

impl fmt::Debug for UpgradeMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UpgradeMask({:#034x})", self.0)
    }
}


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpgradeType {
    /// Applies to everything the player owns
    Player,
    /// Bought for, and applies to, one object
    Object,
}

const UPGRADE_TYPE_NAMES: &'static [&'static str] = &["PLAYER", "OBJECT"];

impl fmt::Display for UpgradeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(UPGRADE_TYPE_NAMES[*self as usize])
    }
}

/// How the post-game academy screen files an upgrade
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AcademyClassify {
    None,
    UpgradeRadar,
    Superpower,
}

const ACADEMY_CLASSIFY_NAMES: &'static [&'static str] = &["ACT_NONE", "ACT_UPGRADE_RADAR", "ACT_SUPERPOWER"];


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpgradeStatus {
    InProduction,
    Complete,
}

/// One upgrade that some player or object has started or finished
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Upgrade {
    template: Handle<UpgradeTemplate>,
    status: UpgradeStatus,
}

impl Upgrade {
    pub fn new(template: Handle<UpgradeTemplate>) -> Self {
        Upgrade {
            template,
            status: UpgradeStatus::InProduction,
        }
    }

    pub fn template(&self) -> Handle<UpgradeTemplate> {
        self.template
    }

    pub fn status(&self) -> UpgradeStatus {
        self.status
    }

    pub fn set_status(&mut self, status: UpgradeStatus) {
        self.status = status;
    }
}


/// Whatever the game knows about a player's finances.  The loader never needs a real player;
/// callers that do supply their own.
pub trait PlayerEconomy {
    fn money(&self) -> u32;

    /// Multiplier on build times, from handicaps and the like
    fn build_time_scale(&self) -> f32 {
        1.0
    }

    /// Multiplier on costs
    fn cost_scale(&self) -> f32 {
        1.0
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeTemplate {
    name: String,
    name_key: NameKey,
    mask: UpgradeMask,

    pub upgrade_type: UpgradeType,
    pub display_name: Option<String>,
    /// Seconds
    pub build_time: f32,
    pub cost: u32,
    pub button_image: Option<String>,
    pub research_sound: Option<String>,
    pub unit_specific_sound: Option<String>,
    pub academy_classify: AcademyClassify,
}

impl UpgradeTemplate {
    fn new(name: &str, name_key: NameKey, mask: UpgradeMask) -> Self {
        UpgradeTemplate {
            name: name.to_owned(),
            name_key,
            mask,
            upgrade_type: UpgradeType::Player,
            display_name: None,
            build_time: 0.0,
            cost: 0,
            button_image: None,
            research_sound: None,
            unit_specific_sound: None,
            academy_classify: AcademyClassify::None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_key(&self) -> NameKey {
        self.name_key
    }

    pub fn mask(&self) -> UpgradeMask {
        self.mask
    }

    /// Take on all of `other`'s settings but keep this upgrade's identity and bit
    fn copy_settings_from(&mut self, other: &UpgradeTemplate) {
        let (name, name_key, mask) = (::std::mem::replace(&mut self.name, String::new()), self.name_key, self.mask);
        *self = other.clone();
        self.name = name;
        self.name_key = name_key;
        self.mask = mask;
    }

    /// Logic frames it takes `player` to research this
    pub fn calc_time_to_build<P: PlayerEconomy + ?Sized>(&self, player: &P) -> u32 {
        let seconds = self.build_time * player.build_time_scale();
        (seconds * LOGIC_FRAMES_PER_SECOND as f32).ceil().max(0.0) as u32
    }

    pub fn calc_cost_to_build<P: PlayerEconomy + ?Sized>(&self, player: &P) -> u32 {
        (self.cost as f32 * player.cost_scale()).round().max(0.0) as u32
    }
}

fn parse_display_name(ini: &mut IniReader, upgrade: &mut UpgradeTemplate) -> Result<()> {
    upgrade.display_name = Some(ini.parse_string()?);
    Ok(())
}

fn parse_type(ini: &mut IniReader, upgrade: &mut UpgradeTemplate) -> Result<()> {
    let token = ini.expect_token("an upgrade type")?;
    upgrade.upgrade_type = match IniReader::scan_index_of(token, UPGRADE_TYPE_NAMES) {
        Ok(0) => UpgradeType::Player,
        Ok(_) => UpgradeType::Object,
        Err(_) => bail!(ErrorKind::UnknownName("upgrade type", token.to_owned())),
    };
    Ok(())
}

fn parse_build_time(ini: &mut IniReader, upgrade: &mut UpgradeTemplate) -> Result<()> {
    upgrade.build_time = ini.parse_real()?;
    Ok(())
}

fn parse_build_cost(ini: &mut IniReader, upgrade: &mut UpgradeTemplate) -> Result<()> {
    upgrade.cost = ini.parse_unsigned()?;
    Ok(())
}

fn parse_button_image(ini: &mut IniReader, upgrade: &mut UpgradeTemplate) -> Result<()> {
    upgrade.button_image = Some(ini.parse_string()?);
    Ok(())
}

fn parse_research_sound(ini: &mut IniReader, upgrade: &mut UpgradeTemplate) -> Result<()> {
    upgrade.research_sound = Some(ini.parse_string()?);
    Ok(())
}

fn parse_unit_specific_sound(ini: &mut IniReader, upgrade: &mut UpgradeTemplate) -> Result<()> {
    upgrade.unit_specific_sound = Some(ini.parse_string()?);
    Ok(())
}

fn parse_academy_classify(ini: &mut IniReader, upgrade: &mut UpgradeTemplate) -> Result<()> {
    let token = ini.expect_token("an academy classification")?;
    upgrade.academy_classify = match IniReader::scan_index_of(token, ACADEMY_CLASSIFY_NAMES) {
        Ok(0) => AcademyClassify::None,
        Ok(1) => AcademyClassify::UpgradeRadar,
        Ok(_) => AcademyClassify::Superpower,
        Err(_) => bail!(ErrorKind::UnknownName("academy classification", token.to_owned())),
    };
    Ok(())
}

const UPGRADE_FIELDS: &'static FieldTable<UpgradeTemplate> = &[
    ("DisplayName", parse_display_name),
    ("Type", parse_type),
    ("BuildTime", parse_build_time),
    ("BuildCost", parse_build_cost),
    ("ButtonImage", parse_button_image),
    ("ResearchSound", parse_research_sound),
    ("UnitSpecificSound", parse_unit_specific_sound),
    ("AcademyClassify", parse_academy_classify),
];


struct UpgradeEntry {
    base: UpgradeTemplate,
    overrides: Vec<UpgradeTemplate>,
    created_by_override: bool,
}

impl UpgradeEntry {
    fn current(&self) -> &UpgradeTemplate {
        self.overrides.last().unwrap_or(&self.base)
    }

    fn current_mut(&mut self) -> &mut UpgradeTemplate {
        match self.overrides.last_mut() {
            Some(upgrade) => upgrade,
            None => &mut self.base,
        }
    }
}

/// Every upgrade template, in definition order.  Bits are handed out in that order too, and never
/// handed out twice, even across a `reset()`.
#[derive(Default)]
pub struct UpgradeCenter {
    entries: Vec<Option<UpgradeEntry>>,
    by_name: HashMap<String, Handle<UpgradeTemplate>>,
    by_key: HashMap<NameKey, Handle<UpgradeTemplate>>,
    name_keys: NameKeyGenerator,
    next_bit: usize,
}

impl UpgradeCenter {
    pub fn new() -> Self {
        UpgradeCenter::default()
    }

    /// Create the upgrades the engine needs no matter what the data says
    pub fn init(&mut self) -> Result<()> {
        for &name in VETERANCY_UPGRADES {
            let handle = self.new_upgrade(name, LoadType::Normal)?;
            if let Some(upgrade) = self.get_mut(handle) {
                upgrade.upgrade_type = UpgradeType::Object;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Bits handed out so far, including any whose upgrades were since reset away
    pub fn bits_used(&self) -> usize {
        self.next_bit
    }

    pub fn get(&self, handle: Handle<UpgradeTemplate>) -> Option<&UpgradeTemplate> {
        self.entries.get(handle.index()).and_then(Option::as_ref).map(UpgradeEntry::current)
    }

    pub fn get_mut(&mut self, handle: Handle<UpgradeTemplate>) -> Option<&mut UpgradeTemplate> {
        self.entries.get_mut(handle.index()).and_then(Option::as_mut).map(UpgradeEntry::current_mut)
    }

    pub fn find_handle(&self, name: &str) -> Option<Handle<UpgradeTemplate>> {
        self.by_name.get(name).cloned()
    }

    pub fn find_upgrade(&self, name: &str) -> Option<&UpgradeTemplate> {
        self.find_handle(name).and_then(|handle| self.get(handle))
    }

    pub fn find_upgrade_by_key(&self, key: NameKey) -> Option<&UpgradeTemplate> {
        self.by_key.get(&key).and_then(|&handle| self.get(handle))
    }

    /// The key of a live upgrade.  Keys are never reissued, but one whose upgrade was dropped by
    /// `reset()` isn't returned until an upgrade of that name is created again.
    pub fn find_name_key(&self, name: &str) -> Option<NameKey> {
        self.name_keys.find_key(name).filter(|key| self.by_key.contains_key(key))
    }

    /// Live upgrades in definition order, in their final form
    pub fn iter<'a>(&'a self) -> impl Iterator<Item=&'a UpgradeTemplate> + 'a {
        self.entries.iter().filter_map(|slot| slot.as_ref().map(UpgradeEntry::current))
    }

    /// Create an upgrade and give it the next free bit.  Asking for a name that already exists
    /// gets back the existing upgrade.
    pub fn new_upgrade(&mut self, name: &str, load_type: LoadType) -> Result<Handle<UpgradeTemplate>> {
        if let Some(handle) = self.find_handle(name) {
            warn!("upgrade {} already exists", name);
            return Ok(handle);
        }
        if self.next_bit >= MAX_UPGRADES {
            bail!(ErrorKind::UpgradeCapacityExhausted(name.to_owned()));
        }

        let mask = UpgradeMask::from_bit(self.next_bit);
        let name_key = self.name_keys.name_to_key(name);
        let mut upgrade = UpgradeTemplate::new(name, name_key, mask);
        if name != DEFAULT_UPGRADE {
            if let Some(default) = self.find_upgrade(DEFAULT_UPGRADE) {
                upgrade.copy_settings_from(default);
            }
        }
        debug!("new upgrade {} with bit {}", name, self.next_bit);
        self.next_bit += 1;

        let handle = Handle::from(self.entries.len());
        self.entries.push(Some(UpgradeEntry {
            base: upgrade,
            overrides: Vec::new(),
            created_by_override: load_type == LoadType::CreateOverrides,
        }));
        self.by_name.insert(name.to_owned(), handle);
        self.by_key.insert(name_key, handle);
        Ok(handle)
    }

    /// Parse `Upgrade <Name>` and its block.  The reader should be just past the `Upgrade`
    /// keyword.  Override loads layer a copy over an existing upgrade, which keeps its bit.
    pub fn parse_upgrade_definition(&mut self, ini: &mut IniReader) -> Result<Handle<UpgradeTemplate>> {
        let name = ini.expect_token("an upgrade name")?;
        let load_type = ini.load_type();
        let handle = match self.find_handle(name) {
            None => self.new_upgrade(name, load_type)?,
            Some(handle) => {
                if load_type == LoadType::CreateOverrides {
                    if let Some(entry) = self.entries.get_mut(handle.index()).and_then(Option::as_mut) {
                        let layer = entry.current().clone();
                        entry.overrides.push(layer);
                    }
                }
                else {
                    warn!("upgrade {} is defined more than once; later fields win", name);
                }
                handle
            }
        };
        match self.get_mut(handle) {
            Some(upgrade) => ini.parse_block(upgrade, UPGRADE_FIELDS, "upgrade")?,
            None => bail!(ErrorKind::UnknownName("upgrade", name.to_owned())),
        }
        Ok(handle)
    }

    pub fn can_afford_upgrade<P: PlayerEconomy + ?Sized>(&self, player: &P, upgrade: &UpgradeTemplate) -> bool {
        player.money() >= upgrade.calc_cost_to_build(player)
    }

    /// Drop everything the override files did.  Bits that override-only upgrades held stay used.
    pub fn reset(&mut self) {
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
            }
        }
        let entries = &self.entries;
        let live = |handle: &Handle<UpgradeTemplate>| entries.get(handle.index()).map_or(false, Option::is_some);
        self.by_name.retain(|_, handle| live(handle));
        self.by_key.retain(|_, handle| live(handle));
    }

    /// Mask for a whitespace-separated list of upgrade names, as used by `TriggeredBy` fields
    pub fn mask_for_names<'a, I: IntoIterator<Item=&'a str>>(&self, names: I) -> Result<UpgradeMask> {
        let mut mask = UpgradeMask::new();
        for name in names {
            match self.find_upgrade(name) {
                Some(upgrade) => mask.set(upgrade.mask()),
                None if eq_ignore_case(name, "None") => {}
                None => bail!(ErrorKind::UnknownName("upgrade", name.to_owned())),
            }
        }
        Ok(mask)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Wallet {
        money: u32,
        handicap: f32,
    }

    impl PlayerEconomy for Wallet {
        fn money(&self) -> u32 {
            self.money
        }

        fn cost_scale(&self) -> f32 {
            self.handicap
        }

        fn build_time_scale(&self) -> f32 {
            self.handicap
        }
    }

    fn load(center: &mut UpgradeCenter, text: &str, load_type: LoadType) {
        let mut ini = IniReader::new(text, "Upgrade.ini", load_type);
        while ini.read_line() {
            assert_eq!(ini.next_token().unwrap(), "Upgrade");
            center.parse_upgrade_definition(&mut ini).unwrap();
        }
    }

    #[test]
    fn bits_increase_until_exhausted() {
        let mut center = UpgradeCenter::new();
        let mut last = None;
        for i in 0..MAX_UPGRADES {
            let handle = center.new_upgrade(&format!("Upgrade_{}", i), LoadType::Normal).unwrap();
            let bits = center.get(handle).unwrap().mask().bits();
            assert_eq!(bits.count_ones(), 1);
            if let Some(previous) = last {
                assert!(bits > previous);
            }
            last = Some(bits);
        }
        let err = center.new_upgrade("Upgrade_OneTooMany", LoadType::Normal).unwrap_err();
        match *err.kind() {
            ErrorKind::UpgradeCapacityExhausted(ref name) => assert_eq!(name, "Upgrade_OneTooMany"),
            ref other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(center.len(), MAX_UPGRADES);
    }

    #[test]
    fn parses_fields_and_copies_default() {
        let mut center = UpgradeCenter::new();
        load(&mut center, "
            Upgrade DefaultUpgrade
              ButtonImage = SSDefault
            End
            Upgrade Upgrade_AmericaTOWMissile
              DisplayName = UPGRADE:TOWMissile
              Type = OBJECT
              BuildTime = 10.0
              BuildCost = 800
              ResearchSound = TOWMissileResearched
              AcademyClassify = ACT_UPGRADE_RADAR
            End
        ", LoadType::Normal);

        let tow = center.find_upgrade("Upgrade_AmericaTOWMissile").unwrap();
        assert_eq!(tow.upgrade_type, UpgradeType::Object);
        assert_eq!(tow.cost, 800);
        assert_eq!(tow.button_image, Some("SSDefault".to_owned()));
        assert_eq!(tow.academy_classify, AcademyClassify::UpgradeRadar);
        assert_eq!(tow.mask(), UpgradeMask::from_bit(1));

        let key = center.find_name_key("Upgrade_AmericaTOWMissile").unwrap();
        assert_eq!(center.find_upgrade_by_key(key).unwrap().name(), "Upgrade_AmericaTOWMissile");
    }

    #[test]
    fn costs_and_times() {
        let mut center = UpgradeCenter::new();
        load(&mut center, "Upgrade Upgrade_Flashbang\n  BuildTime = 2.5\n  BuildCost = 600\nEnd\n", LoadType::Normal);
        let upgrade = center.find_upgrade("Upgrade_Flashbang").unwrap();

        let normal = Wallet { money: 600, handicap: 1.0 };
        assert_eq!(upgrade.calc_time_to_build(&normal), 75);
        assert_eq!(upgrade.calc_cost_to_build(&normal), 600);
        assert!(center.can_afford_upgrade(&normal, upgrade));

        let handicapped = Wallet { money: 600, handicap: 1.5 };
        assert_eq!(upgrade.calc_cost_to_build(&handicapped), 900);
        assert!(!center.can_afford_upgrade(&handicapped, upgrade));
    }

    #[test]
    fn overrides_keep_bits_and_reset() {
        let mut center = UpgradeCenter::new();
        center.init().unwrap();
        assert_eq!(center.find_upgrade("Upgrade_Veterancy_ELITE").unwrap().upgrade_type, UpgradeType::Object);
        load(&mut center, "Upgrade Upgrade_Radar\n  BuildCost = 500\nEnd\n", LoadType::Normal);
        let bit = center.find_upgrade("Upgrade_Radar").unwrap().mask();

        load(&mut center, "
            Upgrade Upgrade_Radar
              BuildCost = 100
            End
            Upgrade Upgrade_MapOnly
            End
        ", LoadType::CreateOverrides);
        assert_eq!(center.find_upgrade("Upgrade_Radar").unwrap().cost, 100);
        assert_eq!(center.find_upgrade("Upgrade_Radar").unwrap().mask(), bit);
        assert_eq!(center.bits_used(), 5);

        let map_only_key = center.find_name_key("Upgrade_MapOnly").unwrap();

        center.reset();
        assert_eq!(center.find_upgrade("Upgrade_Radar").unwrap().cost, 500);
        assert!(center.find_upgrade("Upgrade_MapOnly").is_none());
        assert_eq!(center.find_name_key("Upgrade_MapOnly"), None);
        assert!(center.find_upgrade_by_key(map_only_key).is_none());
        assert!(center.find_name_key("Upgrade_Radar").is_some());
        let handle = center.new_upgrade("Upgrade_AfterReset", LoadType::Normal).unwrap();
        assert_eq!(center.get(handle).unwrap().mask(), UpgradeMask::from_bit(5));
    }

    #[test]
    fn mask_operations() {
        let a = UpgradeMask::from_bit(0);
        let b = UpgradeMask::from_bit(127);
        let both = a | b;
        assert!(both.test_any(a));
        assert!(both.test_all(a.union(b)));
        assert!(!a.test_all(both));
        assert!(!a.test_any(b));

        let mut mask = both;
        mask.clear(a);
        assert_eq!(mask, b);
        assert_eq!(both.count(), 2);
    }

    #[test]
    fn mask_from_names() {
        let mut center = UpgradeCenter::new();
        center.init().unwrap();
        let mask = center.mask_for_names(vec!["Upgrade_Veterancy_VETERAN", "Upgrade_Veterancy_HEROIC"]).unwrap();
        assert_eq!(mask, UpgradeMask::from_bit(0) | UpgradeMask::from_bit(2));
        assert!(center.mask_for_names(vec!["Upgrade_Bogus"]).is_err());
    }
}
