//! Armor and weapon sets, which pick what an object wears and shoots based on its current
//! condition flags, plus production prerequisites.
use std::fmt;

use errors::{ErrorKind, Result};
use parse::{FieldTable, IniReader};
use util::eq_ignore_case;


bitflags! {
    #[derive(Default)]
    pub struct ArmorSetFlags: u32 {
        const VETERAN = 0x01;
        const ELITE = 0x02;
        const HERO = 0x04;
        const PLAYER_UPGRADE = 0x08;
        const WEAK_VERSUS_BASEDEFENSES = 0x10;
        const SECOND_LIFE = 0x20;
        const CRATE_UPGRADE_ONE = 0x40;
        const CRATE_UPGRADE_TWO = 0x80;
    }
}

const ARMOR_SET_FLAG_NAMES: &'static [(&'static str, ArmorSetFlags)] = &[
    ("VETERAN", ArmorSetFlags::VETERAN),
    ("ELITE", ArmorSetFlags::ELITE),
    ("HERO", ArmorSetFlags::HERO),
    ("PLAYER_UPGRADE", ArmorSetFlags::PLAYER_UPGRADE),
    ("WEAK_VERSUS_BASEDEFENSES", ArmorSetFlags::WEAK_VERSUS_BASEDEFENSES),
    ("SECOND_LIFE", ArmorSetFlags::SECOND_LIFE),
    ("CRATE_UPGRADE_ONE", ArmorSetFlags::CRATE_UPGRADE_ONE),
    ("CRATE_UPGRADE_TWO", ArmorSetFlags::CRATE_UPGRADE_TWO),
];

bitflags! {
    #[derive(Default)]
    pub struct WeaponSetFlags: u32 {
        const VETERAN = 0x001;
        const ELITE = 0x002;
        const HERO = 0x004;
        const PLAYER_UPGRADE = 0x008;
        const CRATEUPGRADE_ONE = 0x010;
        const CRATEUPGRADE_TWO = 0x020;
        const VEHICLE_HIJACK = 0x040;
        const CARBOMB = 0x080;
        const MINE_CLEARING_DETAIL = 0x100;
    }
}

const WEAPON_SET_FLAG_NAMES: &'static [(&'static str, WeaponSetFlags)] = &[
    ("VETERAN", WeaponSetFlags::VETERAN),
    ("ELITE", WeaponSetFlags::ELITE),
    ("HERO", WeaponSetFlags::HERO),
    ("PLAYER_UPGRADE", WeaponSetFlags::PLAYER_UPGRADE),
    ("CRATEUPGRADE_ONE", WeaponSetFlags::CRATEUPGRADE_ONE),
    ("CRATEUPGRADE_TWO", WeaponSetFlags::CRATEUPGRADE_TWO),
    ("VEHICLE_HIJACK", WeaponSetFlags::VEHICLE_HIJACK),
    ("CARBOMB", WeaponSetFlags::CARBOMB),
    ("MINE_CLEARING_DETAIL", WeaponSetFlags::MINE_CLEARING_DETAIL),
];

/// `Conditions = VETERAN PLAYER_UPGRADE`, or `None`
fn parse_condition_flags<F>(ini: &mut IniReader, names: &[(&'static str, F)], whence: &'static str) -> Result<F>
where
    F: Copy + Default + ::std::ops::BitOrAssign,
{
    let mut flags = F::default();
    for token in ini.rest_of_line() {
        if eq_ignore_case(token, "None") {
            continue;
        }
        match names.iter().find(|&&(name, _)| eq_ignore_case(name, token)) {
            Some(&(_, flag)) => flags |= flag,
            None => bail!(ErrorKind::UnknownName(whence, token.to_owned())),
        }
    }
    Ok(flags)
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArmorTemplateSet {
    pub conditions: ArmorSetFlags,
    pub armor: Option<String>,
    pub damage_fx: Option<String>,
}

fn parse_armor_conditions(ini: &mut IniReader, set: &mut ArmorTemplateSet) -> Result<()> {
    set.conditions = parse_condition_flags(ini, ARMOR_SET_FLAG_NAMES, "armor set condition")?;
    Ok(())
}

fn parse_armor(ini: &mut IniReader, set: &mut ArmorTemplateSet) -> Result<()> {
    set.armor = Some(ini.parse_string()?);
    Ok(())
}

fn parse_damage_fx(ini: &mut IniReader, set: &mut ArmorTemplateSet) -> Result<()> {
    set.damage_fx = Some(ini.parse_string()?);
    Ok(())
}

const ARMOR_SET_FIELDS: &'static FieldTable<ArmorTemplateSet> = &[
    ("Conditions", parse_armor_conditions),
    ("Armor", parse_armor),
    ("DamageFX", parse_damage_fx),
];

impl ArmorTemplateSet {
    pub fn parse(ini: &mut IniReader) -> Result<ArmorTemplateSet> {
        let mut set = ArmorTemplateSet::default();
        ini.parse_block(&mut set, ARMOR_SET_FIELDS, "armor set")?;
        Ok(set)
    }
}


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WeaponSlot {
    Primary,
    Secondary,
    Tertiary,
}

pub const WEAPON_SLOT_COUNT: usize = 3;

const WEAPON_SLOT_NAMES: &'static [&'static str] = &["PRIMARY", "SECONDARY", "TERTIARY"];

impl WeaponSlot {
    fn from_index(index: usize) -> WeaponSlot {
        match index {
            0 => WeaponSlot::Primary,
            1 => WeaponSlot::Secondary,
            _ => WeaponSlot::Tertiary,
        }
    }

    fn parse(ini: &mut IniReader) -> Result<WeaponSlot> {
        let token = ini.expect_token("a weapon slot")?;
        match IniReader::scan_index_of(token, WEAPON_SLOT_NAMES) {
            Ok(index) => Ok(WeaponSlot::from_index(index)),
            Err(_) => bail!(ErrorKind::UnknownName("weapon slot", token.to_owned())),
        }
    }
}

impl fmt::Display for WeaponSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(WEAPON_SLOT_NAMES[*self as usize])
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeaponTemplateSet {
    pub conditions: WeaponSetFlags,
    pub weapons: [Option<String>; WEAPON_SLOT_COUNT],
    /// Per slot: who may fire it automatically (`FROM_PLAYER`, `FROM_AI`, ...)
    pub auto_choose_sources: [Vec<String>; WEAPON_SLOT_COUNT],
    /// Per slot: kind-of names the slot prefers to shoot at
    pub preferred_against: [Vec<String>; WEAPON_SLOT_COUNT],
    pub share_weapon_reload_time: bool,
}

impl WeaponTemplateSet {
    pub fn parse(ini: &mut IniReader) -> Result<WeaponTemplateSet> {
        let mut set = WeaponTemplateSet::default();
        ini.parse_block(&mut set, WEAPON_SET_FIELDS, "weapon set")?;
        Ok(set)
    }

    pub fn weapon(&self, slot: WeaponSlot) -> Option<&str> {
        self.weapons[slot as usize].as_ref().map(String::as_str)
    }
}

fn parse_weapon_conditions(ini: &mut IniReader, set: &mut WeaponTemplateSet) -> Result<()> {
    set.conditions = parse_condition_flags(ini, WEAPON_SET_FLAG_NAMES, "weapon set condition")?;
    Ok(())
}

/// `Weapon = PRIMARY CrusaderTankGun`; `None` empties the slot
fn parse_weapon(ini: &mut IniReader, set: &mut WeaponTemplateSet) -> Result<()> {
    let slot = WeaponSlot::parse(ini)?;
    let name = ini.parse_string()?;
    set.weapons[slot as usize] = if eq_ignore_case(&name, "None") { None } else { Some(name) };
    Ok(())
}

fn parse_auto_choose_sources(ini: &mut IniReader, set: &mut WeaponTemplateSet) -> Result<()> {
    let slot = WeaponSlot::parse(ini)?;
    set.auto_choose_sources[slot as usize] = ini.parse_string_list();
    Ok(())
}

fn parse_preferred_against(ini: &mut IniReader, set: &mut WeaponTemplateSet) -> Result<()> {
    let slot = WeaponSlot::parse(ini)?;
    set.preferred_against[slot as usize] = ini.parse_string_list();
    Ok(())
}

fn parse_share_weapon_reload_time(ini: &mut IniReader, set: &mut WeaponTemplateSet) -> Result<()> {
    set.share_weapon_reload_time = ini.parse_bool()?;
    Ok(())
}

const WEAPON_SET_FIELDS: &'static FieldTable<WeaponTemplateSet> = &[
    ("Conditions", parse_weapon_conditions),
    ("Weapon", parse_weapon),
    ("AutoChooseSources", parse_auto_choose_sources),
    ("PreferredAgainst", parse_preferred_against),
    ("ShareWeaponReloadTime", parse_share_weapon_reload_time),
];


/// One thing that must exist before a template can be built
#[derive(Clone, Debug, PartialEq)]
pub enum ProductionPrerequisite {
    /// The player owns at least one of these objects
    AnyObject(Vec<String>),
    Science(String),
}

fn parse_object_prerequisite(ini: &mut IniReader, list: &mut Vec<ProductionPrerequisite>) -> Result<()> {
    let names = ini.parse_string_list();
    if names.is_empty() {
        bail!(ErrorKind::MissingToken("an object name"));
    }
    list.push(ProductionPrerequisite::AnyObject(names));
    Ok(())
}

fn parse_science_prerequisite(ini: &mut IniReader, list: &mut Vec<ProductionPrerequisite>) -> Result<()> {
    let science = ini.parse_string()?;
    list.push(ProductionPrerequisite::Science(science));
    Ok(())
}

const PREREQUISITE_FIELDS: &'static FieldTable<Vec<ProductionPrerequisite>> = &[
    ("Object", parse_object_prerequisite),
    ("Science", parse_science_prerequisite),
];

/// Read a whole `Prerequisites` block.  The block replaces whatever list was there before.
pub fn parse_prerequisites(ini: &mut IniReader) -> Result<Vec<ProductionPrerequisite>> {
    let mut list = Vec::new();
    ini.parse_block(&mut list, PREREQUISITE_FIELDS, "prerequisites")?;
    Ok(list)
}


#[cfg(test)]
mod tests {
    use super::*;
    use parse::LoadType;

    #[test]
    fn weapon_set() {
        let mut ini = IniReader::new("
            Conditions = VETERAN PLAYER_UPGRADE
            Weapon = PRIMARY CrusaderTankGun
            Weapon = SECONDARY None
            AutoChooseSources = PRIMARY FROM_PLAYER FROM_AI
          End
        ", "t.ini", LoadType::Normal);
        let set = WeaponTemplateSet::parse(&mut ini).unwrap();
        assert_eq!(set.conditions, WeaponSetFlags::VETERAN | WeaponSetFlags::PLAYER_UPGRADE);
        assert_eq!(set.weapon(WeaponSlot::Primary), Some("CrusaderTankGun"));
        assert_eq!(set.weapon(WeaponSlot::Secondary), None);
        assert_eq!(set.auto_choose_sources[0], vec!["FROM_PLAYER", "FROM_AI"]);
    }

    #[test]
    fn armor_set_none_conditions() {
        let mut ini = IniReader::new("Conditions = None\nArmor = TankArmor\nEnd\n", "t.ini", LoadType::Normal);
        let set = ArmorTemplateSet::parse(&mut ini).unwrap();
        assert!(set.conditions.is_empty());
        assert_eq!(set.armor, Some("TankArmor".to_owned()));
    }

    #[test]
    fn unknown_condition() {
        let mut ini = IniReader::new("Conditions = SHINY\nEnd\n", "t.ini", LoadType::Normal);
        let err = ArmorTemplateSet::parse(&mut ini).unwrap_err();
        match *err.kind() {
            ErrorKind::UnknownName("armor set condition", ref name) => assert_eq!(name, "SHINY"),
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn prerequisites() {
        let mut ini = IniReader::new("
            Object = AmericaWarFactory
            Object = AmericaStrategyCenter AmericaAirfield
            Science = SCIENCE_PaladinTank
          End
        ", "t.ini", LoadType::Normal);
        let list = parse_prerequisites(&mut ini).unwrap();
        assert_eq!(list, vec![
            ProductionPrerequisite::AnyObject(vec!["AmericaWarFactory".to_owned()]),
            ProductionPrerequisite::AnyObject(vec!["AmericaStrategyCenter".to_owned(), "AmericaAirfield".to_owned()]),
            ProductionPrerequisite::Science("SCIENCE_PaladinTank".to_owned()),
        ]);
    }
}
