//! KindOf flags: the semantic categories an object belongs to (STRUCTURE, VEHICLE, ...).  There are
//! far more than fit in a machine word, so the mask is a bit vector indexed by `KindOf`.
use std::fmt;

use bit_vec::BitVec;

use errors::{ErrorKind, Result};
use parse::IniReader;


macro_rules! kindofs {
    ($($variant:ident => $name:expr,)*) => {
        #[allow(non_camel_case_types)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum KindOf {
            $($variant,)*
        }

        pub const KINDOF_NAMES: &'static [&'static str] = &[$($name,)*];

        const ALL_KINDOFS: &'static [KindOf] = &[$(KindOf::$variant,)*];
    };
}

kindofs! {
    OBSTACLE => "OBSTACLE",
    SELECTABLE => "SELECTABLE",
    IMMOBILE => "IMMOBILE",
    CAN_ATTACK => "CAN_ATTACK",
    STICK_TO_TERRAIN_SLOPE => "STICK_TO_TERRAIN_SLOPE",
    CAN_CAST_REFLECTIONS => "CAN_CAST_REFLECTIONS",
    SHRUBBERY => "SHRUBBERY",
    STRUCTURE => "STRUCTURE",
    INFANTRY => "INFANTRY",
    VEHICLE => "VEHICLE",
    AIRCRAFT => "AIRCRAFT",
    HUGE_VEHICLE => "HUGE_VEHICLE",
    DOZER => "DOZER",
    HARVESTER => "HARVESTER",
    COMMANDCENTER => "COMMANDCENTER",
    LINEBUILD => "LINEBUILD",
    SALVAGER => "SALVAGER",
    WEAPON_SALVAGER => "WEAPON_SALVAGER",
    TRANSPORT => "TRANSPORT",
    BRIDGE => "BRIDGE",
    LANDMARK_BRIDGE => "LANDMARK_BRIDGE",
    BRIDGE_TOWER => "BRIDGE_TOWER",
    PROJECTILE => "PROJECTILE",
    PRELOAD => "PRELOAD",
    NO_GARRISON => "NO_GARRISON",
    WAVEGUIDE => "WAVEGUIDE",
    WAVE_EFFECT => "WAVE_EFFECT",
    NO_COLLIDE => "NO_COLLIDE",
    REPAIR_PAD => "REPAIR_PAD",
    HEAL_PAD => "HEAL_PAD",
    STEALTH_GARRISON => "STEALTH_GARRISON",
    CASH_GENERATOR => "CASH_GENERATOR",
    DRAWABLE_ONLY => "DRAWABLE_ONLY",
    MP_COUNT_FOR_VICTORY => "MP_COUNT_FOR_VICTORY",
    REBUILD_HOLE => "REBUILD_HOLE",
    SCORE => "SCORE",
    SCORE_CREATE => "SCORE_CREATE",
    SCORE_DESTROY => "SCORE_DESTROY",
    NO_HEAL_ICON => "NO_HEAL_ICON",
    CAN_RAPPEL => "CAN_RAPPEL",
    PARACHUTABLE => "PARACHUTABLE",
    CAN_BE_REPULSED => "CAN_BE_REPULSED",
    MOB_NEXUS => "MOB_NEXUS",
    IGNORED_IN_GUI => "IGNORED_IN_GUI",
    CRATE => "CRATE",
    CAPTURABLE => "CAPTURABLE",
    CLEARED_BY_BUILD => "CLEARED_BY_BUILD",
    SMALL_MISSILE => "SMALL_MISSILE",
    ALWAYS_VISIBLE => "ALWAYS_VISIBLE",
    UNATTACKABLE => "UNATTACKABLE",
    MINE => "MINE",
    CLEANUP_HAZARD => "CLEANUP_HAZARD",
    PORTABLE_STRUCTURE => "PORTABLE_STRUCTURE",
    ALWAYS_SELECTABLE => "ALWAYS_SELECTABLE",
    ATTACK_NEEDS_LINE_OF_SIGHT => "ATTACK_NEEDS_LINE_OF_SIGHT",
    WALK_ON_TOP_OF_WALL => "WALK_ON_TOP_OF_WALL",
    DEFENSIVE_WALL => "DEFENSIVE_WALL",
    FS_POWER => "FS_POWER",
    FS_FACTORY => "FS_FACTORY",
    FS_BASE_DEFENSE => "FS_BASE_DEFENSE",
    FS_TECHNOLOGY => "FS_TECHNOLOGY",
    AIRCRAFT_PATH_AROUND => "AIRCRAFT_PATH_AROUND",
    LOW_OVERLAPPABLE => "LOW_OVERLAPPABLE",
    FORCEATTACKABLE => "FORCEATTACKABLE",
    AUTO_RALLYPOINT => "AUTO_RALLYPOINT",
    TECH_BUILDING => "TECH_BUILDING",
    POWERED => "POWERED",
    PRODUCED_AT_HELIPAD => "PRODUCED_AT_HELIPAD",
    DRONE => "DRONE",
    CAN_SEE_THROUGH_STRUCTURE => "CAN_SEE_THROUGH_STRUCTURE",
    BALLISTIC_MISSILE => "BALLISTIC_MISSILE",
    CLICK_THROUGH => "CLICK_THROUGH",
    SUPPLY_SOURCE_ON_PREVIEW => "SUPPLY_SOURCE_ON_PREVIEW",
    PARACHUTE => "PARACHUTE",
    GARRISONABLE_UNTIL_DESTROYED => "GARRISONABLE_UNTIL_DESTROYED",
    BOAT => "BOAT",
    IMMUNE_TO_CAPTURE => "IMMUNE_TO_CAPTURE",
    HULK => "HULK",
    SHOW_PORTRAIT_WHEN_CONTROLLED => "SHOW_PORTRAIT_WHEN_CONTROLLED",
    SPAWNS_ARE_THE_WEAPONS => "SPAWNS_ARE_THE_WEAPONS",
    CANNOT_BUILD_NEAR_SUPPLIES => "CANNOT_BUILD_NEAR_SUPPLIES",
    SUPPLY_SOURCE => "SUPPLY_SOURCE",
    REVEAL_TO_ALL => "REVEAL_TO_ALL",
    DISGUISER => "DISGUISER",
    INERT => "INERT",
    HERO => "HERO",
    IGNORES_SELECT_ALL => "IGNORES_SELECT_ALL",
    DONT_AUTO_CRUSH_INFANTRY => "DONT_AUTO_CRUSH_INFANTRY",
    CLIFF_JUMPER => "CLIFF_JUMPER",
    FS_SUPPLY_DROPZONE => "FS_SUPPLY_DROPZONE",
    FS_SUPERWEAPON => "FS_SUPERWEAPON",
    FS_BLACK_MARKET => "FS_BLACK_MARKET",
    FS_SUPPLY_CENTER => "FS_SUPPLY_CENTER",
    FS_STRATEGY_CENTER => "FS_STRATEGY_CENTER",
    MONEY_HACKER => "MONEY_HACKER",
    ARMOR_SALVAGER => "ARMOR_SALVAGER",
    REVEALS_ENEMY_PATHS => "REVEALS_ENEMY_PATHS",
    BOOBY_TRAP => "BOOBY_TRAP",
    FS_FAKE => "FS_FAKE",
    FS_INTERNET_CENTER => "FS_INTERNET_CENTER",
    BLAST_CRATER => "BLAST_CRATER",
    PROP => "PROP",
    OPTIMIZED_TREE => "OPTIMIZED_TREE",
    FS_ADVANCED_TECH => "FS_ADVANCED_TECH",
    FS_BARRACKS => "FS_BARRACKS",
    FS_WARFACTORY => "FS_WARFACTORY",
    FS_AIRFIELD => "FS_AIRFIELD",
    AIRCRAFT_CARRIER => "AIRCRAFT_CARRIER",
    NO_SELECT => "NO_SELECT",
    REJECT_UNMANNED => "REJECT_UNMANNED",
    CANNOT_RETALIATE => "CANNOT_RETALIATE",
    TECH_BASE_DEFENSE => "TECH_BASE_DEFENSE",
    EMP_HARDENED => "EMP_HARDENED",
    DEMOTRAP => "DEMOTRAP",
    CONSERVATIVE_BUILDING => "CONSERVATIVE_BUILDING",
    IGNORE_DOCKING_BONES => "IGNORE_DOCKING_BONES",
}

pub const KINDOF_COUNT: usize = 116;

impl KindOf {
    pub fn name(self) -> &'static str {
        KINDOF_NAMES[self as usize]
    }

    pub fn from_name(name: &str) -> Option<KindOf> {
        KINDOF_NAMES.iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|index| ALL_KINDOFS[index])
    }
}

impl fmt::Display for KindOf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}


#[derive(Clone, PartialEq, Eq)]
pub struct KindOfMask {
    bits: BitVec,
}

impl Default for KindOfMask {
    fn default() -> Self {
        KindOfMask::new()
    }
}

impl KindOfMask {
    pub fn new() -> Self {
        KindOfMask { bits: BitVec::from_elem(KINDOF_COUNT, false) }
    }

    pub fn from_kinds(kinds: &[KindOf]) -> Self {
        let mut mask = KindOfMask::new();
        for &kind in kinds {
            mask.set(kind);
        }
        mask
    }

    pub fn set(&mut self, kind: KindOf) {
        self.bits.set(kind as usize, true);
    }

    pub fn clear(&mut self, kind: KindOf) {
        self.bits.set(kind as usize, false);
    }

    pub fn contains(&self, kind: KindOf) -> bool {
        self.bits.get(kind as usize).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.none()
    }

    pub fn contains_any(&self, kinds: &[KindOf]) -> bool {
        kinds.iter().any(|&kind| self.contains(kind))
    }

    /// True if any flag set in `other` is also set here
    pub fn intersects(&self, other: &KindOfMask) -> bool {
        let mut both = self.bits.clone();
        both.and(&other.bits);
        both.any()
    }

    /// True if every flag set in `other` is also set here
    pub fn contains_all(&self, other: &KindOfMask) -> bool {
        let mut missing = other.bits.clone();
        missing.difference(&self.bits);
        missing.none()
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item=KindOf> + 'a {
        self.bits.iter().enumerate()
            .filter(|&(_, set)| set)
            .map(|(index, _)| ALL_KINDOFS[index])
    }

    /// `KindOf = STRUCTURE SELECTABLE IMMOBILE`.  A leading `+` or `-` on a name adds it to or
    /// removes it from the existing mask instead of replacing the whole thing, which is how child
    /// objects tweak what they inherited.  An empty list clears the mask.
    pub fn parse(ini: &mut IniReader, mask: &mut KindOfMask) -> Result<()> {
        let tokens = ini.rest_of_line();
        let additive = !tokens.is_empty() && tokens.iter().all(|t| t.starts_with('+') || t.starts_with('-'));
        if !additive {
            *mask = KindOfMask::new();
        }
        for token in tokens {
            let (remove, name) =
                if token.starts_with('-') { (true, &token[1..]) }
                else if token.starts_with('+') { (false, &token[1..]) }
                else { (false, token) }
            ;
            if name.eq_ignore_ascii_case("NONE") {
                continue;
            }
            let kind = match KindOf::from_name(name) {
                Some(kind) => kind,
                None => bail!(ErrorKind::UnknownName("KindOf", name.to_owned())),
            };
            if remove {
                mask.clear(kind);
            }
            else {
                mask.set(kind);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for KindOfMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for KindOfMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<_> = self.iter().map(KindOf::name).collect();
        if names.is_empty() {
            f.write_str("NONE")
        }
        else {
            f.write_str(&names.join(" "))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use parse::{IniReader, LoadType};

    #[test]
    fn names_line_up() {
        assert_eq!(KINDOF_NAMES.len(), KINDOF_COUNT);
        assert_eq!(ALL_KINDOFS.len(), KINDOF_COUNT);
        assert_eq!(KindOf::IGNORE_DOCKING_BONES as usize, KINDOF_COUNT - 1);
        assert_eq!(KindOf::from_name("structure"), Some(KindOf::STRUCTURE));
        assert_eq!(KindOf::from_name("BOGUS"), None);
    }

    #[test]
    fn mask_queries() {
        let mask = KindOfMask::from_kinds(&[KindOf::VEHICLE, KindOf::SELECTABLE]);
        assert!(mask.contains(KindOf::VEHICLE));
        assert!(!mask.contains(KindOf::AIRCRAFT));
        assert!(mask.intersects(&KindOfMask::from_kinds(&[KindOf::AIRCRAFT, KindOf::VEHICLE])));
        assert!(!mask.intersects(&KindOfMask::from_kinds(&[KindOf::AIRCRAFT])));
        assert!(mask.contains_all(&KindOfMask::from_kinds(&[KindOf::VEHICLE])));
        assert!(!mask.contains_all(&KindOfMask::from_kinds(&[KindOf::VEHICLE, KindOf::HERO])));
        assert_eq!(mask.to_string(), "SELECTABLE VEHICLE");
    }

    #[test]
    fn parse_replaces_or_adjusts() {
        let mut mask = KindOfMask::from_kinds(&[KindOf::INFANTRY]);
        let mut ini = IniReader::new("KindOf = STRUCTURE IMMOBILE\nKindOf = -IMMOBILE +SCORE\nKindOf = WHATEVER\n", "t.ini", LoadType::Normal);

        assert!(ini.read_line());
        ini.next_token().unwrap();
        KindOfMask::parse(&mut ini, &mut mask).unwrap();
        assert_eq!(mask, KindOfMask::from_kinds(&[KindOf::STRUCTURE, KindOf::IMMOBILE]));

        assert!(ini.read_line());
        ini.next_token().unwrap();
        KindOfMask::parse(&mut ini, &mut mask).unwrap();
        assert_eq!(mask, KindOfMask::from_kinds(&[KindOf::STRUCTURE, KindOf::SCORE]));

        assert!(ini.read_line());
        ini.next_token().unwrap();
        assert!(KindOfMask::parse(&mut ini, &mut mask).is_err());
    }

    #[test]
    fn parse_empty_list_clears() {
        let mut mask = KindOfMask::from_kinds(&[KindOf::VEHICLE, KindOf::SELECTABLE]);
        let mut ini = IniReader::new("KindOf =\n", "t.ini", LoadType::Normal);
        assert!(ini.read_line());
        ini.next_token().unwrap();
        KindOfMask::parse(&mut ini, &mut mask).unwrap();
        assert_eq!(mask, KindOfMask::new());
        assert_eq!(mask.iter().count(), 0);
    }
}
