//! The module classes the loader understands out of the box.  Only the data side lives here; what
//! the modules actually do at runtime belongs to whoever instantiates objects.
use errors::Result;
use parse::{FieldTable, IniReader};
use super::{IniModuleData, ModuleData, ModuleInterface, ModuleKind, ModuleRegistry, parse_module_data};


pub fn register_builtin_modules(registry: &mut ModuleRegistry) {
    use self::ModuleKind::{Behavior, ClientUpdate, Draw};

    // Bodies
    registry.register("ActiveBody", Behavior, ModuleInterface::BODY, parse_module_data::<ActiveBodyModuleData>);
    registry.register("StructureBody", Behavior, ModuleInterface::BODY, parse_module_data::<ActiveBodyModuleData>);
    registry.register("ImmortalBody", Behavior, ModuleInterface::BODY, parse_module_data::<ActiveBodyModuleData>);
    registry.register("HighlanderBody", Behavior, ModuleInterface::BODY, parse_module_data::<ActiveBodyModuleData>);
    registry.register("InactiveBody", Behavior, ModuleInterface::BODY, parse_module_data::<EmptyModuleData>);

    // AI
    registry.register("AIUpdateInterface", Behavior, ModuleInterface::UPDATE, parse_module_data::<AIUpdateModuleData>);
    registry.register("TransportAIUpdate", Behavior, ModuleInterface::UPDATE, parse_module_data::<AIUpdateModuleData>);
    registry.register("JetAIUpdate", Behavior, ModuleInterface::UPDATE, parse_module_data::<JetAIUpdateModuleData>);

    // Everything else
    registry.register("AutoHealBehavior", Behavior,
        ModuleInterface::UPDATE | ModuleInterface::UPGRADE | ModuleInterface::DAMAGE,
        parse_module_data::<AutoHealBehaviorModuleData>);
    registry.register("PhysicsBehavior", Behavior, ModuleInterface::UPDATE | ModuleInterface::COLLIDE,
        parse_module_data::<PhysicsBehaviorModuleData>);
    registry.register("DestroyDie", Behavior, ModuleInterface::DIE, parse_module_data::<EmptyModuleData>);
    registry.register("CreateObjectDie", Behavior, ModuleInterface::DIE, parse_module_data::<CreateObjectDieModuleData>);
    registry.register("SquishCollide", Behavior, ModuleInterface::COLLIDE, parse_module_data::<EmptyModuleData>);
    registry.register("ProductionUpdate", Behavior, ModuleInterface::UPDATE, parse_module_data::<ProductionUpdateModuleData>);
    registry.register("ExperienceScalarUpgrade", Behavior, ModuleInterface::UPGRADE,
        parse_module_data::<ExperienceScalarUpgradeModuleData>);

    // Draw
    registry.register("W3DModelDraw", Draw, ModuleInterface::DRAW, parse_module_data::<W3DModelDrawModuleData>);
    // TODO tread debris fields; until then tanks read as plain model draws
    registry.register("W3DTankDraw", Draw, ModuleInterface::DRAW, parse_module_data::<W3DModelDrawModuleData>);
    registry.register("W3DDefaultDraw", Draw, ModuleInterface::DRAW, parse_module_data::<EmptyModuleData>);

    // Client updates
    registry.register("SwayClientUpdate", ClientUpdate, ModuleInterface::CLIENT_UPDATE, parse_module_data::<EmptyModuleData>);
    registry.register("BeaconClientUpdate", ClientUpdate, ModuleInterface::CLIENT_UPDATE,
        parse_module_data::<BeaconClientUpdateModuleData>);
    registry.register("AnimatedParticleSysBoneClientUpdate", ClientUpdate, ModuleInterface::CLIENT_UPDATE,
        parse_module_data::<EmptyModuleData>);
}


/// For modules whose block is just `End`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmptyModuleData;

impl ModuleData for EmptyModuleData {}

impl IniModuleData for EmptyModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        &[]
    }
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveBodyModuleData {
    pub max_health: f32,
    pub initial_health: f32,
    pub subdual_damage_cap: f32,
}

impl ModuleData for ActiveBodyModuleData {}

fn parse_max_health(ini: &mut IniReader, data: &mut ActiveBodyModuleData) -> Result<()> {
    data.max_health = ini.parse_real()?;
    Ok(())
}

fn parse_initial_health(ini: &mut IniReader, data: &mut ActiveBodyModuleData) -> Result<()> {
    data.initial_health = ini.parse_real()?;
    Ok(())
}

fn parse_subdual_damage_cap(ini: &mut IniReader, data: &mut ActiveBodyModuleData) -> Result<()> {
    data.subdual_damage_cap = ini.parse_real()?;
    Ok(())
}

const ACTIVE_BODY_FIELDS: &'static FieldTable<ActiveBodyModuleData> = &[
    ("MaxHealth", parse_max_health),
    ("InitialHealth", parse_initial_health),
    ("SubdualDamageCap", parse_subdual_damage_cap),
];

impl IniModuleData for ActiveBodyModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        ACTIVE_BODY_FIELDS
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct AIUpdateModuleData {
    pub auto_acquire_enemies_when_idle: bool,
    /// Milliseconds between checks for something to shoot at
    pub mood_attack_check_rate: u32,
    pub forbid_player_commands: bool,
    pub turret_names: Vec<String>,
}

impl Default for AIUpdateModuleData {
    fn default() -> Self {
        AIUpdateModuleData {
            auto_acquire_enemies_when_idle: false,
            mood_attack_check_rate: 250,
            forbid_player_commands: false,
            turret_names: Vec::new(),
        }
    }
}

impl ModuleData for AIUpdateModuleData {
    fn is_ai_module_data(&self) -> bool {
        true
    }
}

fn parse_auto_acquire(ini: &mut IniReader, data: &mut AIUpdateModuleData) -> Result<()> {
    // Can be followed by qualifiers like `Stealthed`, which we don't model
    data.auto_acquire_enemies_when_idle = ini.parse_bool()?;
    ini.rest_of_line();
    Ok(())
}

fn parse_mood_attack_check_rate(ini: &mut IniReader, data: &mut AIUpdateModuleData) -> Result<()> {
    data.mood_attack_check_rate = ini.parse_unsigned()?;
    Ok(())
}

fn parse_forbid_player_commands(ini: &mut IniReader, data: &mut AIUpdateModuleData) -> Result<()> {
    data.forbid_player_commands = ini.parse_bool()?;
    Ok(())
}

/// `Turret` and `AltTurret` are whole blocks in the real data; we only keep that they exist
fn parse_turret(ini: &mut IniReader, data: &mut AIUpdateModuleData) -> Result<()> {
    let name = ini.next_token_or_none().unwrap_or("Turret").to_owned();
    ini.parse_block_with("turret", |ini, _field| {
        ini.rest_of_line();
        Ok(())
    })?;
    data.turret_names.push(name);
    Ok(())
}

const AI_UPDATE_FIELDS: &'static FieldTable<AIUpdateModuleData> = &[
    ("AutoAcquireEnemiesWhenIdle", parse_auto_acquire),
    ("MoodAttackCheckRate", parse_mood_attack_check_rate),
    ("ForbidPlayerCommands", parse_forbid_player_commands),
    ("Turret", parse_turret),
    ("AltTurret", parse_turret),
];

impl IniModuleData for AIUpdateModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        AI_UPDATE_FIELDS
    }
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct JetAIUpdateModuleData {
    pub ai: AIUpdateModuleData,
    /// Fraction of max health lost per second while out of ammo
    pub out_of_ammo_damage_per_second: f32,
    pub needs_runway: bool,
}

impl ModuleData for JetAIUpdateModuleData {
    fn is_ai_module_data(&self) -> bool {
        true
    }
}

impl IniModuleData for JetAIUpdateModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        JET_AI_UPDATE_FIELDS
    }
}

fn parse_jet_auto_acquire(ini: &mut IniReader, data: &mut JetAIUpdateModuleData) -> Result<()> {
    parse_auto_acquire(ini, &mut data.ai)
}

fn parse_jet_mood_attack_check_rate(ini: &mut IniReader, data: &mut JetAIUpdateModuleData) -> Result<()> {
    parse_mood_attack_check_rate(ini, &mut data.ai)
}

fn parse_jet_out_of_ammo_damage(ini: &mut IniReader, data: &mut JetAIUpdateModuleData) -> Result<()> {
    data.out_of_ammo_damage_per_second = ini.parse_percent()?;
    Ok(())
}

fn parse_jet_needs_runway(ini: &mut IniReader, data: &mut JetAIUpdateModuleData) -> Result<()> {
    data.needs_runway = ini.parse_bool()?;
    Ok(())
}

const JET_AI_UPDATE_FIELDS: &'static FieldTable<JetAIUpdateModuleData> = &[
    ("AutoAcquireEnemiesWhenIdle", parse_jet_auto_acquire),
    ("MoodAttackCheckRate", parse_jet_mood_attack_check_rate),
    ("OutOfAmmoDamagePerSecond", parse_jet_out_of_ammo_damage),
    ("NeedsRunway", parse_jet_needs_runway),
];


#[derive(Clone, Debug, Default, PartialEq)]
pub struct AutoHealBehaviorModuleData {
    pub healing_amount: u32,
    /// Milliseconds between heals
    pub healing_delay: u32,
    pub start_healing_delay: u32,
    pub radius: f32,
    pub affects_whole_player: bool,
    pub starts_active: bool,
    pub triggered_by: Vec<String>,
}

impl ModuleData for AutoHealBehaviorModuleData {}

fn parse_healing_amount(ini: &mut IniReader, data: &mut AutoHealBehaviorModuleData) -> Result<()> {
    data.healing_amount = ini.parse_unsigned()?;
    Ok(())
}

fn parse_healing_delay(ini: &mut IniReader, data: &mut AutoHealBehaviorModuleData) -> Result<()> {
    data.healing_delay = ini.parse_unsigned()?;
    Ok(())
}

fn parse_start_healing_delay(ini: &mut IniReader, data: &mut AutoHealBehaviorModuleData) -> Result<()> {
    data.start_healing_delay = ini.parse_unsigned()?;
    Ok(())
}

fn parse_heal_radius(ini: &mut IniReader, data: &mut AutoHealBehaviorModuleData) -> Result<()> {
    data.radius = ini.parse_real()?;
    Ok(())
}

fn parse_affects_whole_player(ini: &mut IniReader, data: &mut AutoHealBehaviorModuleData) -> Result<()> {
    data.affects_whole_player = ini.parse_bool()?;
    Ok(())
}

fn parse_heal_starts_active(ini: &mut IniReader, data: &mut AutoHealBehaviorModuleData) -> Result<()> {
    data.starts_active = ini.parse_bool()?;
    Ok(())
}

fn parse_heal_triggered_by(ini: &mut IniReader, data: &mut AutoHealBehaviorModuleData) -> Result<()> {
    data.triggered_by.extend(ini.parse_string_list());
    Ok(())
}

const AUTO_HEAL_FIELDS: &'static FieldTable<AutoHealBehaviorModuleData> = &[
    ("HealingAmount", parse_healing_amount),
    ("HealingDelay", parse_healing_delay),
    ("StartHealingDelay", parse_start_healing_delay),
    ("Radius", parse_heal_radius),
    ("AffectsWholePlayer", parse_affects_whole_player),
    ("StartsActive", parse_heal_starts_active),
    ("TriggeredBy", parse_heal_triggered_by),
];

impl IniModuleData for AutoHealBehaviorModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        AUTO_HEAL_FIELDS
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsBehaviorModuleData {
    pub mass: f32,
    pub allow_bouncing: bool,
    pub kill_when_resting_on_ground: bool,
}

impl Default for PhysicsBehaviorModuleData {
    fn default() -> Self {
        PhysicsBehaviorModuleData {
            mass: 1.0,
            allow_bouncing: false,
            kill_when_resting_on_ground: false,
        }
    }
}

impl ModuleData for PhysicsBehaviorModuleData {}

fn parse_mass(ini: &mut IniReader, data: &mut PhysicsBehaviorModuleData) -> Result<()> {
    data.mass = ini.parse_real()?;
    Ok(())
}

fn parse_allow_bouncing(ini: &mut IniReader, data: &mut PhysicsBehaviorModuleData) -> Result<()> {
    data.allow_bouncing = ini.parse_bool()?;
    Ok(())
}

fn parse_kill_when_resting(ini: &mut IniReader, data: &mut PhysicsBehaviorModuleData) -> Result<()> {
    data.kill_when_resting_on_ground = ini.parse_bool()?;
    Ok(())
}

const PHYSICS_FIELDS: &'static FieldTable<PhysicsBehaviorModuleData> = &[
    ("Mass", parse_mass),
    ("AllowBouncing", parse_allow_bouncing),
    ("KillWhenRestingOnGround", parse_kill_when_resting),
];

impl IniModuleData for PhysicsBehaviorModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        PHYSICS_FIELDS
    }
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateObjectDieModuleData {
    /// Name of an object creation list, resolved elsewhere
    pub creation_list: Option<String>,
}

impl ModuleData for CreateObjectDieModuleData {}

fn parse_creation_list(ini: &mut IniReader, data: &mut CreateObjectDieModuleData) -> Result<()> {
    data.creation_list = Some(ini.parse_string()?);
    Ok(())
}

const CREATE_OBJECT_DIE_FIELDS: &'static FieldTable<CreateObjectDieModuleData> = &[
    ("CreationList", parse_creation_list),
];

impl IniModuleData for CreateObjectDieModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        CREATE_OBJECT_DIE_FIELDS
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct ProductionUpdateModuleData {
    pub max_queue_entries: u32,
    pub number_of_exit_doors: u32,
}

impl Default for ProductionUpdateModuleData {
    fn default() -> Self {
        ProductionUpdateModuleData {
            max_queue_entries: 9,
            number_of_exit_doors: 1,
        }
    }
}

impl ModuleData for ProductionUpdateModuleData {}

fn parse_max_queue_entries(ini: &mut IniReader, data: &mut ProductionUpdateModuleData) -> Result<()> {
    data.max_queue_entries = ini.parse_unsigned()?;
    Ok(())
}

fn parse_number_of_exit_doors(ini: &mut IniReader, data: &mut ProductionUpdateModuleData) -> Result<()> {
    data.number_of_exit_doors = ini.parse_unsigned()?;
    Ok(())
}

const PRODUCTION_UPDATE_FIELDS: &'static FieldTable<ProductionUpdateModuleData> = &[
    ("MaxQueueEntries", parse_max_queue_entries),
    ("NumberOfExitDoors", parse_number_of_exit_doors),
];

impl IniModuleData for ProductionUpdateModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        PRODUCTION_UPDATE_FIELDS
    }
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperienceScalarUpgradeModuleData {
    pub triggered_by: Vec<String>,
    pub add_xp_scalar: f32,
}

impl ModuleData for ExperienceScalarUpgradeModuleData {}

fn parse_xp_triggered_by(ini: &mut IniReader, data: &mut ExperienceScalarUpgradeModuleData) -> Result<()> {
    data.triggered_by.extend(ini.parse_string_list());
    Ok(())
}

fn parse_add_xp_scalar(ini: &mut IniReader, data: &mut ExperienceScalarUpgradeModuleData) -> Result<()> {
    data.add_xp_scalar = ini.parse_real()?;
    Ok(())
}

const EXPERIENCE_SCALAR_FIELDS: &'static FieldTable<ExperienceScalarUpgradeModuleData> = &[
    ("TriggeredBy", parse_xp_triggered_by),
    ("AddXPScalar", parse_add_xp_scalar),
];

impl IniModuleData for ExperienceScalarUpgradeModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        EXPERIENCE_SCALAR_FIELDS
    }
}


/// One `ConditionState` block of a model draw module
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelConditionState {
    /// Model condition flags, e.g. `DAMAGED`; empty for the default state
    pub conditions: Vec<String>,
    pub model: Option<String>,
    pub animation: Option<String>,
}

fn parse_state_model(ini: &mut IniReader, state: &mut ModelConditionState) -> Result<()> {
    state.model = Some(ini.parse_string()?);
    Ok(())
}

fn parse_state_animation(ini: &mut IniReader, state: &mut ModelConditionState) -> Result<()> {
    state.animation = Some(ini.parse_string()?);
    ini.rest_of_line();
    Ok(())
}

const CONDITION_STATE_FIELDS: &'static FieldTable<ModelConditionState> = &[
    ("Model", parse_state_model),
    ("Animation", parse_state_animation),
];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct W3DModelDrawModuleData {
    pub ok_to_change_model_color: bool,
    pub extra_public_bones: Vec<String>,
    pub condition_states: Vec<ModelConditionState>,
}

impl ModuleData for W3DModelDrawModuleData {}

impl W3DModelDrawModuleData {
    pub fn default_state(&self) -> Option<&ModelConditionState> {
        self.condition_states.iter().find(|state| state.conditions.is_empty())
    }
}

fn parse_ok_to_change_model_color(ini: &mut IniReader, data: &mut W3DModelDrawModuleData) -> Result<()> {
    data.ok_to_change_model_color = ini.parse_bool()?;
    Ok(())
}

fn parse_extra_public_bone(ini: &mut IniReader, data: &mut W3DModelDrawModuleData) -> Result<()> {
    data.extra_public_bones.extend(ini.parse_string_list());
    Ok(())
}

fn parse_condition_state_block(ini: &mut IniReader, data: &mut W3DModelDrawModuleData, conditions: Vec<String>) -> Result<()> {
    let mut state = ModelConditionState { conditions, ..ModelConditionState::default() };
    ini.parse_block(&mut state, CONDITION_STATE_FIELDS, "condition state")?;
    data.condition_states.push(state);
    Ok(())
}

fn parse_default_condition_state(ini: &mut IniReader, data: &mut W3DModelDrawModuleData) -> Result<()> {
    parse_condition_state_block(ini, data, Vec::new())
}

fn parse_condition_state(ini: &mut IniReader, data: &mut W3DModelDrawModuleData) -> Result<()> {
    let conditions = ini.parse_string_list();
    parse_condition_state_block(ini, data, conditions)
}

const MODEL_DRAW_FIELDS: &'static FieldTable<W3DModelDrawModuleData> = &[
    ("OkToChangeModelColor", parse_ok_to_change_model_color),
    ("ExtraPublicBone", parse_extra_public_bone),
    ("DefaultConditionState", parse_default_condition_state),
    ("ConditionState", parse_condition_state),
];

impl IniModuleData for W3DModelDrawModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        MODEL_DRAW_FIELDS
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct BeaconClientUpdateModuleData {
    /// Both in logic frames
    pub radar_pulse_frequency: u32,
    pub radar_pulse_duration: u32,
}

impl Default for BeaconClientUpdateModuleData {
    fn default() -> Self {
        BeaconClientUpdateModuleData {
            radar_pulse_frequency: 30,
            radar_pulse_duration: 15,
        }
    }
}

impl ModuleData for BeaconClientUpdateModuleData {}

fn parse_radar_pulse_frequency(ini: &mut IniReader, data: &mut BeaconClientUpdateModuleData) -> Result<()> {
    data.radar_pulse_frequency = ini.parse_unsigned()?;
    Ok(())
}

fn parse_radar_pulse_duration(ini: &mut IniReader, data: &mut BeaconClientUpdateModuleData) -> Result<()> {
    data.radar_pulse_duration = ini.parse_unsigned()?;
    Ok(())
}

const BEACON_FIELDS: &'static FieldTable<BeaconClientUpdateModuleData> = &[
    ("RadarPulseFrequency", parse_radar_pulse_frequency),
    ("RadarPulseDuration", parse_radar_pulse_duration),
];

impl IniModuleData for BeaconClientUpdateModuleData {
    fn field_table() -> &'static FieldTable<Self> {
        BEACON_FIELDS
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use parse::LoadType;

    fn parse<D: IniModuleData + Clone + 'static>(text: &str) -> D {
        let mut ini = IniReader::new(text, "t.ini", LoadType::Normal);
        let data = parse_module_data::<D>(&mut ini).unwrap();
        data.downcast_ref::<D>().unwrap().clone()
    }

    #[test]
    fn model_draw_condition_states() {
        let data: W3DModelDrawModuleData = parse("
            OkToChangeModelColor = Yes
            DefaultConditionState
              Model = AVCrusader
            End
            ConditionState = REALLYDAMAGED RUBBLE
              Model = AVCrusader_D
              Animation = AVCrusader_D.AVCrusader_D 5
            End
          End
        ");
        assert!(data.ok_to_change_model_color);
        assert_eq!(data.condition_states.len(), 2);
        assert_eq!(data.default_state().unwrap().model, Some("AVCrusader".to_owned()));
        assert_eq!(data.condition_states[1].conditions, vec!["REALLYDAMAGED", "RUBBLE"]);
        assert_eq!(data.condition_states[1].animation, Some("AVCrusader_D.AVCrusader_D".to_owned()));
    }

    #[test]
    fn jet_ai_reads_shared_fields() {
        let data: JetAIUpdateModuleData = parse("
            AutoAcquireEnemiesWhenIdle = No
            MoodAttackCheckRate = 500
            OutOfAmmoDamagePerSecond = 10%
            NeedsRunway = Yes
          End
        ");
        assert_eq!(data.ai.mood_attack_check_rate, 500);
        assert_eq!(data.out_of_ammo_damage_per_second, 0.1);
        assert!(data.needs_runway);
    }

    #[test]
    fn turret_blocks_are_skipped() {
        let data: AIUpdateModuleData = parse("
            Turret
              TurretTurnRate = 180
              ControlledWeaponSlots = PRIMARY
            End
            AutoAcquireEnemiesWhenIdle = Yes Stealthed
          End
        ");
        assert_eq!(data.turret_names, vec!["Turret"]);
        assert!(data.auto_acquire_enemies_when_idle);
    }

    #[test]
    fn auto_heal_fields() {
        let data: AutoHealBehaviorModuleData = parse("
            HealingAmount = 2
            HealingDelay = 1000
            StartsActive = Yes
            TriggeredBy = Upgrade_AmericaAdvancedTraining Upgrade_Other
          End
        ");
        assert_eq!(data.healing_amount, 2);
        assert_eq!(data.healing_delay, 1000);
        assert!(data.starts_active);
        assert_eq!(data.triggered_by.len(), 2);
    }
}
