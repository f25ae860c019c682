//! For lack of a better name, a "universe" is the set of everything that can exist within a
//! running SAGE-engine game: object templates, upgrades, and the module classes templates are
//! built from.  Data files are poured into it one at a time, base files first and then overrides.
use std::collections::HashSet;
use std::path::Path;

use config::{LoadOptions, Manifest};
use errors::{ErrorKind, Result, ResultExt, locate};
use input_buffer::InputBuffer;
use module::ModuleRegistry;
use parse::{IniReader, LoadType};
use thing::{Diagnostic, TemplateParser, ThingFactory};
use upgrade::UpgradeCenter;
use util::eq_ignore_case;


/// What a load added
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub files: usize,
    pub objects: usize,
    pub upgrades: usize,
    pub audio_events: usize,
}

impl LoadSummary {
    pub fn absorb(&mut self, other: LoadSummary) {
        self.files += other.files;
        self.objects += other.objects;
        self.upgrades += other.upgrades;
        self.audio_events += other.audio_events;
    }
}

pub struct Universe {
    modules: ModuleRegistry,
    things: ThingFactory,
    upgrades: UpgradeCenter,
    audio_events: HashSet<String>,
    options: LoadOptions,
}

impl Universe {
    pub fn new() -> Result<Self> {
        Universe::with_registry(ModuleRegistry::with_builtin_modules(), LoadOptions::default())
    }

    /// A universe whose templates may use the module classes in `modules`
    pub fn with_registry(modules: ModuleRegistry, options: LoadOptions) -> Result<Self> {
        let mut upgrades = UpgradeCenter::new();
        upgrades.init()?;
        Ok(Universe {
            modules,
            things: ThingFactory::new(),
            upgrades,
            audio_events: HashSet::new(),
            options,
        })
    }

    /// Build a universe from everything a manifest lists
    pub fn from_manifest<P: AsRef<Path>>(path: P) -> Result<(Self, LoadSummary)> {
        let path = path.as_ref();
        let manifest = Manifest::from_file(path)
            .chain_err(|| format!("couldn't read manifest {}", path.display()))?;
        let mut universe = Universe::with_registry(ModuleRegistry::with_builtin_modules(), manifest.load_options())?;
        let summary = universe.load_manifest(&manifest)?;
        Ok((universe, summary))
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn things(&self) -> &ThingFactory {
        &self.things
    }

    pub fn upgrades(&self) -> &UpgradeCenter {
        &self.upgrades
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    pub fn set_options(&mut self, options: LoadOptions) {
        self.options = options;
    }

    pub fn add_audio_event<S: Into<String>>(&mut self, name: S) {
        self.audio_events.insert(name.into());
    }

    /// With no audio definitions loaded at all, every name is taken on faith
    pub fn is_known_audio_event(&self, name: &str) -> bool {
        self.audio_events.is_empty() || self.audio_events.contains(name)
    }

    /// Load every base file, then every override file, in manifest order
    pub fn load_manifest(&mut self, manifest: &Manifest) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();
        for path in &manifest.base {
            summary.absorb(self.load_file(path, LoadType::Normal)?);
        }
        for path in &manifest.overrides {
            summary.absorb(self.load_file(path, LoadType::CreateOverrides)?);
        }
        Ok(summary)
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P, load_type: LoadType) -> Result<LoadSummary> {
        let path = path.as_ref();
        let buffer = InputBuffer::new_from_file(path)
            .chain_err(|| format!("couldn't open {}", path.display()))?;
        self.load_buffer(&buffer, &path.display().to_string(), load_type)
    }

    pub fn load_buffer(&mut self, buffer: &InputBuffer, filename: &str, load_type: LoadType) -> Result<LoadSummary> {
        let text = buffer.text();
        self.load_str(&text, filename, load_type)
    }

    /// Load one data file's worth of definitions.  The first error stops the load, and comes back
    /// wrapped with where it happened; anything defined before that point stays defined.
    pub fn load_str(&mut self, text: &str, filename: &str, load_type: LoadType) -> Result<LoadSummary> {
        let mut ini = IniReader::new(text, filename, load_type);
        let mut summary = LoadSummary { files: 1, ..LoadSummary::default() };
        while ini.read_line() {
            if let Err(err) = self.load_block(&mut ini, &mut summary) {
                return Err(locate(err, ini.location()));
            }
            ini.set_block(None);
        }
        info!("{}: {} objects, {} upgrades, {} audio events",
            filename, summary.objects, summary.upgrades, summary.audio_events);
        Ok(summary)
    }

    fn load_block(&mut self, ini: &mut IniReader, summary: &mut LoadSummary) -> Result<()> {
        let load_type = ini.load_type();
        let keyword = ini.next_token()?;

        if eq_ignore_case(keyword, "Object") {
            let name = ini.expect_token("an object name")?;
            ini.set_block(Some(format!("Object {}", name)));
            let template = self.things.define_template(name, load_type)?;
            TemplateParser::new(template, &self.modules, load_type, self.options).parse(ini)?;
            summary.objects += 1;
        }
        else if eq_ignore_case(keyword, "ChildObject") || eq_ignore_case(keyword, "ObjectReskin") {
            let reskin = eq_ignore_case(keyword, "ObjectReskin");
            let name = ini.expect_token("an object name")?;
            let parent = ini.expect_token("a parent object name")?;
            ini.set_block(Some(format!("{} {}", keyword, name)));
            let template = self.things.define_child_template(name, parent, reskin, load_type)?;
            TemplateParser::new(template, &self.modules, load_type, self.options).parse(ini)?;
            summary.objects += 1;
        }
        else if eq_ignore_case(keyword, "Upgrade") {
            let block = format!("Upgrade {}", ini.peek_token().unwrap_or(""));
            ini.set_block(Some(block));
            self.upgrades.parse_upgrade_definition(ini)?;
            summary.upgrades += 1;
        }
        else if eq_ignore_case(keyword, "AudioEvent") {
            // Only the name matters here
            let name = ini.expect_token("an audio event name")?;
            ini.set_block(Some(format!("AudioEvent {}", name)));
            ini.parse_block_with("audio event", |ini, _field| {
                ini.rest_of_line();
                Ok(())
            })?;
            self.add_audio_event(name);
            summary.audio_events += 1;
        }
        else {
            bail!(ErrorKind::UnknownBlock(keyword.to_owned()));
        }
        Ok(())
    }

    /// Throw away everything the override files did
    pub fn reset_overrides(&mut self) {
        self.things.reset();
        self.upgrades.reset();
    }

    /// Soft problems in every template, each logged as a warning
    pub fn diagnose(&self) -> Vec<(String, Diagnostic)> {
        let mut ret = vec![];
        for (_, template) in self.things.iter() {
            for diagnostic in template.diagnose(|name| self.is_known_audio_event(name)) {
                warn!("{}: {}", template.name(), diagnostic);
                ret.push((template.name().to_owned(), diagnostic));
            }
        }
        ret
    }
}
