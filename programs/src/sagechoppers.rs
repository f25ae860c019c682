use std::io::Write;
use std::path::{Path, PathBuf};

extern crate env_logger;
#[macro_use]
extern crate log;
extern crate termcolor;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
#[macro_use]
extern crate clap;

extern crate sagechoppers;
use sagechoppers::errors::{Error, ErrorKind, Result};
use sagechoppers::module::MODULE_KINDS;
use sagechoppers::{InputBuffer, LoadOptions, LoadSummary, LoadType, Manifest, Universe};

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    match run() {
        Ok(()) => {}
        Err(err) => {
            drop(write_err(err));
            std::process::exit(1);
        }
    }
}

fn color_choice(args: &clap::ArgMatches) -> ColorChoice {
    match args.value_of("color") {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

fn write_err(err: Error) -> Result<()> {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(&mut stderr, "error: ")?;
    stderr.set_color(&ColorSpec::new())?;
    writeln!(&mut stderr, "{}", err)?;
    for cause in err.iter().skip(1) {
        writeln!(&mut stderr, "  caused by: {}", cause)?;
    }
    if let Some(backtrace) = err.backtrace() {
        writeln!(&mut stderr, "{:?}", backtrace)?;
    }
    Ok(())
}

fn run() -> Result<()> {
    let args = clap_app!(sagechoppers =>
        (about: "Load and inspect SAGE object and upgrade definitions")
        (@arg color: -c --color +takes_value "Choose whether to use colored output (auto, always, never)")
        (@arg manifest: -m --manifest +takes_value "TOML manifest listing base and override files")
        (@arg override: -o --override +takes_value +multiple number_of_values(1) "Override file (map.ini), loaded after the base files")
        (@arg lenient: --lenient "Warn about duplicate module tags instead of failing")
        (@arg files: +multiple "Base data files, loaded in order; - reads stdin")
        (@subcommand info =>
            (about: "Summarize what was loaded")
        )
        (@subcommand modules =>
            (about: "List the modules of one object template")
            (@arg template: +required "Template name")
            (@arg base: -b --base "Show the template as the base files defined it, ignoring overrides")
        )
        (@subcommand upgrades =>
            (about: "List every upgrade and its mask bit")
        )
        (@subcommand check =>
            (about: "Report likely mistakes in the object templates")
        )
    ).get_matches();

    let (universe, summary) = load_universe(&args)?;
    info!(
        "loaded {} files: {} objects, {} upgrades, {} audio events",
        summary.files, summary.objects, summary.upgrades, summary.audio_events);

    // Dispatch!
    let color = color_choice(&args);
    match args.subcommand() {
        ("info", _) | ("", _) => { do_info(&universe)? },
        ("modules", Some(subargs)) => { do_modules(subargs, &universe)? },
        ("upgrades", _) => { do_upgrades(&universe)? },
        ("check", _) => { do_check(color, &universe)? },
        (other, _) => return Err(format!("unknown subcommand {}", other).into()),
    }

    Ok(())
}

fn load_universe(args: &clap::ArgMatches) -> Result<(Universe, LoadSummary)> {
    let manifest = match args.value_of("manifest") {
        Some(path) => Manifest::from_file(path)?,
        None => Manifest::default(),
    };
    let files: Vec<&str> = args.values_of("files").map_or(vec![], |values| values.collect());
    if manifest.base.is_empty() && files.is_empty() {
        return Err("no data files given; pass some on the command line or use --manifest".into());
    }

    let mut options = manifest.load_options();
    if args.is_present("lenient") {
        options = LoadOptions::lenient();
    }
    let mut universe = Universe::new()?;
    universe.set_options(options);

    // Manifest base files, then the command line's, then every override
    let mut summary = LoadSummary::default();
    for path in &manifest.base {
        summary.absorb(universe.load_file(path, LoadType::Normal)?);
    }
    for &filename in &files {
        let loaded = match filename {
            "-" => universe.load_buffer(&InputBuffer::new_from_stdin()?, "<stdin>", LoadType::Normal)?,
            path => universe.load_file(path, LoadType::Normal)?,
        };
        summary.absorb(loaded);
    }
    let overrides = manifest.overrides.iter().map(PathBuf::as_path)
        .chain(args.values_of("override").into_iter().flat_map(|values| values.map(Path::new)));
    for path in overrides {
        summary.absorb(universe.load_file(path, LoadType::CreateOverrides)?);
    }
    Ok((universe, summary))
}

fn do_info(universe: &Universe) -> Result<()> {
    let things = universe.things();
    println!("{} object templates", things.len());
    for (handle, template) in things.iter() {
        let overrides = things.override_count(handle);
        print!("{:5} {}", template.id(), template.name());
        if let Some(original) = template.reskinned_from() {
            print!(" (reskin of {})", original);
        }
        if overrides > 0 {
            print!(" [{} override(s)]", overrides);
        }
        println!();
    }

    let upgrades = universe.upgrades();
    println!();
    println!("{} upgrades, {} of {} mask bits used", upgrades.len(), upgrades.bits_used(), sagechoppers::upgrade::MAX_UPGRADES);
    Ok(())
}

fn do_modules(subargs: &clap::ArgMatches, universe: &Universe) -> Result<()> {
    let name = subargs.value_of("template").unwrap_or_default();
    let things = universe.things();
    let handle = match things.find_handle(name) {
        Some(handle) => handle,
        None => return Err(ErrorKind::UnknownTemplate(name.to_owned()).into()),
    };
    let template = if subargs.is_present("base") { things.base(handle) } else { things.get(handle) };
    let template = match template {
        Some(template) => template,
        None => return Err(ErrorKind::UnknownTemplate(name.to_owned()).into()),
    };

    println!("{} (id {})", template.name(), template.id());
    let kinds: Vec<_> = template.kind_of.iter().map(|kind| kind.name()).collect();
    if !kinds.is_empty() {
        println!("  KindOf = {}", kinds.join(" "));
    }
    for &kind in MODULE_KINDS.iter() {
        let modules = template.modules(kind);
        if modules.is_empty() {
            continue;
        }
        println!("  {} modules:", kind);
        for nugget in modules.iter() {
            let mut flags = vec![];
            if nugget.is_copied_from_default() {
                flags.push("inherited");
            }
            if nugget.is_inheritable() {
                flags.push("inheritable");
            }
            if nugget.is_overrideable_by_like_kind() {
                flags.push("overrideable");
            }
            if flags.is_empty() {
                println!("    {:32} {}", nugget.tag(), nugget.class_name());
            }
            else {
                println!("    {:32} {} ({})", nugget.tag(), nugget.class_name(), flags.join(", "));
            }
        }
    }
    Ok(())
}

fn do_upgrades(universe: &Universe) -> Result<()> {
    for upgrade in universe.upgrades().iter() {
        println!(
            "{:40} {:6} cost {:5} time {:6.1}s  mask {:?}",
            upgrade.name(), upgrade.upgrade_type, upgrade.cost, upgrade.build_time, upgrade.mask());
    }
    Ok(())
}

fn do_check(color: ColorChoice, universe: &Universe) -> Result<()> {
    let diagnostics = universe.diagnose();
    let mut stdout = StandardStream::stdout(color);
    for &(ref name, ref diagnostic) in &diagnostics {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        write!(&mut stdout, "{}", name)?;
        stdout.set_color(&ColorSpec::new())?;
        writeln!(&mut stdout, ": {}", diagnostic)?;
    }
    if diagnostics.is_empty() {
        writeln!(&mut stdout, "no problems found")?;
    }
    Ok(())
}
