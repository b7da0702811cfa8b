use clap::{Arg, ArgAction, Command};
use localizer_mt::{
    DEFAULT_CONFIG_FILE, DispatchPolicy, LocalizerConfig, MachineTranslator, MockMode,
    MockTranslator, Translator, validate_locale,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("localizer-mt")
        .version("0.1.0")
        .about("Translate text, Markdown and JSON locale files with a language model")
        .arg(
            Arg::new("input")
                .help("File to translate, or inline text")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .short('t')
                .help("Target locales, comma separated (default: locales from the config)")
                .value_delimiter(',')
                .num_args(1..),
        )
        .arg(
            Arg::new("source-locale")
                .long("source")
                .short('s')
                .help("Source language code (default: from the config, else en)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file (default: ./localizer-ai.config.json if present)"),
        )
        .arg(
            Arg::new("kind")
                .long("kind")
                .short('k')
                .help("Content kind of inline text")
                .value_parser(["txt", "md", "json"])
                .default_value("txt"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock translator instead of the configured provider")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("min-spacing")
                .long("min-spacing")
                .help("Milliseconds between queued requests")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .help("Send all requests at once instead of queueing them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("write")
                .long("write")
                .short('w')
                .help("Write each translation to <destination>/<locale>/ instead of stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show detailed translation process")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = match matches.get_one::<String>("config") {
        Some(path) => LocalizerConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => LocalizerConfig::load(DEFAULT_CONFIG_FILE)?,
        None => LocalizerConfig::default(),
    };

    let from = matches
        .get_one::<String>("source-locale")
        .cloned()
        .unwrap_or_else(|| config.from.clone());
    let locales: Vec<String> = match matches.get_many::<String>("to") {
        Some(values) => values.cloned().collect(),
        None => config.locales.clone(),
    };
    if locales.is_empty() {
        eprintln!("❌ No target locale given");
        eprintln!("   Pass --to fr,de or list locales in {}", DEFAULT_CONFIG_FILE);
        return Err("Missing target locale".into());
    }
    validate_locale(&from)?;
    for locale in &locales {
        validate_locale(locale)?;
    }

    let policy = if matches.get_flag("parallel") {
        DispatchPolicy::Parallel
    } else if let Some(ms) = matches.get_one::<u64>("min-spacing") {
        DispatchPolicy::Queued {
            min_spacing: Duration::from_millis(*ms),
        }
    } else {
        config.dispatch_policy()
    };

    let model: Arc<dyn MachineTranslator> = if matches.get_flag("mock") {
        Arc::new(MockTranslator::new(MockMode::Suffix))
    } else {
        match config.provider() {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                eprintln!("❌ {}", e);
                eprintln!(
                    "   Set {} or use --mock to use mock translator",
                    config.ai_service_provider.key_variable()
                );
                return Err(e.into());
            }
        }
    };

    let input = matches
        .get_one::<String>("input")
        .ok_or("Missing input")?;
    let (path, content) = if Path::new(input).is_file() {
        (input.clone(), std::fs::read_to_string(input)?)
    } else {
        let kind = matches
            .get_one::<String>("kind")
            .map(String::as_str)
            .unwrap_or("txt");
        (format!("inline.{}", kind), input.clone())
    };

    if verbose {
        println!("📝 Source: {} ({} bytes)", path, content.len());
        println!("🌍 {} → {}", from, locales.join(", "));
        println!("🤖 Model: {} ({:?})", model.provider_name(), policy);
        println!();
    }

    let translator = Translator::new(model, policy);
    let context = config.file_context(&path);
    let results = translator
        .translate_locales(&path, &content, &from, &locales, &context)
        .await;

    let mut failed = 0;
    for (locale, result) in results {
        match result {
            Ok(translated) if matches.get_flag("write") => {
                let dir = config.locale_dir(&locale);
                let name = Path::new(&path)
                    .file_name()
                    .ok_or("Input has no file name")?;
                std::fs::create_dir_all(&dir)?;
                let target = dir.join(name);
                std::fs::write(&target, translated)?;
                info!("Wrote {}", target.display());
            }
            Ok(translated) => {
                if locales.len() > 1 {
                    println!("🌍 {}:", locale);
                }
                println!("{}", translated);
            }
            Err(e) => {
                eprintln!("❌ {}: {}", locale, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} locales failed", failed, locales.len()).into());
    }

    Ok(())
}
