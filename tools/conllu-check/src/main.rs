mod compile;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use conllu_protocol::{Category, NoLanguageData, Report};
use conllu_validator::{DeprelLanguagePolicy, ValidationConfig, Validator};
use rkyv::ser::{serializers::AllocSerializer, Serializer};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::compile::{add_features, build_database, DataFile, DeprelsFile, FeatsFile, Lists, RawFeature};

#[derive(Parser)]
#[command(author, version, about = "Validates CoNLL-U files against the Universal Dependencies guidelines")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compiles the UD documentation tables into a rule archive
    Compile(CompileArgs),
    /// Validates CoNLL-U files (stdin when no file is given)
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    #[arg(long, value_name = "FILE")]
    feats: PathBuf,

    #[arg(long, value_name = "FILE")]
    deprels: PathBuf,

    /// data.json with the auxiliary lemmas
    #[arg(long, value_name = "FILE")]
    data: PathBuf,

    /// Directory with tokens_w_space.LANG and edeprel.LANG lists
    #[arg(long, value_name = "DIR")]
    lists: Option<PathBuf>,

    /// Extra feature records (JSON object) for the language given by --lang
    #[arg(long, value_name = "FILE", requires = "lang")]
    add_features: Option<PathBuf>,

    #[arg(long)]
    lang: Option<String>,

    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    Primary,
    Token,
    Union,
}

impl From<Policy> for DeprelLanguagePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Primary => DeprelLanguagePolicy::Primary,
            Policy::Token => DeprelLanguagePolicy::Token,
            Policy::Union => DeprelLanguagePolicy::Union,
        }
    }
}

#[derive(clap::Args)]
struct ValidateArgs {
    files: Vec<PathBuf>,

    /// Language code; levels below 4 always use "ud"
    #[arg(long)]
    lang: Option<String>,

    /// 1-5
    #[arg(long)]
    level: Option<u8>,

    /// Compiled rule archive
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// ValidationConfig as JSON; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Allow several words attached to the root
    #[arg(long)]
    multiple_roots: bool,

    /// Compare # text with FORM and SpaceAfter=No
    #[arg(long)]
    check_tree_text: bool,

    /// Do not require SpaceAfter=No where the text has no space
    #[arg(long)]
    no_space_after: bool,

    #[arg(long, value_enum)]
    deprel_policy: Option<Policy>,

    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compile(args) => compile(args).map(|_| ExitCode::SUCCESS),
        Command::Validate(args) => validate(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn compile(args: CompileArgs) -> Result<()> {
    // 1. Read the tables
    let mut feats: FeatsFile = read_json(&args.feats)?;
    let deprels: DeprelsFile = read_json(&args.deprels)?;
    let data: DataFile = read_json(&args.data)?;
    if let (Some(path), Some(lang)) = (&args.add_features, &args.lang) {
        let extra: BTreeMap<String, RawFeature> = read_json(path)?;
        add_features(&mut feats, lang, extra);
    }
    let lists = match &args.lists {
        Some(dir) => {
            let langs: BTreeSet<String> = feats.features.keys().chain(deprels.deprels.keys()).cloned().collect();
            Lists::load(dir, &langs)?
        }
        None => Lists::default(),
    };

    // 2. Merge per language
    let db = build_database(&feats, &deprels, &data, &lists)?;

    // 3. Serialize to rkyv
    let mut serializer = AllocSerializer::<256>::default();
    serializer
        .serialize_value(&db)
        .map_err(|e| anyhow::anyhow!("failed to serialize rule database: {e:?}"))?;
    let bytes = serializer.into_serializer().into_inner();

    // 4. Write the archive
    fs::write(&args.output, &bytes).with_context(|| format!("writing {}", args.output.display()))?;
    info!(languages = db.languages.len(), bytes = bytes.len(), output = %args.output.display(), "rule archive written");
    Ok(())
}

fn load_config(args: &ValidateArgs) -> Result<ValidationConfig> {
    let mut config: ValidationConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => ValidationConfig::default(),
    };
    if let Some(lang) = &args.lang {
        config.lang = lang.clone();
    }
    if let Some(level) = args.level {
        config.level = level;
    }
    if args.multiple_roots {
        config.single_root = false;
    }
    if args.check_tree_text {
        config.check_tree_text = true;
    }
    if args.no_space_after {
        config.check_space_after = false;
    }
    if let Some(policy) = args.deprel_policy {
        config.deprel_language_policy = policy.into();
    }
    Ok(config)
}

fn load_validator(config: ValidationConfig, rules: Option<&Path>) -> Result<Validator> {
    let Some(path) = rules else {
        return Ok(Validator::new(config, NoLanguageData));
    };
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut aligned = rkyv::AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(&bytes);
    Validator::from_archive(config, &aligned).with_context(|| format!("loading {}", path.display()))
}

fn validate(args: ValidateArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let mut validator = load_validator(config, args.rules.as_deref())?;

    // 1. Validate every input in one run so sent_ids are checked across files
    let mut reports = Vec::new();
    if args.files.is_empty() {
        validator.validate_reader(io::stdin().lock())?;
        reports.push(validator.take_report(Some("<stdin>".to_string())));
    }
    for path in &args.files {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        validator
            .validate_reader(BufReader::new(file))
            .with_context(|| format!("validating {}", path.display()))?;
        reports.push(validator.take_report(Some(path.display().to_string())));
        debug!(file = %path.display(), "validated");
    }

    // 2. Print
    let errors: usize = reports.iter().map(Report::len).sum();
    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        Format::Text => {
            for report in &reports {
                print!("{}", report);
            }
            println!("{}", summary(&reports));
        }
    }
    Ok(if errors == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn summary(reports: &[Report]) -> String {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for entry in reports.iter().flat_map(|r| &r.entries) {
        *counts.entry(entry.category).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();
    if total == 0 {
        return "*** PASSED ***".to_string();
    }
    let mut out = String::new();
    for (category, n) in &counts {
        out.push_str(&format!("{} errors: {}\n", category, n));
    }
    out.push_str(&format!("*** FAILED *** with {} errors", total));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use conllu_protocol::ErrorEntry;

    fn entry(category: Category) -> ErrorEntry {
        ErrorEntry {
            sentence_id: Some("s1".to_string()),
            alt_id: None,
            order: 0,
            tree_counter: 1,
            level: 2,
            category,
            test_id: "probe".to_string(),
            message: "probe".to_string(),
            node_id: None,
            line_no: Some(1),
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(summary(&[Report::new(None, vec![])]), "*** PASSED ***");
        let report = Report::new(
            None,
            vec![entry(Category::Syntax), entry(Category::Format), entry(Category::Syntax)],
        );
        assert_eq!(
            summary(&[report]),
            "Format errors: 1\nSyntax errors: 2\n*** FAILED *** with 3 errors"
        );
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "conllu-check",
            "validate",
            "--lang",
            "la",
            "--level",
            "4",
            "--multiple-roots",
            "--deprel-policy",
            "union",
            "a.conllu",
        ]);
        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.lang, "la");
        assert_eq!(config.level, 4);
        assert!(!config.single_root);
        assert!(config.check_space_after);
        assert_eq!(config.deprel_language_policy, DeprelLanguagePolicy::Union);
        assert_eq!(args.files, [PathBuf::from("a.conllu")]);
    }

    #[test]
    fn test_add_features_requires_lang() {
        let parsed = Cli::try_parse_from([
            "conllu-check", "compile", "--feats", "f.json", "--deprels", "d.json", "--data", "x.json",
            "--add-features", "extra.json", "-o", "out.bin",
        ]);
        assert!(parsed.is_err());
    }
}
