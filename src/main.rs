//! Document Redaction CLI Application.
//!
//! Command-line front end for the docredact library: rule-driven redaction
//! of PDF and DOCX files with a JSON audit report, text extraction, and the
//! stored submit/prompt flows backed by the configured storage directories.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use docredact::pipeline::entity_detector_from_config;
use docredact::report::merge;
use docredact::{
    Config, Document, PromptRedactRequest, RedactRequest, RedactionPipeline, RedactionRecord,
    RedactionReport, RedactionRule, RedactionService, RuleRecord,
};

/// Document Redaction Tool
///
/// Physically removes matched text from PDF and DOCX documents and writes an
/// audit report of every redaction.
#[derive(Parser)]
#[command(name = "docredact")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact a document with the given rules
    Redact {
        /// Input PDF or DOCX file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        rules: RuleArgs,

        /// Template id recorded in the report
        #[arg(long, value_name = "ID", default_value = "cli")]
        template: String,

        /// Write the redaction report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Prior report to extend; new events continue its numbering
        #[arg(long, value_name = "FILE")]
        prior: Option<PathBuf>,
    },

    /// Redact a document by URL and store the result under the configured
    /// storage directories
    Submit {
        /// Document id the record is stored under
        #[arg(long, value_name = "ID")]
        document_id: String,

        /// Requesting user; the redacted file is stored under this user
        #[arg(long, value_name = "ID")]
        user_id: String,

        /// Source document URL (http, https, file or a plain path)
        #[arg(long, value_name = "URL")]
        url: String,

        #[command(flatten)]
        rules: RuleArgs,

        /// Template id recorded in the report
        #[arg(long, value_name = "ID", default_value = "cli")]
        template: String,
    },

    /// Redact a stored document further with the prompt detector
    Prompt {
        /// Document id of a previously submitted document
        #[arg(long, value_name = "ID")]
        document_id: String,

        /// Requesting user
        #[arg(long, value_name = "ID")]
        user_id: String,

        /// What to look for, in plain language
        #[arg(long, value_name = "TEXT")]
        prompt: String,
    },

    /// Extract text from a document (for debugging and verification)
    Extract {
        /// Input PDF or DOCX file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Rule sources shared by the redacting subcommands.
#[derive(Args)]
struct RuleArgs {
    /// JSON file holding an array of rule records
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Literal text to redact (can be specified multiple times)
    #[arg(short, long, value_name = "TEXT")]
    pattern: Vec<String>,

    /// Regular expression to redact (can be specified multiple times)
    #[arg(short, long, value_name = "REGEX")]
    regex: Vec<String>,

    /// Entity category to redact, e.g. EMAIL or PHONE (can be specified multiple times)
    #[arg(short, long, value_name = "CATEGORY")]
    entity: Vec<String>,
}

impl RuleArgs {
    fn load(&self) -> Result<Vec<RedactionRule>> {
        let records = match &self.rules {
            Some(path) => read_rule_records(path)?,
            None => Vec::new(),
        };
        Ok(build_rules(records, &self.pattern, &self.regex, &self.entity))
    }
}

/// Output locations for a redaction run.
struct RedactTargets<'a> {
    output: &'a Path,
    report: Option<&'a Path>,
    prior: Option<&'a Path>,
}

/// Command handler over a configured service.
struct RedactionHandler {
    service: RedactionService,
    verbose: bool,
}

impl RedactionHandler {
    fn new(config: &Config, verbose: bool) -> Result<Self> {
        let detector = entity_detector_from_config(&config.detector)
            .context("Failed to set up entity detector")?;
        let service = RedactionService::from_config(config).with_entity_detector(detector);
        Ok(Self { service, verbose })
    }

    fn redact(
        &self,
        input: &Path,
        rules: &[RedactionRule],
        template_id: &str,
        targets: RedactTargets<'_>,
    ) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        if rules.is_empty() {
            anyhow::bail!(
                "No redaction rules specified. Use --rules, --pattern, --regex, or --entity."
            );
        }

        let prior = targets.prior.map(read_report).transpose()?;

        if self.verbose {
            println!("Input:  {}", input.display());
            println!("Output: {}", targets.output.display());
            println!("Rules:  {} rule(s)", rules.len());
        }

        let document = Document::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        let outcome = self
            .service
            .redact(&document, rules, template_id)
            .with_context(|| "Redaction failed")?;

        std::fs::write(targets.output, outcome.document.bytes())
            .with_context(|| format!("Failed to write to {}", targets.output.display()))?;

        let report = match &prior {
            Some(prior) => merge(prior, outcome.report),
            None => outcome.report,
        };

        if let Some(report_path) = targets.report {
            let json = serde_json::to_string_pretty(&report)?;
            std::fs::write(report_path, json)
                .with_context(|| format!("Failed to write to {}", report_path.display()))?;
        }

        if self.verbose {
            println!("\nRedaction Summary:");
            println!("  Units processed: {}", outcome.stats.units_processed);
            println!("  Units modified:  {}", outcome.stats.units_modified);
            println!("  Marks applied:   {}", outcome.stats.marks_applied);
            println!("  Report events:   {}", report.total_redactions);
        }

        let added = report.total_redactions - prior.map_or(0, |p| p.total_redactions);
        if added > 0 {
            println!(
                "✓ Successfully redacted {} instance(s) → {}",
                added,
                targets.output.display()
            );
        } else {
            println!("⚠ No instances found to redact");
        }

        Ok(())
    }

    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        let document = Document::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        let text = self
            .service
            .extract_text(&document)
            .with_context(|| "Text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.chars().count(),
                output_path.display()
            );
        } else {
            println!("{}", text);
        }

        Ok(())
    }
}

fn print_record(record: &RedactionRecord, verbose: bool) {
    if verbose {
        println!("Document: {}", record.document_id);
        println!("Template: {}", record.template_id);
        if let Some(previous) = record.total_previous_redactions {
            println!("Previous redactions: {}", previous);
        }
    }
    println!(
        "✓ {} redaction(s) recorded → {}",
        record.report.total_redactions, record.redacted_url
    );
}

fn read_report(path: &Path) -> Result<RedactionReport> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read prior report {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("Invalid prior report {}", path.display()))
}

fn read_rule_records(path: &Path) -> Result<Vec<RuleRecord>> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read rules file {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("Invalid rules file {}", path.display()))
}

/// Builds the rule list: file records first, then literal, regex and entity flags.
fn build_rules(
    records: Vec<RuleRecord>,
    patterns: &[String],
    regexes: &[String],
    entities: &[String],
) -> Vec<RedactionRule> {
    let mut rules = docredact::domain::rules_from_records(records);

    rules.extend(patterns.iter().enumerate().map(|(i, p)| {
        RedactionRule::literal(p.clone(), format!("Literal: {}", p), format!("cli_p{}", i))
    }));
    rules.extend(regexes.iter().enumerate().map(|(i, r)| {
        RedactionRule::regex(r.clone(), format!("Regex: {}", r), format!("cli_r{}", i))
    }));
    if !entities.is_empty() {
        rules.push(RedactionRule::entity(
            entities.iter().cloned(),
            format!("Entities: {}", entities.join(", ")),
            "cli_e0",
        ));
    }

    rules
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    match &cli.command {
        Commands::Extract { input, output } => {
            RedactionHandler::new(&config, cli.verbose)?.extract(input, output.as_deref())?;
        }
        Commands::Submit {
            document_id,
            user_id,
            url,
            rules,
            template,
        } => {
            let rules = rules.load()?;
            if rules.is_empty() {
                anyhow::bail!(
                    "No redaction rules specified. Use --rules, --pattern, --regex, or --entity."
                );
            }
            let pipeline =
                RedactionPipeline::from_config(&config).context("Failed to set up pipeline")?;
            let record = pipeline
                .redact_document(&RedactRequest {
                    document_id: document_id.clone(),
                    template_id: template.clone(),
                    user_id: user_id.clone(),
                    document_url: url.clone(),
                    rules,
                })
                .with_context(|| format!("Redaction of {} failed", document_id))?;
            print_record(&record, cli.verbose);
        }
        Commands::Prompt {
            document_id,
            user_id,
            prompt,
        } => {
            let pipeline =
                RedactionPipeline::from_config(&config).context("Failed to set up pipeline")?;
            let record = pipeline
                .redact_with_prompt(&PromptRedactRequest {
                    document_id: document_id.clone(),
                    user_id: user_id.clone(),
                    prompt: prompt.clone(),
                })
                .with_context(|| format!("Prompt redaction of {} failed", document_id))?;
            print_record(&record, cli.verbose);
        }
        Commands::Redact {
            input,
            output,
            rules,
            template,
            report,
            prior,
        } => {
            let handler = RedactionHandler::new(&config, cli.verbose)?;
            let rules = rules.load()?;
            handler.redact(
                input,
                &rules,
                template,
                RedactTargets {
                    output,
                    report: report.as_deref(),
                    prior: prior.as_deref(),
                },
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docredact::RuleKind;

    #[test]
    fn test_rule_building() {
        let records: Vec<RuleRecord> =
            serde_json::from_str(r#"[{"type": "text", "pattern": "Acme", "id": "f1"}]"#).unwrap();
        let rules = build_rules(
            records,
            &["John".to_string()],
            &[r"\d+".to_string()],
            &["EMAIL".to_string(), "PHONE".to_string()],
        );
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].id(), "f1");
        assert!(matches!(rules[1].kind(), RuleKind::Literal(v) if v == "John"));
        assert!(matches!(rules[2].kind(), RuleKind::Regex(_)));
        assert!(matches!(rules[3].kind(), RuleKind::Entity(c) if c.len() == 2));
    }

    #[test]
    fn test_no_flags_builds_no_rules() {
        assert!(build_rules(Vec::new(), &[], &[], &[]).is_empty());
    }
}
