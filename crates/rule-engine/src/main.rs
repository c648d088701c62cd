//! 规则校验命令行
//!
//! 读取规则定义文件与记录文件，输出校验结论或逐条规则报告。

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use ruler::{DataFormat, Report, RulerDefinition};
use ruler_shared::config::AppConfig;
use ruler_shared::observability;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "ruler", about = "Validate a record against a rule set")]
struct Cli {
    /// 规则定义文件（JSON / YAML），未指定时使用配置中的 engine.rules_file
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// 待校验的记录文件
    #[arg(short = 'i', long)]
    record: PathBuf,

    /// 记录格式，未指定时按扩展名推断，再回退到配置
    #[arg(short, long)]
    format: Option<DataFormat>,

    /// 输出逐条规则报告
    #[arg(long)]
    report: bool,
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    matched: bool,
    results: &'a Report,
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let config = AppConfig::load("ruler").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });
    observability::init(&config.observability)?;

    let rules_path = cli
        .rules
        .clone()
        .or_else(|| config.engine.rules_file.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow!("no rules file given (use --rules or engine.rules_file)"))?;

    let definition = load_definition(&rules_path)?;
    let ruler = definition
        .build()
        .with_context(|| format!("invalid rule definition {}", rules_path.display()))?;
    info!(
        rules = ruler.rules().len(),
        combinator = %ruler.combinator(),
        "规则组已加载"
    );

    let format = match cli.format.or_else(|| format_of(&cli.record)) {
        Some(format) => format,
        None => config.engine.format.parse()?,
    };
    let bytes = std::fs::read(&cli.record)
        .with_context(|| format!("failed to read record {}", cli.record.display()))?;
    let record = format
        .decoder()
        .decode(&bytes)
        .with_context(|| format!("failed to decode record as {}", format))?;

    if cli.report || config.engine.report {
        let (results, matched) = ruler.validate_with_result(&record);
        let output = ReportOutput {
            matched,
            results: &results,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(matched)
    } else {
        let matched = ruler.validate(&record);
        println!("{}", matched);
        Ok(matched)
    }
}

fn format_of(path: &Path) -> Option<DataFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(DataFormat::from_extension)
}

fn load_definition(path: &Path) -> Result<RulerDefinition> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules {}", path.display()))?;
    let format = format_of(path).unwrap_or(DataFormat::Yaml);
    Ok(RulerDefinition::parse(&text, format)?)
}
