//! meridian - 国と下位区分のデータセットを読み込み、選択結果を表示する
//!
//! 1. 設定（TOML）を読み、JSON ファイルの RecordReader で CountrySelector を組み立てる
//! 2. `init()` で読み込みを開始し、完了を待つ
//! 3. 読み込みレポートを表示し、`--country` が指定されていれば選択して結果を表示

mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use meridian_core::config::load_config;
use meridian_core::{CountrySelector, LoadReport};

#[derive(Debug, Parser)]
#[command(name = "meridian", about = "Load ISO 3166 countries and subdivisions")]
struct Args {
    /// Config file (TOML). Missing file means built-in defaults.
    #[arg(long, default_value = "meridian.toml")]
    config: PathBuf,

    /// Directory the dataset resources are resolved against.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Country code to select after loading (e.g. US).
    #[arg(long)]
    country: Option<String>,

    /// Print every loaded country.
    #[arg(long)]
    list: bool,

    /// Print the load report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut config = load_config(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(dir) = args.data_dir {
        config.resources.base_dir = dir;
    }

    let selector = CountrySelector::builder()
        .config(config)
        .json_files()
        .build()
        .context("building selector")?;

    let report = selector.init()?.wait().await?;
    print_report(&report, args.json)?;

    if args.list {
        for country in selector.available_countries().snapshot() {
            println!("{}  {}", country.code(), country.name());
        }
    }

    if let Some(code) = args.country {
        let Some(country) = selector.find_country_by_code(&code) else {
            bail!("unknown country code: {code}");
        };
        selector.set_country(Some(&country));

        let label = selector.subdivision_label().get();
        println!("{country}: {}", label.as_deref().unwrap_or("(no subdivisions)"));
        for subdivision in selector.subdivisions().snapshot() {
            println!("  {}  {}", subdivision.code(), subdivision.name());
        }
    }

    Ok(())
}

fn print_report(report: &LoadReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!(
        "loaded {} countries, {} subdivisions in {} groups",
        report.countries, report.subdivisions, report.groups
    );
    if report.duplicate_countries > 0 {
        println!("skipped {} duplicate countries", report.duplicate_countries);
    }
    if report.has_unresolved() {
        let codes: Vec<&str> = report.unresolved_codes.iter().map(|c| c.as_str()).collect();
        println!("unresolved country codes: {}", codes.join(", "));
    }
    Ok(())
}
