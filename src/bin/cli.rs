use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use reqwest::Client;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

use stockfacts::{
    config::Config,
    edgar::{filing, index},
    edgar::xbrl::XbrlInstance,
    persist::{load_attributes, MemorySink},
    utils::dirs,
};

#[derive(Debug, StructOpt)]
#[structopt(name = "stockfacts-cli", about = "SEC EDGAR XBRL attribute importer")]
enum Command {
    /// Download one quarterly filing index and convert it to CSV.
    ImportIndex {
        #[structopt(long)]
        year: i32,
        /// Calendar quarter, 1-4.
        #[structopt(long)]
        quarter: u32,
        /// Comma-separated form types to keep; empty keeps everything.
        #[structopt(long, default_value = "10-K,10-Q")]
        forms: String,
        /// Overrides the configured data directory.
        #[structopt(long, parse(from_os_str))]
        data_dir: Option<PathBuf>,
    },
    /// Extract XBRL attributes from one filing.
    ImportAttrs {
        /// CIK of the company the filing belongs to.
        #[structopt(long)]
        cik: u64,
        /// Index filename (edgar/data/...) to download, or a path to a
        /// local instance document.
        #[structopt(long)]
        filing: String,
        /// Taxonomy namespace prefix to extract.
        #[structopt(long, default_value = "us-gaap")]
        namespace: String,
        /// Filing date recorded with each value.
        #[structopt(long)]
        date: NaiveDate,
        /// Report what would be written without writing anything.
        #[structopt(long)]
        dryrun: bool,
        /// Overrides the configured data directory.
        #[structopt(long, parse(from_os_str))]
        data_dir: Option<PathBuf>,
        /// Print document fields as JSON alongside the summary.
        #[structopt(long)]
        fields: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let config = Config::from_env()?;

    match Command::from_args() {
        Command::ImportIndex {
            year,
            quarter,
            forms,
            data_dir,
        } => {
            let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());
            import_index(&config, &data_dir, year, quarter, &forms).await
        }
        Command::ImportAttrs {
            cik,
            filing,
            namespace,
            date,
            dryrun,
            data_dir,
            fields,
        } => {
            let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());
            import_attrs(&config, &data_dir, cik, &filing, &namespace, date, dryrun, fields).await
        }
    }
}

async fn import_index(
    config: &Config,
    data_dir: &Path,
    year: i32,
    quarter: u32,
    forms: &str,
) -> Result<()> {
    let keep: Vec<&str> = forms.split(',').map(str::trim).filter(|f| !f.is_empty()).collect();

    let client = Client::new();
    let mut records = index::fetch_company_index(&client, year, quarter, &config.user_agent).await?;
    let total = records.len();
    if !keep.is_empty() {
        records.retain(|r| keep.contains(&r.form.as_str()));
    }
    let companies: BTreeSet<u64> = records.iter().map(|r| r.cik).collect();

    let out_dir = dirs::index_dir(data_dir);
    dirs::ensure_dir(&out_dir)?;
    let out = out_dir.join(format!("company_{}_QTR{}.csv", year, quarter));
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_writer(File::create(&out)?);
    writer.write_record(["CIK", "Company Name", "Form Type", "Date Filed", "Filename"])?;
    for r in &records {
        writer.write_record([
            &r.cik.to_string(),
            &r.company_name,
            &r.form,
            &r.date_filed.to_string(),
            &r.filename,
        ])?;
    }
    writer.flush()?;

    println!(
        "{}/QTR{}: {} filings ({} matching forms) from {} companies -> {}",
        year,
        quarter,
        total,
        records.len(),
        companies.len(),
        out.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn import_attrs(
    config: &Config,
    data_dir: &Path,
    cik: u64,
    filing_ref: &str,
    namespace: &str,
    date: NaiveDate,
    dryrun: bool,
    print_fields: bool,
) -> Result<()> {
    let xml = if Path::new(filing_ref).is_file() {
        std::fs::read_to_string(filing_ref)?
    } else {
        let client = Client::new();
        filing::fetch_xbrl_instance(&client, filing_ref, &config.user_agent)
            .await?
            .ok_or_else(|| anyhow!("No XBRL found."))?
    };

    let instance = XbrlInstance::parse(&xml)
        .with_context(|| format!("filing {} is not a usable instance document", filing_ref))?;

    let mut sink = MemorySink::new();
    let stats = load_attributes(&instance, namespace, cik, date, &mut sink)?;

    println!(
        "{} ({}): {} values loaded, {} suppressed, period end {}",
        instance.registrant_name().unwrap_or("unknown registrant"),
        cik,
        stats.upserted,
        stats.suppressed,
        instance.document_period_end_date(),
    );
    if let Some(ticker) = sink.ticker(cik) {
        println!("ticker: {}", ticker);
    }
    for (concept, count) in sink.concept_counts() {
        println!("  {}: {}", concept, count);
    }
    if print_fields {
        println!("{}", serde_json::to_string_pretty(instance.fields())?);
    }

    if dryrun {
        println!("dryrun: no attribute values were written");
        return Ok(());
    }
    let out = write_values(data_dir, cik, &sink)?;
    println!("wrote {}", out.display());
    Ok(())
}

fn write_values(data_dir: &Path, cik: u64, sink: &MemorySink) -> Result<PathBuf> {
    let out_dir = dirs::attrs_dir(data_dir);
    dirs::ensure_dir(&out_dir)?;
    let out = out_dir.join(format!("attrs_{}.csv", cik));
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_writer(File::create(&out)?);
    writer.write_record([
        "CIK",
        "Namespace",
        "Attribute",
        "Value",
        "Unit",
        "Start Date",
        "End Date",
        "Decimals",
        "Filing Date",
    ])?;
    for v in sink.values() {
        writer.write_record([
            &v.cik.to_string(),
            &v.fact.namespace,
            &v.fact.name,
            &v.fact.value,
            &v.fact.unit,
            &v.fact.start_date.to_string(),
            &v.fact.end_date.to_string(),
            &v.fact.decimals.to_string(),
            &v.filing_date.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(out)
}
