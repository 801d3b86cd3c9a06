//! Quarterly full-index adapter: downloads `company.zip` for one
//! year/quarter and parses the fixed-width `company.idx` listing into
//! filing records. A thin I/O wrapper with no shared state with the
//! extraction core.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use url::Url;
use zip::ZipArchive;

use crate::utils::http::fetch_bytes;

pub const EDGAR_FULL_INDEX_URL: &str = "https://www.sec.gov/Archives/edgar/full-index/";

/// Member of the quarterly archive holding the fixed-width listing.
const COMPANY_IDX: &str = "company.idx";

/// The listing opens with a preamble and column rulers.
const HEADER_LINES: usize = 10;

// Fixed-width columns of company.idx.
const NAME_COL: (usize, usize) = (0, 62);
const FORM_COL: (usize, usize) = (62, 74);
const CIK_COL: (usize, usize) = (74, 86);
const DATE_COL: (usize, usize) = (86, 98);
const FILENAME_COL: usize = 98;

/// One row of the quarterly index: a filing by one company.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub cik: u64,
    pub company_name: String,
    /// Form type, e.g. `10-K` or `10-Q`.
    pub form: String,
    pub date_filed: NaiveDate,
    /// Archive-relative path, e.g. `edgar/data/320193/0001193125-15-356351.txt`.
    pub filename: String,
}

pub fn index_url(year: i32, quarter: u32) -> Result<Url> {
    if !(1..=4).contains(&quarter) {
        return Err(anyhow!("quarter must be 1-4, got {}", quarter));
    }
    let url = Url::parse(EDGAR_FULL_INDEX_URL)?
        .join(&format!("{}/QTR{}/company.zip", year, quarter))?;
    Ok(url)
}

/// Downloads and parses one quarterly company index.
pub async fn fetch_company_index(
    client: &Client,
    year: i32,
    quarter: u32,
    user_agent: &str,
) -> Result<Vec<IndexRecord>> {
    let url = index_url(year, quarter)?;
    log::info!("Downloading index {}", url);
    let bytes = fetch_bytes(client, &url, user_agent).await?;
    let idx = read_zip_member(&bytes, COMPANY_IDX)
        .with_context(|| format!("reading {} for {}/QTR{}", COMPANY_IDX, year, quarter))?;
    Ok(parse_company_index(&idx))
}

/// Parses the whole fixed-width listing, skipping the header block and any
/// row without a filing date.
///
/// Listings are latin-1 in the wild, so the column slicing happens on raw
/// bytes; each field is lossy-decoded on its own afterwards, keeping later
/// columns aligned no matter what the company name contains.
pub fn parse_company_index(idx: &[u8]) -> Vec<IndexRecord> {
    idx.split(|b| *b == b'\n')
        .skip(HEADER_LINES)
        .filter_map(parse_index_line)
        .collect()
}

fn parse_index_line(line: &[u8]) -> Option<IndexRecord> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let date = column(line, DATE_COL.0, DATE_COL.1)?;
    let date_filed = NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?;
    let cik = column(line, CIK_COL.0, CIK_COL.1)?.parse().ok()?;
    let filename = line
        .get(FILENAME_COL..)
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .unwrap_or_default();
    Some(IndexRecord {
        cik,
        company_name: column(line, NAME_COL.0, NAME_COL.1).unwrap_or_default(),
        form: column(line, FORM_COL.0, FORM_COL.1).unwrap_or_default(),
        date_filed,
        filename,
    })
}

fn column(line: &[u8], start: usize, end: usize) -> Option<String> {
    let bytes = line.get(start..end.min(line.len()))?;
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn read_zip_member(bytes: &[u8], member: &str) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut file = archive.by_name(member)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}
