//! Filing adapter: derives the `-xbrl.zip` archive location for an index
//! row and pulls the instance document out of the archive. The extraction
//! core only ever sees the resulting XML string.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::io::{Cursor, Read};
use url::Url;
use zip::ZipArchive;

use crate::utils::http::fetch_bytes;

pub const EDGAR_ARCHIVES_URL: &str = "https://www.sec.gov/Archives/";

/// Archive URL of the XBRL attachment bundle for one filing.
///
/// `edgar/data/320193/0001193125-15-356351.txt` becomes
/// `.../edgar/data/320193/000119312515356351/0001193125-15-356351-xbrl.zip`
/// (accession number with dashes removed names the filing directory).
pub fn xbrl_zip_url(filename: &str) -> Result<Url> {
    let (dir, basename) = filename
        .rsplit_once('/')
        .ok_or_else(|| anyhow!("index filename has no directory: {:?}", filename))?;
    let accession = basename
        .strip_suffix(".txt")
        .ok_or_else(|| anyhow!("index filename is not a .txt filing: {:?}", filename))?;
    let url = Url::parse(EDGAR_ARCHIVES_URL)?.join(&format!(
        "{}/{}/{}-xbrl.zip",
        dir,
        accession.replace('-', ""),
        accession
    ))?;
    Ok(url)
}

/// Instance document from a `-xbrl.zip` archive: the shortest-named `.xml`
/// member, which in SEC bundles is the instance (the longer names are
/// label/presentation/calculation linkbases). `None` when the archive
/// carries no XML at all, in which case the caller records the filing as
/// having no usable XBRL.
pub fn instance_from_zip(bytes: &[u8]) -> Result<Option<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("opening xbrl zip")?;
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| name.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    names.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    let Some(name) = names.first() else {
        return Ok(None);
    };
    log::debug!("instance document member: {}", name);
    let mut member = archive.by_name(name)?;
    let mut xml = String::new();
    member.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// Downloads a filing's XBRL bundle and extracts the instance document.
pub async fn fetch_xbrl_instance(
    client: &Client,
    filename: &str,
    user_agent: &str,
) -> Result<Option<String>> {
    let url = xbrl_zip_url(filename)?;
    log::info!("Downloading filing archive {}", url);
    let bytes = fetch_bytes(client, &url, user_agent).await?;
    instance_from_zip(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn derives_xbrl_zip_url() {
        let url = xbrl_zip_url("edgar/data/320193/0001193125-15-356351.txt").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.sec.gov/Archives/edgar/data/320193/000119312515356351/0001193125-15-356351-xbrl.zip"
        );
    }

    #[test]
    fn rejects_non_txt_filenames() {
        assert!(xbrl_zip_url("edgar/data/320193/0001193125-15-356351.htm").is_err());
        assert!(xbrl_zip_url("no-directory.txt").is_err());
    }

    fn zip_with(members: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in members {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn picks_shortest_xml_member() {
        let bytes = zip_with(&[
            ("aapl-20151231_lab.xml", "<lab/>"),
            ("aapl-20151231.xml", "<instance/>"),
            ("aapl-20151231_pre.xml", "<pre/>"),
            ("report.txt", "not xml"),
        ]);
        let xml = instance_from_zip(&bytes).unwrap().unwrap();
        assert_eq!(xml, "<instance/>");
    }

    #[test]
    fn archive_without_xml_yields_none() {
        let bytes = zip_with(&[("report.txt", "not xml")]);
        assert_eq!(instance_from_zip(&bytes).unwrap(), None);
    }
}
