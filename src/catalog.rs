use std::fs;

use anyhow::Context;
use serde::Deserialize;

pub const SOCIAL_LINKS: [(&str, &str); 4] = [
    ("Linktree", "https://linktr.ee/snailsnft"),
    ("Medium", "https://medium.com/@snailsnft/"),
    ("OmniFlix", "https://omniflix.tv/channel/65182782e1c28773aa199c84"),
    ("YouTube", "https://www.youtube.com/@SNAILS._/videos"),
];

#[derive(Deserialize, Debug, Clone)]
pub struct CatalogEntry {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: &str, url: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            url: url.map(|u| u.to_string()),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SubOption {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

impl SubOption {
    pub fn new(name: &str, url: Option<&str>) -> SubOption {
        SubOption {
            name: name.to_string(),
            url: url.map(|u| u.to_string()),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct OptionGroup {
    name: String,
    options: Vec<SubOption>,
}

impl OptionGroup {
    pub fn new(name: &str, options: Vec<SubOption>) -> OptionGroup {
        OptionGroup {
            name: name.to_string(),
            options,
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &[SubOption] {
        &self.options
    }
}

/// The two lookup tables the bot answers from. Order matters: queries are
/// checked against the catalog first, then the groups, and within each table
/// the first match wins.
pub struct LookupTables {
    catalog: Vec<CatalogEntry>,
    groups: Vec<OptionGroup>,
}

impl LookupTables {
    pub fn new(catalog: Vec<CatalogEntry>, groups: Vec<OptionGroup>) -> LookupTables {
        LookupTables { catalog, groups }
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    pub fn groups(&self) -> &[OptionGroup] {
        &self.groups
    }
}

pub fn builtin_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("Linktree", Some("https://linktr.ee/snailsnft")),
        CatalogEntry::new("Medium", Some("https://medium.com/@snailsnft/")),
        CatalogEntry::new("OmniFlix", Some("https://omniflix.tv/channel/65182782e1c28773aa199c84")),
        CatalogEntry::new("YouTube", Some("https://www.youtube.com/@SNAILS._/videos")),
        CatalogEntry::new("Whitepaper", None),
    ]
}

pub fn builtin_groups() -> Vec<OptionGroup> {
    vec![
        OptionGroup::new(
            "Socials",
            vec![
                SubOption::new("Linktree", Some("https://linktr.ee/snailsnft")),
                SubOption::new("Medium", Some("https://medium.com/@snailsnft/")),
                SubOption::new("OmniFlix", Some("https://omniflix.tv/channel/65182782e1c28773aa199c84")),
                SubOption::new("YouTube", Some("https://www.youtube.com/@SNAILS._/videos")),
            ],
        ),
        OptionGroup::new(
            "Videos",
            vec![
                SubOption::new("YouTube Channel", Some("https://www.youtube.com/@SNAILS._/videos")),
                SubOption::new("OmniFlix Channel", Some("https://omniflix.tv/channel/65182782e1c28773aa199c84")),
                SubOption::new("Shorts", None),
            ],
        ),
    ]
}

pub fn load_catalog(path: &str) -> anyhow::Result<Vec<CatalogEntry>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading catalog file {}", path))?;
    let entries = serde_json::from_str(&text)
        .with_context(|| format!("parsing catalog file {}", path))?;
    Ok(entries)
}

pub fn load_groups(path: &str) -> anyhow::Result<Vec<OptionGroup>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading option groups file {}", path))?;
    let groups = serde_json::from_str(&text)
        .with_context(|| format!("parsing option groups file {}", path))?;
    Ok(groups)
}
