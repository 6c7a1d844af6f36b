use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use tracing::{debug, info};

use crate::session::SessionContext;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");

/// Properties shown first when a component is displayed, in this order.
pub const PROPERTY_PRIORITY: &[&str] = &[
    "Manufacturer",
    "Product Category",
    "RoHS",
    "Capacitance",
    "Voltage Rating DC",
    "Dielectric",
    "Tolerance",
    "Case Code - in",
    "Case Code - mm",
    "Termination Style",
    "Termination",
    "Minimum Operating Temperature",
    "Maximum Operating Temperature",
    "Length",
    "Width",
    "Height",
    "Product",
    "Qualification",
    "CPU Core",
    "Frequency",
    "RAM Size",
    "Flash Size",
    "Package",
    "Data Rate",
    "Output Voltage",
    "Output Current",
    "Vds",
    "Id",
    "Rds(on)",
    "VRRM",
    "If(AV)",
    "Pitch",
    "Positions",
    "Inductance",
    "Impedance @ 100MHz",
    "Current",
    "Type",
    "ESR",
    "V Rwm",
    "Power",
    "Vz",
    "Channels",
    "Bus Type",
    "Isolation",
    "Gain",
    "Series",
    "Bands",
    "Cable",
    "Interface",
    "Description",
    "Elements",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub part_number: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl CatalogEntry {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Display list: part number (upper-cased) first, then the priority
    /// properties that are present, then everything else.
    pub fn ordered_properties(&self) -> Vec<(String, String)> {
        let mut ordered = vec![("Part Number".to_string(), self.part_number.to_uppercase())];
        for key in PROPERTY_PRIORITY {
            if let Some(value) = self.properties.get(*key) {
                ordered.push((display_key(key), value.clone()));
            }
        }
        for (key, value) in &self.properties {
            let label = display_key(key);
            if !ordered.iter().any(|(seen, _)| *seen == label) {
                ordered.push((label, value.clone()));
            }
        }
        ordered
    }
}

fn display_key(key: &str) -> String {
    key.replace('_', " ")
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    components: Vec<CatalogEntry>,
}

/// Part number lookup table. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct ComponentCatalog {
    entries: HashMap<String, CatalogEntry>,
}

pub fn normalize_part_number(part_number: &str) -> String {
    part_number.trim().to_lowercase()
}

impl ComponentCatalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                entry.part_number = normalize_part_number(&entry.part_number);
                (entry.part_number.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_yaml::from_str(yaml).context("Failed to parse component catalog")?;
        Ok(Self::from_entries(file.components))
    }

    /// The catalog shipped with the library.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {path}"))?;
        let catalog = Self::from_yaml(&content)
            .with_context(|| format!("Invalid catalog file: {path}"))?;
        info!("Loaded {} components from {}", catalog.len(), path);
        Ok(catalog)
    }

    /// Exact match after trimming and lower-casing.
    pub fn get(&self, part_number: &str) -> Option<&CatalogEntry> {
        self.entries.get(&normalize_part_number(part_number))
    }

    /// Like `get`, and records a hit in the session's lookup history.
    pub fn lookup(&self, part_number: &str, session: &mut SessionContext) -> Option<&CatalogEntry> {
        let entry = self.get(part_number)?;
        debug!("Catalog hit for {}", entry.part_number);
        session.record_lookup(&entry.part_number);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Part numbers in sorted order.
    pub fn part_numbers(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        parts.sort_unstable();
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = ComponentCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 141);
        let entry = catalog.get("  TJA1051T ").unwrap();
        assert_eq!(entry.property("Manufacturer"), Some("NXP"));
        assert_eq!(entry.property("Qualification"), Some("AEC-Q100"));
    }

    #[test]
    fn lookup_records_only_hits() {
        let catalog = ComponentCatalog::builtin().unwrap();
        let mut session = SessionContext::new();
        assert!(catalog.lookup("TJA1051T", &mut session).is_some());
        assert!(catalog.lookup("no-such-part", &mut session).is_none());
        assert!(catalog.lookup("tja1051t", &mut session).is_some());
        assert_eq!(session.lookup_history, vec!["tja1051t"]);
    }

    #[test]
    fn ordered_properties_put_priority_keys_first() {
        let catalog = ComponentCatalog::from_yaml(
            r#"
components:
  - part_number: ABC123
    properties:
      Zeta: z
      Package: SO-8
      Manufacturer: Acme
      cell_count: "4"
"#,
        )
        .unwrap();
        let entry = catalog.get("abc123").unwrap();
        let labels: Vec<String> = entry
            .ordered_properties()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            labels,
            vec!["Part Number", "Manufacturer", "Package", "Zeta", "cell count"]
        );
        assert_eq!(entry.ordered_properties()[0].1, "ABC123");
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(ComponentCatalog::from_yaml("components: 7").is_err());
        assert!(ComponentCatalog::load_from_file("/nonexistent/catalog.yaml").is_err());
    }
}
