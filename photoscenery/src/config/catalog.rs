//! Map server catalog.
//!
//! Servers are INI sections named `server.<id>`:
//!
//! ```ini
//! [server.1]
//! name = ArcGIS World Imagery
//! url_base = https://services.arcgisonline.com/arcgis/rest/services/World_Imagery/MapServer/export
//! url_command = ?bbox={lonLL},{latLL},{lonUR},{latUR}|bboxSR=4326|size={szWidth},{szHight}|imageSR=4326|format=png|f=image
//! comment = Esri World Imagery
//! ```
//!
//! `|` in `url_command` stands for `&`.

use std::collections::BTreeMap;
use std::path::Path;

use ini::Ini;

use crate::provider::MapServer;

use super::file::ConfigFileError;

const SECTION_PREFIX: &str = "server.";

const ARCGIS_URL_BASE: &str =
    "https://services.arcgisonline.com/arcgis/rest/services/World_Imagery/MapServer/export";
const ARCGIS_URL_COMMAND: &str = "?bbox={lonLL},{latLL},{lonUR},{latUR}|bboxSR=4326|size={szWidth},{szHight}|imageSR=4326|format=png|f=image";

/// Map servers by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapServerCatalog {
    servers: BTreeMap<u32, MapServer>,
}

impl MapServerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding only the ArcGIS World Imagery export endpoint as id 1.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(
            MapServer::new(1, "ArcGIS World Imagery", ARCGIS_URL_BASE, ARCGIS_URL_COMMAND)
                .with_comment("Esri World Imagery, EPSG:4326 export"),
        );
        catalog
    }

    /// Read a standalone catalog file. Servers it defines replace the
    /// built-in entries with the same id.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_file(path)?;
        let mut catalog = Self::builtin();
        catalog.merge_ini(&ini)?;
        Ok(catalog)
    }

    /// Add every `[server.<id>]` section of `ini`.
    pub fn merge_ini(&mut self, ini: &Ini) -> Result<(), ConfigFileError> {
        for (name, props) in ini.iter() {
            let Some(id) = name.and_then(|n| n.strip_prefix(SECTION_PREFIX)) else {
                continue;
            };
            let section = format!("{}{}", SECTION_PREFIX, id);
            let id: u32 = id.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                section: section.clone(),
                key: "id".to_string(),
                value: id.to_string(),
                reason: "server id must be a positive integer".to_string(),
            })?;

            let required = |key: &str| -> Result<String, ConfigFileError> {
                match props.get(key).map(str::trim) {
                    Some(v) if !v.is_empty() => Ok(v.to_string()),
                    _ => Err(ConfigFileError::MissingKey {
                        section: section.clone(),
                        key: key.to_string(),
                    }),
                }
            };

            let server = MapServer::new(
                id,
                required("name")?,
                required("url_base")?,
                required("url_command")?,
            )
            .with_comment(props.get("comment").unwrap_or_default().trim())
            .with_proxy(
                props
                    .get("proxy")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            );

            server.validate().map_err(|e| ConfigFileError::InvalidValue {
                section: section.clone(),
                key: "url_command".to_string(),
                value: server.url_command.clone(),
                reason: e.to_string(),
            })?;
            self.insert(server);
        }
        Ok(())
    }

    pub fn insert(&mut self, server: MapServer) {
        self.servers.insert(server.id, server);
    }

    pub fn get(&self, id: u32) -> Option<&MapServer> {
        self.servers.get(&id)
    }

    /// Like [`get`](Self::get), failing with `UnknownServer`.
    pub fn require(&self, id: u32) -> Result<&MapServer, ConfigFileError> {
        self.get(id).ok_or(ConfigFileError::UnknownServer(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapServer> {
        self.servers.values()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
