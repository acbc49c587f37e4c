//! repo::interchange
//!
//! Import and export pass-throughs.
//!
//! Each call builds the engine's argument vector for one data source
//! (shapefile, GeoJSON, PostGIS, SpatiaLite, OSM) and runs it. Nothing is
//! read or written by this crate except the temporary OSM mapping file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::Repository;
use crate::core::types::refspec;
use crate::error::Result;

/// Options shared by the tabular importers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Add to the destination tree instead of replacing it.
    pub add: bool,
    /// Destination tree; the engine derives one from the source if unset.
    pub dest: Option<String>,
    /// Attribute to use as feature id.
    pub fid_attribute: Option<String>,
    /// Accept features whose type differs from the destination tree's.
    pub force_feature_type: bool,
}

/// PostGIS connection parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgConnection {
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub schema: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl PgConnection {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// `--user`, `--password`, `--schema`, `--port`, in that order.
    fn credential_args(&self, args: &mut Vec<String>) {
        push_opt(args, "--user", self.user.as_deref());
        push_opt(args, "--password", self.password.as_deref());
        push_opt(args, "--schema", self.schema.as_deref());
        push_opt(args, "--port", self.port.map(|p| p.to_string()).as_deref());
    }
}

/// One target field of an OSM mapping rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsmField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// Maps OSM entities with matching tags onto one feature tree.
///
/// Fields are declared in key order so the JSON form has sorted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsmMappingRule {
    #[serde(default)]
    pub exclude: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub fields: BTreeMap<String, OsmField>,
    #[serde(default)]
    pub filter: BTreeMap<String, Vec<String>>,
    pub name: String,
}

impl OsmMappingRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copy tag `tag` into field `name` of type `field_type`.
    pub fn add_field(&mut self, tag: &str, name: &str, field_type: &str) -> &mut Self {
        self.fields.insert(
            tag.to_string(),
            OsmField {
                name: name.to_string(),
                field_type: field_type.to_string(),
            },
        );
        self
    }

    /// Only map entities whose `tag` has one of `values` (any value if
    /// empty).
    pub fn add_filter(&mut self, tag: &str, values: &[&str]) -> &mut Self {
        self.filter
            .insert(tag.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Skip entities whose `tag` has one of `values`.
    pub fn add_exclusion(&mut self, tag: &str, values: &[&str]) -> &mut Self {
        self.exclude
            .insert(tag.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }
}

/// A set of OSM mapping rules.
///
/// ```
/// use geogig_porcelain::repo::{OsmMapping, OsmMappingRule};
///
/// let mut rule = OsmMappingRule::new("roads");
/// rule.add_filter("highway", &[]).add_field("name", "name", "STRING");
/// let mapping = OsmMapping { rules: vec![rule] };
///
/// assert_eq!(
///     serde_json::to_string(&mapping).unwrap(),
///     r#"{"rules":[{"exclude":{},"fields":{"name":{"name":"name","type":"STRING"}},"filter":{"highway":[]},"name":"roads"}]}"#,
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsmMapping {
    pub rules: Vec<OsmMappingRule>,
}

/// Where an OSM mapping comes from.
#[derive(Debug, Clone, Copy)]
pub enum MappingSource<'a> {
    /// An existing mapping file.
    File(&'a Path),
    /// Rules written to a temporary file for the duration of the call.
    Rules(&'a OsmMapping),
}

impl MappingSource<'_> {
    /// The file path to hand the engine. The returned guard, if any, must
    /// outlive the engine call.
    fn materialize(self) -> Result<(String, Option<NamedTempFile>)> {
        match self {
            MappingSource::File(path) => Ok((path.display().to_string(), None)),
            MappingSource::Rules(mapping) => {
                let mut file = NamedTempFile::new()?;
                serde_json::to_writer(&mut file, mapping).map_err(std::io::Error::from)?;
                file.flush()?;
                Ok((file.path().display().to_string(), Some(file)))
            }
        }
    }
}

fn push_opt(args: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, on: bool) {
    if on {
        args.push(flag.to_string());
    }
}

fn command(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn bbox_args(bbox: &[f64; 4]) -> impl Iterator<Item = String> + '_ {
    bbox.iter().map(|c| c.to_string())
}

impl Repository {
    pub fn import_shp(&self, shapefile: &Path, options: &ImportOptions) -> Result<()> {
        let mut args = command(&["shp", "import"]);
        args.push(path_arg(shapefile));
        push_opt(&mut args, "--dest", options.dest.as_deref());
        push_opt(&mut args, "--fid-attrib", options.fid_attribute.as_deref());
        push_flag(&mut args, "--add", options.add);
        push_flag(&mut args, "--force-featuretype", options.force_feature_type);
        self.run(&args).map(drop)
    }

    /// Import a GeoJSON file; `geom_name` renames the geometry attribute.
    pub fn import_geojson(&self, file: &Path, options: &ImportOptions, geom_name: Option<&str>) -> Result<()> {
        let mut args = command(&["geojson", "import"]);
        args.push(path_arg(file));
        push_opt(&mut args, "--dest", options.dest.as_deref());
        push_opt(&mut args, "--fid-attrib", options.fid_attribute.as_deref());
        push_opt(&mut args, "--geom-name", geom_name);
        push_flag(&mut args, "--add", options.add);
        push_flag(&mut args, "--force-featuretype", options.force_feature_type);
        self.run(&args).map(drop)
    }

    /// Import one PostGIS table, or every table when `table` is `None`.
    pub fn import_pg(&self, conn: &PgConnection, table: Option<&str>, options: &ImportOptions) -> Result<()> {
        let mut args = command(&["pg", "import", "--database", &conn.database]);
        conn.credential_args(&mut args);
        push_opt(&mut args, "--dest", options.dest.as_deref());
        match table {
            Some(table) => push_opt(&mut args, "--table", Some(table)),
            None => args.push("--all".into()),
        }
        push_opt(&mut args, "--host", conn.host.as_deref());
        push_opt(&mut args, "--fid-attrib", options.fid_attribute.as_deref());
        push_flag(&mut args, "--add", options.add);
        push_flag(&mut args, "--force-featuretype", options.force_feature_type);
        self.run(&args).map(drop)
    }

    /// Import a SpatiaLite table. Only `add` and `dest` apply.
    pub fn import_sl(&self, database: &Path, table: &str, options: &ImportOptions) -> Result<()> {
        let mut args = command(&["sl", "import", "--database"]);
        args.push(path_arg(database));
        push_opt(&mut args, "--dest", options.dest.as_deref());
        push_opt(&mut args, "--table", Some(table));
        push_flag(&mut args, "--add", options.add);
        self.run(&args).map(drop)
    }

    /// Export the tree at `reference:path` to a PostGIS table, named after
    /// the path unless `table` is given.
    pub fn export_pg(
        &self,
        reference: &str,
        path: &str,
        table: Option<&str>,
        conn: &PgConnection,
        overwrite: bool,
    ) -> Result<()> {
        let table = table.unwrap_or(path);
        let mut args = command(&["pg", "export", &refspec(reference, path), table, "--database", &conn.database]);
        conn.credential_args(&mut args);
        push_opt(&mut args, "--host", conn.host.as_deref());
        push_flag(&mut args, "-o", overwrite);
        self.run(&args).map(drop)
    }

    /// Export the tree at `reference:path` to a shapefile, overwriting it.
    pub fn export_shp(&self, reference: &str, path: &str, shapefile: &Path) -> Result<()> {
        let mut args = command(&["shp", "export", &refspec(reference, path)]);
        args.push(path_arg(shapefile));
        args.extend(command(&["-o", "--defaulttype"]));
        self.run(&args).map(drop)
    }

    /// Export the tree at `reference:path` to a SpatiaLite table, named
    /// after the path unless `table` is given.
    pub fn export_sl(
        &self,
        reference: &str,
        path: &str,
        database: &Path,
        user: Option<&str>,
        table: Option<&str>,
    ) -> Result<()> {
        let mut args = command(&["sl", "export", &refspec(reference, path), "--database"]);
        args.push(path_arg(database));
        args.push(table.unwrap_or(path).to_string());
        push_opt(&mut args, "--user", user);
        self.run(&args).map(drop)
    }

    /// Write the features of `path` that changed between `old_ref` and
    /// `new_ref` to a shapefile, taking the new versions unless `old`.
    pub fn export_diffs(
        &self,
        old_ref: &str,
        new_ref: &str,
        path: &str,
        shapefile: &Path,
        old: bool,
        overwrite: bool,
    ) -> Result<()> {
        let mut args = command(&["shp", "export-diff", old_ref, new_ref, path]);
        args.push(path_arg(shapefile));
        push_flag(&mut args, "--old", old);
        push_flag(&mut args, "-o", overwrite);
        self.run(&args).map(drop)
    }

    pub fn import_osm(&self, file: &Path, add: bool, mapping: Option<MappingSource<'_>>) -> Result<()> {
        let mut args = command(&["osm", "import"]);
        args.push(path_arg(file));
        push_flag(&mut args, "--add", add);
        let _guard = self.push_mapping(&mut args, mapping)?;
        self.run(&args).map(drop)
    }

    /// Export OSM data to an XML file, optionally from `reference` and
    /// clipped to `bbox` (S, W, N, E).
    pub fn export_osm(&self, file: &Path, reference: Option<&str>, bbox: Option<[f64; 4]>) -> Result<()> {
        let mut args = command(&["osm", "export"]);
        args.push(path_arg(file));
        if let Some(reference) = reference {
            args.push(reference.to_string());
        }
        if let Some(bbox) = &bbox {
            args.extend(bbox_args(bbox));
        }
        self.run(&args).map(drop)
    }

    /// Write the OSM changes between two references as a changeset file.
    pub fn export_osm_changeset(
        &self,
        file: &Path,
        changeset_id: Option<&str>,
        old_ref: Option<&str>,
        new_ref: Option<&str>,
    ) -> Result<()> {
        let mut args = command(&["osm", "create-changeset", "-f"]);
        args.push(path_arg(file));
        args.extend(old_ref.into_iter().chain(new_ref).map(str::to_string));
        push_opt(&mut args, "--id", changeset_id);
        self.run(&args).map(drop)
    }

    /// Download OSM data inside `bbox` and commit it.
    pub fn download_osm(&self, url: &str, bbox: [f64; 4], mapping: Option<MappingSource<'_>>) -> Result<()> {
        let mut args = command(&["osm", "download", url, "--bbox"]);
        args.extend(bbox_args(&bbox));
        let _guard = self.push_mapping(&mut args, mapping)?;
        self.run_mutating(&args).map(drop)
    }

    /// Apply a mapping to the OSM data already in the repository.
    pub fn map_osm(&self, mapping: MappingSource<'_>) -> Result<()> {
        let (file, _guard) = mapping.materialize()?;
        self.run(&["osm", "map", file.as_str()]).map(drop)
    }

    fn push_mapping(&self, args: &mut Vec<String>, mapping: Option<MappingSource<'_>>) -> Result<Option<NamedTempFile>> {
        let Some(mapping) = mapping else {
            return Ok(None);
        };
        let (file, guard) = mapping.materialize()?;
        debug!(%file, "using OSM mapping");
        push_opt(args, "--mapping", Some(&file));
        Ok(guard)
    }
}
