//! import and export commands
//!
//! File arguments are resolved against the working directory, since the
//! engine runs in the repository root.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};

use crate::cli::args::{ExportFormat, ImportArgs, ImportFormat};
use crate::cli::Context;
use crate::repo::{ImportOptions, MappingSource};
use crate::ui::output;

impl From<ImportArgs> for ImportOptions {
    fn from(args: ImportArgs) -> Self {
        ImportOptions {
            add: args.add,
            dest: args.dest,
            fid_attribute: args.fid_attribute,
            force_feature_type: args.force_feature_type,
        }
    }
}

fn resolve(ctx: &Context, file: &Path) -> Result<PathBuf> {
    Ok(ctx.workdir()?.join(file))
}

fn bbox(values: Option<Vec<f64>>) -> Result<Option<[f64; 4]>> {
    values
        .map(|v| <[f64; 4]>::try_from(v).map_err(|v| anyhow!("bounding box needs 4 numbers, got {}", v.len())))
        .transpose()
}

pub fn import(ctx: &Context, format: ImportFormat) -> Result<()> {
    let repo = ctx.open_repo()?;
    let (file, result) = match format {
        ImportFormat::Shp { file, options } => {
            let file = resolve(ctx, &file)?;
            let result = repo.import_shp(&file, &options.into());
            (file, result)
        }
        ImportFormat::Geojson {
            file,
            options,
            geom_name,
        } => {
            let file = resolve(ctx, &file)?;
            let result = repo.import_geojson(&file, &options.into(), geom_name.as_deref());
            (file, result)
        }
        ImportFormat::Sl {
            database,
            table,
            options,
        } => {
            let file = resolve(ctx, &database)?;
            let result = repo.import_sl(&file, &table, &options.into());
            (file, result)
        }
        ImportFormat::Osm { file, add, mapping } => {
            let file = resolve(ctx, &file)?;
            let mapping = mapping.map(|m| resolve(ctx, &m)).transpose()?;
            let result = repo.import_osm(&file, add, mapping.as_deref().map(MappingSource::File));
            (file, result)
        }
    };
    result.with_context(|| format!("Failed to import {}", file.display()))?;
    output::success(format!("Imported {}", file.display()), ctx.verbosity);
    Ok(())
}

pub fn export(ctx: &Context, format: ExportFormat) -> Result<()> {
    let repo = ctx.open_repo()?;
    let (file, result) = match format {
        ExportFormat::Shp { path, file, reference } => {
            let file = resolve(ctx, &file)?;
            let result = repo.export_shp(&reference, &path, &file);
            (file, result)
        }
        ExportFormat::ShpDiff {
            old,
            new,
            path,
            file,
            old_version,
            overwrite,
        } => {
            let file = resolve(ctx, &file)?;
            let result = repo.export_diffs(&old, &new, &path, &file, old_version, overwrite);
            (file, result)
        }
        ExportFormat::Osm { file, reference, bbox: values } => {
            let file = resolve(ctx, &file)?;
            let result = repo.export_osm(&file, reference.as_deref(), bbox(values)?);
            (file, result)
        }
    };
    result.with_context(|| format!("Failed to export to {}", file.display()))?;
    output::success(format!("Exported to {}", file.display()), ctx.verbosity);
    Ok(())
}
