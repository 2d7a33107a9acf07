pub mod filters;
pub mod lookups;
pub mod presets;
pub mod render;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use filtermix_core::FilterMixer;
use filtermix_lookups::{AssetLookups, LookupStore};
use filtermix_presets::{RepresentationLibrary, SqliteStore};
use tracing::info;

use crate::cli::{Command, LookupsCommand, PresetsCommand, StackArgs, parse_value};
use crate::settings::Settings;

pub fn run(command: Command, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Filters { group } => filters::list(group.map(Into::into), out),
        Command::Render(args) => render::run(&args, settings),
        Command::Presets { command } => match command {
            PresetsCommand::List => presets::list(settings, out),
            PresetsCommand::Show { name } => presets::show(settings, &name, out),
            PresetsCommand::Delete { name } => presets::delete(settings, &name, out),
            PresetsCommand::Save { name, stack } => presets::save(settings, &name, &stack, out),
        },
        Command::Lookups { command } => match command {
            LookupsCommand::List => lookups::list(settings, out),
            LookupsCommand::Import { path, name } => {
                lookups::import(settings, &path, name.as_deref(), out)
            }
            LookupsCommand::Delete { name } => lookups::delete(settings, &name, out),
            LookupsCommand::Bake { output, stack } => lookups::bake(settings, &output, &stack),
        },
    }
}

pub fn open_library(settings: &Settings) -> Result<RepresentationLibrary<SqliteStore>> {
    Ok(RepresentationLibrary::new(SqliteStore::open(
        &settings.presets_db,
    )?))
}

/// Assemble the mixer `stack` describes. Preset filters come first, then the
/// `--filter` tags; overrides index into the combined list.
pub fn build_mixer(settings: &Settings, stack: &StackArgs) -> Result<FilterMixer> {
    let resolver = Arc::new(AssetLookups::new(settings.assets_dir.clone()));
    let mut mixer = FilterMixer::new(resolver);

    if let Some(name) = &stack.preset {
        let representation = open_library(settings)?
            .load(name)?
            .with_context(|| format!("no preset named `{name}`"))?;
        info!(preset = %name, items = representation.items.len(), "loaded preset");
        mixer.load_representation(representation);
    }

    if !stack.filters.is_empty() {
        let mut filters = mixer.filters().to_vec();
        filters.extend_from_slice(&stack.filters);
        mixer.set_filters(filters);
    }

    for assignment in &stack.assignments {
        let filter = mixer
            .filters()
            .get(assignment.index)
            .copied()
            .with_context(|| {
                format!(
                    "--set {}.{}: the stack has {} filters",
                    assignment.index,
                    assignment.name,
                    mixer.filters().len()
                )
            })?;
        let descriptor = filter.parameter(&assignment.name)?;
        let value = parse_value(descriptor.kind(), &assignment.raw)
            .with_context(|| format!("--set {}.{}", assignment.index, assignment.name))?;
        mixer.set_parameter(assignment.index, &assignment.name, value)?;
    }

    if !stack.lookups.is_empty() {
        let store = LookupStore::open(settings.lookups_dir.clone())?;
        let mut tables = Vec::with_capacity(stack.lookups.len());
        for name in &stack.lookups {
            let table = store
                .load(name)?
                .with_context(|| format!("no imported lookup named `{name}`"))?;
            tables.push(Arc::new(table));
        }
        mixer.set_custom_lookups(tables);
    }

    Ok(mixer)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use super::*;
    use crate::cli::Assignment;
    use filtermix_core::{FilterKind, ParameterValue};

    pub fn settings(root: &Path) -> Settings {
        Settings::resolve(Some(root.to_path_buf()), None).unwrap()
    }

    pub fn vintage_stack() -> StackArgs {
        StackArgs {
            filters: vec![FilterKind::Sepia, FilterKind::GaussianBlur],
            assignments: vec![
                "0.intensity=0.4".parse().unwrap(),
                "1.blurRadiusInPixels=12".parse().unwrap(),
            ],
            ..StackArgs::default()
        }
    }

    #[test]
    fn builds_stack_with_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let mixer = build_mixer(&settings(tmp.path()), &vintage_stack()).unwrap();
        assert_eq!(
            mixer.parameter(0, "intensity").unwrap(),
            ParameterValue::Float(0.4)
        );
        assert_eq!(
            mixer.parameter(1, "blurRadiusInPixels").unwrap(),
            ParameterValue::Float(12.0)
        );
    }

    #[test]
    fn override_past_the_end_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let stack = StackArgs {
            filters: vec![FilterKind::Sepia],
            assignments: vec![Assignment {
                index: 3,
                name: "intensity".into(),
                raw: "0.5".into(),
            }],
            ..StackArgs::default()
        };
        assert!(build_mixer(&settings(tmp.path()), &stack).is_err());
    }

    #[test]
    fn missing_preset_and_lookup_are_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path());
        let with_preset = StackArgs {
            preset: Some("Nope".into()),
            ..StackArgs::default()
        };
        assert!(build_mixer(&settings, &with_preset).is_err());

        let with_lookup = StackArgs {
            lookups: vec!["nope".into()],
            ..StackArgs::default()
        };
        assert!(build_mixer(&settings, &with_lookup).is_err());
    }
}
