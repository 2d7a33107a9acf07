use std::io::Write;
use std::path::Path;

use anyhow::Result;
use filtermix_core::source::save_image;
use filtermix_lookups::LookupStore;
use tracing::info;

use crate::cli::StackArgs;
use crate::commands::build_mixer;
use crate::settings::Settings;

fn open_store(settings: &Settings) -> Result<LookupStore> {
    LookupStore::open(settings.lookups_dir.clone())
}

pub fn list(settings: &Settings, out: &mut dyn Write) -> Result<()> {
    for name in open_store(settings)?.names()? {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

pub fn import(
    settings: &Settings,
    path: &Path,
    name: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let stored = open_store(settings)?.import(path, name)?;
    writeln!(out, "{}", stored.display())?;
    Ok(())
}

pub fn delete(settings: &Settings, name: &str, out: &mut dyn Write) -> Result<()> {
    if open_store(settings)?.delete(name)? {
        writeln!(out, "deleted {name}")?;
    } else {
        writeln!(out, "no lookup named {name}")?;
    }
    Ok(())
}

pub fn bake(settings: &Settings, output: &Path, stack: &StackArgs) -> Result<()> {
    let mixer = build_mixer(settings, stack)?;
    let baked = mixer.bake_lookup();
    info!(?output, filters = mixer.filters().len(), "baking lookup");
    save_image(&baked, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::settings;
    use filtermix_core::FilterKind;

    #[test]
    fn bake_import_and_reuse() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(&tmp.path().join("data"));
        let baked = tmp.path().join("sepia.png");

        let stack = StackArgs {
            filters: vec![FilterKind::Sepia],
            ..StackArgs::default()
        };
        bake(&settings, &baked, &stack).unwrap();

        let mut out = Vec::new();
        import(&settings, &baked, Some("sepia"), &mut out).unwrap();
        let mut listed = Vec::new();
        list(&settings, &mut listed).unwrap();
        assert_eq!(String::from_utf8(listed).unwrap(), "sepia\n");

        let replay = StackArgs {
            lookups: vec!["sepia".into()],
            ..StackArgs::default()
        };
        let mixer = build_mixer(&settings, &replay).unwrap();
        assert_eq!(mixer.custom_lookups().len(), 1);

        let mut deleted = Vec::new();
        delete(&settings, "sepia", &mut deleted).unwrap();
        assert_eq!(String::from_utf8(deleted).unwrap(), "deleted sepia\n");
    }

    #[test]
    fn bake_of_empty_stack_is_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(&tmp.path().join("data"));
        let baked = tmp.path().join("identity.png");
        bake(&settings, &baked, &StackArgs::default()).unwrap();

        let table = LookupStore::open(tmp.path().to_path_buf())
            .unwrap()
            .load("identity")
            .unwrap()
            .unwrap();
        let out = table.lookup([0.25, 0.5, 0.75]);
        assert!((out[0] - 0.25).abs() < 0.01);
        assert!((out[2] - 0.75).abs() < 0.01);
    }
}
