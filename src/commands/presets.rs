use std::io::Write;

use anyhow::{Context, Result};

use crate::cli::StackArgs;
use crate::commands::{build_mixer, open_library};
use crate::settings::Settings;

pub fn list(settings: &Settings, out: &mut dyn Write) -> Result<()> {
    for name in open_library(settings)?.names()? {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

pub fn show(settings: &Settings, name: &str, out: &mut dyn Write) -> Result<()> {
    let representation = open_library(settings)?
        .load(name)?
        .with_context(|| format!("no preset named `{name}`"))?;
    writeln!(out, "{representation}")?;
    Ok(())
}

pub fn delete(settings: &Settings, name: &str, out: &mut dyn Write) -> Result<()> {
    if open_library(settings)?.delete(name)? {
        writeln!(out, "deleted {name}")?;
    } else {
        writeln!(out, "no preset named {name}")?;
    }
    Ok(())
}

pub fn save(settings: &Settings, name: &str, stack: &StackArgs, out: &mut dyn Write) -> Result<()> {
    let mixer = build_mixer(settings, stack)?;
    open_library(settings)?.save(name, mixer.representation())?;
    writeln!(out, "saved {name} ({} filters)", mixer.filters().len())?;
    Ok(())
}
