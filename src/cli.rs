use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use filtermix_core::{Color, FilterClass, FilterKind, ParameterValue, Position, Size};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Where presets and imported lookups are kept.
    #[arg(long, env = "FILTERMIX_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding the bundled `lookup_*.png` assets.
    #[arg(long, global = true)]
    pub assets_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the filter catalog with each filter's parameters.
    Filters {
        #[arg(long, value_enum)]
        group: Option<Group>,
    },
    /// Run a filter stack over an image, or every image in a directory.
    Render(RenderArgs),
    /// Manage saved filter stacks.
    Presets {
        #[command(subcommand)]
        command: PresetsCommand,
    },
    /// Manage imported lookup images.
    Lookups {
        #[command(subcommand)]
        command: LookupsCommand,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Group {
    Generic,
    Lookup,
    CoreImage,
}

impl From<Group> for FilterClass {
    fn from(group: Group) -> Self {
        match group {
            Group::Generic => FilterClass::Generic,
            Group::Lookup => FilterClass::Lookup,
            Group::CoreImage => FilterClass::CoreImage,
        }
    }
}

/// Describes a filter stack: an optional preset, extra filters appended to
/// it, parameter overrides and imported lookups run ahead of it.
#[derive(Args, Debug, Default, Clone)]
pub struct StackArgs {
    /// Start from a saved preset.
    #[arg(long)]
    pub preset: Option<String>,

    /// Append a filter by tag, e.g. `sepia`.
    #[arg(long = "filter")]
    pub filters: Vec<FilterKind>,

    /// Set a parameter as `INDEX.NAME=VALUE`, e.g. `0.intensity=0.4`.
    #[arg(long = "set")]
    pub assignments: Vec<Assignment>,

    /// Run an imported lookup before the stack.
    #[arg(long = "lookup")]
    pub lookups: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    /// Shrink inputs so the longest edge fits.
    #[arg(long)]
    pub max_edge: Option<u32>,

    #[command(flatten)]
    pub stack: StackArgs,
}

#[derive(Subcommand, Debug)]
pub enum PresetsCommand {
    List,
    Show { name: String },
    Delete { name: String },
    Save {
        name: String,
        #[command(flatten)]
        stack: StackArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum LookupsCommand {
    List,
    Import {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    Delete { name: String },
    /// Render the color part of a stack into a new 512x512 lookup image.
    Bake {
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        stack: StackArgs,
    },
}

/// A `INDEX.NAME=VALUE` parameter override. The value stays raw until the
/// target parameter's kind is known.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub index: usize,
    pub name: String,
    pub raw: String,
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected INDEX.NAME=VALUE, got `{s}`"))?;
        let (index, name) = target
            .split_once('.')
            .ok_or_else(|| format!("expected INDEX.NAME before `=`, got `{target}`"))?;
        let index = index
            .trim()
            .parse()
            .map_err(|_| format!("`{index}` is not a filter index"))?;
        if name.is_empty() {
            return Err(format!("missing parameter name in `{s}`"));
        }
        Ok(Self {
            index,
            name: name.trim().to_owned(),
            raw: raw.trim().to_owned(),
        })
    }
}

/// Parse `raw` as a value of `kind`: `0.4`, `x,y`, `w,h` or `r,g,b[,a]`.
pub fn parse_value(kind: &str, raw: &str) -> Result<ParameterValue> {
    let numbers = raw
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>();
    let Ok(numbers) = numbers else {
        bail!("`{raw}` is not a list of numbers");
    };
    Ok(match (kind, numbers.as_slice()) {
        ("FLOAT", &[v]) => ParameterValue::Float(v),
        ("POSITION", &[x, y]) => ParameterValue::Position(Position::new(x, y)),
        ("SIZE", &[w, h]) => ParameterValue::Size(Size::new(w, h)),
        ("COLOR", &[r, g, b]) => ParameterValue::Color(Color::rgb(r, g, b)),
        ("COLOR", &[r, g, b, a]) => ParameterValue::Color(Color::new(r, g, b, a)),
        _ => bail!("`{raw}` is not a valid {kind} value"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_assignment() {
        let a: Assignment = "1.blurRadiusInPixels=12".parse().unwrap();
        assert_eq!(
            a,
            Assignment {
                index: 1,
                name: "blurRadiusInPixels".into(),
                raw: "12".into(),
            }
        );
        assert!("intensity=0.4".parse::<Assignment>().is_err());
        assert!("x.intensity=0.4".parse::<Assignment>().is_err());
        assert!("0.=0.4".parse::<Assignment>().is_err());
    }

    #[test]
    fn parses_values_by_kind() {
        assert_eq!(parse_value("FLOAT", "0.4").unwrap(), ParameterValue::Float(0.4));
        assert_eq!(
            parse_value("POSITION", "0.2, 0.8").unwrap(),
            ParameterValue::Position(Position::new(0.2, 0.8))
        );
        assert_eq!(
            parse_value("COLOR", "1,0,0").unwrap(),
            ParameterValue::Color(Color::RED)
        );
        assert_eq!(
            parse_value("COLOR", "1,0,0,0.5").unwrap(),
            ParameterValue::Color(Color::new(1.0, 0.0, 0.0, 0.5))
        );
        assert!(parse_value("FLOAT", "0.1,0.2").is_err());
        assert!(parse_value("SIZE", "wide").is_err());
    }

    #[test]
    fn render_accepts_a_stack() {
        let cli = Cli::try_parse_from([
            "filtermix",
            "render",
            "--input",
            "in.jpg",
            "--output",
            "out.png",
            "--filter",
            "sepia",
            "--filter",
            "gaussianBlur",
            "--set",
            "0.intensity=0.4",
        ])
        .unwrap();
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(
            args.stack.filters,
            vec![FilterKind::Sepia, FilterKind::GaussianBlur]
        );
        assert_eq!(args.stack.assignments.len(), 1);
    }

    #[test]
    fn unknown_filter_tag_is_rejected() {
        let result = Cli::try_parse_from([
            "filtermix", "render", "--input", "a", "--output", "b", "--filter", "nope",
        ]);
        assert!(result.is_err());
    }
}
