use std::io::Write;

use anyhow::Result;
use filtermix_core::{FilterClass, FilterKind, ParameterDescriptor};

pub fn list(group: Option<FilterClass>, out: &mut dyn Write) -> Result<()> {
    let filters: Vec<FilterKind> = match group {
        Some(FilterClass::Generic) => FilterKind::generic_filters(),
        Some(FilterClass::Lookup) => FilterKind::lookup_filters(),
        Some(FilterClass::CoreImage) => FilterKind::core_image_filters(),
        None => FilterKind::all().to_vec(),
    };
    for filter in filters {
        writeln!(out, "{:<28} {} [{}]", filter.as_str(), filter.display_name(), filter.class())?;
        for descriptor in filter.parameters() {
            writeln!(out, "    {}", describe(&descriptor))?;
        }
    }
    Ok(())
}

fn describe(descriptor: &ParameterDescriptor) -> String {
    let mut line = format!("{:<24} {}", descriptor.name(), descriptor.kind());
    if let Some(range) = descriptor.range() {
        line.push_str(&format!(" {}..={}", range.start(), range.end()));
    }
    if let Some(steps) = descriptor.step_count() {
        line.push_str(&format!(" ({steps} steps)"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(group: Option<FilterClass>) -> String {
        let mut out = Vec::new();
        list(group, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn lists_parameters_under_each_filter() {
        let text = render(Some(FilterClass::Generic));
        assert!(text.contains("sepia"));
        assert!(text.contains("    intensity"));
        assert!(!text.contains("amatorka"));
    }

    #[test]
    fn full_listing_has_one_header_per_filter() {
        let text = render(None);
        let headers = text.lines().filter(|l| !l.starts_with(' ')).count();
        assert_eq!(headers, FilterKind::all().len());
    }
}
