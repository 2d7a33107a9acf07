use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::filter::{readable, FilterKind};
use crate::image_buf::ImageBuf;
use crate::operation::Operation;
use crate::operation::lookup::LookupResolver;
use crate::parameter::ParameterValue;
use crate::pipeline::Chain;

/// A serializable snapshot of a filter stack and every parameter value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationRepresentation {
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub filter: FilterKind,
    #[serde(rename = "parameterValues")]
    pub parameter_values: BTreeMap<String, ParameterValue>,
}

impl Item {
    /// Read every descriptor of `filter` from `operation`. Descriptors that
    /// fail are left out.
    pub fn capture(filter: FilterKind, operation: &Operation) -> Self {
        let mut parameter_values = BTreeMap::new();
        for descriptor in filter.parameters() {
            match descriptor.read(operation) {
                Ok(value) => {
                    parameter_values.insert(descriptor.name().to_owned(), value);
                }
                Err(e) => warn!(filter = filter.as_str(), error = %e, "skipping parameter in snapshot"),
            }
        }
        Self {
            filter,
            parameter_values,
        }
    }

    /// Write the saved values back through `filter`'s descriptors. Missing
    /// values keep the operation's current setting.
    pub fn write_into(&self, operation: &mut Operation) {
        for descriptor in self.filter.parameters() {
            let Some(value) = self.parameter_values.get(descriptor.name()) else {
                continue;
            };
            if let Err(e) = descriptor.write(operation, value) {
                warn!(filter = self.filter.as_str(), error = %e, "skipping parameter on restore");
            }
        }
    }
}

impl OperationRepresentation {
    /// Capture a pipeline given as parallel filter and operation lists.
    pub fn snapshot(filters: &[FilterKind], operations: &[Operation]) -> Self {
        if filters.len() != operations.len() {
            warn!(
                filters = filters.len(),
                operations = operations.len(),
                "filter and operation counts differ, snapshotting the common prefix"
            );
        }
        let items = filters
            .iter()
            .zip(operations)
            .map(|(&filter, operation)| Item::capture(filter, operation))
            .collect();
        Self { items }
    }

    pub fn filters(&self) -> Vec<FilterKind> {
        self.items.iter().map(|item| item.filter).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Write saved values into a freshly built pipeline.
    ///
    /// The k-th item of a given kind restores into the k-th operation of that
    /// kind, so values follow their filter through reorders and duplicates
    /// keep their own settings. Items without a partner are dropped.
    pub fn restore(&self, filters: &[FilterKind], operations: &mut [Operation]) {
        let mut positions: HashMap<FilterKind, Vec<usize>> = HashMap::new();
        for (index, &filter) in filters.iter().enumerate().take(operations.len()) {
            positions.entry(filter).or_default().push(index);
        }

        let mut seen: HashMap<FilterKind, usize> = HashMap::new();
        for item in &self.items {
            let occurrence = seen.entry(item.filter).or_default();
            let target = positions
                .get(&item.filter)
                .and_then(|indices| indices.get(*occurrence))
                .copied();
            *occurrence += 1;

            match target {
                Some(index) => item.write_into(&mut operations[index]),
                None => debug!(filter = item.filter.as_str(), "no partner for cached item"),
            }
        }
    }

    /// Build fresh operations for this representation and run `image` through them.
    pub fn apply(&self, image: &ImageBuf, resolver: &dyn LookupResolver) -> ImageBuf {
        let operations = self
            .items
            .iter()
            .map(|item| {
                let mut operation = item.filter.make_operation();
                operation.bind_lookups(resolver);
                item.write_into(&mut operation);
                operation
            })
            .collect();
        Chain::new(operations).run(image)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- {}", self.filter.display_name())?;
        let lines: Vec<String> = self
            .parameter_values
            .iter()
            .map(|(name, value)| format!("{}: {value}", readable(name)))
            .collect();
        f.write_str(&lines.join("\n"))
    }
}

impl fmt::Display for OperationRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, item) in self.items.iter().enumerate() {
            if index > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}{item}", index + 1)?;
        }
        Ok(())
    }
}
