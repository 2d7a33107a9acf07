pub mod preview;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{MixerError, ParameterError};
use crate::filter::FilterKind;
use crate::image_buf::ImageBuf;
use crate::operation::lookup::{LookupResolver, LookupTable};
use crate::operation::{LookupFilter, Operation};
use crate::parameter::ParameterValue;
use crate::representation::OperationRepresentation;

/// An owned, ordered run of operations.
///
/// ```text
/// custom filters -> custom lookups -> active filters
/// ```
///
/// A stage that fails is skipped and its input passes through unchanged.
#[derive(Clone, Debug, Default)]
pub struct Chain {
    stages: Vec<Operation>,
}

impl Chain {
    pub fn new(stages: Vec<Operation>) -> Self {
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage in order. A failing stage is logged and skipped, so its
    /// input flows on to the next one.
    pub fn run(&self, input: &ImageBuf) -> ImageBuf {
        let mut current: Option<ImageBuf> = None;
        for stage in &self.stages {
            debug!(operation = stage.name(), "processing");
            match stage.process(current.as_ref().unwrap_or(input)) {
                Ok(output) => current = Some(output),
                Err(e) => warn!(operation = stage.name(), error = %e, "operation failed, passing input through"),
            }
        }
        current.unwrap_or_else(|| input.clone())
    }
}

/// Whether `filtered_image` reflects the current filters and settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Stale,
    Rebuilding,
    Fresh,
}

/// Assembles a filter list into a runnable pipeline and keeps its settings
/// alive across rebuilds.
///
/// Every structural change rebuilds the operations from scratch and restores
/// the cached representation into them. In still mode the rebuild also runs
/// the original image through the chain; in live mode frames are pushed with
/// [`FilterMixer::process_frame`].
pub struct FilterMixer {
    resolver: Arc<dyn LookupResolver>,
    original: Option<ImageBuf>,
    filters: Vec<FilterKind>,
    operations: Vec<Operation>,
    custom_lookups: Vec<Arc<LookupTable>>,
    custom_lookup_operations: Vec<Operation>,
    custom_filters: Vec<Operation>,
    live: bool,
    cached: OperationRepresentation,
    filtered: Option<ImageBuf>,
    state: PipelineState,
}

impl FilterMixer {
    pub fn new(resolver: Arc<dyn LookupResolver>) -> Self {
        Self {
            resolver,
            original: None,
            filters: Vec::new(),
            operations: Vec::new(),
            custom_lookups: Vec::new(),
            custom_lookup_operations: Vec::new(),
            custom_filters: Vec::new(),
            live: false,
            cached: OperationRepresentation::default(),
            filtered: None,
            state: PipelineState::Stale,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn filters(&self) -> &[FilterKind] {
        &self.filters
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn original_image(&self) -> Option<&ImageBuf> {
        self.original.as_ref()
    }

    /// Output of the most recent pass or frame.
    pub fn filtered_image(&self) -> Option<&ImageBuf> {
        self.filtered.as_ref()
    }

    pub fn custom_lookups(&self) -> &[Arc<LookupTable>] {
        &self.custom_lookups
    }

    pub fn set_original_image(&mut self, image: ImageBuf) {
        self.original = Some(image);
        self.configure_pipeline();
    }

    pub fn set_filters(&mut self, filters: Vec<FilterKind>) {
        self.filters = filters;
        self.configure_pipeline();
    }

    pub fn append_filter(&mut self, filter: FilterKind) {
        self.filters.push(filter);
        self.configure_pipeline();
    }

    pub fn remove_filter(&mut self, index: usize) -> Result<FilterKind, ParameterError> {
        self.check_index(index)?;
        let removed = self.filters.remove(index);
        self.configure_pipeline();
        Ok(removed)
    }

    /// Move the filter at `from` so it ends up at position `to`.
    pub fn move_filter(&mut self, from: usize, to: usize) -> Result<(), ParameterError> {
        self.check_index(from)?;
        self.check_index(to)?;
        let filter = self.filters.remove(from);
        self.filters.insert(to, filter);
        self.configure_pipeline();
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.configure_pipeline();
    }

    pub fn set_live_mode(&mut self, live: bool) {
        self.live = live;
        self.configure_pipeline();
    }

    /// User-imported lookup tables, applied before the active filters.
    pub fn set_custom_lookups(&mut self, tables: Vec<Arc<LookupTable>>) {
        self.custom_lookups = tables;
        self.configure_pipeline();
    }

    /// Operations run ahead of everything else in the chain.
    pub fn set_custom_filters(&mut self, operations: Vec<Operation>) {
        self.custom_filters = operations;
        self.configure_pipeline();
    }

    /// Replace the filter list with `representation`'s and restore its values.
    pub fn load_representation(&mut self, representation: OperationRepresentation) {
        self.filters = representation.filters();
        self.cached = representation;
        self.configure_pipeline();
    }

    /// Rebuild every operation from the filter list and restore the cached
    /// values into them.
    pub fn configure_pipeline(&mut self) {
        self.state = PipelineState::Rebuilding;
        info!(
            filters = self.filters.len(),
            custom_lookups = self.custom_lookups.len(),
            custom_filters = self.custom_filters.len(),
            live = self.live,
            "rebuilding pipeline"
        );

        self.operations.clear();
        let mut operations: Vec<Operation> = self
            .filters
            .iter()
            .map(|filter| {
                let mut operation = filter.make_operation();
                operation.bind_lookups(self.resolver.as_ref());
                operation
            })
            .collect();
        self.cached.restore(&self.filters, &mut operations);
        self.operations = operations;

        self.custom_lookup_operations = self
            .custom_lookups
            .iter()
            .map(|table| Operation::from(LookupFilter::with_table(Arc::clone(table))))
            .collect();

        if self.live {
            self.cache_representation();
            self.state = PipelineState::Fresh;
        } else {
            self.process_image();
        }
    }

    /// Run the original image (or a placeholder) through the chain and
    /// re-snapshot the settings.
    pub fn process_image(&mut self) {
        let chain = self.chain();
        let filtered = match &self.original {
            Some(original) => chain.run(original),
            None => {
                debug!("no source image, processing placeholder");
                chain.run(&ImageBuf::placeholder())
            }
        };
        self.filtered = Some(filtered);
        self.cache_representation();
        self.state = PipelineState::Fresh;
    }

    /// Push one frame through the chain.
    pub fn process_frame(&mut self, frame: ImageBuf) -> Result<ImageBuf, MixerError> {
        if !self.live {
            return Err(MixerError::NotLive);
        }
        let output = self.chain().run(&frame);
        self.filtered = Some(output.clone());
        self.state = PipelineState::Fresh;
        Ok(output)
    }

    /// Write one setting of the filter at `index`. The filtered image goes
    /// stale until the next pass.
    pub fn set_parameter(
        &mut self,
        index: usize,
        name: &str,
        value: ParameterValue,
    ) -> Result<(), ParameterError> {
        self.check_index(index)?;
        let descriptor = self.filters[index].parameter(name)?;
        descriptor.write(&mut self.operations[index], &value)?;
        self.cache_representation();
        self.state = PipelineState::Stale;
        Ok(())
    }

    pub fn parameter(&self, index: usize, name: &str) -> Result<ParameterValue, ParameterError> {
        self.check_index(index)?;
        self.filters[index]
            .parameter(name)?
            .read(&self.operations[index])
    }

    /// Owned copy of every stage, safe to run on another thread.
    pub fn chain(&self) -> Chain {
        let stages = self
            .custom_filters
            .iter()
            .chain(&self.custom_lookup_operations)
            .chain(&self.operations)
            .cloned()
            .collect();
        Chain::new(stages)
    }

    pub fn representation(&self) -> &OperationRepresentation {
        &self.cached
    }

    /// Render the color part of the stack into a new lookup image: custom
    /// lookups over the identity table, then the current settings.
    pub fn bake_lookup(&self) -> ImageBuf {
        let identity = LookupTable::identity_image();
        let customized = Chain::new(self.custom_lookup_operations.clone()).run(&identity);
        self.cached.apply(&customized, self.resolver.as_ref())
    }

    fn cache_representation(&mut self) {
        self.cached = OperationRepresentation::snapshot(&self.filters, &self.operations);
    }

    fn check_index(&self, index: usize) -> Result<(), ParameterError> {
        if index >= self.filters.len() {
            return Err(ParameterError::IndexOutOfRange {
                index,
                len: self.filters.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::lookup::IdentityLookups;
    use crate::operation::test_util::checker;
    use crate::operation::{CiGloom, Sepia};

    fn mixer() -> FilterMixer {
        FilterMixer::new(Arc::new(IdentityLookups))
    }

    fn float(mixer: &FilterMixer, index: usize, name: &str) -> f32 {
        match mixer.parameter(index, name).unwrap() {
            ParameterValue::Float(v) => v,
            other => panic!("expected a float, got {other}"),
        }
    }

    fn vintage(mixer: &mut FilterMixer) {
        mixer.set_filters(vec![FilterKind::Sepia, FilterKind::GaussianBlur]);
        mixer
            .set_parameter(0, "intensity", ParameterValue::Float(0.4))
            .unwrap();
        mixer
            .set_parameter(1, "blurRadiusInPixels", ParameterValue::Float(12.0))
            .unwrap();
    }

    #[test]
    fn starts_stale_and_empty() {
        let mixer = mixer();
        assert_eq!(mixer.state(), PipelineState::Stale);
        assert!(mixer.filters().is_empty());
        assert!(mixer.filtered_image().is_none());
        assert!(mixer.chain().is_empty());
    }

    #[test]
    fn still_mode_processes_placeholder_without_source() {
        let mut mixer = mixer();
        mixer.set_filters(vec![FilterKind::Brightness]);
        assert_eq!(mixer.state(), PipelineState::Fresh);
        assert_eq!(mixer.filtered_image(), Some(&ImageBuf::placeholder()));
    }

    #[test]
    fn still_mode_pass_matches_chain() {
        let mut mixer = mixer();
        mixer.set_original_image(checker(16, 16));
        vintage(&mut mixer);
        assert_eq!(mixer.state(), PipelineState::Stale);

        mixer.process_image();
        let expected = mixer.chain().run(&checker(16, 16));
        assert_eq!(mixer.filtered_image(), Some(&expected));
        assert_eq!(mixer.state(), PipelineState::Fresh);
    }

    #[test]
    fn vintage_survives_clear_and_load() {
        let mut mixer = mixer();
        vintage(&mut mixer);
        let saved = mixer.representation().clone();

        mixer.clear_filters();
        assert!(mixer.filters().is_empty());
        assert!(mixer.representation().is_empty());

        mixer.load_representation(saved);
        assert_eq!(
            mixer.filters(),
            &[FilterKind::Sepia, FilterKind::GaussianBlur]
        );
        assert_eq!(float(&mixer, 0, "intensity"), 0.4);
        assert_eq!(float(&mixer, 1, "blurRadiusInPixels"), 12.0);
    }

    #[test]
    fn rebuild_keeps_values() {
        let mut mixer = mixer();
        vintage(&mut mixer);
        mixer.append_filter(FilterKind::Sepia);
        assert_eq!(float(&mixer, 0, "intensity"), 0.4);
        assert_eq!(float(&mixer, 1, "blurRadiusInPixels"), 12.0);
        assert_eq!(float(&mixer, 2, "intensity"), 1.0);
    }

    #[test]
    fn move_keeps_each_filters_values() {
        let mut mixer = mixer();
        vintage(&mut mixer);
        mixer.move_filter(0, 1).unwrap();
        assert_eq!(
            mixer.filters(),
            &[FilterKind::GaussianBlur, FilterKind::Sepia]
        );
        assert_eq!(float(&mixer, 0, "blurRadiusInPixels"), 12.0);
        assert_eq!(float(&mixer, 1, "intensity"), 0.4);
    }

    #[test]
    fn remove_drops_only_that_filter() {
        let mut mixer = mixer();
        vintage(&mut mixer);
        assert_eq!(mixer.remove_filter(0), Ok(FilterKind::Sepia));
        assert_eq!(mixer.filters(), &[FilterKind::GaussianBlur]);
        assert_eq!(float(&mixer, 0, "blurRadiusInPixels"), 12.0);
    }

    #[test]
    fn bad_indices_and_names_are_errors() {
        let mut mixer = mixer();
        vintage(&mut mixer);
        assert_eq!(
            mixer.remove_filter(2),
            Err(ParameterError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            mixer.move_filter(0, 5),
            Err(ParameterError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert!(matches!(
            mixer.set_parameter(0, "radius", ParameterValue::Float(1.0)),
            Err(ParameterError::UnknownParameter { .. })
        ));
        assert!(matches!(
            mixer.set_parameter(0, "intensity", ParameterValue::Size(crate::parameter::Size::new(1.0, 1.0))),
            Err(ParameterError::ValueKind { .. })
        ));
        assert_eq!(mixer.filters().len(), 2);
    }

    #[test]
    fn frames_require_live_mode() {
        let mut mixer = mixer();
        mixer.set_filters(vec![FilterKind::Sepia]);
        assert_eq!(
            mixer.process_frame(checker(8, 8)),
            Err(MixerError::NotLive)
        );

        mixer.set_live_mode(true);
        let frame = checker(8, 8);
        let expected = mixer.chain().run(&frame);
        assert_eq!(mixer.process_frame(frame), Ok(expected.clone()));
        assert_eq!(mixer.filtered_image(), Some(&expected));
    }

    #[test]
    fn live_rebuild_skips_the_pass() {
        let mut mixer = mixer();
        mixer.set_live_mode(true);
        mixer.set_filters(vec![FilterKind::Sepia]);
        assert!(mixer.filtered_image().is_none());
        assert_eq!(mixer.state(), PipelineState::Fresh);
        assert_eq!(mixer.representation().filters(), vec![FilterKind::Sepia]);
    }

    #[test]
    fn chain_orders_custom_stages_first() {
        let mut mixer = mixer();
        mixer.set_filters(vec![FilterKind::Sepia]);
        mixer.set_custom_lookups(vec![LookupTable::shared_identity()]);
        mixer.set_custom_filters(vec![CiGloom::default().into()]);
        assert_eq!(mixer.chain().names(), vec!["ci_gloom", "lookup", "sepia"]);
        assert_eq!(mixer.filters(), &[FilterKind::Sepia]);
    }

    #[test]
    fn chain_runs_stages_over_borrowed_input() {
        let input = checker(12, 12);
        assert_eq!(Chain::new(Vec::new()).run(&input), input);

        let stages: Vec<Operation> = vec![
            Sepia { intensity: 0.7 }.into(),
            CiGloom::default().into(),
            Sepia { intensity: 0.2 }.into(),
        ];
        let mut expected = input.clone();
        for stage in &stages {
            expected = stage.process(&expected).unwrap();
        }
        let untouched = input.clone();
        assert_eq!(Chain::new(stages).run(&input), expected);
        assert_eq!(input, untouched);
    }

    #[test]
    fn bake_without_color_filters_is_identity() {
        let mut mixer = mixer();
        mixer.set_custom_lookups(vec![LookupTable::shared_identity()]);
        let baked = mixer.bake_lookup();
        let identity = LookupTable::identity_image();
        assert_eq!(baked.width, identity.width);
        for (a, b) in baked.data.iter().zip(&identity.data) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn bake_captures_sepia() {
        let mut mixer = mixer();
        vintage(&mut mixer);
        mixer.remove_filter(1).unwrap();
        let baked = LookupTable::from_image(mixer.bake_lookup()).unwrap();

        let sepia = Operation::from(Sepia { intensity: 0.4 });
        let sample = ImageBuf::filled(1, 1, [0.2, 0.5, 0.7, 1.0]);
        let direct = sepia.process(&sample).unwrap().pixel(0, 0);
        let via_table = baked.lookup([0.2, 0.5, 0.7]);
        for c in 0..3 {
            assert!((direct[c] - via_table[c]).abs() < 0.02, "{direct:?} vs {via_table:?}");
        }
    }
}
